// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Queue Declaration for RabbitMQ
//!
//! This module provides the definition used when a channel is requested together with
//! a named queue. Definitions start from the module defaults (durable, non-exclusive,
//! not auto-deleted) and are adjusted by the per-queue overrides found in configuration.

use crate::config::QueueOverrides;
use lapin::options::QueueDeclareOptions;

/// Definition of a RabbitMQ queue with the flags used to declare it.
///
/// This struct implements the builder pattern to adjust the declaration flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDefinition {
    pub(crate) name: String,
    pub(crate) durable: bool,
    pub(crate) exclusive: bool,
    pub(crate) delete: bool,
}

impl QueueDefinition {
    /// Creates a new queue definition with the given name.
    ///
    /// The queue is durable, non-exclusive and is not deleted when unused.
    ///
    /// # Parameters
    /// * `name` - The name of the queue
    ///
    /// # Returns
    /// A new queue definition with default settings
    pub fn new(name: &str) -> QueueDefinition {
        QueueDefinition {
            name: name.to_owned(),
            durable: true,
            exclusive: false,
            delete: false,
        }
    }

    /// Sets whether the queue survives broker restarts.
    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    /// Sets whether the queue is exclusive to the declaring connection.
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Sets whether the queue is deleted once its last consumer goes away.
    pub fn delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    /// Applies configured overrides. Flags left unset by the overrides are unchanged.
    ///
    /// # Parameters
    /// * `overrides` - Overrides for this queue, if any were configured
    ///
    /// # Returns
    /// Self for method chaining
    pub fn with_overrides(self, overrides: Option<&QueueOverrides>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };

        let durable = overrides.durable.unwrap_or(self.durable);
        let exclusive = overrides.exclusive.unwrap_or(self.exclusive);
        let delete = overrides.auto_delete.unwrap_or(self.delete);

        self.durable(durable).exclusive(exclusive).delete(delete)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration options for this queue.
    pub fn declare_options(&self) -> QueueDeclareOptions {
        QueueDeclareOptions {
            passive: false,
            durable: self.durable,
            exclusive: self.exclusive,
            auto_delete: self.delete,
            nowait: false,
        }
    }
}

/// Options for inspecting an existing queue without modifying it.
pub fn passive_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        passive: true,
        ..QueueDeclareOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_definition_uses_module_defaults() {
        let opts = QueueDefinition::new("jobs").declare_options();

        assert!(!opts.passive);
        assert!(opts.durable);
        assert!(!opts.exclusive);
        assert!(!opts.auto_delete);
        assert!(!opts.nowait);
    }

    #[test]
    fn overrides_replace_only_the_flags_they_set() {
        let overrides = QueueOverrides {
            durable: Some(false),
            exclusive: None,
            auto_delete: Some(true),
        };

        let def = QueueDefinition::new("jobs").with_overrides(Some(&overrides));

        assert_eq!(def.name(), "jobs");
        assert!(!def.durable);
        assert!(!def.exclusive);
        assert!(def.delete);
    }

    #[test]
    fn no_overrides_keeps_definition() {
        let def = QueueDefinition::new("jobs").exclusive(true);

        assert_eq!(def.clone().with_overrides(None), def);
    }

    #[test]
    fn passive_options_do_not_create_queues() {
        let opts = passive_options();

        assert!(opts.passive);
        assert!(!opts.durable);
    }
}
