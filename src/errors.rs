// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the RabbitMQ Module
//!
//! This module provides the error type for every fallible operation of the module:
//! reading configuration, opening the broker connection, creating channels and
//! declaring or inspecting queues.

use thiserror::Error;

/// Represents errors that can occur while initializing or using the RabbitMQ module.
///
/// Startup failures (`MissingUri`, `InvalidUri`, `InvalidConfig`, `ConnectionError`)
/// are only surfaced when the bypass flag is disabled. Once the module runs, broker
/// failures on a live connection are reported through the remaining variants.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmqpError {
    /// The broker URI is absent or empty
    #[error("URI is empty")]
    MissingUri,

    /// The broker URI could not be parsed
    #[error("invalid broker uri: {0}")]
    InvalidUri(String),

    /// A configuration value is out of range or could not be loaded
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error establishing a connection to the RabbitMQ server
    #[error("failure to connect: {0}")]
    ConnectionError(String),

    /// Error creating a channel from an established connection
    #[error("failure to create a channel: {0}")]
    ChannelError(String),

    /// Error declaring a queue with the given name
    #[error("failure to declare a queue `{0}`")]
    DeclareQueueError(String),

    /// Error inspecting a queue with the given name
    #[error("failure to inspect queue `{0}`")]
    InspectQueueError(String),

    /// Error closing the connection
    #[error("failure to close the connection: {0}")]
    CloseError(String),

    /// Error building the worker runtime that drives the connection
    #[error("failure to start the amqp worker runtime: {0}")]
    RuntimeError(String),
}

/// Result alias used across the module.
pub type Result<T> = std::result::Result<T, AmqpError>;

impl From<config::ConfigError> for AmqpError {
    fn from(err: config::ConfigError) -> Self {
        AmqpError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_queue() {
        let err = AmqpError::DeclareQueueError("orders".to_owned());
        assert_eq!(err.to_string(), "failure to declare a queue `orders`");
    }

    #[test]
    fn config_errors_map_to_invalid_config() {
        let err: AmqpError = config::ConfigError::Message("bad heartbeat".to_owned()).into();
        assert_eq!(err, AmqpError::InvalidConfig("bad heartbeat".to_owned()));
    }
}
