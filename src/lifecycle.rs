// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Application Lifecycle
//!
//! Stop hooks run when the application shuts down, and the binder that builds the
//! RabbitMQ module and ties its connection to that shutdown.
//!
//! ```no_run
//! use rabbitmq_module::{config::RabbitMQConfig, lifecycle::{bind, ApplicationLifecycle}};
//!
//! # async fn run() -> Result<(), rabbitmq_module::errors::AmqpError> {
//! let lifecycle = ApplicationLifecycle::new();
//! let rabbitmq = bind(&lifecycle, RabbitMQConfig::load(None)?).await?;
//!
//! if let Some(channel) = rabbitmq.channel_for_queue("jobs").await? {
//!     // publish or consume with lapin
//! #   drop(channel);
//! }
//!
//! lifecycle.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::{
    config::RabbitMQConfig,
    errors::Result,
    module::{RabbitMQModule, RabbitMQModuleImpl},
};
use futures_util::future::{BoxFuture, FutureExt};
use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{debug, error, info};

type StopHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Registry of asynchronous hooks run at application shutdown.
#[derive(Default)]
pub struct ApplicationLifecycle {
    hooks: Mutex<Vec<StopHook>>,
}

impl ApplicationLifecycle {
    pub fn new() -> ApplicationLifecycle {
        ApplicationLifecycle::default()
    }

    /// Registers a hook to run on [`stop`](ApplicationLifecycle::stop).
    pub fn add_stop_hook<F, Fut>(&self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(move || hook().boxed()));
    }

    /// Runs every registered hook, last registered first.
    ///
    /// Hooks run once: later calls only run hooks registered since.
    pub async fn stop(&self) {
        let hooks = std::mem::take(
            &mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        debug!(hooks = hooks.len(), "running stop hooks");

        for hook in hooks.into_iter().rev() {
            hook().await;
        }
    }

    pub fn pending(&self) -> usize {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Builds the RabbitMQ module and closes its connection when the lifecycle stops.
///
/// # Parameters
/// * `lifecycle` - Lifecycle receiving the shutdown hook
/// * `config` - Module configuration
///
/// # Returns
/// The shared module, or the startup error when initialization failed and
/// `bypass_init_error` is not set
pub async fn bind(
    lifecycle: &ApplicationLifecycle,
    config: RabbitMQConfig,
) -> Result<Arc<dyn RabbitMQModule>> {
    let module: Arc<dyn RabbitMQModule> = Arc::new(RabbitMQModuleImpl::new(config).await?);
    register_stop_hook(lifecycle, module.clone());
    Ok(module)
}

fn register_stop_hook(lifecycle: &ApplicationLifecycle, module: Arc<dyn RabbitMQModule>) {
    lifecycle.add_stop_hook(move || async move {
        info!("Shutting down RabbitMQ");
        if let Err(err) = module.close().await {
            error!(error = err.to_string(), "error shutting down RabbitMQ");
        }
    });
}
