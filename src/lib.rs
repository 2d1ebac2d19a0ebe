// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

mod recovery;

pub mod channel;
pub mod config;
pub mod connection;
pub mod errors;
pub mod lifecycle;
pub mod module;
pub mod queue;

pub use crate::config::RabbitMQConfig;
pub use crate::lifecycle::{bind, ApplicationLifecycle};
pub use crate::module::{RabbitMQModule, RabbitMQModuleImpl, ServerProperties};
