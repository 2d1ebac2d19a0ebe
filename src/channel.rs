// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Channel Management
//!
//! Channel level operations used by the module: opening channels, declaring the
//! queue a caller asked for and inspecting queues through a passive declaration.

use crate::{
    errors::{AmqpError, Result},
    queue::{passive_options, QueueDefinition},
};
use lapin::{types::FieldTable, Channel, Connection, Queue};
use tracing::{debug, error, warn};

/// Reply code sent when the module closes a channel it opened for itself.
const REPLY_SUCCESS: u16 = 200;

/// Opens a new channel on the connection.
///
/// The channel belongs to the caller, which is responsible for closing it.
pub async fn open_channel(conn: &Connection) -> Result<Channel> {
    debug!("creating amqp channel...");
    match conn.create_channel().await {
        Ok(c) => {
            debug!(channel_id = c.id(), "channel created");
            Ok(c)
        }
        Err(err) => {
            error!(error = err.to_string(), "error to create the channel");
            Err(AmqpError::ChannelError(err.to_string()))
        }
    }
}

/// Declares a queue on the given channel.
///
/// # Parameters
/// * `channel` - The channel to declare the queue on
/// * `def` - Name and flags of the queue
pub async fn declare_queue(channel: &Channel, def: &QueueDefinition) -> Result<Queue> {
    debug!(
        name = def.name(),
        durable = def.durable,
        exclusive = def.exclusive,
        auto_delete = def.delete,
        "declaring queue"
    );

    match channel
        .queue_declare(def.name(), def.declare_options(), FieldTable::default())
        .await
    {
        Err(err) => {
            error!(
                error = err.to_string(),
                name = def.name(),
                "error to declare the queue"
            );
            Err(AmqpError::DeclareQueueError(def.name().to_owned()))
        }
        Ok(queue) => {
            debug!("queue: {} was declared", def.name());
            Ok(queue)
        }
    }
}

/// Reads the current state of an existing queue.
///
/// A short-lived channel is opened for the passive declaration and closed again
/// before returning.
pub async fn inspect_queue(conn: &Connection, name: &str) -> Result<Queue> {
    let channel = open_channel(conn).await?;

    let result = channel
        .queue_declare(name, passive_options(), FieldTable::default())
        .await;

    match result {
        Err(err) => {
            // the broker closes the channel itself when the passive declaration fails
            error!(error = err.to_string(), name, "error to inspect the queue");
            Err(AmqpError::InspectQueueError(name.to_owned()))
        }
        Ok(queue) => {
            if let Err(err) = channel.close(REPLY_SUCCESS, "OK").await {
                warn!(error = err.to_string(), "error closing inspection channel");
            }
            Ok(queue)
        }
    }
}
