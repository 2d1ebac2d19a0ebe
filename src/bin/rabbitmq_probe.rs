// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Probe
//!
//! Connects with the module configuration and prints the session properties and the
//! state of the requested queues as JSON.

use clap::Parser;
use rabbitmq_module::{
    bind, ApplicationLifecycle, RabbitMQConfig, RabbitMQModule, ServerProperties,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rabbitmq-probe", version, about = "Inspect a RabbitMQ broker")]
struct Args {
    /// Configuration file holding a `rabbitmq` section
    #[arg(short, long, env = "RABBITMQ_PROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Broker uri, overrides the configured one
    #[arg(long, env = "AMQP_ADDR")]
    uri: Option<String>,

    /// Queue to inspect, may be repeated
    #[arg(short, long = "queue")]
    queues: Vec<String>,
}

#[derive(Serialize)]
struct Report {
    connected: bool,
    server: Option<ServerProperties>,
    queues: Vec<QueueReport>,
}

#[derive(Serialize)]
struct QueueReport {
    name: String,
    messages: Option<u32>,
    consumers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match RabbitMQConfig::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = err.to_string(), "failure to load configuration");
            std::process::exit(2);
        }
    };
    if let Some(uri) = args.uri {
        config.conn.uri = Some(uri);
    }

    let lifecycle = ApplicationLifecycle::new();
    let rabbitmq = match bind(&lifecycle, config).await {
        Ok(module) => module,
        Err(err) => {
            error!(error = err.to_string(), "failure to start");
            std::process::exit(1);
        }
    };

    let mut queues = Vec::with_capacity(args.queues.len());
    for name in args.queues {
        queues.push(inspect(rabbitmq.as_ref(), name).await);
    }

    let report = Report {
        connected: rabbitmq.is_connected(),
        server: rabbitmq.server_properties(),
        queues,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => error!(error = err.to_string(), "failure to render report"),
    }

    lifecycle.stop().await;
    info!("probe finished");
}

async fn inspect(rabbitmq: &dyn RabbitMQModule, name: String) -> QueueReport {
    let messages = rabbitmq.message_count(&name).await;
    let consumers = rabbitmq.consumer_count(&name).await;

    let error = messages
        .as_ref()
        .err()
        .or(consumers.as_ref().err())
        .map(|err| err.to_string());

    QueueReport {
        messages: messages.ok().flatten(),
        consumers: consumers.ok().flatten(),
        error,
        name,
    }
}
