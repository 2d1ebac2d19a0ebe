// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Automatic Connection Recovery
//!
//! lapin does not recover lost connections by itself. When automatic recovery is
//! enabled, every connection handed to the module reports its errors to a supervisor
//! task running on the worker runtime. The supervisor empties the connection slot,
//! waits the network recovery interval and reconnects, retrying at that interval until
//! it succeeds or the module shuts down.

use crate::{connection::Connector, errors::Result};
use async_trait::async_trait;
use lapin::Connection;
use std::{
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

const REPLY_SUCCESS: u16 = 200;

/// Shared slot holding the live connection, empty while degraded or recovering.
pub(crate) type Slot<C> = Arc<RwLock<Option<Arc<C>>>>;

pub(crate) type ConnectionSlot = Slot<Connection>;

pub(crate) fn read_slot<C>(slot: &Slot<C>) -> RwLockReadGuard<'_, Option<Arc<C>>> {
    slot.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_slot<C>(slot: &Slot<C>) -> RwLockWriteGuard<'_, Option<Arc<C>>> {
    slot.write().unwrap_or_else(PoisonError::into_inner)
}

/// Error reported by a watched connection.
#[derive(Debug)]
struct Failure {
    generation: u64,
    reason: String,
}

/// Forwards the errors of one connection generation to the supervisor.
#[derive(Debug, Clone)]
pub(crate) struct FailureReporter {
    failures: mpsc::UnboundedSender<Failure>,
    generation: u64,
}

impl FailureReporter {
    pub(crate) fn report(&self, reason: String) {
        // the supervisor is gone once the module shut down
        let _ = self.failures.send(Failure {
            generation: self.generation,
            reason,
        });
    }
}

/// Opens, watches and closes the connections the supervisor recovers.
#[async_trait]
pub(crate) trait Reconnect: Send + Sync + 'static {
    type Connection: Send + Sync + 'static;

    async fn open(&self) -> Result<Self::Connection>;

    /// Routes the errors of `conn` to `reporter`.
    fn watch(&self, conn: &Self::Connection, reporter: FailureReporter);

    async fn close(&self, conn: &Self::Connection);
}

#[async_trait]
impl Reconnect for Connector {
    type Connection = Connection;

    async fn open(&self) -> Result<Connection> {
        Connector::open(self).await
    }

    fn watch(&self, conn: &Connection, reporter: FailureReporter) {
        conn.on_error(move |err| reporter.report(err.to_string()));
    }

    async fn close(&self, conn: &Connection) {
        if let Err(err) = conn.close(REPLY_SUCCESS, "shutting down").await {
            warn!(error = err.to_string(), "error closing a recovered connection");
        }
    }
}

/// Handle to the recovery supervisor.
pub struct Recovery<R: Reconnect = Connector> {
    connector: Arc<R>,
    failures: mpsc::UnboundedSender<Failure>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Reconnect> Recovery<R> {
    /// Spawns the supervisor.
    ///
    /// # Parameters
    /// * `connector` - Used to reopen the connection
    /// * `slot` - Slot the recovered connection is stored in
    /// * `interval` - Delay before each reconnection attempt
    /// * `runtime` - Runtime the supervisor runs on
    pub(crate) fn start(
        connector: R,
        slot: Slot<R::Connection>,
        interval: Duration,
        runtime: &Handle,
    ) -> Recovery<R> {
        let connector = Arc::new(connector);
        let (failures, failures_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let supervisor = Supervisor {
            connector: connector.clone(),
            slot,
            interval,
            failures: failures.clone(),
            generation: 0,
        };
        let task = runtime.spawn(supervisor.run(failures_rx, shutdown_rx));

        Recovery {
            connector,
            failures,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Starts watching the connection opened at startup.
    pub(crate) fn watch(&self, conn: &R::Connection) {
        self.connector.watch(conn, self.reporter(0));
    }

    fn reporter(&self, generation: u64) -> FailureReporter {
        FailureReporter {
            failures: self.failures.clone(),
            generation,
        }
    }

    /// Stops the supervisor, including any reconnection in progress.
    ///
    /// Returns the supervisor task the first time it is called. Once that task
    /// completed, the supervisor no longer touches the slot.
    pub(crate) fn stop(&self) -> Option<JoinHandle<()>> {
        self.shutdown.send_replace(true);
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<R: Reconnect> Drop for Recovery<R> {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

struct Supervisor<R: Reconnect> {
    connector: Arc<R>,
    slot: Slot<R::Connection>,
    interval: Duration,
    failures: mpsc::UnboundedSender<Failure>,
    generation: u64,
}

impl<R: Reconnect> Supervisor<R> {
    async fn run(
        mut self,
        mut failures: mpsc::UnboundedReceiver<Failure>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                failure = failures.recv() => {
                    let Some(failure) = failure else { break };

                    if failure.generation != self.generation {
                        debug!(
                            generation = failure.generation,
                            "ignoring error of a replaced connection"
                        );
                        continue;
                    }

                    warn!(error = failure.reason, "amqp connection lost, starting recovery");
                    write_slot(&self.slot).take();

                    let Some(conn) = self.reconnect(&mut shutdown).await else { break };

                    self.generation += 1;
                    self.connector.watch(
                        &conn,
                        FailureReporter {
                            failures: self.failures.clone(),
                            generation: self.generation,
                        },
                    );
                    *write_slot(&self.slot) = Some(Arc::new(conn));
                }
            }
        }

        debug!("recovery supervisor stopped");
    }

    async fn reconnect(&self, shutdown: &mut watch::Receiver<bool>) -> Option<R::Connection> {
        let mut attempt: u32 = 0;

        loop {
            tokio::select! {
                _ = shutdown.changed() => return None,
                _ = tokio::time::sleep(self.interval) => {}
            }

            attempt += 1;
            let opened = tokio::select! {
                _ = shutdown.changed() => return None,
                opened = self.connector.open() => opened,
            };

            let stopping = *shutdown.borrow();
            match opened {
                Ok(conn) if stopping => {
                    debug!(attempt, "closing connection recovered during shutdown");
                    self.connector.close(&conn).await;
                    return None;
                }
                Ok(conn) => {
                    info!(attempt, "amqp connection recovered");
                    return Some(conn);
                }
                Err(err) => warn!(attempt, error = err.to_string(), "recovery attempt failed"),
            }
        }
    }
}
