/*!
 * Connection lifecycle management.
 *
 * The manager owns the single live handle to the engine. A reconnect closes the
 * previous handle before opening a new one and swaps the new handle in whole; the
 * handle itself is never mutated. Every successful (re)connect bumps a generation
 * number so the retry policy can tell whether the handle it failed on is still
 * current or has already been replaced by another task.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::engine::{Connection, Connector};
use super::statement::{Bindings, StatementResult};
use crate::errors::ConnectionError;

/// A connection paired with the generation it was opened in
#[derive(Debug, Clone)]
pub struct Handle {
    generation: u64,
    connection: Arc<dyn Connection>,
}

impl Handle {
    /// Generation this handle was opened in; starts at 1
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Submit a batch over this handle
    pub async fn query(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<Vec<StatementResult>, ConnectionError> {
        self.connection.query(query, bindings).await
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }
}

/// Owner of the process-wide connection handle
#[derive(Debug)]
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    /// Current handle; the lock is never held across an await
    current: RwLock<Option<Handle>>,
    /// Last generation handed out
    generation: AtomicU64,
    /// Serializes reconnects so two never interleave
    reconnect_gate: Mutex<()>,
    /// Set during the build phase; no connection is ever opened
    dormant: bool,
}

impl ConnectionManager {
    /// Create a manager that connects through `connector`
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            reconnect_gate: Mutex::new(()),
            dormant: false,
        }
    }

    /// Create a manager that refuses to connect, for the build phase
    pub fn dormant(connector: Arc<dyn Connector>) -> Self {
        Self {
            dormant: true,
            ..Self::new(connector)
        }
    }

    pub fn is_dormant(&self) -> bool {
        self.dormant
    }

    /// The live handle
    pub fn current_handle(&self) -> Result<Handle, ConnectionError> {
        if self.dormant {
            return Err(ConnectionError::Dormant);
        }
        self.current.read().clone().ok_or(ConnectionError::NotConnected)
    }

    /// Generation of the live handle, 0 when not connected
    pub fn generation(&self) -> u64 {
        self.current.read().as_ref().map_or(0, |h| h.generation)
    }

    /// Close any existing handle and open a fresh one
    pub async fn reconnect(&self) -> Result<Handle, ConnectionError> {
        let _gate = self.reconnect_gate.lock().await;
        self.reconnect_locked().await
    }

    /// Reconnect after a failure on the handle of `failed_generation`
    ///
    /// When another task already replaced that handle, the newer one is returned
    /// without reconnecting again.
    pub async fn reconnect_after(&self, failed_generation: u64) -> Result<Handle, ConnectionError> {
        let _gate = self.reconnect_gate.lock().await;

        let current = self.current.read().clone();
        if let Some(handle) = current {
            if handle.generation > failed_generation && !handle.is_closed() {
                debug!(
                    "Generation {} already replaced by {}, skipping reconnect",
                    failed_generation, handle.generation
                );
                return Ok(handle);
            }
        }

        self.reconnect_locked().await
    }

    /// Close the live handle, if any
    pub async fn close(&self) {
        let _gate = self.reconnect_gate.lock().await;
        let previous = self.current.write().take();
        if let Some(handle) = previous {
            handle.connection.close().await;
        }
    }

    async fn reconnect_locked(&self) -> Result<Handle, ConnectionError> {
        // Take the old handle out first so nobody picks it up while it closes
        let previous = self.current.write().take();
        if let Some(handle) = previous {
            debug!("Closing connection generation {}", handle.generation);
            handle.connection.close().await;
        }

        if self.dormant {
            debug!("Build phase, not connecting to {}", self.connector.target());
            return Err(ConnectionError::Dormant);
        }

        info!("Connecting to {}", self.connector.target());
        let connection = self.connector.open().await?;

        match connection.version().await {
            Ok(version) => info!("Reloaded, engine version {}", version),
            Err(e) => warn!("Connected but failed to read engine version: {}", e),
        }

        let handle = Handle {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            connection,
        };
        *self.current.write() = Some(handle.clone());

        Ok(handle)
    }
}
