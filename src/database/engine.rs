/*!
 * Transport seam between the data-access layer and the database engine.
 *
 * The engine is treated as an opaque RPC target: a `Connector` performs the
 * handshake and yields a `Connection`, which accepts query text plus bindings and
 * answers with one outcome per statement. Implementations:
 * - `http::HttpConnector`: JSON over HTTP with reqwest
 * - `mock::MockConnector`: scripted in-process engine for tests
 */

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use super::statement::{Bindings, StatementResult};
use crate::errors::ConnectionError;

/// Opens connections to the database engine
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    /// Open a fresh connection and complete the handshake
    ///
    /// # Returns
    /// * `Result<Arc<dyn Connection>, ConnectionError>` - The live connection or the handshake failure
    async fn open(&self) -> Result<Arc<dyn Connection>, ConnectionError>;

    /// Human readable address of the engine, for logs
    fn target(&self) -> String;
}

/// A live connection to the database engine
#[async_trait]
pub trait Connection: Send + Sync + Debug {
    /// Submit a batch and return one outcome per statement, in submission order
    ///
    /// # Arguments
    /// * `query` - Query text, one or more statements
    /// * `bindings` - Named parameters shared by all statements
    async fn query(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<Vec<StatementResult>, ConnectionError>;

    /// Version string reported by the engine
    async fn version(&self) -> Result<String, ConnectionError>;

    /// Close the connection. Closing twice is a no-op.
    async fn close(&self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;
}
