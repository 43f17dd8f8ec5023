/*!
 * Resilient access to the remote database engine.
 *
 * - `engine`: transport traits (`Connector`, `Connection`)
 * - `http`: JSON-over-HTTP transport
 * - `connection`: the single live handle and its reconnects
 * - `retry`: bounded reconnect-and-retry around one round trip
 * - `executor`: batch execution with statement-level error filtering
 * - `schema`: init script run at startup
 * - `mock`: scripted engine for tests
 *
 * `Database` ties these together for one process.
 */

pub mod connection;
pub mod engine;
pub mod executor;
pub mod http;
pub mod mock;
pub mod retry;
pub mod schema;
pub mod statement;

use std::sync::Arc;

use log::info;

use crate::app_config::Config;
use crate::errors::AppError;

// Re-export main types
pub use connection::{ConnectionManager, Handle};
pub use engine::{Connection, Connector};
pub use executor::QueryExecutor;
pub use http::HttpConnector;
pub use retry::{RetryOutcome, RetryPolicy};
pub use statement::{Bindings, COLLATERAL_MESSAGE, QueryResults, StatementResult};

/// A started database: the connection manager plus an executor over it
#[derive(Debug, Clone)]
pub struct Database {
    connections: Arc<ConnectionManager>,
    executor: QueryExecutor,
}

impl Database {
    /// Start the database layer
    ///
    /// During the build phase a dormant database is returned without any network
    /// traffic. Otherwise the first connection is opened and the schema script run;
    /// a failure of either aborts startup.
    pub async fn start(config: &Config, connector: Arc<dyn Connector>) -> Result<Self, AppError> {
        let retry = RetryPolicy::from_config(&config.retry);

        if config.is_building() {
            info!("Build phase detected, database connection disabled");
            let connections = Arc::new(ConnectionManager::dormant(connector));
            let executor = QueryExecutor::new(Arc::clone(&connections), retry);
            return Ok(Self { connections, executor });
        }

        let connections = Arc::new(ConnectionManager::new(connector));
        connections.reconnect().await?;

        let executor = QueryExecutor::new(Arc::clone(&connections), retry);
        schema::initialize(&executor).await?;

        Ok(Self { connections, executor })
    }

    /// Start the database layer over HTTP using the configured endpoint
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let connector: Arc<dyn Connector> = Arc::new(HttpConnector::new(&config.database));
        Self::start(config, connector).await
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Whether this database was started in the build phase
    pub fn is_dormant(&self) -> bool {
        self.connections.is_dormant()
    }

    /// Close the live handle
    pub async fn shutdown(&self) {
        self.connections.close().await;
    }
}

/// Process-wide database instance for request-handler glue
///
/// Library code takes a `QueryExecutor` explicitly; this is only for entry points
/// that cannot thread one through.
pub mod global {
    use once_cell::sync::OnceCell;

    use super::Database;
    use crate::errors::AppError;

    static INSTANCE: OnceCell<Database> = OnceCell::new();

    /// Install the process-wide database; fails if one is already installed
    pub fn install(database: Database) -> Result<&'static Database, AppError> {
        INSTANCE
            .set(database)
            .map_err(|_| AppError::Unknown("Database already installed".to_string()))?;
        get()
    }

    /// The installed database
    pub fn get() -> Result<&'static Database, AppError> {
        INSTANCE
            .get()
            .ok_or_else(|| AppError::Unknown("Database not installed".to_string()))
    }
}
