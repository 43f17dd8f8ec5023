/*!
 * JSON-over-HTTP transport to the engine.
 *
 * Opening a connection is a handshake: `GET {endpoint}/version` must answer with
 * a success status, and its body is the engine version. Queries go to
 * `POST {endpoint}/rpc` as a JSON-RPC body
 * `{"id": n, "method": "query", "params": [text, bindings]}` and come back as a
 * list of `{status, result}` entries, one per statement. Every request carries
 * the `surreal-ns`/`surreal-db` headers and, when configured, basic auth.
 *
 * A non-success HTTP status, a top-level `error` object or an unreadable body is
 * a `ConnectionError`, which makes the retry policy reconnect.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::engine::{Connection, Connector};
use super::statement::{Bindings, RawStatement, StatementResult};
use crate::app_config::DatabaseConfig;
use crate::errors::ConnectionError;

/// Opens JSON-over-HTTP connections to the engine
#[derive(Debug, Clone)]
pub struct HttpConnector {
    /// Base URL of the engine, without trailing slash
    base_url: String,
    /// Namespace sent with every request
    namespace: String,
    /// Database sent with every request
    database: String,
    /// Optional basic auth credentials
    credentials: Option<(String, String)>,
    /// Request timeout
    timeout: Duration,
}

/// A connection opened by [`HttpConnector`]
#[derive(Debug)]
pub struct HttpConnection {
    client: Client,
    base_url: String,
    namespace: String,
    database: String,
    credentials: Option<(String, String)>,
    /// Set once by `close`; queries on a closed handle fail
    closed: AtomicBool,
    /// RPC request id counter
    next_id: AtomicU64,
}

/// RPC request body
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    id: u64,
    method: &'static str,
    params: (&'a str, &'a Bindings),
}

/// RPC error object
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// RPC response body
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<RawStatement>>,
    #[serde(default)]
    error: Option<RpcError>,
}

impl HttpConnector {
    /// Create a connector from the database configuration
    pub fn new(config: &DatabaseConfig) -> Self {
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };

        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            database: config.database.clone(),
            credentials,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn open(&self) -> Result<Arc<dyn Connection>, ConnectionError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ConnectionError::Unreachable(format!("Failed to build HTTP client: {}", e)))?;

        let connection = HttpConnection {
            client,
            base_url: self.base_url.clone(),
            namespace: self.namespace.clone(),
            database: self.database.clone(),
            credentials: self.credentials.clone(),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        };

        // The handshake is a version probe; it proves the engine is up and speaking HTTP
        let version = connection.fetch_version().await?;
        debug!("Handshake with {} complete ({})", self.base_url, version);

        Ok(Arc::new(connection))
    }

    fn target(&self) -> String {
        format!("{} ({}/{})", self.base_url, self.namespace, self.database)
    }
}

impl HttpConnection {
    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/json")
            .header("surreal-ns", &self.namespace)
            .header("surreal-db", &self.database);

        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn fetch_version(&self) -> Result<String, ConnectionError> {
        let url = format!("{}/version", self.base_url);

        let response = self
            .with_headers(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ConnectionError::Unreachable(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get response text".to_string());

        if !status.is_success() {
            error!("Engine handshake failed ({}): {}", status, body);
            return Err(ConnectionError::HandshakeRejected {
                status_code: status.as_u16(),
                message: body,
            });
        }

        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn query(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<Vec<StatementResult>, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        let url = format!("{}/rpc", self.base_url);
        let body = RpcRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "query",
            params: (query, bindings),
        };

        let response = self
            .with_headers(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ConnectionError::Unreachable(format!("Failed to send query: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectionError::Protocol(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!("Engine error ({}): {}", status, text);
            return Err(ConnectionError::Rpc {
                code: i64::from(status.as_u16()),
                message: text,
            });
        }

        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(500).collect();
            error!("Failed to parse engine response: {}. Raw response (first 500 chars): {}", e, preview);
            ConnectionError::Protocol(e.to_string())
        })?;

        match parsed {
            RpcResponse { error: Some(err), .. } => Err(ConnectionError::Rpc {
                code: err.code,
                message: err.message,
            }),
            RpcResponse { result: Some(statements), .. } => {
                Ok(statements.into_iter().map(StatementResult::from).collect())
            }
            _ => Err(ConnectionError::Protocol(
                "response carries neither result nor error".to_string(),
            )),
        }
    }

    async fn version(&self) -> Result<String, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        self.fetch_version().await
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed connection to {}", self.base_url);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
