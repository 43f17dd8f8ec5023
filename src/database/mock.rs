/*!
 * Mock engine for testing.
 *
 * `MockConnector` hands out connections that answer from a shared script:
 * - `push_response(...)` - Next query returns these statement outcomes
 * - `push_error(...)` - Next query fails at the transport level
 * - `fail_opens(true)` - Every handshake fails until switched off
 *
 * Counters for opens, closes and queries are shared by all connections, so tests
 * can assert exactly how many reconnects a code path triggered.
 */

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::engine::{Connection, Connector};
use super::statement::{Bindings, StatementResult};
use crate::errors::ConnectionError;

type Scripted = Result<Vec<StatementResult>, ConnectionError>;

/// A query as the mock engine received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    /// Query text
    pub query: String,
    /// Bindings sent with the query
    pub bindings: Bindings,
    /// Open sequence number of the connection that received it
    pub connection_id: usize,
}

#[derive(Debug, Default)]
struct MockState {
    opens: AtomicUsize,
    closes: AtomicUsize,
    queries: AtomicUsize,
    fail_opens: AtomicBool,
    script: Mutex<VecDeque<Scripted>>,
    recorded: Mutex<Vec<RecordedQuery>>,
}

/// Scripted connector for tests
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<MockState>,
}

/// Connection handed out by [`MockConnector`]
#[derive(Debug)]
pub struct MockConnection {
    id: usize,
    closed: AtomicBool,
    state: Arc<MockState>,
}

impl MockConnector {
    /// Create a connector with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the statement outcomes for the next query
    pub fn push_response(&self, statements: Vec<StatementResult>) -> &Self {
        self.state.script.lock().push_back(Ok(statements));
        self
    }

    /// Queue a successful response with one payload per statement
    pub fn push_success(&self, payloads: Vec<Value>) -> &Self {
        self.push_response(payloads.into_iter().map(StatementResult::Success).collect())
    }

    /// Queue a transport failure for the next query
    pub fn push_error(&self, error: ConnectionError) -> &Self {
        self.state.script.lock().push_back(Err(error));
        self
    }

    /// Make handshakes fail (or succeed again)
    pub fn fail_opens(&self, fail: bool) {
        self.state.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Number of successful handshakes
    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Number of connections closed
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Number of queries that reached an open connection
    pub fn queries(&self) -> usize {
        self.state.queries.load(Ordering::SeqCst)
    }

    /// Every query received so far, in order
    pub fn recorded(&self) -> Vec<RecordedQuery> {
        self.state.recorded.lock().clone()
    }

    /// The most recent query
    pub fn last_query(&self) -> Option<RecordedQuery> {
        self.state.recorded.lock().last().cloned()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self) -> Result<Arc<dyn Connection>, ConnectionError> {
        if self.state.fail_opens.load(Ordering::SeqCst) {
            return Err(ConnectionError::Unreachable("Simulated unreachable engine".to_string()));
        }

        let id = self.state.opens.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Arc::new(MockConnection {
            id,
            closed: AtomicBool::new(false),
            state: Arc::clone(&self.state),
        }))
    }

    fn target(&self) -> String {
        "mock://engine".to_string()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<Vec<StatementResult>, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        self.state.queries.fetch_add(1, Ordering::SeqCst);
        self.state.recorded.lock().push(RecordedQuery {
            query: query.to_string(),
            bindings: bindings.clone(),
            connection_id: self.id,
        });

        self.state
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn version(&self) -> Result<String, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        Ok("mock-1.0.0".to_string())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
