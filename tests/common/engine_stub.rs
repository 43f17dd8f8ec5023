/*!
 * In-process HTTP engine for transport tests.
 *
 * Built on a wiremock `MockServer`: `GET /version` answers with a fixed version
 * string and `POST /rpc` serves queued replies in order, falling back to an
 * empty result list once the queue runs out. RPC calls only match when they
 * carry the namespace and database headers.
 */

use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::Value;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const STUB_VERSION: &str = "surrealdb-2.1.0";

/// Priority of the default responders; queued replies always win over them
const FALLBACK_PRIORITY: u8 = 250;

/// A request as the engine received it
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StubRequest {
    fn from_received(request: &Request) -> Self {
        Self {
            method: request.method.to_string(),
            path: request.url.path().to_string(),
            headers: request
                .headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_ascii_lowercase(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect(),
            body: request.body.clone(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

pub struct EngineStub {
    server: MockServer,
    /// Priority handed to the next queued reply; lower wins in wiremock
    next_priority: AtomicU8,
}

impl EngineStub {
    /// Start a mock engine on an ephemeral local port
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STUB_VERSION))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(header_exists("surreal-ns"))
            .and(header_exists("surreal-db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1,
                "result": []
            })))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Self {
            server,
            next_priority: AtomicU8::new(1),
        }
    }

    pub fn endpoint(&self) -> String {
        self.server.uri()
    }

    /// Queue a 200 reply for the next RPC call
    pub async fn reply(&self, body: Value) {
        self.queue(ResponseTemplate::new(200).set_body_json(body)).await;
    }

    /// Queue a raw reply for the next RPC call
    pub async fn reply_status(&self, status: u16, body: &str) {
        self.queue(ResponseTemplate::new(status).set_body_string(body))
            .await;
    }

    /// Answer every following version handshake with `status`
    pub async fn set_version_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(ResponseTemplate::new(status).set_body_string("handshake refused"))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Every request received so far, in order
    pub async fn requests(&self) -> Vec<StubRequest> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(StubRequest::from_received)
            .collect()
    }

    pub async fn rpc_requests(&self) -> Vec<StubRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path == "/rpc")
            .collect()
    }

    async fn queue(&self, response: ResponseTemplate) {
        let priority = self.next_priority.fetch_add(1, Ordering::SeqCst);

        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(header_exists("surreal-ns"))
            .and(header_exists("surreal-db"))
            .respond_with(response)
            .up_to_n_times(1)
            .with_priority(priority)
            .mount(&self.server)
            .await;
    }
}
