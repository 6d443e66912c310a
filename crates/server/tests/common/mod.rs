//! Common test utilities for API testing.
//!
//! This module provides a test fixture that drives the router in-process,
//! backed by either ticket store variant in a temporary directory.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use helpdesk_core::{
    Comment, Config, DatabaseConfig, DocumentTicketStore, NewComment, SqliteTicketStore,
    StorageBackend, Ticket, TicketDraft, TicketError, TicketStore,
};
use helpdesk_server::{create_router, AppState};

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ticket_creation() {
///     let fixture = TestFixture::new(StorageBackend::Relational);
///
///     let response = fixture.post("/api/tickets", ticket_body("Printer offline")).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle on the store behind the router
    pub store: Arc<dyn TicketStore>,
    /// Temporary directory for the test database
    pub temp_dir: Option<TempDir>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture backed by a file-based store of the given variant.
    pub fn new(backend: StorageBackend) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let store: Arc<dyn TicketStore> = match backend {
            StorageBackend::Relational => Arc::new(
                SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"),
            ),
            StorageBackend::Document => Arc::new(
                DocumentTicketStore::new(&db_path).expect("Failed to create ticket store"),
            ),
        };

        let config = Config {
            database: DatabaseConfig {
                backend,
                path: db_path,
                seed: false,
            },
            ..Config::default()
        };

        let mut fixture = Self::with_store(config, store);
        fixture.temp_dir = Some(temp_dir);
        fixture
    }

    /// Create a fixture around an arbitrary store.
    pub fn with_store(config: Config, store: Arc<dyn TicketStore>) -> Self {
        let state = Arc::new(AppState::new(config, Arc::clone(&store)));
        let router = create_router(state);

        Self {
            router,
            store,
            temp_dir: None,
        }
    }

    /// Fixtures for every store variant.
    pub fn all() -> Vec<Self> {
        vec![
            Self::new(StorageBackend::Relational),
            Self::new(StorageBackend::Document),
        ]
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Create a ticket through the API and return its JSON.
    pub async fn create_ticket(&self, title: &str) -> Value {
        let response = self.post("/api/tickets", ticket_body(title)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    /// Send a prebuilt request, for tests that need custom headers.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A valid create payload.
pub fn ticket_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "The device stopped responding this morning",
        "category": "Technical",
        "priority": "Medium",
        "status": "Open",
        "assignedTo": "Support Team",
        "reportedBy": "Jane Smith"
    })
}

/// A store whose backing database is gone. Every call fails.
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail<T>() -> Result<T, TicketError> {
        Err(TicketError::Database("database is locked".to_string()))
    }
}

impl TicketStore for UnavailableStore {
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }

    fn list(&self) -> Result<Vec<Ticket>, TicketError> {
        Self::fail()
    }

    fn get(&self, _id: &str) -> Result<Option<Ticket>, TicketError> {
        Self::fail()
    }

    fn count(&self) -> Result<u64, TicketError> {
        Self::fail()
    }

    fn create(&self, _draft: TicketDraft) -> Result<Ticket, TicketError> {
        Self::fail()
    }

    fn update(&self, _id: &str, _draft: TicketDraft) -> Result<Ticket, TicketError> {
        Self::fail()
    }

    fn delete(&self, _id: &str) -> Result<Ticket, TicketError> {
        Self::fail()
    }

    fn import(&self, _ticket: &Ticket) -> Result<(), TicketError> {
        Self::fail()
    }

    fn comments_for(&self, _ticket_id: &str) -> Result<Vec<Comment>, TicketError> {
        Self::fail()
    }

    fn add_comment(&self, _comment: NewComment) -> Result<Comment, TicketError> {
        Self::fail()
    }

    fn delete_comment(&self, _id: &str) -> Result<Comment, TicketError> {
        Self::fail()
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {{
        let response = &$response;
        assert_eq!(
            response.status,
            $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            response.status,
            serde_json::to_string_pretty(&response.body).unwrap_or_default()
        );
    }};
}
