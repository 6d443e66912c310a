//! Mock helpdesk API for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use helpdesk_core::{
    Comment, NewComment, SqliteTicketStore, Ticket, TicketDraft, TicketError, TicketPayload,
    TicketStats, TicketStore,
};

use crate::api::{ClientError, HelpdeskApi};

/// In-memory implementation of the HelpdeskApi trait.
///
/// Requests are served by an in-memory [`SqliteTicketStore`], so ordering,
/// the resolved timestamp and comment handling behave like the real server.
/// Provides controllable behavior for testing:
/// - Seed tickets directly, bypassing the call log
/// - Count calls per method for assertions
/// - Simulate an unreachable server
///
/// Clones share state, so a test can keep one handle while a
/// `ClientTicketStore` owns another.
#[derive(Clone)]
pub struct MockHelpdeskApi {
    store: Arc<SqliteTicketStore>,
    /// When set, every call fails as if the connection were refused.
    unavailable: Arc<RwLock<bool>>,
    /// Number of calls per method name.
    calls: Arc<RwLock<HashMap<&'static str, usize>>>,
}

impl std::fmt::Debug for MockHelpdeskApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHelpdeskApi")
            .field("store", &"<store>")
            .field("unavailable", &"<flag>")
            .field("calls", &"<calls>")
            .finish()
    }
}

impl Default for MockHelpdeskApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHelpdeskApi {
    pub fn new() -> Self {
        let store = SqliteTicketStore::in_memory()
            .unwrap_or_else(|e| panic!("in-memory store unavailable: {}", e));
        Self {
            store: Arc::new(store),
            unavailable: Arc::new(RwLock::new(false)),
            calls: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a ticket directly. Not recorded as a call.
    pub fn seed(&self, draft: TicketDraft) -> Ticket {
        self.store
            .create(draft)
            .unwrap_or_else(|e| panic!("seeding mock store failed: {}", e))
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// How many times a method has been called.
    pub async fn call_count(&self, method: &str) -> usize {
        self.calls.read().await.get(method).copied().unwrap_or(0)
    }

    async fn record(&self, method: &'static str) -> Result<(), ClientError> {
        *self.calls.write().await.entry(method).or_insert(0) += 1;
        if *self.unavailable.read().await {
            return Err(ClientError::Http("connection refused".to_string()));
        }
        Ok(())
    }
}

fn map_store_error(e: TicketError) -> ClientError {
    match e {
        TicketError::NotFound(_) | TicketError::CommentNotFound(_) => {
            ClientError::NotFound(e.to_string())
        }
        TicketError::Database(_) | TicketError::Serialization(_) => ClientError::Status {
            status: 500,
            message: "Internal server error".to_string(),
        },
    }
}

/// Run a draft through the same checks the server applies.
fn check_draft(draft: &TicketDraft) -> Result<(), ClientError> {
    TicketPayload::from_draft(None, draft)
        .validate()
        .map(|_| ())
        .map_err(|e| ClientError::BadRequest {
            message: e.to_string(),
            fields: e.fields,
        })
}

#[async_trait]
impl HelpdeskApi for MockHelpdeskApi {
    async fn list_tickets(&self) -> Result<Vec<Ticket>, ClientError> {
        self.record("list_tickets").await?;
        self.store.list().map_err(map_store_error)
    }

    async fn get_ticket(&self, id: &str) -> Result<Ticket, ClientError> {
        self.record("get_ticket").await?;
        self.store
            .get(id)
            .map_err(map_store_error)?
            .ok_or_else(|| ClientError::NotFound(format!("Ticket not found: {}", id)))
    }

    async fn stats(&self) -> Result<TicketStats, ClientError> {
        self.record("stats").await?;
        self.store.stats().map_err(map_store_error)
    }

    async fn search(&self, term: &str) -> Result<Vec<Ticket>, ClientError> {
        self.record("search").await?;
        self.store.search(term).map_err(map_store_error)
    }

    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket, ClientError> {
        self.record("create_ticket").await?;
        check_draft(draft)?;
        self.store.create(draft.clone()).map_err(map_store_error)
    }

    async fn update_ticket(&self, id: &str, draft: &TicketDraft) -> Result<(), ClientError> {
        self.record("update_ticket").await?;
        check_draft(draft)?;
        self.store
            .update(id, draft.clone())
            .map(|_| ())
            .map_err(map_store_error)
    }

    async fn delete_ticket(&self, id: &str) -> Result<(), ClientError> {
        self.record("delete_ticket").await?;
        self.store.delete(id).map(|_| ()).map_err(map_store_error)
    }

    async fn comments(&self, ticket_id: &str) -> Result<Vec<Comment>, ClientError> {
        self.record("comments").await?;
        self.store.comments_for(ticket_id).map_err(map_store_error)
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ClientError> {
        self.record("add_comment").await?;
        self.store
            .add_comment(comment.clone())
            .map_err(map_store_error)
    }

    async fn delete_comment(&self, id: &str) -> Result<(), ClientError> {
        self.record("delete_comment").await?;
        self.store
            .delete_comment(id)
            .map(|_| ())
            .map_err(map_store_error)
    }
}
