//! Ticket storage trait and error type.

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

use super::query::{compute_stats, search_tickets};
use super::{Comment, NewComment, Ticket, TicketDraft, TicketStats};

/// Current time at the microsecond precision every store persists.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket not found.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// Comment not found.
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for TicketError {
    fn from(e: rusqlite::Error) -> Self {
        TicketError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for TicketError {
    fn from(e: serde_json::Error) -> Self {
        TicketError::Serialization(e.to_string())
    }
}

/// Trait for ticket storage backends.
///
/// Every ticket returned carries its comments ordered oldest-first, and every
/// list is ordered newest-created first.
pub trait TicketStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// All tickets, newest first.
    fn list(&self) -> Result<Vec<Ticket>, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// Number of stored tickets.
    fn count(&self) -> Result<u64, TicketError>;

    /// Create a ticket with a fresh ID and timestamps.
    fn create(&self, draft: TicketDraft) -> Result<Ticket, TicketError>;

    /// Replace a ticket's mutable fields.
    fn update(&self, id: &str, draft: TicketDraft) -> Result<Ticket, TicketError>;

    /// Permanently delete a ticket and all of its comments.
    /// Returns the deleted ticket.
    fn delete(&self, id: &str) -> Result<Ticket, TicketError>;

    /// Store a fully formed ticket, including its comments, as-is.
    fn import(&self, ticket: &Ticket) -> Result<(), TicketError>;

    /// Comments for a ticket, oldest first. Unknown tickets have none.
    fn comments_for(&self, ticket_id: &str) -> Result<Vec<Comment>, TicketError>;

    /// Attach a comment and touch the ticket's `updated_at`.
    fn add_comment(&self, comment: NewComment) -> Result<Comment, TicketError>;

    /// Remove a comment and touch its ticket's `updated_at`.
    /// Returns the deleted comment.
    fn delete_comment(&self, id: &str) -> Result<Comment, TicketError>;

    /// Tickets matching a free-text term, newest first.
    fn search(&self, term: &str) -> Result<Vec<Ticket>, TicketError> {
        Ok(search_tickets(self.list()?, term))
    }

    /// Aggregate counts over all tickets.
    fn stats(&self) -> Result<TicketStats, TicketError> {
        Ok(compute_stats(&self.list()?))
    }
}
