//! Support tickets, their comments, and the stores that persist them.

mod document_store;
mod query;
mod seed;
mod sqlite_store;
mod store;
mod types;
mod validate;

pub use document_store::DocumentTicketStore;
pub use query::{compute_stats, matches_term, search_tickets, sort_newest_first};
pub use seed::{sample_tickets, seed_if_empty};
pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketStore};
pub use types::{
    Category, Comment, NewComment, ParseLabelError, Priority, Status, Ticket, TicketDraft,
    TicketStats,
};
pub use validate::{CommentPayload, TicketPayload, ValidationError};
