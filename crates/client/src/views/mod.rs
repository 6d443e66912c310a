//! View models for the dashboard, ticket list, ticket detail and ticket form.
//!
//! Each view reads through a [`ClientTicketStore`](crate::ClientTicketStore)
//! passed in by the caller; none of them keep a store of their own.

mod dashboard;
mod detail;
mod form;
mod list;

pub use dashboard::{DashboardView, RECENT_TICKET_COUNT};
pub use detail::{CommentForm, TicketDetailView};
pub use form::{FormMode, TicketForm};
pub use list::{sort_tickets, ListFilter, SortKey, SortOrder, TicketListView};

use thiserror::Error;

use helpdesk_core::ValidationError;

use crate::api::ClientError;

/// Failure submitting a form.
#[derive(Debug, Error)]
pub enum FormError {
    /// Rejected locally; the API was not called.
    #[error("{0}")]
    Invalid(ValidationError),

    #[error(transparent)]
    Api(#[from] ClientError),
}
