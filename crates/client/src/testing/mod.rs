//! Test doubles and fixtures for exercising client code without a server.

mod mock_api;

pub use mock_api::MockHelpdeskApi;

/// Test fixtures.
pub mod fixtures {
    use helpdesk_core::{Category, Priority, Status, TicketDraft};

    /// A valid draft with the given title, status and priority.
    pub fn draft(title: &str, status: Status, priority: Priority) -> TicketDraft {
        TicketDraft {
            title: title.to_string(),
            description: format!("{} needs attention from support", title),
            category: Category::Technical,
            priority,
            status,
            assigned_to: "Support Team".to_string(),
            reported_by: "Jane Smith".to_string(),
        }
    }
}
