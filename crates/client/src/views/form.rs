use helpdesk_core::{Category, Priority, Status, Ticket, TicketDraft, ValidationError};

use super::FormError;
use crate::api::HelpdeskApi;
use crate::store::ClientTicketStore;

const MIN_TITLE_LEN: usize = 5;
const MIN_DESCRIPTION_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Editing the ticket with this id.
    Edit(String),
}

/// Create/edit form for a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketForm {
    pub mode: FormMode,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub assigned_to: String,
    pub reported_by: String,
}

impl TicketForm {
    /// Empty form with the create defaults.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
            category: Category::General,
            priority: Priority::Medium,
            status: Status::Open,
            assigned_to: String::new(),
            reported_by: String::new(),
        }
    }

    /// Form pre-filled from the snapshot. `None` when the id is unknown.
    pub fn edit<A: HelpdeskApi>(store: &ClientTicketStore<A>, id: &str) -> Option<Self> {
        let ticket = store.ticket(id)?;
        let draft = ticket.to_draft();
        Some(Self {
            mode: FormMode::Edit(ticket.id),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            status: draft.status,
            assigned_to: draft.assigned_to,
            reported_by: draft.reported_by,
        })
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    /// Per-field errors keyed by wire field name.
    pub fn validate(&self) -> Result<TicketDraft, ValidationError> {
        let mut errors = ValidationError::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        } else if title.chars().count() < MIN_TITLE_LEN {
            errors.add(
                "title",
                format!("Title must be at least {} characters", MIN_TITLE_LEN),
            );
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", "Description is required");
        } else if description.chars().count() < MIN_DESCRIPTION_LEN {
            errors.add(
                "description",
                format!(
                    "Description must be at least {} characters",
                    MIN_DESCRIPTION_LEN
                ),
            );
        }

        if self.assigned_to.trim().is_empty() {
            errors.add("assignedTo", "Assigned to is required");
        }
        if self.reported_by.trim().is_empty() {
            errors.add("reportedBy", "Reported by is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TicketDraft {
            title: title.to_string(),
            description: description.to_string(),
            category: self.category,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to.trim().to_string(),
            reported_by: self.reported_by.trim().to_string(),
        })
    }

    /// Validate, then create or update through the store.
    ///
    /// Returns the saved ticket as it appears in the refreshed snapshot.
    /// Editing a ticket that has since disappeared yields `Ok(None)`.
    pub async fn submit<A: HelpdeskApi>(
        &self,
        store: &ClientTicketStore<A>,
    ) -> Result<Option<Ticket>, FormError> {
        let draft = self.validate().map_err(FormError::Invalid)?;

        match &self.mode {
            FormMode::Create => Ok(Some(store.create(draft).await?)),
            FormMode::Edit(id) => Ok(store.update(id, draft).await?),
        }
    }
}

impl Default for TicketForm {
    fn default() -> Self {
        Self::create()
    }
}
