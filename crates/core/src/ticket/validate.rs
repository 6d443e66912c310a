//! Request payloads and the validation boundary.
//!
//! Payloads are deliberately loose (every field optional, enumerations as
//! plain strings) so that a bad request produces per-field messages instead
//! of a single deserialization failure. Fields the server assigns, such as
//! `createdAt`, are not part of the payload and are ignored if sent.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Category, NewComment, Priority, Status, TicketDraft};

/// Field-level validation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Message per offending field, keyed by wire field name.
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    /// A failure for a single field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut error = Self::default();
        error.add(name, message);
        error
    }

    pub fn add(&mut self, name: &str, message: impl Into<String>) {
        self.fields.insert(name.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, (field, message)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, field, message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Ticket body for create and update requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketPayload {
    /// Required on update (must match the path id), ignored on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub reported_by: Option<String>,
}

impl TicketPayload {
    /// Build a payload carrying a draft's values.
    pub fn from_draft(id: Option<String>, draft: &TicketDraft) -> Self {
        Self {
            id,
            title: Some(draft.title.clone()),
            description: Some(draft.description.clone()),
            category: Some(draft.category.label().to_string()),
            priority: Some(draft.priority.label().to_string()),
            status: Some(draft.status.label().to_string()),
            assigned_to: Some(draft.assigned_to.clone()),
            reported_by: Some(draft.reported_by.clone()),
        }
    }

    /// Check every field, collecting all failures before returning.
    pub fn validate(&self) -> Result<TicketDraft, ValidationError> {
        let mut errors = ValidationError::default();

        let title = required(&mut errors, "title", &self.title);
        let description = required(&mut errors, "description", &self.description);
        let assigned_to = required(&mut errors, "assignedTo", &self.assigned_to);
        let reported_by = required(&mut errors, "reportedBy", &self.reported_by);
        let category = label::<Category>(&mut errors, "category", &self.category);
        let priority = label::<Priority>(&mut errors, "priority", &self.priority);
        let status = label::<Status>(&mut errors, "status", &self.status);

        match (
            title,
            description,
            category,
            priority,
            status,
            assigned_to,
            reported_by,
        ) {
            (
                Some(title),
                Some(description),
                Some(category),
                Some(priority),
                Some(status),
                Some(assigned_to),
                Some(reported_by),
            ) if errors.is_empty() => Ok(TicketDraft {
                title,
                description,
                category,
                priority,
                status,
                assigned_to,
                reported_by,
            }),
            _ => Err(errors),
        }
    }
}

/// Comment body for create requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentPayload {
    pub ticket_id: Option<String>,
    pub author: Option<String>,
    pub text: Option<String>,
}

impl CommentPayload {
    pub fn validate(&self) -> Result<NewComment, ValidationError> {
        let mut errors = ValidationError::default();

        let ticket_id = required(&mut errors, "ticketId", &self.ticket_id);
        let author = required(&mut errors, "author", &self.author);
        let text = required(&mut errors, "text", &self.text);

        match (ticket_id, author, text) {
            (Some(ticket_id), Some(author), Some(text)) => Ok(NewComment {
                ticket_id,
                author,
                text,
            }),
            _ => Err(errors),
        }
    }
}

fn required(errors: &mut ValidationError, name: &str, value: &Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.clone()),
        _ => {
            errors.add(name, format!("{} is required", name));
            None
        }
    }
}

fn label<T>(errors: &mut ValidationError, name: &str, value: &Option<String>) -> Option<T>
where
    T: std::str::FromStr<Err = super::ParseLabelError>,
{
    let raw = required(errors, name, value)?;
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.add(name, e.to_string());
            None
        }
    }
}
