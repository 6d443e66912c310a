//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Enumerations
// ============================================================================

/// Error returned when a label does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

/// Ticket category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Technical,
    Billing,
    General,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    Bug,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Technical,
        Category::Billing,
        Category::General,
        Category::FeatureRequest,
        Category::Bug,
    ];

    /// Display label, also used as the wire and storage representation.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Technical => "Technical",
            Category::Billing => "Billing",
            Category::General => "General",
            Category::FeatureRequest => "Feature Request",
            Category::Bug => "Bug",
        }
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    /// Sort rank: Critical=4 > High=3 > Medium=2 > Low=1.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Critical => 4,
        }
    }

    /// High and Critical tickets are counted as high priority in stats.
    pub fn is_high(&self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

/// Ticket workflow status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Open,
        Status::InProgress,
        Status::Resolved,
        Status::Closed,
        Status::OnHold,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Resolved => "Resolved",
            Status::Closed => "Closed",
            Status::OnHold => "On Hold",
        }
    }
}

macro_rules! label_impls {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| ParseLabelError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

label_impls!(Category, "category");
label_impls!(Priority, "priority");
label_impls!(Status, "status");

// ============================================================================
// Records
// ============================================================================

/// A timestamped note attached to exactly one ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub ticket_id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A trackable support item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub assigned_to: String,
    pub reported_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Comments ordered oldest-first.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Validated, client-editable ticket fields.
///
/// Produced by [`TicketPayload::validate`](crate::TicketPayload::validate);
/// everything else on a ticket is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub assigned_to: String,
    pub reported_by: String,
}

/// Validated request to attach a comment to a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub ticket_id: String,
    pub author: String,
    pub text: String,
}

impl Ticket {
    /// Build a fresh ticket from a draft. The comment list starts empty.
    pub fn from_draft(id: String, draft: TicketDraft, now: DateTime<Utc>) -> Self {
        let resolved_at = (draft.status == Status::Resolved).then_some(now);
        Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            status: draft.status,
            assigned_to: draft.assigned_to,
            reported_by: draft.reported_by,
            created_at: now,
            updated_at: now,
            resolved_at,
            comments: Vec::new(),
        }
    }

    /// Replace all mutable fields with the draft's values.
    ///
    /// `resolved_at` is set the first time the status is Resolved and is
    /// never overwritten or cleared afterwards.
    pub fn apply_draft(&mut self, draft: TicketDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.description = draft.description;
        self.category = draft.category;
        self.priority = draft.priority;
        self.status = draft.status;
        self.assigned_to = draft.assigned_to;
        self.reported_by = draft.reported_by;
        self.updated_at = now;

        if self.status == Status::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(now);
        }
    }

    /// The editable fields of this ticket as a draft.
    pub fn to_draft(&self) -> TicketDraft {
        TicketDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to.clone(),
            reported_by: self.reported_by.clone(),
        }
    }
}

/// Aggregate ticket counts.
///
/// Only four statuses have a bucket; "On Hold" tickets contribute to `total`
/// alone, so the buckets need not sum to `total`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
    pub high_priority: u64,
}
