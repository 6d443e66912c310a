//! Sample data for a fresh installation.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::{Category, Comment, Priority, Status, Ticket, TicketError, TicketStore};

struct Sample {
    title: &'static str,
    description: &'static str,
    category: Category,
    priority: Priority,
    status: Status,
    assigned_to: &'static str,
    reported_by: &'static str,
    created_days_ago: i64,
    updated_days_ago: i64,
    resolved_days_ago: Option<i64>,
    comments: &'static [(&'static str, &'static str, i64)],
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "Login page not working",
        description: "Users are unable to login to the system. Getting 500 error.",
        category: Category::Bug,
        priority: Priority::Critical,
        status: Status::Open,
        assigned_to: "John Doe",
        reported_by: "Jane Smith",
        created_days_ago: 3,
        updated_days_ago: 3,
        resolved_days_ago: None,
        comments: &[],
    },
    Sample {
        title: "Add export functionality",
        description: "Need ability to export tickets to CSV format.",
        category: Category::FeatureRequest,
        priority: Priority::Medium,
        status: Status::InProgress,
        assigned_to: "Mike Johnson",
        reported_by: "Sarah Williams",
        created_days_ago: 2,
        updated_days_ago: 1,
        resolved_days_ago: None,
        comments: &[("Mike Johnson", "Working on implementation", 1)],
    },
    Sample {
        title: "Billing discrepancy",
        description: "Customer charged twice for the same service.",
        category: Category::Billing,
        priority: Priority::High,
        status: Status::Resolved,
        assigned_to: "Emily Davis",
        reported_by: "Robert Brown",
        created_days_ago: 4,
        updated_days_ago: 1,
        resolved_days_ago: Some(1),
        comments: &[("Emily Davis", "Refund processed", 1)],
    },
    Sample {
        title: "How to reset password?",
        description: "User needs help resetting their password.",
        category: Category::General,
        priority: Priority::Low,
        status: Status::Closed,
        assigned_to: "Support Team",
        reported_by: "Alice Cooper",
        created_days_ago: 5,
        updated_days_ago: 4,
        resolved_days_ago: Some(4),
        comments: &[],
    },
    Sample {
        title: "Server performance issues",
        description: "API response time is very slow during peak hours.",
        category: Category::Technical,
        priority: Priority::High,
        status: Status::OnHold,
        assigned_to: "DevOps Team",
        reported_by: "System Monitor",
        created_days_ago: 2,
        updated_days_ago: 0,
        resolved_days_ago: None,
        comments: &[],
    },
    Sample {
        title: "Improve dashboard UI",
        description: "Dashboard layout needs to be more intuitive and user-friendly.",
        category: Category::General,
        priority: Priority::Medium,
        status: Status::Open,
        assigned_to: "UI Team",
        reported_by: "Product Manager",
        created_days_ago: 1,
        updated_days_ago: 1,
        resolved_days_ago: None,
        comments: &[],
    },
];

/// Sample tickets with timestamps relative to `now`, newest first.
pub fn sample_tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    let days_ago = |days: i64| now - Duration::days(days);

    let mut tickets: Vec<Ticket> = SAMPLES
        .iter()
        .map(|sample| {
            let id = uuid::Uuid::new_v4().to_string();
            let comments = sample
                .comments
                .iter()
                .map(|(author, text, age)| Comment {
                    id: uuid::Uuid::new_v4().to_string(),
                    ticket_id: id.clone(),
                    author: author.to_string(),
                    text: text.to_string(),
                    created_at: days_ago(*age),
                })
                .collect();

            Ticket {
                id,
                title: sample.title.to_string(),
                description: sample.description.to_string(),
                category: sample.category,
                priority: sample.priority,
                status: sample.status,
                assigned_to: sample.assigned_to.to_string(),
                reported_by: sample.reported_by.to_string(),
                created_at: days_ago(sample.created_days_ago),
                updated_at: days_ago(sample.updated_days_ago),
                resolved_at: sample.resolved_days_ago.map(days_ago),
                comments,
            }
        })
        .collect();

    super::sort_newest_first(&mut tickets);
    tickets
}

/// Import the sample tickets when the store holds none.
///
/// Returns the number of tickets imported.
pub fn seed_if_empty(store: &dyn TicketStore) -> Result<usize, TicketError> {
    if store.count()? > 0 {
        return Ok(0);
    }

    let tickets = sample_tickets(super::store::now());
    for ticket in &tickets {
        store.import(ticket)?;
    }

    info!(count = tickets.len(), backend = store.backend_name(), "Seeded sample tickets");
    Ok(tickets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{compute_stats, DocumentTicketStore, SqliteTicketStore};

    #[test]
    fn test_samples_cover_every_status() {
        let tickets = sample_tickets(Utc::now());
        for status in Status::ALL {
            assert!(tickets.iter().any(|t| t.status == status), "missing {}", status);
        }
    }

    #[test]
    fn test_sample_stats() {
        let stats = compute_stats(&sample_tickets(Utc::now()));
        assert_eq!(stats.total, 6);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.high_priority, 3);
    }

    #[test]
    fn test_comments_reference_their_ticket() {
        for ticket in sample_tickets(Utc::now()) {
            assert!(ticket.comments.iter().all(|c| c.ticket_id == ticket.id));
        }
    }

    #[test]
    fn test_seed_only_runs_on_empty_store() {
        let stores: Vec<Box<dyn TicketStore>> = vec![
            Box::new(SqliteTicketStore::in_memory().unwrap()),
            Box::new(DocumentTicketStore::in_memory().unwrap()),
        ];

        for store in stores {
            assert_eq!(seed_if_empty(store.as_ref()).unwrap(), 6);
            assert_eq!(seed_if_empty(store.as_ref()).unwrap(), 0);

            let listed = store.list().unwrap();
            assert_eq!(listed.len(), 6);
            assert_eq!(listed[0].title, "Improve dashboard UI");
            let commented: usize = listed.iter().map(|t| t.comments.len()).sum();
            assert_eq!(commented, 2);
        }
    }
}
