//! Store conformance tests.
//!
//! Both persistence variants must be observably identical. Every scenario
//! here runs once against the relational store and once against the
//! document store, each backed by a file in a temporary directory.

use chrono::Utc;
use tempfile::TempDir;

use helpdesk_core::ticket::{compute_stats, sample_tickets};
use helpdesk_core::{
    Category, DocumentTicketStore, NewComment, Priority, SqliteTicketStore, Status, TicketDraft,
    TicketError, TicketStore,
};

/// Run a scenario against every store implementation.
fn for_each_store(scenario: impl Fn(&dyn TicketStore)) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let relational = SqliteTicketStore::new(&dir.path().join("relational.db"))
        .expect("Failed to create relational store");
    scenario(&relational);

    let document = DocumentTicketStore::new(&dir.path().join("document.db"))
        .expect("Failed to create document store");
    scenario(&document);
}

fn draft(title: &str) -> TicketDraft {
    TicketDraft {
        title: title.to_string(),
        description: "Something is not working as expected".to_string(),
        category: Category::Technical,
        priority: Priority::Medium,
        status: Status::Open,
        assigned_to: "Support Team".to_string(),
        reported_by: "Jane Smith".to_string(),
    }
}

fn comment(ticket_id: &str, text: &str) -> NewComment {
    NewComment {
        ticket_id: ticket_id.to_string(),
        author: "Mike Johnson".to_string(),
        text: text.to_string(),
    }
}

#[test]
fn create_assigns_server_fields() {
    for_each_store(|store| {
        let created = store.create(draft("VPN drops hourly")).unwrap();

        assert!(uuid::Uuid::parse_str(&created.id).is_ok(), "{}", store.backend_name());
        assert_eq!(created.created_at, created.updated_at);
        assert!(created.resolved_at.is_none());
        assert!(created.comments.is_empty());

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    });
}

#[test]
fn create_resolved_sets_resolved_at() {
    for_each_store(|store| {
        let mut resolved = draft("Already fixed");
        resolved.status = Status::Resolved;

        let created = store.create(resolved).unwrap();
        assert_eq!(created.resolved_at, Some(created.created_at));
    });
}

#[test]
fn list_is_newest_first() {
    for_each_store(|store| {
        let first = store.create(draft("First ticket")).unwrap();
        let second = store.create(draft("Second ticket")).unwrap();
        let third = store.create(draft("Third ticket")).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id], "{}", store.backend_name());
        assert_eq!(store.count().unwrap(), 3);
    });
}

#[test]
fn update_replaces_fields_and_keeps_created_at() {
    for_each_store(|store| {
        let created = store.create(draft("Old title")).unwrap();

        let mut changes = draft("New title");
        changes.priority = Priority::Critical;
        changes.category = Category::FeatureRequest;
        let updated = store.update(&created.id, changes).unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.priority, Priority::Critical);
        assert_eq!(updated.category, Category::FeatureRequest);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(store.get(&created.id).unwrap().unwrap(), updated);
    });
}

#[test]
fn resolved_at_is_set_once() {
    for_each_store(|store| {
        let created = store.create(draft("Intermittent outage")).unwrap();

        let mut to_resolved = draft("Intermittent outage");
        to_resolved.status = Status::Resolved;
        let resolved = store.update(&created.id, to_resolved.clone()).unwrap();
        let first_resolution = resolved.resolved_at.expect("resolved_at set");

        let mut to_closed = draft("Intermittent outage");
        to_closed.status = Status::Closed;
        let closed = store.update(&created.id, to_closed).unwrap();
        assert_eq!(closed.resolved_at, Some(first_resolution));

        let reopened = store.update(&created.id, to_resolved).unwrap();
        assert_eq!(reopened.resolved_at, Some(first_resolution));
    });
}

#[test]
fn missing_ticket_operations() {
    for_each_store(|store| {
        assert!(store.get("missing").unwrap().is_none());
        assert!(matches!(
            store.update("missing", draft("Nope")),
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(store.delete("missing"), Err(TicketError::NotFound(_))));
        assert!(matches!(
            store.delete_comment("missing"),
            Err(TicketError::CommentNotFound(_))
        ));
        assert!(store.comments_for("missing").unwrap().is_empty());
    });
}

#[test]
fn comment_on_missing_ticket_is_rejected() {
    for_each_store(|store| {
        let result = store.add_comment(comment("missing", "Hello?"));
        assert!(matches!(result, Err(TicketError::NotFound(_))));
        assert!(store.comments_for("missing").unwrap().is_empty());
    });
}

#[test]
fn comments_are_oldest_first_and_embedded() {
    for_each_store(|store| {
        let ticket = store.create(draft("Printer jam")).unwrap();
        let first = store.add_comment(comment(&ticket.id, "Looking into it")).unwrap();
        let second = store.add_comment(comment(&ticket.id, "Replaced the roller")).unwrap();

        assert_eq!(first.ticket_id, ticket.id);
        assert!(uuid::Uuid::parse_str(&first.id).is_ok());

        let listed = store.comments_for(&ticket.id).unwrap();
        assert_eq!(listed, vec![first.clone(), second.clone()]);

        let fetched = store.get(&ticket.id).unwrap().unwrap();
        assert_eq!(fetched.comments, vec![first, second]);
        assert!(fetched.updated_at >= ticket.updated_at);
    });
}

#[test]
fn delete_comment_touches_ticket() {
    for_each_store(|store| {
        let ticket = store.create(draft("Slow laptop")).unwrap();
        let added = store.add_comment(comment(&ticket.id, "Rebooted")).unwrap();
        let before = store.get(&ticket.id).unwrap().unwrap().updated_at;

        let deleted = store.delete_comment(&added.id).unwrap();
        assert_eq!(deleted, added);

        let after = store.get(&ticket.id).unwrap().unwrap();
        assert!(after.comments.is_empty());
        assert!(after.updated_at >= before);
    });
}

#[test]
fn delete_cascades_to_comments() {
    for_each_store(|store| {
        let ticket = store.create(draft("Disk full")).unwrap();
        let kept = store.create(draft("Unrelated")).unwrap();
        let a = store.add_comment(comment(&ticket.id, "Cleared logs")).unwrap();
        store.add_comment(comment(&ticket.id, "Added volume")).unwrap();
        store.add_comment(comment(&kept.id, "Still open")).unwrap();

        let deleted = store.delete(&ticket.id).unwrap();
        assert_eq!(deleted.id, ticket.id);
        assert_eq!(deleted.comments.len(), 2);

        assert!(store.get(&ticket.id).unwrap().is_none());
        assert!(store.comments_for(&ticket.id).unwrap().is_empty());
        assert!(matches!(
            store.delete_comment(&a.id),
            Err(TicketError::CommentNotFound(_))
        ));
        assert_eq!(store.comments_for(&kept.id).unwrap().len(), 1);
    });
}

#[test]
fn search_matches_text_fields() {
    for_each_store(|store| {
        let mut hidden = draft("Monitor flicker");
        hidden.description = "Happens after the Docking station update".to_string();
        let by_description = store.create(hidden).unwrap();

        let mut assigned = draft("Keyboard sticky");
        assigned.assigned_to = "Hardware Desk".to_string();
        store.create(assigned).unwrap();

        let hits = store.search("docking").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, by_description.id);

        assert_eq!(store.search("HARDWARE").unwrap().len(), 1);
        assert_eq!(store.search("   ").unwrap().len(), 2);
        assert!(store.search("nothing like this").unwrap().is_empty());
    });
}

#[test]
fn stats_count_buckets() {
    for_each_store(|store| {
        assert_eq!(store.stats().unwrap(), Default::default());

        let statuses = [
            (Status::Open, Priority::Critical),
            (Status::Open, Priority::Low),
            (Status::InProgress, Priority::High),
            (Status::Resolved, Priority::Medium),
            (Status::Closed, Priority::Low),
            (Status::OnHold, Priority::High),
        ];
        for (i, (status, priority)) in statuses.into_iter().enumerate() {
            let mut d = draft(&format!("Ticket number {}", i));
            d.status = status;
            d.priority = priority;
            store.create(d).unwrap();
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 6);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.high_priority, 3);
        assert_eq!(stats, compute_stats(&store.list().unwrap()));
    });
}

#[test]
fn import_preserves_tickets_verbatim() {
    for_each_store(|store| {
        let samples = sample_tickets(Utc::now());
        for ticket in &samples {
            store.import(ticket).unwrap();
        }

        for sample in &samples {
            let stored = store.get(&sample.id).unwrap().unwrap();
            assert_eq!(stored.title, sample.title);
            assert_eq!(stored.status, sample.status);
            assert_eq!(stored.resolved_at.is_some(), sample.resolved_at.is_some());
            assert_eq!(stored.comments.len(), sample.comments.len());
        }
    });
}
