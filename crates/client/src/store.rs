//! Client-side ticket cache.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use tracing::{error, warn};

use helpdesk_core::ticket::{compute_stats, search_tickets};
use helpdesk_core::{Comment, NewComment, Priority, Status, Ticket, TicketDraft, TicketStats};

use crate::api::{ClientError, HelpdeskApi};

/// The last-fetched ticket list, refreshed after every mutation.
///
/// Reads are served from the snapshot. Writes go to the API and are followed
/// by a full re-fetch; the snapshot is never patched locally.
pub struct ClientTicketStore<A: HelpdeskApi> {
    api: A,
    tickets: RwLock<Vec<Ticket>>,
}

impl<A: HelpdeskApi> ClientTicketStore<A> {
    /// Create the store and fetch the ticket list once.
    ///
    /// A failed fetch is logged and leaves the snapshot empty.
    pub async fn new(api: A) -> Self {
        let store = Self {
            api,
            tickets: RwLock::new(Vec::new()),
        };
        if let Err(e) = store.refresh().await {
            error!(error = %e, "Initial ticket fetch failed");
        }
        store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Replace the snapshot with the server's current list.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let tickets = self.api.list_tickets().await?;
        *self.tickets.write().unwrap_or_else(PoisonError::into_inner) = tickets;
        Ok(())
    }

    fn snapshot(&self) -> RwLockReadGuard<'_, Vec<Ticket>> {
        self.tickets.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-fetch after a successful mutation. The mutation already happened,
    /// so a failed re-fetch keeps the stale snapshot instead of failing.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Ticket refresh after write failed");
        }
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.snapshot().clone()
    }

    pub fn ticket(&self, id: &str) -> Option<Ticket> {
        self.snapshot().iter().find(|t| t.id == id).cloned()
    }

    pub fn tickets_by_status(&self, status: Status) -> Vec<Ticket> {
        self.snapshot()
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    pub fn tickets_by_priority(&self, priority: Priority) -> Vec<Ticket> {
        self.snapshot()
            .iter()
            .filter(|t| t.priority == priority)
            .cloned()
            .collect()
    }

    /// Server stats, or the same buckets computed from the snapshot.
    pub async fn stats(&self) -> TicketStats {
        match self.api.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "Stats request failed, computing locally");
                compute_stats(self.snapshot().iter())
            }
        }
    }

    /// Server search, or the same match applied to the snapshot.
    pub async fn search(&self, term: &str) -> Vec<Ticket> {
        match self.api.search(term).await {
            Ok(tickets) => tickets,
            Err(e) => {
                warn!(error = %e, "Search request failed, filtering locally");
                search_tickets(self.tickets(), term)
            }
        }
    }

    pub async fn create(&self, draft: TicketDraft) -> Result<Ticket, ClientError> {
        let ticket = self.api.create_ticket(&draft).await?;
        self.refresh_after_write().await;
        Ok(ticket)
    }

    /// Replace a ticket's editable fields.
    ///
    /// Returns `Ok(None)` without calling the API when the ticket is not in
    /// the snapshot.
    pub async fn update(&self, id: &str, draft: TicketDraft) -> Result<Option<Ticket>, ClientError> {
        if self.ticket(id).is_none() {
            return Ok(None);
        }

        self.api.update_ticket(id, &draft).await?;
        self.refresh_after_write().await;
        Ok(self.ticket(id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_ticket(id).await?;
        self.refresh_after_write().await;
        Ok(())
    }

    pub async fn add_comment(&self, comment: NewComment) -> Result<Comment, ClientError> {
        let comment = self.api.add_comment(&comment).await?;
        self.refresh_after_write().await;
        Ok(comment)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_comment(id).await?;
        self.refresh_after_write().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockHelpdeskApi};

    #[tokio::test]
    async fn test_initial_fetch() {
        let api = MockHelpdeskApi::new();
        api.seed(fixtures::draft("Seeded ticket", Status::Open, Priority::High));

        let store = ClientTicketStore::new(api.clone()).await;
        assert_eq!(store.tickets().len(), 1);
        assert_eq!(api.call_count("list_tickets").await, 1);
    }

    #[tokio::test]
    async fn test_failed_initial_fetch_leaves_empty_snapshot() {
        let api = MockHelpdeskApi::new();
        api.seed(fixtures::draft("Hidden ticket", Status::Open, Priority::Low));
        api.set_unavailable(true).await;

        let store = ClientTicketStore::new(api.clone()).await;
        assert!(store.tickets().is_empty());

        api.set_unavailable(false).await;
        store.refresh().await.unwrap();
        assert_eq!(store.tickets().len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_refresh_snapshot() {
        let api = MockHelpdeskApi::new();
        let store = ClientTicketStore::new(api.clone()).await;

        let created = store
            .create(fixtures::draft("Created ticket", Status::Open, Priority::Low))
            .await
            .unwrap();
        assert_eq!(store.ticket(&created.id), Some(created.clone()));

        let comment = store
            .add_comment(NewComment {
                ticket_id: created.id.clone(),
                author: "Emily Davis".to_string(),
                text: "On it".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(store.ticket(&created.id).unwrap().comments, vec![comment.clone()]);

        store.delete_comment(&comment.id).await.unwrap();
        assert!(store.ticket(&created.id).unwrap().comments.is_empty());

        store.delete(&created.id).await.unwrap();
        assert!(store.ticket(&created.id).is_none());

        // initial fetch plus one per mutation
        assert_eq!(api.call_count("list_tickets").await, 5);
    }

    #[tokio::test]
    async fn test_update_unknown_id_skips_api() {
        let api = MockHelpdeskApi::new();
        let store = ClientTicketStore::new(api.clone()).await;

        let result = store
            .update("missing", fixtures::draft("Nope", Status::Open, Priority::Low))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(api.call_count("update_ticket").await, 0);
    }

    #[tokio::test]
    async fn test_update_returns_refreshed_ticket() {
        let api = MockHelpdeskApi::new();
        let store = ClientTicketStore::new(api.clone()).await;
        let created = store
            .create(fixtures::draft("Before edit", Status::Open, Priority::Low))
            .await
            .unwrap();

        let updated = store
            .update(
                &created.id,
                fixtures::draft("After edit", Status::Resolved, Priority::High),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "After edit");
        assert!(updated.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_mutation_errors_surface() {
        let api = MockHelpdeskApi::new();
        let store = ClientTicketStore::new(api.clone()).await;
        api.set_unavailable(true).await;

        let result = store
            .create(fixtures::draft("Lost ticket", Status::Open, Priority::Low))
            .await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }

    #[tokio::test]
    async fn test_stats_and_search_fall_back_to_snapshot() {
        let api = MockHelpdeskApi::new();
        api.seed(fixtures::draft("Router reboot", Status::Open, Priority::Critical));
        api.seed(fixtures::draft("Billing question", Status::OnHold, Priority::Low));
        let store = ClientTicketStore::new(api.clone()).await;

        let online_stats = store.stats().await;
        let online_search = store.search("router").await;

        api.set_unavailable(true).await;
        assert_eq!(store.stats().await, online_stats);
        assert_eq!(store.search("router").await, online_search);
        assert_eq!(online_stats.total, 2);
        assert_eq!(online_stats.open, 1);
        assert_eq!(online_search.len(), 1);
    }

    #[tokio::test]
    async fn test_status_and_priority_accessors() {
        let api = MockHelpdeskApi::new();
        api.seed(fixtures::draft("First", Status::Open, Priority::High));
        api.seed(fixtures::draft("Second", Status::Closed, Priority::High));
        api.seed(fixtures::draft("Third", Status::Open, Priority::Low));
        let store = ClientTicketStore::new(api).await;

        assert_eq!(store.tickets_by_status(Status::Open).len(), 2);
        assert_eq!(store.tickets_by_priority(Priority::High).len(), 2);
        assert!(store.tickets_by_status(Status::InProgress).is_empty());
    }
}
