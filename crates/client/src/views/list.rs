use std::cmp::Ordering;

use helpdesk_core::{Category, Priority, Status, Ticket};

use crate::api::HelpdeskApi;
use crate::store::ClientTicketStore;

/// Column the list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    /// Critical > High > Medium > Low.
    Priority,
    /// Lexical order of the status label.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Conjunction of the list filters. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub term: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}

impl ListFilter {
    fn accepts(&self, ticket: &Ticket) -> bool {
        self.status.is_none_or(|s| ticket.status == s)
            && self.priority.is_none_or(|p| ticket.priority == p)
            && self.category.is_none_or(|c| ticket.category == c)
    }
}

/// State of the ticket list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketListView {
    pub filter: ListFilter,
    sort_key: SortKey,
    sort_order: SortOrder,
}

impl Default for TicketListView {
    fn default() -> Self {
        Self {
            filter: ListFilter::default(),
            sort_key: SortKey::CreatedAt,
            sort_order: SortOrder::Descending,
        }
    }
}

impl TicketListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Select a sort column. The current column flips direction; a new
    /// column starts descending.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_key = key;
            self.sort_order = SortOrder::Descending;
        }
    }

    /// Tickets to display: searched, filtered, then sorted.
    pub async fn load<A: HelpdeskApi>(&self, store: &ClientTicketStore<A>) -> Vec<Ticket> {
        let candidates = if self.filter.term.trim().is_empty() {
            store.tickets()
        } else {
            store.search(&self.filter.term).await
        };

        let mut tickets: Vec<Ticket> = candidates
            .into_iter()
            .filter(|t| self.filter.accepts(t))
            .collect();
        sort_tickets(&mut tickets, self.sort_key, self.sort_order);
        tickets
    }
}

/// Stable sort by the given key and direction.
pub fn sort_tickets(tickets: &mut [Ticket], key: SortKey, order: SortOrder) {
    tickets.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

fn compare(a: &Ticket, b: &Ticket, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortKey::Status => a.status.label().cmp(b.status.label()),
    }
}
