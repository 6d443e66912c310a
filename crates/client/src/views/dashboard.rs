use helpdesk_core::ticket::sort_newest_first;
use helpdesk_core::{Ticket, TicketStats};

use crate::api::HelpdeskApi;
use crate::store::ClientTicketStore;

/// Number of tickets shown in the "recent" panel.
pub const RECENT_TICKET_COUNT: usize = 5;

/// Summary counts plus the newest tickets.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub stats: TicketStats,
    pub recent: Vec<Ticket>,
}

impl DashboardView {
    pub async fn load<A: HelpdeskApi>(store: &ClientTicketStore<A>) -> Self {
        let stats = store.stats().await;
        let mut recent = store.tickets();
        sort_newest_first(&mut recent);
        recent.truncate(RECENT_TICKET_COUNT);
        Self { stats, recent }
    }
}
