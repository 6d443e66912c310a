//! Search, ordering and aggregate semantics shared by every store and the client.

use super::{Status, Ticket, TicketStats};

/// Whether a ticket matches a free-text term.
///
/// Case-insensitive substring match against title, description, assignee and
/// reporter, OR-combined. A blank term matches everything.
pub fn matches_term(ticket: &Ticket, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    [
        &ticket.title,
        &ticket.description,
        &ticket.assigned_to,
        &ticket.reported_by,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Filter tickets by a search term, keeping their input order.
pub fn search_tickets(tickets: Vec<Ticket>, term: &str) -> Vec<Ticket> {
    if term.trim().is_empty() {
        return tickets;
    }
    tickets
        .into_iter()
        .filter(|t| matches_term(t, term))
        .collect()
}

/// Count tickets into the fixed stats buckets in a single pass.
pub fn compute_stats<'a, I>(tickets: I) -> TicketStats
where
    I: IntoIterator<Item = &'a Ticket>,
{
    let mut stats = TicketStats::default();
    for ticket in tickets {
        stats.total += 1;
        match ticket.status {
            Status::Open => stats.open += 1,
            Status::InProgress => stats.in_progress += 1,
            Status::Resolved => stats.resolved += 1,
            Status::Closed => stats.closed += 1,
            Status::OnHold => {}
        }
        if ticket.priority.is_high() {
            stats.high_priority += 1;
        }
    }
    stats
}

/// Order tickets by creation time, newest first.
///
/// The sort is stable, so tickets sharing a timestamp keep their relative order.
pub fn sort_newest_first(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
