//! Ticket API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use helpdesk_core::{Ticket, TicketPayload, TicketStats};

use super::ApiError;
use crate::metrics::{TICKETS_CREATED_TOTAL, TICKETS_DELETED_TOTAL};
use crate::state::AppState;

/// Query parameters for ticket search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text term; absent or blank returns every ticket.
    pub term: Option<String>,
}

/// List all tickets, newest first
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    Ok(Json(state.ticket_store().list()?))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    state
        .ticket_store()
        .get(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ticket not found: {}", id)))
}

/// Aggregate counts over all tickets
pub async fn ticket_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TicketStats>, ApiError> {
    Ok(Json(state.ticket_store().stats()?))
}

/// Case-insensitive search over the text fields
pub async fn search_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Query(params) = params?;
    let term = params.term.unwrap_or_default();
    Ok(Json(state.ticket_store().search(&term)?))
}

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TicketPayload>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Ticket>), ApiError> {
    let Json(payload) = payload?;
    let draft = payload.validate()?;

    let ticket = state.ticket_store().create(draft)?;
    TICKETS_CREATED_TOTAL.inc();
    info!(ticket_id = %ticket.id, title = %ticket.title, "Ticket created");

    let location = format!("/api/tickets/{}", ticket.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(ticket)))
}

/// Replace a ticket's editable fields
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<TicketPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    if payload.id.as_deref() != Some(id.as_str()) {
        return Err(ApiError::IdMismatch);
    }
    let draft = payload.validate()?;

    let ticket = state.ticket_store().update(&id, draft)?;
    info!(ticket_id = %ticket.id, status = %ticket.status, "Ticket updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a ticket and its comments
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ticket = state.ticket_store().delete(&id)?;
    TICKETS_DELETED_TOTAL.inc();
    info!(
        ticket_id = %ticket.id,
        comments = ticket.comments.len(),
        "Ticket deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
