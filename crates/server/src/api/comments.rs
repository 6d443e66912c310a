//! Comment API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::info;

use helpdesk_core::{Comment, CommentPayload};

use super::ApiError;
use crate::metrics::{COMMENTS_ADDED_TOTAL, COMMENTS_DELETED_TOTAL};
use crate::state::AppState;

/// Comments for a ticket, oldest first
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.ticket_store().comments_for(&ticket_id)?))
}

/// Attach a comment to an existing ticket
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CommentPayload>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Comment>), ApiError> {
    let Json(payload) = payload?;
    let new_comment = payload.validate()?;

    let comment = state.ticket_store().add_comment(new_comment)?;
    COMMENTS_ADDED_TOTAL.inc();
    info!(
        comment_id = %comment.id,
        ticket_id = %comment.ticket_id,
        author = %comment.author,
        "Comment added"
    );

    let location = format!("/api/comments/ticket/{}", comment.ticket_id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(comment)))
}

/// Remove a comment
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let comment = state.ticket_store().delete_comment(&id)?;
    COMMENTS_DELETED_TOTAL.inc();
    info!(comment_id = %comment.id, ticket_id = %comment.ticket_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
