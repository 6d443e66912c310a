//! API error type and its HTTP mapping.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use helpdesk_core::{TicketError, ValidationError};

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Path and body disagree on the ticket id.
    #[error("Ticket id in path does not match id in body")]
    IdMismatch,

    /// The ticket or comment does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Anything else. The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl From<TicketError> for ApiError {
    fn from(e: TicketError) -> Self {
        match e {
            TicketError::NotFound(_) | TicketError::CommentNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            TicketError::Database(_) | TicketError::Serialization(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::field("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationError::field("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, fields) = match self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.fields),
            ApiError::IdMismatch => (StatusCode::BAD_REQUEST, BTreeMap::new()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, BTreeMap::new()),
            ApiError::Internal(_) => {
                error!(error = %message, "Request failed");
                let body = ErrorResponse {
                    error: "Internal server error".to_string(),
                    fields: BTreeMap::new(),
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn into_parts(error: ApiError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let mut errors = ValidationError::field("title", "title is required");
        errors.add("priority", "unknown priority 'Urgent'");

        let (status, body) = into_parts(ApiError::from(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.fields.len(), 2);
        assert_eq!(body.fields["priority"], "unknown priority 'Urgent'");
    }

    #[tokio::test]
    async fn test_store_errors_map_by_kind() {
        let (status, _) = into_parts(TicketError::NotFound("abc".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = into_parts(TicketError::CommentNotFound("abc".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            into_parts(TicketError::Database("disk I/O error".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        assert!(body.fields.is_empty());
    }

    #[tokio::test]
    async fn test_id_mismatch_is_bad_request() {
        let (status, body) = into_parts(ApiError::IdMismatch).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("does not match"));
    }
}
