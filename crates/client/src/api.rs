//! Data access against the helpdesk REST API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use helpdesk_core::{
    Comment, CommentPayload, NewComment, Ticket, TicketDraft, TicketPayload, TicketStats,
};

use crate::config::ClientConfig;

/// Errors returned by API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected the request body.
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Request-scoped access to tickets and comments.
///
/// Every call goes to the server; nothing is cached at this layer.
#[async_trait]
pub trait HelpdeskApi: Send + Sync {
    async fn list_tickets(&self) -> Result<Vec<Ticket>, ClientError>;

    async fn get_ticket(&self, id: &str) -> Result<Ticket, ClientError>;

    async fn stats(&self) -> Result<TicketStats, ClientError>;

    async fn search(&self, term: &str) -> Result<Vec<Ticket>, ClientError>;

    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket, ClientError>;

    /// Full replacement of a ticket's editable fields.
    async fn update_ticket(&self, id: &str, draft: &TicketDraft) -> Result<(), ClientError>;

    async fn delete_ticket(&self, id: &str) -> Result<(), ClientError>;

    async fn comments(&self, ticket_id: &str) -> Result<Vec<Comment>, ClientError>;

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ClientError>;

    async fn delete_comment(&self, id: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

/// [`HelpdeskApi`] over HTTP.
pub struct HttpHelpdeskApi {
    client: Client,
    base_url: String,
}

impl HttpHelpdeskApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Pass successful responses through; turn the rest into errors.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = if body.error.is_empty() {
            status.to_string()
        } else {
            body.error
        };

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::BadRequest {
                message,
                fields: body.fields,
            },
            _ => ClientError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(transport_error)?;
        Self::check(response).await
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path = path, "GET");
        let response = self.send(self.client.get(self.url(path))).await?;
        response.json().await.map_err(transport_error)
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Http("request timed out".to_string())
    } else {
        ClientError::Http(e.to_string())
    }
}

#[async_trait]
impl HelpdeskApi for HttpHelpdeskApi {
    async fn list_tickets(&self) -> Result<Vec<Ticket>, ClientError> {
        self.fetch("/tickets").await
    }

    async fn get_ticket(&self, id: &str) -> Result<Ticket, ClientError> {
        self.fetch(&format!("/tickets/{}", urlencoding::encode(id))).await
    }

    async fn stats(&self) -> Result<TicketStats, ClientError> {
        self.fetch("/tickets/stats").await
    }

    async fn search(&self, term: &str) -> Result<Vec<Ticket>, ClientError> {
        self.fetch(&format!("/tickets/search?term={}", urlencoding::encode(term))).await
    }

    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket, ClientError> {
        let payload = TicketPayload::from_draft(None, draft);
        let response = self
            .send(self.client.post(self.url("/tickets")).json(&payload))
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn update_ticket(&self, id: &str, draft: &TicketDraft) -> Result<(), ClientError> {
        let payload = TicketPayload::from_draft(Some(id.to_string()), draft);
        let url = self.url(&format!("/tickets/{}", urlencoding::encode(id)));
        self.send(self.client.put(url).json(&payload)).await?;
        Ok(())
    }

    async fn delete_ticket(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/tickets/{}", urlencoding::encode(id)));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn comments(&self, ticket_id: &str) -> Result<Vec<Comment>, ClientError> {
        self.fetch(&format!("/comments/ticket/{}", urlencoding::encode(ticket_id))).await
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ClientError> {
        let payload = CommentPayload {
            ticket_id: Some(comment.ticket_id.clone()),
            author: Some(comment.author.clone()),
            text: Some(comment.text.clone()),
        };
        let response = self
            .send(self.client.post(self.url("/comments")).json(&payload))
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn delete_comment(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/comments/{}", urlencoding::encode(id)));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}
