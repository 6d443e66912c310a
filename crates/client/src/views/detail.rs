use helpdesk_core::{NewComment, Ticket, ValidationError};

use super::FormError;
use crate::api::HelpdeskApi;
use crate::store::ClientTicketStore;

/// Pending comment input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForm {
    pub author: String,
    pub text: String,
}

impl CommentForm {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        if self.author.trim().is_empty() {
            errors.add("author", "Author is required");
        }
        if self.text.trim().is_empty() {
            errors.add("text", "Comment is required");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn clear(&mut self) {
        self.author.clear();
        self.text.clear();
    }
}

/// A single ticket with its comments and a comment form.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetailView {
    pub ticket: Ticket,
    pub comment_form: CommentForm,
}

impl TicketDetailView {
    /// `None` when the ticket is not in the snapshot.
    pub fn load<A: HelpdeskApi>(store: &ClientTicketStore<A>, id: &str) -> Option<Self> {
        store.ticket(id).map(|ticket| Self {
            ticket,
            comment_form: CommentForm::default(),
        })
    }

    /// Post the comment form, then reload the ticket from the refreshed
    /// snapshot. The form is cleared only on success.
    pub async fn submit_comment<A: HelpdeskApi>(
        &mut self,
        store: &ClientTicketStore<A>,
    ) -> Result<(), FormError> {
        self.comment_form.validate().map_err(FormError::Invalid)?;

        store
            .add_comment(NewComment {
                ticket_id: self.ticket.id.clone(),
                author: self.comment_form.author.trim().to_string(),
                text: self.comment_form.text.trim().to_string(),
            })
            .await?;

        self.comment_form.clear();
        if let Some(ticket) = store.ticket(&self.ticket.id) {
            self.ticket = ticket;
        }
        Ok(())
    }

    pub async fn delete_comment<A: HelpdeskApi>(
        &mut self,
        store: &ClientTicketStore<A>,
        comment_id: &str,
    ) -> Result<(), FormError> {
        store.delete_comment(comment_id).await?;
        if let Some(ticket) = store.ticket(&self.ticket.id) {
            self.ticket = ticket;
        }
        Ok(())
    }

    /// Delete the displayed ticket.
    pub async fn delete<A: HelpdeskApi>(self, store: &ClientTicketStore<A>) -> Result<(), FormError> {
        store.delete(&self.ticket.id).await?;
        Ok(())
    }
}
