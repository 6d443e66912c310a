//! Document-oriented ticket store.
//!
//! Tickets and comments are stored as JSON documents in two collections,
//! `ticket_documents` and `comment_documents`, keyed by ID. The comment list
//! a caller sees on a ticket is never stored with the ticket: it is projected
//! from the comment collection on every read, so the two can't drift apart.
//!
//! The collections are independent, as in a document database without
//! multi-document transactions: adding a comment and touching its ticket are
//! two separate writes, and deleting a ticket issues a follow-up delete for
//! its comments.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::query::sort_newest_first;
use super::store::now;
use super::{
    Category, Comment, NewComment, Priority, Status, Ticket, TicketDraft, TicketError, TicketStore,
};

/// Stored form of a ticket: everything but the comment projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketDocument {
    id: String,
    title: String,
    description: String,
    category: Category,
    priority: Priority,
    status: Status,
    assigned_to: String,
    reported_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TicketDocument {
    fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            category: ticket.category,
            priority: ticket.priority,
            status: ticket.status,
            assigned_to: ticket.assigned_to.clone(),
            reported_by: ticket.reported_by.clone(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            resolved_at: ticket.resolved_at,
        }
    }

    fn into_ticket(self, comments: Vec<Comment>) -> Ticket {
        Ticket {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to,
            reported_by: self.reported_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
            comments,
        }
    }
}

/// Document-oriented ticket store backed by SQLite JSON columns.
pub struct DocumentTicketStore {
    conn: Mutex<Connection>,
}

impl DocumentTicketStore {
    /// Open (or create) a document store at the given path.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path)?;
        Self::initialize_collections(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory document store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_collections(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_collections(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ticket_documents (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS comment_documents (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comment_documents_ticket
                ON comment_documents(json_extract(body, '$.ticketId'));
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn find_ticket(conn: &Connection, id: &str) -> Result<Option<TicketDocument>, TicketError> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM ticket_documents WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b).map_err(TicketError::from))
            .transpose()
    }

    fn save_ticket(conn: &Connection, doc: &TicketDocument) -> Result<(), TicketError> {
        let body = serde_json::to_string(doc)?;
        conn.execute(
            "INSERT INTO ticket_documents (id, body) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
            params![doc.id, body],
        )?;
        Ok(())
    }

    fn save_comment(conn: &Connection, comment: &Comment) -> Result<(), TicketError> {
        let body = serde_json::to_string(comment)?;
        conn.execute(
            "INSERT INTO comment_documents (id, body) VALUES (?, ?)",
            params![comment.id, body],
        )?;
        Ok(())
    }

    /// Comments for one ticket, oldest first.
    fn project_comments(conn: &Connection, ticket_id: &str) -> Result<Vec<Comment>, TicketError> {
        let mut stmt = conn.prepare(
            "SELECT body FROM comment_documents
             WHERE json_extract(body, '$.ticketId') = ?
             ORDER BY rowid ASC",
        )?;
        let bodies = stmt
            .query_map(params![ticket_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut comments = decode_all::<Comment>(&bodies)?;
        sort_oldest_first(&mut comments);
        Ok(comments)
    }

    /// Every comment grouped by ticket, each group oldest first.
    fn project_all_comments(
        conn: &Connection,
    ) -> Result<HashMap<String, Vec<Comment>>, TicketError> {
        let mut stmt = conn.prepare("SELECT body FROM comment_documents ORDER BY rowid ASC")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut grouped: HashMap<String, Vec<Comment>> = HashMap::new();
        for comment in decode_all::<Comment>(&bodies)? {
            grouped
                .entry(comment.ticket_id.clone())
                .or_default()
                .push(comment);
        }
        for comments in grouped.values_mut() {
            sort_oldest_first(comments);
        }
        Ok(grouped)
    }

    fn touch_ticket(
        conn: &Connection,
        ticket_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), TicketError> {
        match Self::find_ticket(conn, ticket_id)? {
            Some(mut doc) => {
                doc.updated_at = at;
                Self::save_ticket(conn, &doc)
            }
            None => {
                // Orphaned comment: nothing ties the collections together
                warn!(ticket_id = %ticket_id, "No ticket document to touch");
                Ok(())
            }
        }
    }
}

impl TicketStore for DocumentTicketStore {
    fn backend_name(&self) -> &'static str {
        "document"
    }

    fn list(&self) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn()?;

        // Newest insert first, so the stable sort below breaks timestamp ties that way
        let mut stmt = conn.prepare("SELECT body FROM ticket_documents ORDER BY rowid DESC")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut comments = Self::project_all_comments(&conn)?;
        let mut tickets: Vec<Ticket> = decode_all::<TicketDocument>(&bodies)?
            .into_iter()
            .map(|doc| {
                let projected = comments.remove(&doc.id).unwrap_or_default();
                doc.into_ticket(projected)
            })
            .collect();

        sort_newest_first(&mut tickets);
        Ok(tickets)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn()?;

        match Self::find_ticket(&conn, id)? {
            Some(doc) => {
                let comments = Self::project_comments(&conn, id)?;
                Ok(Some(doc.into_ticket(comments)))
            }
            None => Ok(None),
        }
    }

    fn count(&self) -> Result<u64, TicketError> {
        let conn = self.conn()?;
        let count: u64 =
            conn.query_row("SELECT COUNT(*) FROM ticket_documents", [], |row| row.get(0))?;
        Ok(count)
    }

    fn create(&self, draft: TicketDraft) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        let ticket = Ticket::from_draft(uuid::Uuid::new_v4().to_string(), draft, now());
        Self::save_ticket(&conn, &TicketDocument::from_ticket(&ticket))?;

        Ok(ticket)
    }

    fn update(&self, id: &str, draft: TicketDraft) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        let doc = Self::find_ticket(&conn, id)?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;
        let mut ticket = doc.into_ticket(Self::project_comments(&conn, id)?);
        ticket.apply_draft(draft, now());

        Self::save_ticket(&conn, &TicketDocument::from_ticket(&ticket))?;
        Ok(ticket)
    }

    fn delete(&self, id: &str) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        let doc = Self::find_ticket(&conn, id)?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;
        let ticket = doc.into_ticket(Self::project_comments(&conn, id)?);

        conn.execute("DELETE FROM ticket_documents WHERE id = ?", params![id])?;
        // No cascade between collections: remove the comments explicitly
        conn.execute(
            "DELETE FROM comment_documents WHERE json_extract(body, '$.ticketId') = ?",
            params![id],
        )?;

        Ok(ticket)
    }

    fn import(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let conn = self.conn()?;

        Self::save_ticket(&conn, &TicketDocument::from_ticket(ticket))?;
        for comment in &ticket.comments {
            Self::save_comment(&conn, comment)?;
        }
        Ok(())
    }

    fn comments_for(&self, ticket_id: &str) -> Result<Vec<Comment>, TicketError> {
        let conn = self.conn()?;
        Self::project_comments(&conn, ticket_id)
    }

    fn add_comment(&self, comment: NewComment) -> Result<Comment, TicketError> {
        let conn = self.conn()?;

        if Self::find_ticket(&conn, &comment.ticket_id)?.is_none() {
            return Err(TicketError::NotFound(comment.ticket_id));
        }

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            ticket_id: comment.ticket_id,
            author: comment.author,
            text: comment.text,
            created_at: now(),
        };
        Self::save_comment(&conn, &comment)?;
        Self::touch_ticket(&conn, &comment.ticket_id, comment.created_at)?;

        Ok(comment)
    }

    fn delete_comment(&self, id: &str) -> Result<Comment, TicketError> {
        let conn = self.conn()?;

        let body: String = conn
            .query_row(
                "SELECT body FROM comment_documents WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| TicketError::CommentNotFound(id.to_string()))?;
        let comment: Comment = serde_json::from_str(&body)?;

        conn.execute("DELETE FROM comment_documents WHERE id = ?", params![id])?;
        Self::touch_ticket(&conn, &comment.ticket_id, now())?;

        Ok(comment)
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(bodies: &[String]) -> Result<Vec<T>, TicketError> {
    bodies
        .iter()
        .map(|b| serde_json::from_str(b).map_err(TicketError::from))
        .collect()
}

fn sort_oldest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
}
