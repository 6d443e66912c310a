//! SQLite-backed relational ticket store.
//!
//! Tickets and comments live in separate tables; comments reference their
//! ticket through a foreign key with `ON DELETE CASCADE`, so removing a ticket
//! removes its comments without any application-side cleanup.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::store::now;
use super::{
    Comment, NewComment, ParseLabelError, Priority, Status, Ticket, TicketDraft, TicketError,
    TicketStats, TicketStore,
};

const TICKET_COLUMNS: &str = "id, title, description, category, priority, status, assigned_to, reported_by, created_at, updated_at, resolved_at";

const COMMENT_COLUMNS: &str = "id, ticket_id, author, text, created_at";

/// SQLite-backed relational ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                assigned_to TEXT NOT NULL,
                reported_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                resolved_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at DESC);

            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                author TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comments_ticket ON comments(ticket_id, created_at);
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_ticket(row: &Row) -> rusqlite::Result<Ticket> {
        let resolved_at = match row.get::<_, Option<String>>(10)? {
            Some(raw) => Some(parse_timestamp(10, &raw)?),
            None => None,
        };

        Ok(Ticket {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: parse_label(row, 3)?,
            priority: parse_label(row, 4)?,
            status: parse_label(row, 5)?,
            assigned_to: row.get(6)?,
            reported_by: row.get(7)?,
            created_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
            updated_at: parse_timestamp(9, &row.get::<_, String>(9)?)?,
            resolved_at,
            comments: Vec::new(),
        })
    }

    fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            author: row.get(2)?,
            text: row.get(3)?,
            created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
        })
    }

    fn fetch_ticket(conn: &Connection, id: &str) -> Result<Option<Ticket>, TicketError> {
        let sql = format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS);
        let ticket = conn
            .query_row(&sql, params![id], Self::row_to_ticket)
            .optional()?;

        match ticket {
            Some(mut ticket) => {
                ticket.comments = Self::fetch_comments(conn, id)?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    fn fetch_comments(conn: &Connection, ticket_id: &str) -> Result<Vec<Comment>, TicketError> {
        let sql = format!(
            "SELECT {} FROM comments WHERE ticket_id = ? ORDER BY created_at ASC, rowid ASC",
            COMMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let comments = stmt
            .query_map(params![ticket_id], Self::row_to_comment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    /// Every comment grouped by ticket, each group oldest first.
    fn fetch_all_comments(conn: &Connection) -> Result<HashMap<String, Vec<Comment>>, TicketError> {
        let sql = format!(
            "SELECT {} FROM comments ORDER BY created_at ASC, rowid ASC",
            COMMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_comment)?;

        let mut grouped: HashMap<String, Vec<Comment>> = HashMap::new();
        for row in rows {
            let comment = row?;
            grouped
                .entry(comment.ticket_id.clone())
                .or_default()
                .push(comment);
        }
        Ok(grouped)
    }

    fn insert_ticket(conn: &Connection, ticket: &Ticket) -> Result<(), TicketError> {
        conn.execute(
            "INSERT INTO tickets (id, title, description, category, priority, status, assigned_to, reported_by, created_at, updated_at, resolved_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.category.label(),
                ticket.priority.label(),
                ticket.status.label(),
                ticket.assigned_to,
                ticket.reported_by,
                format_timestamp(&ticket.created_at),
                format_timestamp(&ticket.updated_at),
                ticket.resolved_at.as_ref().map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    fn insert_comment(conn: &Connection, comment: &Comment) -> Result<(), TicketError> {
        conn.execute(
            "INSERT INTO comments (id, ticket_id, author, text, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                comment.id,
                comment.ticket_id,
                comment.author,
                comment.text,
                format_timestamp(&comment.created_at),
            ],
        )?;
        Ok(())
    }

    fn touch_ticket(
        conn: &Connection,
        ticket_id: &str,
        at: &DateTime<Utc>,
    ) -> Result<(), TicketError> {
        conn.execute(
            "UPDATE tickets SET updated_at = ? WHERE id = ?",
            params![format_timestamp(at), ticket_id],
        )?;
        Ok(())
    }
}

impl TicketStore for SqliteTicketStore {
    fn backend_name(&self) -> &'static str {
        "relational"
    }

    fn list(&self) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn()?;

        let sql = format!(
            "SELECT {} FROM tickets ORDER BY created_at DESC, rowid DESC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut tickets = stmt
            .query_map([], Self::row_to_ticket)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut comments = Self::fetch_all_comments(&conn)?;
        for ticket in &mut tickets {
            ticket.comments = comments.remove(&ticket.id).unwrap_or_default();
        }

        Ok(tickets)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn()?;
        Self::fetch_ticket(&conn, id)
    }

    fn count(&self) -> Result<u64, TicketError> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count)
    }

    fn create(&self, draft: TicketDraft) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        let ticket = Ticket::from_draft(uuid::Uuid::new_v4().to_string(), draft, now());
        Self::insert_ticket(&conn, &ticket)?;

        Ok(ticket)
    }

    fn update(&self, id: &str, draft: TicketDraft) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        let mut ticket =
            Self::fetch_ticket(&conn, id)?.ok_or_else(|| TicketError::NotFound(id.to_string()))?;
        ticket.apply_draft(draft, now());

        conn.execute(
            "UPDATE tickets SET title = ?, description = ?, category = ?, priority = ?, status = ?, assigned_to = ?, reported_by = ?, updated_at = ?, resolved_at = ? WHERE id = ?",
            params![
                ticket.title,
                ticket.description,
                ticket.category.label(),
                ticket.priority.label(),
                ticket.status.label(),
                ticket.assigned_to,
                ticket.reported_by,
                format_timestamp(&ticket.updated_at),
                ticket.resolved_at.as_ref().map(format_timestamp),
                id,
            ],
        )?;

        Ok(ticket)
    }

    fn delete(&self, id: &str) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        // Fetch first so the deleted ticket can be returned
        let ticket =
            Self::fetch_ticket(&conn, id)?.ok_or_else(|| TicketError::NotFound(id.to_string()))?;

        // Comments go with it through the foreign key cascade
        conn.execute("DELETE FROM tickets WHERE id = ?", params![id])?;

        Ok(ticket)
    }

    fn import(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        Self::insert_ticket(&tx, ticket)?;
        for comment in &ticket.comments {
            Self::insert_comment(&tx, comment)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn comments_for(&self, ticket_id: &str) -> Result<Vec<Comment>, TicketError> {
        let conn = self.conn()?;
        Self::fetch_comments(&conn, ticket_id)
    }

    fn add_comment(&self, comment: NewComment) -> Result<Comment, TicketError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE id = ?)",
            params![comment.ticket_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(TicketError::NotFound(comment.ticket_id));
        }

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            ticket_id: comment.ticket_id,
            author: comment.author,
            text: comment.text,
            created_at: now(),
        };
        Self::insert_comment(&tx, &comment)?;
        Self::touch_ticket(&tx, &comment.ticket_id, &comment.created_at)?;

        tx.commit()?;
        Ok(comment)
    }

    fn delete_comment(&self, id: &str) -> Result<Comment, TicketError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let sql = format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS);
        let comment = tx
            .query_row(&sql, params![id], Self::row_to_comment)
            .optional()?
            .ok_or_else(|| TicketError::CommentNotFound(id.to_string()))?;

        tx.execute("DELETE FROM comments WHERE id = ?", params![id])?;
        Self::touch_ticket(&tx, &comment.ticket_id, &now())?;

        tx.commit()?;
        Ok(comment)
    }

    fn stats(&self) -> Result<TicketStats, TicketError> {
        let conn = self.conn()?;

        let stats = conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = ?3 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = ?4 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN priority IN (?5, ?6) THEN 1 ELSE 0 END), 0)
            FROM tickets
            "#,
            params![
                Status::Open.label(),
                Status::InProgress.label(),
                Status::Resolved.label(),
                Status::Closed.label(),
                Priority::High.label(),
                Priority::Critical.label(),
            ],
            |row| {
                Ok(TicketStats {
                    total: row.get(0)?,
                    open: row.get(1)?,
                    in_progress: row.get(2)?,
                    resolved: row.get(3)?,
                    closed: row.get(4)?,
                    high_priority: row.get(5)?,
                })
            },
        )?;

        Ok(stats)
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_label<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseLabelError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
