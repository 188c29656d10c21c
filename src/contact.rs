//! Contact form submissions stored in SQLite.

use crate::error::{Result, ShoptalkError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        subject TEXT,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );
"#;

/// A message submitted through the contact form.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// A stored contact message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    /// UTC time the message was stored, RFC 3339.
    pub created_at: String,
}

impl Contact {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            subject: row.get(3)?,
            message: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// SQLite table of contact messages.
pub struct ContactStore {
    conn: Mutex<Connection>,
}

impl ContactStore {
    /// Open (or create) the contact database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized contact store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory contact store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ShoptalkError::Contact(format!("Failed to acquire lock: {}", e)))
    }

    /// Store a submission and return the saved row.
    pub fn save(&self, form: &ContactForm) -> Result<Contact> {
        for (field, value) in [("name", &form.name), ("email", &form.email), ("message", &form.message)] {
            if value.trim().is_empty() {
                return Err(ShoptalkError::InvalidInput(format!("{} is required", field)));
            }
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contacts (name, email, subject, message) VALUES (?1, ?2, ?3, ?4)",
            params![form.name, form.email, form.subject, form.message],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Stored contact message {} from {}", id, form.email);

        Self::fetch(&conn, id)?
            .ok_or_else(|| ShoptalkError::Contact(format!("message {} missing after insert", id)))
    }

    /// Look up a stored message by id.
    pub fn get(&self, id: i64) -> Result<Option<Contact>> {
        let conn = self.lock()?;
        Self::fetch(&conn, id)
    }

    fn fetch(conn: &Connection, id: i64) -> Result<Option<Contact>> {
        let contact = conn
            .query_row(
                "SELECT id, name, email, subject, message, created_at FROM contacts WHERE id = ?1",
                params![id],
                Contact::from_row,
            )
            .optional()?;
        Ok(contact)
    }
}
