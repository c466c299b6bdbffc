//! SQLite-backed document store.
//!
//! Documents are stored as JSON text in a single `documents` table. Filters
//! are evaluated on decoded documents, so any field can be matched.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::documents::{Callback, Document, DocumentStore, Filter, Subscription, Watchers};
use super::migrations;
use crate::error::StoreError;

/// SQLite database holding every collection.
///
/// Subscriptions only observe writes made through this handle.
pub struct SqliteStore {
    conn: Connection,
    watchers: Watchers,
}

impl SqliteStore {
    /// Open the store at `path`, creating the file and schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests and ephemeral runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        migrations::migrate(&conn)?;
        Ok(Self {
            conn,
            watchers: Watchers::default(),
        })
    }

    fn changed(&self, collection: &str) {
        self.watchers
            .notify(collection, |filter| self.query(collection, filter));
    }
}

impl DocumentStore for SqliteStore {
    fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let body = serde_json::to_string(doc)?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at",
            params![collection, id, body, Utc::now().to_rfc3339()],
        )?;
        self.changed(collection);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
    }

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for row in rows {
            let doc: Document = serde_json::from_str(&row?)?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        if n > 0 {
            self.changed(collection);
        }
        Ok(n > 0)
    }

    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        callback: Callback,
    ) -> Result<Subscription, StoreError> {
        let initial = self.query(collection, &filter)?;
        callback(&initial);
        Ok(self.watchers.add(collection, filter, callback))
    }
}
