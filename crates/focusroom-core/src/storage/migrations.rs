//! Database schema migrations for the SQLite document store.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: one table of JSON documents keyed by (collection, id).
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            collection  TEXT NOT NULL,
            id          TEXT NOT NULL,
            body        TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: index for owner-scoped listing (sessions and todos by user).
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_documents_owner
            ON documents(collection, json_extract(body, '$.userId'));",
    )?;
    set_schema_version(conn, 2)
}
