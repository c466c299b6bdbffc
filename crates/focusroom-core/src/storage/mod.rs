mod config;
pub mod documents;
mod memory;
pub mod migrations;
mod sqlite;

pub use config::{AccountConfig, Config, NotificationsConfig, StorageBackend, StorageConfig, TimerConfig};
pub use documents::{
    Callback, Document, DocumentStore, DocumentStoreExt, Filter, Subscription, SESSIONS,
    SETTINGS, TODOS,
};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

/// Returns `~/.config/focusroom[-dev]/` based on FOCUSROOM_ENV.
///
/// Set FOCUSROOM_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusroom-dev")
    } else {
        base_dir.join("focusroom")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Open the store selected by `config`.
pub fn open_store(config: &Config) -> crate::error::Result<Box<dyn DocumentStore>> {
    Ok(match config.storage.backend {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.database_path()?)?),
    })
}
