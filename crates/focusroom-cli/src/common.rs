//! Shared setup for CLI commands.

use std::sync::Arc;

use focusroom_core::notify::{Notification, Notifier, Severity};
use focusroom_core::storage::open_store;
use focusroom_core::{Clock, Config, DocumentStore, Identity, SessionLedger, SystemClock, TodoList};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: configuration, the opened store, the signed-in
/// identity and the system clock.
pub struct Context {
    pub config: Config,
    pub store: Box<dyn DocumentStore>,
    pub identity: Option<Identity>,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        tracing::debug!(?config, "loaded configuration");
        let store = open_store(&config)?;
        let identity = Identity::from_config(&config.account);
        Ok(Self {
            config,
            store,
            identity,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn ledger(&self) -> SessionLedger<&dyn DocumentStore> {
        SessionLedger::new(&*self.store, Arc::clone(&self.clock), self.identity.clone())
    }

    pub fn todos(&self) -> TodoList<&dyn DocumentStore> {
        TodoList::new(&*self.store, Arc::clone(&self.clock), self.identity.clone())
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints notifications to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, n: &Notification) {
        let tag = match n.severity {
            Severity::Info => "info",
            Severity::Success => "done",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}: {}", n.title, n.message);
    }
}
