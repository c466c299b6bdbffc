//! Document store abstraction.
//!
//! Records are JSON documents addressed by `(collection, id)`. The contract is
//! deliberately small: put, get, filtered query, delete and change
//! subscriptions. No transactions; a put replaces the whole document.

use std::sync::{Arc, Mutex, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

pub type Document = Value;

/// Collection holding one settings document per user, keyed by user id.
pub const SETTINGS: &str = "settings";
/// Collection of session records.
pub const SESSIONS: &str = "pomodoro_sessions";
/// Collection of todos.
pub const TODOS: &str = "todos";

/// Conjunction of top-level field equality clauses. An empty filter matches
/// every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, want)| doc.get(field) == Some(want))
    }
}

/// Receives the full filtered collection after every change.
pub type Callback = Arc<dyn Fn(&[Document]) + Send + Sync>;

pub trait DocumentStore {
    fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Matching documents in insertion order.
    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Returns whether a document was removed.
    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Deliver the current matching documents now and again after every
    /// change to `collection`. Dropping the handle detaches the callback.
    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        callback: Callback,
    ) -> Result<Subscription, StoreError>;
}

/// Typed helpers over [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    fn put_as<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<(), StoreError> {
        let doc = serde_json::to_value(value)?;
        self.put(collection, id, &doc)
    }

    fn get_as<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError> {
        self.get(collection, id)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Documents that fail to decode are skipped with a warning.
    fn query_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<T>, StoreError> {
        Ok(self
            .query(collection, filter)?
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(collection, error = %e, "skipping undecodable document");
                    None
                }
            })
            .collect())
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        (**self).put(collection, id, doc)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id)
    }

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        (**self).query(collection, filter)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        (**self).delete(collection, id)
    }

    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        callback: Callback,
    ) -> Result<Subscription, StoreError> {
        (**self).subscribe(collection, filter, callback)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        (**self).put(collection, id, doc)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id)
    }

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        (**self).query(collection, filter)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        (**self).delete(collection, id)
    }

    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        callback: Callback,
    ) -> Result<Subscription, StoreError> {
        (**self).subscribe(collection, filter, callback)
    }
}

// ── Subscriptions ────────────────────────────────────────────────────

struct Watcher {
    id: u64,
    collection: String,
    filter: Filter,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    watchers: Vec<Watcher>,
}

/// Subscriber registry shared by the store backends.
#[derive(Clone, Default)]
pub(crate) struct Watchers {
    registry: Arc<Mutex<Registry>>,
}

impl Watchers {
    pub(crate) fn add(&self, collection: &str, filter: Filter, callback: Callback) -> Subscription {
        let mut reg = lock(&self.registry);
        reg.next_id += 1;
        let id = reg.next_id;
        reg.watchers.push(Watcher {
            id,
            collection: collection.to_string(),
            filter,
            callback,
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Re-run every watcher on `collection` with fresh query results.
    ///
    /// Callbacks run after the registry lock is released, so they may
    /// subscribe or unsubscribe.
    pub(crate) fn notify<F>(&self, collection: &str, query: F)
    where
        F: Fn(&Filter) -> Result<Vec<Document>, StoreError>,
    {
        let targets: Vec<(Filter, Callback)> = lock(&self.registry)
            .watchers
            .iter()
            .filter(|w| w.collection == collection)
            .map(|w| (w.filter.clone(), Arc::clone(&w.callback)))
            .collect();
        for (filter, callback) in targets {
            match query(&filter) {
                Ok(docs) => callback(&docs),
                Err(e) => tracing::warn!(collection, error = %e, "subscription refresh failed"),
            }
        }
    }
}

/// Handle for a live subscription.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).watchers.retain(|w| w.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_clauses() {
        let doc = json!({"userId": "u1", "mode": "work", "durationMinutes": 25});
        assert!(Filter::all().matches(&doc));
        assert!(Filter::eq("userId", "u1").matches(&doc));
        assert!(Filter::eq("userId", "u1").and_eq("mode", "work").matches(&doc));
        assert!(!Filter::eq("userId", "u1").and_eq("mode", "longBreak").matches(&doc));
        assert!(!Filter::eq("missing", "x").matches(&doc));
    }
}
