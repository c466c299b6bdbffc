//! In-process document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use super::documents::{Callback, Document, DocumentStore, Filter, Subscription, Watchers};
use crate::error::StoreError;

type Collections = HashMap<String, IndexMap<String, Document>>;

/// Document store kept entirely in memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
    watchers: Watchers,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put/delete fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, IndexMap::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        self.collections.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("writes disabled".into()))
        } else {
            Ok(())
        }
    }

    fn changed(&self, collection: &str) {
        self.watchers
            .notify(collection, |filter| self.query(collection, filter));
    }
}

impl DocumentStore for MemoryStore {
    fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        self.check_writable()?;
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        self.changed(collection);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.lock().get(collection).and_then(|c| c.get(id)).cloned())
    }

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|c| c.values().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.check_writable()?;
        let removed = self
            .lock()
            .get_mut(collection)
            .and_then(|c| c.shift_remove(id))
            .is_some();
        if removed {
            self.changed(collection);
        }
        Ok(removed)
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
