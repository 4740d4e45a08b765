//! Composer draft persistence.
//!
//! Drafts are mirrored to an injected key-value capability so an
//! in-progress composition survives a page reload. Browser hosts back this
//! with session storage; tests and native hosts use [`MemoryDraftStore`].

use parking_lot::Mutex;
use std::collections::HashMap;

/// Storage key for one thread's draft.
#[must_use]
pub fn draft_key(thread_id: &str) -> String {
    format!("comment-draft:{thread_id}")
}

/// Injected key-value persistence for drafts.
pub trait DraftStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory [`DraftStore`] for tests and hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
