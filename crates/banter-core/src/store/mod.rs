//! The per-thread comment store: keyed state map, subscriptions, drafts.
//!
//! [`CommentStore`] is an explicitly constructed service object — no ambient
//! singleton — owning one [`ThreadState`] per thread id. All writes go
//! through the defined fetch/mutation operations (`fetch.rs`, `mutate.rs`);
//! external code never splices `items` directly.
//!
//! # Concurrency
//!
//! Operations are synchronous state transitions interleaved with async API
//! calls; the map mutex is held only across a synchronous commit, never
//! across an await. Concurrent operations against the same thread are
//! allowed: each commit re-reads the latest state and merges through the
//! kernel instead of overwriting, so a retry racing a fresh fetch converges.
//! The only explicit guard is the initial-fetch `Loading` check.
//!
//! There is no cancellation token. A consumer that goes away simply stops
//! reading; in-flight requests still resolve and update shared state so
//! other consumers of the same thread benefit from the result.

mod fetch;
mod mutate;
mod view;

pub use view::ThreadView;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::api::CommentApi;
use crate::draft::{DraftStore, draft_key};
use crate::model::ThreadState;
use crate::session::Session;

/// How long a deep-link highlight stays set before auto-clearing.
pub const HIGHLIGHT_TTL: Duration = Duration::from_secs(4);

struct Listener {
    token: u64,
    callback: Arc<dyn Fn() + Send + Sync>,
}

struct Inner {
    api: Arc<dyn CommentApi>,
    session: Arc<dyn Session>,
    drafts: Arc<dyn DraftStore>,
    threads: Mutex<HashMap<String, ThreadState>>,
    subscribers: Mutex<HashMap<String, Vec<Listener>>>,
    next_token: AtomicU64,
    highlight_ttl: Duration,
}

/// The engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CommentStore {
    inner: Arc<Inner>,
}

impl CommentStore {
    /// Build a store around the injected collaborators.
    #[must_use]
    pub fn new(
        api: Arc<dyn CommentApi>,
        session: Arc<dyn Session>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        Self::with_highlight_ttl(api, session, drafts, HIGHLIGHT_TTL)
    }

    /// Like [`CommentStore::new`] but with a custom highlight lifetime.
    #[must_use]
    pub fn with_highlight_ttl(
        api: Arc<dyn CommentApi>,
        session: Arc<dyn Session>,
        drafts: Arc<dyn DraftStore>,
        highlight_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                session,
                drafts,
                threads: Mutex::new(HashMap::new()),
                subscribers: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
                highlight_ttl,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    /// A fresh thread entry, with any persisted draft restored.
    fn seeded_default(&self, thread_id: &str) -> ThreadState {
        let mut state = ThreadState::default();
        if let Some(draft) = self.inner.drafts.get(&draft_key(thread_id)) {
            state.draft = draft;
        }
        state
    }

    /// Run one synchronous commit against a thread's state, then notify that
    /// thread's subscribers. The map lock is released before callbacks run.
    pub(crate) fn mutate_thread<R>(
        &self,
        thread_id: &str,
        commit: impl FnOnce(&mut ThreadState) -> R,
    ) -> R {
        let result = {
            let mut threads = self.inner.threads.lock();
            let state = match threads.entry(thread_id.to_string()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.seeded_default(thread_id)),
            };
            commit(state)
        };
        self.notify(thread_id);
        result
    }

    /// Clone of the thread's current state (or a seeded default), without
    /// creating a map entry or notifying anyone.
    pub(crate) fn snapshot(&self, thread_id: &str) -> ThreadState {
        let threads = self.inner.threads.lock();
        threads
            .get(thread_id)
            .cloned()
            .unwrap_or_else(|| self.seeded_default(thread_id))
    }

    pub(crate) fn api(&self) -> &dyn CommentApi {
        self.inner.api.as_ref()
    }

    pub(crate) fn session(&self) -> &dyn Session {
        self.inner.session.as_ref()
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a change listener for one thread. The callback fires after
    /// every committed state change; read the new state via
    /// [`CommentStore::thread_view`]. Dropping the returned [`Subscription`]
    /// unregisters it.
    pub fn subscribe(
        &self,
        thread_id: &str,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .entry(thread_id.to_string())
            .or_default()
            .push(Listener {
                token,
                callback: Arc::new(callback),
            });
        Subscription {
            inner: Arc::downgrade(&self.inner),
            thread_id: thread_id.to_string(),
            token,
        }
    }

    fn notify(&self, thread_id: &str) {
        let callbacks: Vec<Arc<dyn Fn() + Send + Sync>> = {
            let subscribers = self.inner.subscribers.lock();
            subscribers.get(thread_id).map_or_else(Vec::new, |list| {
                list.iter()
                    .map(|listener| Arc::clone(&listener.callback))
                    .collect()
            })
        };
        for callback in callbacks {
            callback();
        }
    }

    // -----------------------------------------------------------------------
    // Drafts
    // -----------------------------------------------------------------------

    /// Update the composer draft for a thread, mirrored to the injected
    /// draft store so it survives a reload.
    pub fn set_draft(&self, thread_id: &str, text: &str) {
        self.mutate_thread(thread_id, |state| {
            state.draft = text.to_string();
        });
        let key = draft_key(thread_id);
        if text.is_empty() {
            self.inner.drafts.remove(&key);
        } else {
            self.inner.drafts.set(&key, text);
        }
    }

    pub(crate) fn clear_persisted_draft(&self, thread_id: &str) {
        self.inner.drafts.remove(&draft_key(thread_id));
    }

    // -----------------------------------------------------------------------
    // Status / highlight maintenance
    // -----------------------------------------------------------------------

    /// Reset a recorded error status so the UI can offer a clean retry.
    pub fn clear_error(&self, thread_id: &str) {
        self.mutate_thread(thread_id, |state| {
            if state.status.is_error() {
                state.status = if state.items.is_empty() {
                    crate::model::ThreadStatus::Idle
                } else {
                    crate::model::ThreadStatus::Loaded
                };
            }
        });
    }

    /// Drop the deep-link highlight immediately.
    pub fn clear_highlight(&self, thread_id: &str) {
        self.mutate_thread(thread_id, |state| {
            state.highlighted_id = None;
        });
    }

    /// Auto-clear the highlight after the configured delay, unless it was
    /// re-pointed at a different comment in the meantime.
    pub(crate) fn schedule_highlight_clear(&self, thread_id: &str, comment_id: &str) {
        let store = self.clone();
        let thread_id = thread_id.to_string();
        let comment_id = comment_id.to_string();
        let ttl = self.inner.highlight_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            store.mutate_thread(&thread_id, |state| {
                if state.highlighted_id.as_deref() == Some(comment_id.as_str()) {
                    state.highlighted_id = None;
                }
            });
        });
    }
}

/// Registration handle returned by [`CommentStore::subscribe`].
/// Unsubscribes on drop.
pub struct Subscription {
    inner: Weak<Inner>,
    thread_id: String,
    token: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Some(list) = inner.subscribers.lock().get_mut(&self.thread_id) {
                list.retain(|listener| listener.token != self.token);
            }
        }
    }
}
