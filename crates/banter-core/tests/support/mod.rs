//! Shared test doubles: a scriptable API client and a recording session.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;

use banter_core::api::{
    CommentApi, CommentLookup, CommentPage, CreateCommentRequest, LikeResponse,
};
use banter_core::draft::MemoryDraftStore;
use banter_core::error::ApiError;
use banter_core::session::{Session, Viewer};
use banter_core::store::CommentStore;
use banter_core::transform::{RawComment, RawUser};

// ---------------------------------------------------------------------------
// MockApi
// ---------------------------------------------------------------------------

/// Scriptable [`CommentApi`]: queue one result per expected call. An
/// unscripted call resolves to a network error so tests fail loudly.
#[derive(Default)]
pub struct MockApi {
    pub list_responses: Mutex<VecDeque<Result<CommentPage, ApiError>>>,
    pub create_responses: Mutex<VecDeque<Result<RawComment, ApiError>>>,
    pub edit_responses: Mutex<VecDeque<Result<RawComment, ApiError>>>,
    pub delete_responses: Mutex<VecDeque<Result<(), ApiError>>>,
    pub like_responses: Mutex<VecDeque<Result<LikeResponse, ApiError>>>,
    pub unlike_responses: Mutex<VecDeque<Result<LikeResponse, ApiError>>>,
    pub lookup_responses: Mutex<VecDeque<Result<CommentLookup, ApiError>>>,
    /// Every create call observed, with its thread id.
    pub create_requests: Mutex<Vec<(String, CreateCommentRequest)>>,
    pub list_calls: AtomicUsize,
    pub like_calls: AtomicUsize,
    pub unlike_calls: AtomicUsize,
    /// When set, list calls park here until the test releases them.
    pub list_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_list(&self, result: Result<CommentPage, ApiError>) {
        self.list_responses.lock().push_back(result);
    }

    pub fn push_create(&self, result: Result<RawComment, ApiError>) {
        self.create_responses.lock().push_back(result);
    }

    pub fn push_edit(&self, result: Result<RawComment, ApiError>) {
        self.edit_responses.lock().push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), ApiError>) {
        self.delete_responses.lock().push_back(result);
    }

    pub fn push_like(&self, result: Result<LikeResponse, ApiError>) {
        self.like_responses.lock().push_back(result);
    }

    pub fn push_unlike(&self, result: Result<LikeResponse, ApiError>) {
        self.unlike_responses.lock().push_back(result);
    }

    pub fn push_lookup(&self, result: Result<CommentLookup, ApiError>) {
        self.lookup_responses.lock().push_back(result);
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, endpoint: &str) -> Result<T, ApiError> {
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network(format!("unscripted call: {endpoint}"))))
    }
}

#[async_trait]
impl CommentApi for MockApi {
    async fn list_comments(
        &self,
        _thread_id: &str,
        _page: u32,
        _limit: u32,
    ) -> Result<CommentPage, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::next(&self.list_responses, "list")
    }

    async fn create_comment(
        &self,
        thread_id: &str,
        request: CreateCommentRequest,
    ) -> Result<RawComment, ApiError> {
        self.create_requests
            .lock()
            .push((thread_id.to_string(), request));
        Self::next(&self.create_responses, "create")
    }

    async fn edit_comment(&self, _comment_id: &str, _body: &str) -> Result<RawComment, ApiError> {
        Self::next(&self.edit_responses, "edit")
    }

    async fn delete_comment(&self, _comment_id: &str) -> Result<(), ApiError> {
        Self::next(&self.delete_responses, "delete")
    }

    async fn like_comment(&self, _comment_id: &str) -> Result<LikeResponse, ApiError> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.like_responses, "like")
    }

    async fn unlike_comment(&self, _comment_id: &str) -> Result<LikeResponse, ApiError> {
        self.unlike_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.unlike_responses, "unlike")
    }

    async fn get_comment(
        &self,
        _thread_id: &str,
        _comment_id: &str,
    ) -> Result<CommentLookup, ApiError> {
        Self::next(&self.lookup_responses, "get_comment")
    }
}

// ---------------------------------------------------------------------------
// RecordingSession
// ---------------------------------------------------------------------------

/// [`Session`] double: configurable viewer, counts logout calls.
pub struct RecordingSession {
    pub current: Mutex<Option<Viewer>>,
    pub logout_calls: AtomicUsize,
}

impl RecordingSession {
    pub fn signed_in() -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(Some(test_viewer())),
            logout_calls: AtomicUsize::new(0),
        })
    }

    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(None),
            logout_calls: AtomicUsize::new(0),
        })
    }

    pub fn logouts(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl Session for RecordingSession {
    fn viewer(&self) -> Option<Viewer> {
        self.current.lock().clone()
    }

    fn logout(&self) {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn test_viewer() -> Viewer {
    Viewer {
        id: "viewer-1".to_string(),
        username: "mike_trader".to_string(),
        display_name: Some("Mike Chen".to_string()),
        avatar_url: None,
        verified: false,
        badge: None,
    }
}

pub fn raw_comment(id: &str, body: &str) -> RawComment {
    RawComment {
        id: Some(id.to_string()),
        content: Some(body.to_string()),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
        user: Some(RawUser {
            id: Some(format!("author-of-{id}")),
            username: Some(format!("user_{id}")),
            ..RawUser::default()
        }),
        ..RawComment::default()
    }
}

pub fn raw_reply(id: &str, parent_id: &str, body: &str) -> RawComment {
    RawComment {
        parent_comment_id: Some(parent_id.to_string()),
        ..raw_comment(id, body)
    }
}

pub fn page(comments: Vec<RawComment>, has_next: bool) -> CommentPage {
    CommentPage { comments, has_next }
}

pub fn http(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: None,
    }
}

static TRACING: Once = Once::new();

/// Install a per-binary test-writer subscriber so failing tests surface the
/// engine's logs.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Store wired to the given doubles plus an in-memory draft store.
pub fn store_with(api: Arc<MockApi>, session: Arc<RecordingSession>) -> CommentStore {
    store_with_drafts(api, session, Arc::new(MemoryDraftStore::new()))
}

/// Like [`store_with`] but sharing an externally owned draft store.
pub fn store_with_drafts(
    api: Arc<MockApi>,
    session: Arc<RecordingSession>,
    drafts: Arc<MemoryDraftStore>,
) -> CommentStore {
    init_tracing();
    CommentStore::new(api, session, drafts)
}

/// Like [`store_with`] but with a custom highlight lifetime.
pub fn store_with_ttl(
    api: Arc<MockApi>,
    session: Arc<RecordingSession>,
    highlight_ttl: Duration,
) -> CommentStore {
    init_tracing();
    CommentStore::with_highlight_ttl(
        api,
        session,
        Arc::new(MemoryDraftStore::new()),
        highlight_ttl,
    )
}
