//! External REST contract consumed by the engine.
//!
//! The engine never talks HTTP directly: it is handed a [`CommentApi`]
//! implementation whose transport concerns (retries, timeouts, auth
//! headers) are its own business. The trait mirrors the seven endpoints:
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | list      | GET    | `/threads/{thread}/comments?page=P&limit=L` |
//! | create    | POST   | `/threads/{thread}/comments` |
//! | edit      | PATCH  | `/comments/{id}` |
//! | delete    | DELETE | `/comments/{id}` |
//! | like      | POST   | `/comments/{id}/like` |
//! | unlike    | DELETE | `/comments/{id}/like` |
//! | get one   | GET    | `/threads/{thread}/comments/{id}` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::transform::RawComment;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of the create endpoint.
///
/// `client_request_id` is the idempotency key: a retried submission carries
/// the same key and must be indistinguishable server-side from a
/// re-delivered request, never a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub client_request_id: String,
}

/// One page of the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<RawComment>,
    #[serde(default, alias = "hasMore", alias = "hasNext")]
    pub has_next: bool,
}

/// Authoritative like state returned by the like/unlike endpoints.
///
/// Either field may be absent on older deployments; present values win over
/// the optimistic guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default, alias = "likes_count")]
    pub like_count: Option<i64>,
}

/// Single-comment (deep link) response: the target plus optional thread
/// context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentLookup {
    pub comment: RawComment,
    /// The target's parent, when the target is a reply.
    #[serde(default)]
    pub parent: Option<RawComment>,
    /// Sibling replies (reply target) or child replies (top-level target).
    #[serde(default)]
    pub replies: Vec<RawComment>,
}

// ---------------------------------------------------------------------------
// CommentApi
// ---------------------------------------------------------------------------

/// Injected API client. Every method resolves to a typed [`ApiError`] on
/// failure, carrying an HTTP status whenever one was obtained.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// GET `/threads/{thread_id}/comments?page={page}&limit={limit}`.
    async fn list_comments(
        &self,
        thread_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<CommentPage, ApiError>;

    /// POST `/threads/{thread_id}/comments`.
    async fn create_comment(
        &self,
        thread_id: &str,
        request: CreateCommentRequest,
    ) -> Result<RawComment, ApiError>;

    /// PATCH `/comments/{comment_id}`.
    async fn edit_comment(&self, comment_id: &str, body: &str) -> Result<RawComment, ApiError>;

    /// DELETE `/comments/{comment_id}` (soft delete server-side).
    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError>;

    /// POST `/comments/{comment_id}/like`.
    async fn like_comment(&self, comment_id: &str) -> Result<LikeResponse, ApiError>;

    /// DELETE `/comments/{comment_id}/like`.
    async fn unlike_comment(&self, comment_id: &str) -> Result<LikeResponse, ApiError>;

    /// GET `/threads/{thread_id}/comments/{comment_id}`.
    async fn get_comment(
        &self,
        thread_id: &str,
        comment_id: &str,
    ) -> Result<CommentLookup, ApiError>;
}
