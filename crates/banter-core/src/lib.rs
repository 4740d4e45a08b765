//! banter-core: a per-thread optimistic comment synchronization engine.
//!
//! The engine reconciles three concurrent sources of truth for each comment
//! thread — a locally typed draft, optimistically inserted items awaiting
//! server confirmation, and the authoritative server state arriving via
//! pagination or deep link — without flicker, duplicate rows, or lost edits
//! under network failure, retries, and concurrent user actions.
//!
//! # Layout
//!
//! - [`model`] — canonical [`Comment`](model::Comment) entities and
//!   per-thread state.
//! - [`transform`] — loosely-shaped server rows → canonical entities.
//! - [`merge`] — the pure merge/dedupe kernel every reconciliation uses.
//! - [`api`] — the injected REST client contract.
//! - [`session`] / [`draft`] — viewer-identity and draft-persistence
//!   collaborators.
//! - [`store`] — the [`CommentStore`](store::CommentStore) service object:
//!   fetch operations, optimistic mutations, and the subscription surface.
//!
//! # Conventions
//!
//! - **Errors**: typed (`thiserror`) enums; mutation paths return `Result`,
//!   fetch paths record a thread status instead of throwing.
//! - **Logging**: `tracing` macros (`debug!`, `warn!`).

pub mod api;
pub mod draft;
pub mod error;
pub mod merge;
pub mod model;
pub mod session;
pub mod store;
pub mod transform;

pub use api::{CommentApi, CommentLookup, CommentPage, CreateCommentRequest, LikeResponse};
pub use draft::{DraftStore, MemoryDraftStore};
pub use error::{ApiError, CommentError};
pub use model::{
    BadgeTier, Comment, CommentUser, MAX_BODY_CHARS, PAGE_SIZE, SendStatus, ThreadStatus,
};
pub use session::{Session, Viewer};
pub use store::{CommentStore, Subscription, ThreadView};
pub use transform::{RawComment, RawUser, comment_from_raw};
