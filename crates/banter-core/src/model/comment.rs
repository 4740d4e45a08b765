//! Canonical comment entities.
//!
//! A [`Comment`] is born one of two ways: as an optimistic placeholder built
//! from the current viewer (mutation path), or as a transformed server row
//! (fetch path). Its delivery lifecycle is:
//!
//! ```text
//! sending ──► sent
//!    │
//!    └──► failed ──(retry)──► sending ──► sent
//!              └──(dismiss)──► removed
//! ```
//!
//! Confirmed comments leave the store only through soft deletion, which
//! excludes them from every read path without purging the row immediately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder username assigned when the server row carries no usable
/// author name. Treated as "not a real value" by the merge kernel.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// Maximum accepted comment body length, in characters, after trimming.
pub const MAX_BODY_CHARS: usize = 1_000;

// ---------------------------------------------------------------------------
// SendStatus
// ---------------------------------------------------------------------------

/// Delivery state of a comment from the viewer's perspective.
///
/// Only meaningful for comments created on this client; server-originated
/// rows are always [`SendStatus::Sent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    /// Confirmed by the server.
    #[default]
    Sent,
    /// Submitted, awaiting confirmation.
    Sending,
    /// Submission failed; kept visible until retried or dismissed.
    Failed,
}

impl SendStatus {
    /// Return the status name as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Sending => "sending",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "sending" => Ok(Self::Sending),
            "failed" => Ok(Self::Failed),
            other => Err(format!(
                "unknown send status '{other}': expected sent, sending, or failed"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// BadgeTier
// ---------------------------------------------------------------------------

/// Optional author badge tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
}

impl BadgeTier {
    /// Return the tier name as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }
}

impl fmt::Display for BadgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            other => Err(format!(
                "unknown badge tier '{other}': expected bronze, silver, or gold"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// CommentUser
// ---------------------------------------------------------------------------

/// Author identity snapshot embedded on each comment.
///
/// Identity fields must never regress to a more generic placeholder once a
/// real value has been observed; the merge kernel enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentUser {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub verified: bool,
    pub badge: Option<BadgeTier>,
}

impl CommentUser {
    /// The degraded author used when a server row has no usable identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            username: ANONYMOUS_USERNAME.to_string(),
            display_name: None,
            avatar_url: None,
            verified: false,
            badge: None,
        }
    }

    /// Whether `name` is a generic placeholder rather than a real username.
    #[must_use]
    pub fn is_placeholder_name(name: &str) -> bool {
        let trimmed = name.trim();
        trimmed.is_empty() || trimmed == ANONYMOUS_USERNAME || trimmed == "Anonymous User"
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// The canonical comment entity.
///
/// Replies are carried inline on their parent (`replies`), never exposed as
/// a separate flat list. Nesting is exactly two levels deep; the merge
/// kernel reclassifies anything deeper as top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Stable server identity once confirmed. Before confirmation this holds
    /// the locally generated temp id (mirrored in `client_temp_id`).
    pub id: String,
    /// The thread (prediction/subject) this comment belongs to.
    pub thread_id: String,
    pub author: CommentUser,
    /// Current body text, post-edit.
    pub text: String,
    /// `None` for top-level comments, a top-level comment id for replies.
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True once any edit has been confirmed (or optimistically applied).
    pub edited: bool,
    /// Soft delete marker. Deleted rows are excluded from every read path
    /// but may transiently remain in raw state until the next reconciliation.
    pub deleted: bool,
    pub like_count: u32,
    pub liked_by_me: bool,
    /// Tri-state: unknown (`None`) only before first server confirmation.
    pub owned_by_viewer: Option<bool>,
    pub send_status: SendStatus,
    /// Present only while `send_status != Sent`.
    pub client_temp_id: Option<String>,
    /// Idempotency key, stable across retries of the same logical submission.
    /// Present only while `send_status != Sent`.
    pub client_request_id: Option<String>,
    /// User-facing diagnostic, present only when `send_status == Failed`.
    pub error_message: Option<String>,
    /// Body captured at submission time, kept for retry while failed.
    pub original_content: Option<String>,
    /// Inline single-level replies, in server order with optimistic inserts
    /// at the head.
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Whether this comment exists only on this client (unconfirmed or
    /// failed) and must therefore survive any server reconciliation.
    #[must_use]
    pub const fn is_local_only(&self) -> bool {
        !matches!(self.send_status, SendStatus::Sent)
    }

    /// Whether this comment is visible to readers.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.deleted
    }

    /// Whether this comment counts toward the visible comment counter:
    /// confirmed-or-sending and not soft-deleted. Failed submissions never
    /// inflate the counter.
    #[must_use]
    pub const fn is_countable(&self) -> bool {
        !self.deleted && !matches!(self.send_status, SendStatus::Failed)
    }
}
