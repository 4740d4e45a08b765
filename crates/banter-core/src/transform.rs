//! Raw server record → canonical [`Comment`].
//!
//! Server payloads for the same comment arrive in several shapes: list rows
//! flatten the author onto the comment (`username`, `avatar_url`), detail
//! rows embed a `user` object, and older endpoints rename half the fields
//! (`body` vs `content`, `like_count` vs `likes_count`, ...). [`RawComment`]
//! absorbs all of them with serde aliases and optional fields; the
//! transformer computes derived flags and degrades missing data to safe
//! defaults instead of failing.
//!
//! The transform is a pure total function: no clock, no network, no panics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BadgeTier, Comment, CommentUser, SendStatus};

/// Sentinel body some endpoints substitute for a soft-deleted comment.
const DELETED_BODY_SENTINEL: &str = "[deleted]";

// ---------------------------------------------------------------------------
// Raw wire records
// ---------------------------------------------------------------------------

/// Author identity as it appears nested inside a raw comment row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, alias = "user_id")]
    pub id: Option<String>,
    #[serde(default, alias = "handle")]
    pub username: Option<String>,
    #[serde(default, alias = "display_name")]
    pub full_name: Option<String>,
    #[serde(default, alias = "avatar")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "verified")]
    pub is_verified: Option<bool>,
    #[serde(default, alias = "badge_tier")]
    pub badge: Option<String>,
}

/// A comment row as returned by any of the REST endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    #[serde(default, alias = "uuid", alias = "comment_id")]
    pub id: Option<String>,
    #[serde(default, alias = "prediction_id", alias = "post_id")]
    pub thread_id: Option<String>,
    #[serde(default, alias = "author_id", alias = "owner_id")]
    pub user_id: Option<String>,
    #[serde(default, alias = "body", alias = "text")]
    pub content: Option<String>,
    #[serde(default, alias = "parent_id")]
    pub parent_comment_id: Option<String>,
    #[serde(default, alias = "edited")]
    pub is_edited: Option<bool>,
    #[serde(default, alias = "deleted")]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Some endpoints report lifecycle as a string instead of flags.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded author object (detail endpoints).
    #[serde(default)]
    pub user: Option<RawUser>,
    /// Flattened author fields (list endpoints).
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default, alias = "like_count")]
    pub likes_count: Option<i64>,
    #[serde(default, alias = "is_liked_by_user", alias = "liked")]
    pub is_liked: Option<bool>,
    #[serde(default, alias = "is_owner", alias = "is_mine")]
    pub is_owned_by_viewer: Option<bool>,
    #[serde(default)]
    pub replies: Vec<RawComment>,
}

// ---------------------------------------------------------------------------
// Transformer
// ---------------------------------------------------------------------------

/// Build the canonical author from whichever identity fields are present.
fn author_from_raw(raw: &RawComment) -> CommentUser {
    let nested = raw.user.clone().unwrap_or_default();

    let id = nested
        .id
        .or_else(|| raw.user_id.clone())
        .unwrap_or_default();

    let username = nested
        .username
        .or_else(|| raw.username.clone())
        .or_else(|| nested.full_name.clone())
        .filter(|name| !CommentUser::is_placeholder_name(name))
        .unwrap_or_else(|| CommentUser::anonymous().username);

    let display_name = nested
        .full_name
        .filter(|name| !CommentUser::is_placeholder_name(name));

    let avatar_url = nested.avatar_url.or_else(|| raw.avatar_url.clone());

    let verified = nested.is_verified.or(raw.is_verified).unwrap_or(false);

    let badge = nested
        .badge
        .and_then(|tier| tier.parse::<BadgeTier>().ok());

    CommentUser {
        id,
        username,
        display_name,
        avatar_url,
        verified,
        badge,
    }
}

/// Whether the row is effectively soft-deleted.
///
/// No single field can be trusted: an explicit flag, a deletion timestamp, a
/// `"deleted"` lifecycle string, and the `[deleted]` body sentinel have all
/// been observed, depending on the endpoint.
#[must_use]
pub fn is_effectively_deleted(raw: &RawComment) -> bool {
    raw.is_deleted == Some(true)
        || raw.deleted_at.is_some()
        || raw.status.as_deref() == Some("deleted")
        || raw.content.as_deref().map(str::trim) == Some(DELETED_BODY_SENTINEL)
}

/// Transform a raw server row into the canonical entity.
///
/// `fallback_thread_id` fills in when the row omits its thread; list and
/// detail callers always know which thread they asked about. Nested replies
/// are transformed recursively and keep their own parent pointers.
///
/// Missing fields degrade: author to "Anonymous", counts to zero, timestamps
/// to the Unix epoch. Server rows are always [`SendStatus::Sent`].
#[must_use]
pub fn comment_from_raw(raw: &RawComment, fallback_thread_id: &str) -> Comment {
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    let thread_id = raw
        .thread_id
        .clone()
        .unwrap_or_else(|| fallback_thread_id.to_string());

    let replies = raw
        .replies
        .iter()
        .map(|reply| comment_from_raw(reply, &thread_id))
        .collect();

    Comment {
        id: raw.id.clone().unwrap_or_default(),
        thread_id,
        author: author_from_raw(raw),
        text: raw.content.clone().unwrap_or_default(),
        parent_id: raw.parent_comment_id.clone(),
        created_at: raw.created_at.unwrap_or(epoch),
        updated_at: raw.updated_at.or(raw.created_at).unwrap_or(epoch),
        edited: raw.is_edited.unwrap_or(false),
        deleted: is_effectively_deleted(raw),
        like_count: raw
            .likes_count
            .and_then(|count| u32::try_from(count).ok())
            .unwrap_or(0),
        liked_by_me: raw.is_liked.unwrap_or(false),
        owned_by_viewer: raw.is_owned_by_viewer,
        send_status: SendStatus::Sent,
        client_temp_id: None,
        client_request_id: None,
        error_message: None,
        original_content: None,
        replies,
    }
}
