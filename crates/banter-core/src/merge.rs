//! Merge/dedupe kernel: pure reconciliation of comment lists.
//!
//! Every fetch and mutation reconciliation funnels through the four
//! operations in this module, so they are total functions — no network, no
//! clock, no panics — and safe to race: a retry landing concurrently with a
//! fresh fetch converges because both paths dedupe by id and merge
//! field-wise instead of overwriting.
//!
//! # Merge Semantics
//!
//! When a previously-known comment reappears in a server payload, an
//! incoming field replaces the existing one only if it is a *real* value:
//! non-empty, and not a generic placeholder such as "Anonymous". A partial
//! or summary payload therefore never clobbers richer previously-known
//! profile data. Counters and the viewer-liked flag are taken from the
//! server-confirmed side, which is authoritative for them.
//!
//! # Ordering
//!
//! Order is never invented here: [`dedupe_by_id`] keeps first-occurrence
//! order, [`upsert_list`] keeps existing order and places incoming-only
//! items at the head or tail as requested, and [`group_by_parent`] preserves
//! encounter order within each level.

use std::collections::{HashMap, HashSet};

use crate::model::{Comment, CommentUser, SendStatus};

// ---------------------------------------------------------------------------
// Field-wise merge
// ---------------------------------------------------------------------------

/// Merge author identities, never regressing to a placeholder.
fn merge_author(existing: &CommentUser, incoming: &CommentUser) -> CommentUser {
    CommentUser {
        id: if incoming.id.trim().is_empty() {
            existing.id.clone()
        } else {
            incoming.id.clone()
        },
        username: if CommentUser::is_placeholder_name(&incoming.username) {
            existing.username.clone()
        } else {
            incoming.username.clone()
        },
        display_name: incoming
            .display_name
            .clone()
            .filter(|name| !CommentUser::is_placeholder_name(name))
            .or_else(|| existing.display_name.clone()),
        avatar_url: incoming
            .avatar_url
            .clone()
            .or_else(|| existing.avatar_url.clone()),
        // A verified flag, once observed, is not forgotten by a summary row.
        verified: incoming.verified || existing.verified,
        badge: incoming.badge.or(existing.badge),
    }
}

/// Field-wise reconciliation of one comment against a newer payload for the
/// same id.
///
/// Rules:
/// - text/author fields: incoming wins only with a real (non-placeholder)
///   value;
/// - `owned_by_viewer`: whichever side has an explicit boolean, preferring
///   incoming;
/// - `like_count`/`liked_by_me`: the server-confirmed side wins;
/// - `send_status`: `Sent` is absorbing — once either side is confirmed the
///   result is confirmed and the client-only bookkeeping fields are cleared;
/// - nested replies merge recursively via [`upsert_list`].
#[must_use]
pub fn merge_comment_update(existing: &Comment, incoming: &Comment) -> Comment {
    let confirmed =
        existing.send_status == SendStatus::Sent || incoming.send_status == SendStatus::Sent;
    let send_status = if confirmed {
        SendStatus::Sent
    } else {
        incoming.send_status
    };

    // Counters come from whichever side the server has confirmed; when both
    // are confirmed the incoming payload is newer.
    let (like_count, liked_by_me) = if incoming.send_status == SendStatus::Sent {
        (incoming.like_count, incoming.liked_by_me)
    } else {
        (existing.like_count, existing.liked_by_me)
    };

    let epoch = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;

    Comment {
        id: if incoming.id.is_empty() {
            existing.id.clone()
        } else {
            incoming.id.clone()
        },
        thread_id: if incoming.thread_id.is_empty() {
            existing.thread_id.clone()
        } else {
            incoming.thread_id.clone()
        },
        author: merge_author(&existing.author, &incoming.author),
        text: if incoming.text.trim().is_empty() {
            existing.text.clone()
        } else {
            incoming.text.clone()
        },
        parent_id: incoming
            .parent_id
            .clone()
            .or_else(|| existing.parent_id.clone()),
        created_at: if existing.created_at == epoch {
            incoming.created_at
        } else {
            existing.created_at
        },
        updated_at: existing.updated_at.max(incoming.updated_at),
        edited: existing.edited || incoming.edited,
        deleted: existing.deleted || incoming.deleted,
        like_count,
        liked_by_me,
        owned_by_viewer: incoming.owned_by_viewer.or(existing.owned_by_viewer),
        send_status,
        client_temp_id: if confirmed {
            None
        } else {
            incoming
                .client_temp_id
                .clone()
                .or_else(|| existing.client_temp_id.clone())
        },
        client_request_id: if confirmed {
            None
        } else {
            incoming
                .client_request_id
                .clone()
                .or_else(|| existing.client_request_id.clone())
        },
        error_message: if confirmed {
            None
        } else {
            incoming
                .error_message
                .clone()
                .or_else(|| existing.error_message.clone())
        },
        original_content: if confirmed {
            None
        } else {
            incoming
                .original_content
                .clone()
                .or_else(|| existing.original_content.clone())
        },
        replies: upsert_list(&existing.replies, &incoming.replies, false),
    }
}

// ---------------------------------------------------------------------------
// List operations
// ---------------------------------------------------------------------------

/// Merge two lists by id.
///
/// Items present in both are merged via [`merge_comment_update`]; items only
/// in `incoming` are inserted (prepended when `prepend_new`, else appended,
/// keeping their relative order); items only in `existing` are untouched.
#[must_use]
pub fn upsert_list(existing: &[Comment], incoming: &[Comment], prepend_new: bool) -> Vec<Comment> {
    let mut merged: Vec<Comment> = existing.to_vec();
    let mut fresh: Vec<Comment> = Vec::new();

    for item in incoming {
        if let Some(slot) = merged.iter_mut().find(|known| known.id == item.id) {
            *slot = merge_comment_update(slot, item);
        } else {
            fresh.push(item.clone());
        }
    }

    if prepend_new {
        fresh.extend(merged);
        fresh
    } else {
        merged.extend(fresh);
        merged
    }
}

/// Collapse a flat sequence into unique-by-id, first-occurrence order.
///
/// Duplicates are merged into the first occurrence in encounter order, so
/// `dedupe_by_id(dedupe_by_id(x)) == dedupe_by_id(x)`.
#[must_use]
pub fn dedupe_by_id(items: &[Comment]) -> Vec<Comment> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<Comment> = Vec::with_capacity(items.len());

    for item in items {
        if let Some(&at) = index.get(&item.id) {
            unique[at] = merge_comment_update(&unique[at], item);
        } else {
            index.insert(item.id.clone(), unique.len());
            unique.push(item.clone());
        }
    }

    unique
}

/// Flatten nested top-level-with-replies into a single sequence with
/// `parent_id` pointers. Each parent precedes its own replies.
#[must_use]
pub fn flatten(items: &[Comment]) -> Vec<Comment> {
    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        let mut top = item.clone();
        let replies = std::mem::take(&mut top.replies);
        flat.push(top);
        // Depth is capped at two, but a malformed payload can nest deeper;
        // hoist everything so no row is lost.
        flat.extend(flatten(&replies));
    }
    flat
}

/// Regroup a flat sequence into nested top-level-with-inline-replies.
///
/// A row whose `parent_id` names a top-level row becomes its reply. A row
/// whose `parent_id` names another reply — or nothing present at all — is
/// reclassified as top-level rather than dropped: two-plus nesting is
/// invalid, and losing data is worse than flattening it.
#[must_use]
pub fn group_by_parent(flat: &[Comment]) -> Vec<Comment> {
    let top_ids: HashSet<&str> = flat
        .iter()
        .filter(|item| item.parent_id.is_none())
        .map(|item| item.id.as_str())
        .collect();

    let mut grouped: Vec<Comment> = Vec::new();
    let mut slot_of: HashMap<String, usize> = HashMap::new();

    for item in flat {
        let attachable = item
            .parent_id
            .as_deref()
            .is_some_and(|parent| top_ids.contains(parent));

        if item.parent_id.is_none() || !attachable {
            slot_of.insert(item.id.clone(), grouped.len());
            grouped.push(item.clone());
        }
    }

    for item in flat {
        let Some(parent) = item.parent_id.as_deref() else {
            continue;
        };
        if !top_ids.contains(parent) {
            continue;
        }
        if let Some(&at) = slot_of.get(parent) {
            let mut reply = item.clone();
            reply.replies.clear();
            grouped[at].replies.push(reply);
        }
    }

    grouped
}
