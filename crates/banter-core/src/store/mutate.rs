//! Mutation operations: optimistic-first state machines.
//!
//! Every mutation follows the same shape: apply the change locally first,
//! call the server, then reconcile or roll back. Failures are surfaced two
//! ways at once — local state visibly reflects them (a `failed` marker for
//! adds, a snapshot restore for edit/delete/like) *and* the error is
//! re-thrown to the caller. A 401 on any mutation additionally triggers the
//! session's logout exactly once.
//!
//! Rollback here is value-level, in the spirit of compensating events: the
//! pre-mutation snapshot is captured up front and written back wholesale on
//! failure, so a rolled-back mutation is indistinguishable from one that
//! never happened.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::api::CreateCommentRequest;
use crate::error::CommentError;
use crate::merge::{dedupe_by_id, flatten, group_by_parent, merge_comment_update};
use crate::model::{Comment, MAX_BODY_CHARS, SendStatus, ThreadState};
use crate::store::CommentStore;
use crate::transform::comment_from_raw;

// ---------------------------------------------------------------------------
// Item lookup
// ---------------------------------------------------------------------------

/// Position of a comment within a thread's nested items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Top(usize),
    Reply { parent: usize, index: usize },
}

fn locate(items: &[Comment], matches: impl Fn(&Comment) -> bool) -> Option<Slot> {
    for (top, item) in items.iter().enumerate() {
        if matches(item) {
            return Some(Slot::Top(top));
        }
        for (index, reply) in item.replies.iter().enumerate() {
            if matches(reply) {
                return Some(Slot::Reply { parent: top, index });
            }
        }
    }
    None
}

fn slot_mut(items: &mut [Comment], slot: Slot) -> &mut Comment {
    match slot {
        Slot::Top(top) => &mut items[top],
        Slot::Reply { parent, index } => &mut items[parent].replies[index],
    }
}

fn locate_temp(items: &[Comment], temp_id: &str) -> Option<Slot> {
    locate(items, |item| {
        item.client_temp_id.as_deref() == Some(temp_id) || item.id == temp_id
    })
}

/// Validate and trim a comment body.
fn validated_body(text: &str) -> Result<String, CommentError> {
    let body = text.trim();
    let chars = body.chars().count();
    if chars == 0 || chars > MAX_BODY_CHARS {
        return Err(CommentError::InvalidBody { chars });
    }
    Ok(body.to_string())
}

/// Re-normalize after a confirmed insert: collapse any id collision between
/// the replaced placeholder and a row that also arrived via a racing fetch.
fn normalize(state: &mut ThreadState) {
    state.items = group_by_parent(&dedupe_by_id(&flatten(&state.items)));
}

impl CommentStore {
    // -----------------------------------------------------------------------
    // Add / retry / dismiss
    // -----------------------------------------------------------------------

    /// Add a comment (or a reply when `parent_id` is given), optimistically.
    ///
    /// The optimistic row is inserted at the head of its target list before
    /// the create call goes out. On failure it stays visible as `failed`
    /// with a user-facing message, the draft is preserved, and the error is
    /// returned to the caller.
    pub async fn add_comment(
        &self,
        thread_id: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<(), CommentError> {
        let body = validated_body(text)?;
        let viewer = self.session().viewer().ok_or(CommentError::SignedOut)?;

        let temp_id = format!("temp-{}", Uuid::new_v4());
        let request_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let optimistic = Comment {
            id: temp_id.clone(),
            thread_id: thread_id.to_string(),
            author: viewer.as_comment_user(),
            text: body.clone(),
            parent_id: parent_id.map(str::to_string),
            created_at: now,
            updated_at: now,
            edited: false,
            deleted: false,
            like_count: 0,
            liked_by_me: false,
            owned_by_viewer: Some(true),
            send_status: SendStatus::Sending,
            client_temp_id: Some(temp_id.clone()),
            client_request_id: Some(request_id.clone()),
            error_message: None,
            original_content: None,
            replies: Vec::new(),
        };

        let inserted = self.mutate_thread(thread_id, |state| match parent_id {
            None => {
                state.items.insert(0, optimistic.clone());
                state.posting = true;
                true
            }
            Some(parent) => {
                if let Some(slot) = state.items.iter_mut().find(|item| item.id == parent) {
                    slot.replies.insert(0, optimistic.clone());
                    state.posting = true;
                    true
                } else {
                    false
                }
            }
        });
        if !inserted {
            let id = parent_id.unwrap_or_default().to_string();
            return Err(CommentError::NotFound { id });
        }

        debug!(thread_id, temp_id, "optimistic comment inserted");
        self.submit_create(thread_id, &temp_id, &body, parent_id, &request_id)
            .await
    }

    /// Retry a failed submission, reusing its original idempotency key so
    /// the server sees a re-delivered request, never a duplicate. No-op if
    /// the temp id doesn't name a failed item.
    pub async fn retry_add(&self, thread_id: &str, temp_id: &str) -> Result<(), CommentError> {
        let staged = self.mutate_thread(thread_id, |state| {
            let slot = locate_temp(&state.items, temp_id)?;
            let item = slot_mut(&mut state.items, slot);
            if item.send_status != SendStatus::Failed {
                return None;
            }
            item.send_status = SendStatus::Sending;
            item.error_message = None;
            let body = item
                .original_content
                .clone()
                .unwrap_or_else(|| item.text.clone());
            let parent_id = item.parent_id.clone();
            let request_id = item
                .client_request_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            state.posting = true;
            Some((body, parent_id, request_id))
        });
        let Some((body, parent_id, request_id)) = staged else {
            return Ok(());
        };

        debug!(thread_id, temp_id, "retrying failed comment");
        self.submit_create(thread_id, temp_id, &body, parent_id.as_deref(), &request_id)
            .await
    }

    /// Remove a failed submission without retrying. Pure local removal.
    pub fn dismiss_failed(&self, thread_id: &str, temp_id: &str) {
        self.mutate_thread(thread_id, |state| {
            let matches = |item: &Comment| {
                item.send_status == SendStatus::Failed
                    && (item.client_temp_id.as_deref() == Some(temp_id) || item.id == temp_id)
            };
            state.items.retain(|item| !matches(item));
            for item in &mut state.items {
                item.replies.retain(|reply| !matches(reply));
            }
        });
    }

    /// Shared tail of add/retry: call create, then confirm or mark failed.
    async fn submit_create(
        &self,
        thread_id: &str,
        temp_id: &str,
        body: &str,
        parent_id: Option<&str>,
        request_id: &str,
    ) -> Result<(), CommentError> {
        let request = CreateCommentRequest {
            body: body.to_string(),
            parent_id: parent_id.map(str::to_string),
            client_request_id: request_id.to_string(),
        };

        match self.api().create_comment(thread_id, request).await {
            Ok(raw) => {
                let mut confirmed = comment_from_raw(&raw, thread_id);
                if confirmed.id.is_empty() {
                    confirmed.id = temp_id.to_string();
                }
                if confirmed.parent_id.is_none() {
                    confirmed.parent_id = parent_id.map(str::to_string);
                }
                confirmed.owned_by_viewer = confirmed.owned_by_viewer.or(Some(true));

                self.mutate_thread(thread_id, |state| {
                    if let Some(slot) = locate_temp(&state.items, temp_id) {
                        *slot_mut(&mut state.items, slot) = confirmed.clone();
                    } else {
                        // The placeholder is gone (e.g. dismissed during the
                        // round trip); the confirmed row still belongs here.
                        state.items.insert(0, confirmed.clone());
                    }
                    normalize(state);
                    state.posting = false;
                    state.draft.clear();
                });
                self.clear_persisted_draft(thread_id);
                debug!(thread_id, comment_id = %confirmed.id, "comment confirmed");
                Ok(())
            }
            Err(err) => {
                let message = err.user_message();
                self.mutate_thread(thread_id, |state| {
                    if let Some(slot) = locate_temp(&state.items, temp_id) {
                        let item = slot_mut(&mut state.items, slot);
                        item.send_status = SendStatus::Failed;
                        item.error_message = Some(message.clone());
                        item.original_content = Some(body.to_string());
                    }
                    state.posting = false;
                    // The draft is deliberately kept: the typed text must
                    // survive a failed post.
                });
                if err.is_unauthorized() {
                    self.session().logout();
                }
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Edit
    // -----------------------------------------------------------------------

    /// Edit a confirmed comment's text, optimistically.
    pub async fn edit_comment(
        &self,
        thread_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<(), CommentError> {
        let body = validated_body(text)?;

        let snapshot = self.mutate_thread(thread_id, |state| {
            let Some(slot) = locate(&state.items, |item| item.id == comment_id) else {
                return Err(CommentError::NotFound {
                    id: comment_id.to_string(),
                });
            };
            let item = slot_mut(&mut state.items, slot);
            if item.send_status != SendStatus::Sent {
                return Err(CommentError::Unconfirmed {
                    id: comment_id.to_string(),
                });
            }
            let snapshot = item.clone();
            item.text = body.clone();
            item.edited = true;
            item.updated_at = Utc::now();
            Ok(snapshot)
        })?;

        match self.api().edit_comment(comment_id, &body).await {
            Ok(raw) => {
                let incoming = comment_from_raw(&raw, thread_id);
                self.mutate_thread(thread_id, |state| {
                    if let Some(slot) = locate(&state.items, |item| item.id == comment_id) {
                        let item = slot_mut(&mut state.items, slot);
                        let current = item.clone();
                        *item = merge_comment_update(&current, &incoming);
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.mutate_thread(thread_id, |state| {
                    if let Some(slot) = locate(&state.items, |item| item.id == comment_id) {
                        *slot_mut(&mut state.items, slot) = snapshot.clone();
                    }
                });
                if err.is_unauthorized() {
                    self.session().logout();
                }
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete a comment, optimistically removing it from view.
    ///
    /// A top-level row is removed entirely; a reply is removed from its
    /// parent's list (the parent is never removed as a side effect). On
    /// failure the full pre-delete item list is restored — there is no
    /// client-side tombstone.
    pub async fn delete_comment(
        &self,
        thread_id: &str,
        comment_id: &str,
    ) -> Result<(), CommentError> {
        let snapshot = self.mutate_thread(thread_id, |state| {
            let Some(slot) = locate(&state.items, |item| item.id == comment_id) else {
                return Err(CommentError::NotFound {
                    id: comment_id.to_string(),
                });
            };
            let snapshot = state.items.clone();
            match slot {
                Slot::Top(top) => {
                    state.items.remove(top);
                }
                Slot::Reply { parent, index } => {
                    state.items[parent].replies.remove(index);
                }
            }
            Ok(snapshot)
        })?;

        match self.api().delete_comment(comment_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.mutate_thread(thread_id, |state| {
                    state.items = snapshot.clone();
                });
                if err.is_unauthorized() {
                    self.session().logout();
                }
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Like
    // -----------------------------------------------------------------------

    /// Toggle the viewer's like on a comment, optimistically.
    ///
    /// The HTTP verb is chosen from the *pre-toggle* state; if the server
    /// returns authoritative `liked`/`like_count` values they win over the
    /// optimistic guess (another session may have raced us).
    pub async fn toggle_like(
        &self,
        thread_id: &str,
        comment_id: &str,
    ) -> Result<(), CommentError> {
        let snapshot = self.mutate_thread(thread_id, |state| {
            let Some(slot) = locate(&state.items, |item| item.id == comment_id) else {
                return Err(CommentError::NotFound {
                    id: comment_id.to_string(),
                });
            };
            let item = slot_mut(&mut state.items, slot);
            let snapshot = item.clone();
            if snapshot.liked_by_me {
                item.liked_by_me = false;
                item.like_count = item.like_count.saturating_sub(1);
            } else {
                item.liked_by_me = true;
                item.like_count += 1;
            }
            Ok(snapshot)
        })?;

        let result = if snapshot.liked_by_me {
            self.api().unlike_comment(comment_id).await
        } else {
            self.api().like_comment(comment_id).await
        };

        match result {
            Ok(response) => {
                self.mutate_thread(thread_id, |state| {
                    if let Some(slot) = locate(&state.items, |item| item.id == comment_id) {
                        let item = slot_mut(&mut state.items, slot);
                        if let Some(liked) = response.liked {
                            item.liked_by_me = liked;
                        }
                        if let Some(count) = response.like_count {
                            item.like_count = u32::try_from(count.max(0)).unwrap_or(0);
                        }
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.mutate_thread(thread_id, |state| {
                    if let Some(slot) = locate(&state.items, |item| item.id == comment_id) {
                        *slot_mut(&mut state.items, slot) = snapshot.clone();
                    }
                });
                if err.is_unauthorized() {
                    self.session().logout();
                }
                Err(err.into())
            }
        }
    }
}
