//! Fetch operations: initial load, pagination, deep-link fetch-by-id.
//!
//! All three paths commit through the merge kernel so that server truth
//! never discards in-flight optimistic or failed items, and none of them
//! propagates an error past the engine — failures are recorded as thread
//! status (initial/paginate) or logged (deep link on an already-loaded
//! thread).

use tracing::{debug, warn};

use crate::api::CommentPage;
use crate::merge::{dedupe_by_id, flatten, group_by_parent, merge_comment_update, upsert_list};
use crate::model::{Comment, PAGE_SIZE, ThreadStatus};
use crate::store::CommentStore;
use crate::transform::comment_from_raw;

/// Transform one page into visible canonical rows, flattened.
fn visible_flat(page: &CommentPage, thread_id: &str) -> Vec<Comment> {
    let rows: Vec<Comment> = page
        .comments
        .iter()
        .map(|raw| comment_from_raw(raw, thread_id))
        .collect();
    flatten(&rows)
        .into_iter()
        .filter(Comment::is_visible)
        .collect()
}

impl CommentStore {
    // -----------------------------------------------------------------------
    // Initial load
    // -----------------------------------------------------------------------

    /// Load the first page for a thread.
    ///
    /// A second call while one is already `Loading` is an idempotent no-op.
    /// A 404 means the thread simply has no comments yet. Items already in
    /// memory — including `sending`/`failed` local-only ones — survive both
    /// success and failure.
    pub async fn fetch_comments(&self, thread_id: &str) {
        let started = self.mutate_thread(thread_id, |state| {
            if state.status == ThreadStatus::Loading {
                return false;
            }
            state.status = ThreadStatus::Loading;
            true
        });
        if !started {
            debug!(thread_id, "fetch already in flight, skipping");
            return;
        }

        match self.api().list_comments(thread_id, 1, PAGE_SIZE).await {
            Ok(page) => {
                let server_flat = visible_flat(&page, thread_id);
                self.mutate_thread(thread_id, |state| {
                    // Local-only items must survive the fetch: replies first,
                    // then top-level, appended after server truth.
                    let current = flatten(&state.items);
                    let mut combined = server_flat.clone();
                    combined.extend(
                        current
                            .iter()
                            .filter(|item| item.is_local_only() && item.parent_id.is_some())
                            .cloned(),
                    );
                    combined.extend(
                        current
                            .iter()
                            .filter(|item| item.is_local_only() && item.parent_id.is_none())
                            .cloned(),
                    );
                    state.items = group_by_parent(&dedupe_by_id(&combined));
                    state.cursor = page.has_next.then(|| "2".to_string());
                    state.status = ThreadStatus::Loaded;
                });
                debug!(thread_id, count = server_flat.len(), "thread loaded");
            }
            Err(err) if err.status() == Some(404) => {
                // Not-found on the list endpoint means "no comments yet".
                self.mutate_thread(thread_id, |state| {
                    let current = flatten(&state.items);
                    let local_only: Vec<Comment> = current
                        .iter()
                        .filter(|item| item.is_local_only())
                        .cloned()
                        .collect();
                    state.items = group_by_parent(&dedupe_by_id(&local_only));
                    state.cursor = None;
                    state.status = ThreadStatus::Loaded;
                });
            }
            Err(err) => {
                warn!(thread_id, error = %err, "failed to load thread");
                self.mutate_thread(thread_id, |state| {
                    state.status = err.classify();
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pagination
    // -----------------------------------------------------------------------

    /// Load the next page. No-op without a cursor or while already
    /// paginating. On failure the items and cursor are kept so the user can
    /// retry.
    pub async fn fetch_more(&self, thread_id: &str) {
        let next_page = self.mutate_thread(thread_id, |state| {
            if state.status == ThreadStatus::Paginating || state.cursor.is_none() {
                return None;
            }
            // Cursor carries the next page number; fall back to offset math
            // so a lost cursor cannot re-request page one.
            let fallback =
                u32::try_from(state.raw_len()).unwrap_or(u32::MAX) / PAGE_SIZE + 1;
            let page = state
                .cursor
                .as_deref()
                .and_then(|cursor| cursor.parse::<u32>().ok())
                .unwrap_or(fallback);
            state.status = ThreadStatus::Paginating;
            Some(page)
        });
        let Some(page_number) = next_page else {
            return;
        };

        match self.api().list_comments(thread_id, page_number, PAGE_SIZE).await {
            Ok(page) => {
                let incoming = visible_flat(&page, thread_id);
                self.mutate_thread(thread_id, |state| {
                    let mut combined = flatten(&state.items);
                    combined.extend(incoming.iter().cloned());
                    state.items = group_by_parent(&dedupe_by_id(&combined));
                    state.cursor = page.has_next.then(|| (page_number + 1).to_string());
                    state.status = ThreadStatus::Loaded;
                });
            }
            Err(err) => {
                warn!(thread_id, page = page_number, error = %err, "pagination failed");
                self.mutate_thread(thread_id, |state| {
                    state.status = err.classify();
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Deep link
    // -----------------------------------------------------------------------

    /// Fetch a single comment (plus thread context) and merge it in.
    ///
    /// Strictly additive/corrective: data already present from a prior full
    /// fetch is merged, never duplicated or regressed. On success the target
    /// is highlighted for scroll-to, auto-clearing after a fixed delay.
    pub async fn fetch_comment_by_id(&self, thread_id: &str, comment_id: &str) {
        match self.api().get_comment(thread_id, comment_id).await {
            Ok(lookup) => {
                let target = comment_from_raw(&lookup.comment, thread_id);
                let fetched_parent = lookup
                    .parent
                    .as_ref()
                    .map(|raw| comment_from_raw(raw, thread_id));
                let context: Vec<Comment> = lookup
                    .replies
                    .iter()
                    .map(|raw| comment_from_raw(raw, thread_id))
                    .filter(Comment::is_visible)
                    .collect();

                self.mutate_thread(thread_id, |state| {
                    if let Some(parent_id) = target.parent_id.clone() {
                        merge_reply_target(state, &parent_id, &target, fetched_parent, &context);
                    } else {
                        merge_top_level_target(state, &target, &context);
                    }
                    // A reply that first arrived without parent context sits
                    // top-level; once the parent is known, regrouping folds
                    // that stray copy back into its reply list.
                    state.items = group_by_parent(&dedupe_by_id(&flatten(&state.items)));
                    state.highlighted_id = Some(comment_id.to_string());
                    if state.status == ThreadStatus::Idle {
                        state.status = ThreadStatus::Loaded;
                    }
                });
                self.schedule_highlight_clear(thread_id, comment_id);
            }
            Err(err) => {
                warn!(thread_id, comment_id, error = %err, "deep-link fetch failed");
                // Only surface the error when nothing is loaded yet; a
                // deep-link miss must not blank an already-visible thread.
                self.mutate_thread(thread_id, |state| {
                    if state.status == ThreadStatus::Idle {
                        state.status = err.classify();
                    }
                });
            }
        }
    }
}

/// Merge a fetched reply (and its siblings) into the parent's reply list,
/// materializing the parent if it isn't known locally.
fn merge_reply_target(
    state: &mut crate::model::ThreadState,
    parent_id: &str,
    target: &Comment,
    fetched_parent: Option<Comment>,
    siblings: &[Comment],
) {
    let slot = state.items.iter().position(|item| item.id == parent_id);
    let parent = match (slot, fetched_parent) {
        (Some(at), Some(fetched)) => Some(merge_comment_update(&state.items[at], &fetched)),
        (Some(at), None) => Some(state.items[at].clone()),
        (None, Some(fetched)) => Some(fetched),
        (None, None) => None,
    };

    if let Some(mut parent) = parent {
        let mut incoming = Vec::with_capacity(1 + siblings.len());
        incoming.push(target.clone());
        incoming.extend(siblings.iter().cloned());
        let incoming = dedupe_by_id(&incoming);
        parent.replies = upsert_list(&parent.replies, &incoming, true);
        match slot {
            Some(at) => state.items[at] = parent,
            None => state.items.insert(0, parent),
        }
    } else {
        // Parent unknown locally and not returned by the server: surface
        // the reply as top-level rather than dropping it.
        state.items = upsert_list(&state.items, std::slice::from_ref(target), true);
    }
}

/// Merge a fetched top-level comment (and any returned replies) in place.
fn merge_top_level_target(
    state: &mut crate::model::ThreadState,
    target: &Comment,
    replies: &[Comment],
) {
    state.items = upsert_list(&state.items, std::slice::from_ref(target), true);
    if replies.is_empty() {
        return;
    }
    if let Some(slot) = state.items.iter_mut().find(|item| item.id == target.id) {
        slot.replies = upsert_list(&slot.replies, &dedupe_by_id(replies), true);
    }
}
