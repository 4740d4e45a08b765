//! Subscription surface: the derived, read-only per-thread view.

use crate::model::{Comment, ThreadStatus};
use crate::store::CommentStore;

/// Everything a consumer needs to render one thread. Derived on read, never
/// stored redundantly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    /// Top-level comments with soft-deleted entries filtered at both levels.
    /// Failed submissions remain visible here until retried or dismissed.
    pub comments: Vec<Comment>,
    /// Count of non-deleted, non-failed items, top-level plus replies. A
    /// failed (unconfirmed) comment never inflates this.
    pub comment_count: usize,
    pub status: ThreadStatus,
    pub draft: String,
    pub posting: bool,
    /// Whether another page exists (cursor presence).
    pub has_more: bool,
    /// Deep-link scroll target, if one is active.
    pub highlighted_id: Option<String>,
}

impl CommentStore {
    /// The derived view for one thread.
    #[must_use]
    pub fn thread_view(&self, thread_id: &str) -> ThreadView {
        let state = self.snapshot(thread_id);

        let comments: Vec<Comment> = state
            .items
            .iter()
            .filter(|item| item.is_visible())
            .map(|item| {
                let mut item = item.clone();
                item.replies.retain(Comment::is_visible);
                item
            })
            .collect();

        let comment_count = comments
            .iter()
            .map(|item| {
                usize::from(item.is_countable())
                    + item.replies.iter().filter(|reply| reply.is_countable()).count()
            })
            .sum();

        ThreadView {
            comments,
            comment_count,
            status: state.status,
            draft: state.draft,
            posting: state.posting,
            has_more: state.cursor.is_some(),
            highlighted_id: state.highlighted_id,
        }
    }

    /// Convenience accessor for the visible comment counter.
    #[must_use]
    pub fn comment_count(&self, thread_id: &str) -> usize {
        self.thread_view(thread_id).comment_count
    }
}
