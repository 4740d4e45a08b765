//! Viewer identity and logout collaborator.

use crate::model::{BadgeTier, CommentUser};

/// The current signed-in viewer, as provided by the host's auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub verified: bool,
    pub badge: Option<BadgeTier>,
}

impl Viewer {
    /// Author snapshot for an optimistic comment written by this viewer.
    #[must_use]
    pub fn as_comment_user(&self) -> CommentUser {
        CommentUser {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            verified: self.verified,
            badge: self.badge,
        }
    }
}

/// Injected session collaborator.
///
/// The engine consumes exactly two things from the auth layer: "who is the
/// viewer right now" and a logout side effect, which is triggered once per
/// 401-failed mutation.
pub trait Session: Send + Sync {
    /// The current viewer, or `None` when signed out.
    fn viewer(&self) -> Option<Viewer>;

    /// Invalidate the session (the host decides what that means).
    fn logout(&self);
}
