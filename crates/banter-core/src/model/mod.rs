//! Canonical entities and per-thread state.

pub mod comment;
pub mod thread;

pub use comment::{
    ANONYMOUS_USERNAME, BadgeTier, Comment, CommentUser, MAX_BODY_CHARS, SendStatus,
};
pub use thread::{PAGE_SIZE, ThreadState, ThreadStatus};
