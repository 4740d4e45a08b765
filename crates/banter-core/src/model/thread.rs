//! Per-thread state: the unit of the keyed store map.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::comment::Comment;

/// Fixed page size for list requests.
pub const PAGE_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// ThreadStatus
// ---------------------------------------------------------------------------

/// Fetch lifecycle for one thread.
///
/// The four error variants mirror the transport error taxonomy: they are
/// recorded on the thread (retryable by fetching again) and never thrown
/// past the engine boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    /// Never fetched.
    #[default]
    Idle,
    /// Initial page request in flight.
    Loading,
    /// At least one page committed.
    Loaded,
    /// "Load more" request in flight.
    Paginating,
    /// No HTTP status was obtained.
    NetworkError,
    /// HTTP status >= 500.
    ServerError,
    /// HTTP status in [400, 500).
    ClientError,
    /// Response body could not be decoded.
    ParseError,
}

impl ThreadStatus {
    /// Return the status name as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Paginating => "paginating",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::ParseError => "parse_error",
        }
    }

    /// Whether this is one of the four recorded error states.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::ServerError | Self::ClientError | Self::ParseError
        )
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ThreadState
// ---------------------------------------------------------------------------

/// Everything the engine tracks for a single thread id.
///
/// `items` is the raw internal sequence: top-level comments carrying inline
/// replies, in server order with optimistic inserts at the head. Readers
/// never see it directly — the subscription surface derives filtered views.
#[derive(Debug, Clone, Default)]
pub struct ThreadState {
    pub items: Vec<Comment>,
    /// Opaque pagination token; `None` once the last page was consumed.
    pub cursor: Option<String>,
    pub status: ThreadStatus,
    /// Composer draft, mirrored to the injected draft store.
    pub draft: String,
    /// True while any add/retry is in flight for this thread.
    pub posting: bool,
    /// Deep-link scroll target; auto-cleared after a fixed delay.
    pub highlighted_id: Option<String>,
}

impl ThreadState {
    /// Count of flattened items (top-level plus replies), before any read
    /// filtering. Used for pagination offset math.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.items
            .iter()
            .map(|item| 1 + item.replies.len())
            .sum()
    }
}
