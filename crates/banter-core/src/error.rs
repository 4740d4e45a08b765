//! Error types for the transport contract and the mutation paths.
//!
//! Classification is purely a function of the thrown error's shape:
//!
//! | Shape | Class |
//! |---|---|
//! | no HTTP status obtained | `network_error` |
//! | status >= 500 | `server_error` |
//! | status in [400, 500) | `client_error` |
//! | body failed to decode | `parse_error` |
//!
//! Fetch-path errors are recorded as thread status and never propagate past
//! the engine. Mutation-path errors update local state (failed marker or
//! rollback) *and* re-surface to the caller as [`CommentError`].

use crate::model::{MAX_BODY_CHARS, ThreadStatus};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Typed transport error surfaced by the injected API client.
///
/// Retries, timeouts, and header handling belong to the client; the engine
/// only needs the status (when one exists) and any server-provided message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("http status {status}")]
    Status {
        status: u16,
        /// Server-provided human message, when the body carried one.
        message: Option<String>,
    },
    /// The request never produced an HTTP status.
    #[error("network failure: {0}")]
    Network(String),
    /// The response body could not be decoded as expected.
    #[error("response decode failed: {0}")]
    Parse(String),
}

impl ApiError {
    /// The HTTP status, if one was obtained.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(_) | Self::Parse(_) => None,
        }
    }

    /// Whether this failure must trigger the logout collaborator.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Classify into the thread-status error taxonomy.
    #[must_use]
    pub const fn classify(&self) -> ThreadStatus {
        match self {
            Self::Network(_) => ThreadStatus::NetworkError,
            Self::Parse(_) => ThreadStatus::ParseError,
            Self::Status { status, .. } => {
                if *status >= 500 {
                    ThreadStatus::ServerError
                } else {
                    ThreadStatus::ClientError
                }
            }
        }
    }

    /// User-facing message for this failure.
    ///
    /// Known client statuses get fixed copy; otherwise any server-provided
    /// message wins, then a per-class fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "No connection. Check your network and try again.".to_string(),
            Self::Parse(_) => "Something went wrong reading the server response.".to_string(),
            Self::Status { status, message } => match status {
                401 => "Session expired. Please sign in again.".to_string(),
                403 => "Account suspended. You can't comment right now.".to_string(),
                409 => "Account issue. Restore your account to comment.".to_string(),
                422 => "Invalid comment. Please revise and try again.".to_string(),
                _ => message.clone().unwrap_or_else(|| {
                    if *status >= 500 {
                        "Server error. Please try again shortly.".to_string()
                    } else {
                        "Request failed. Please try again.".to_string()
                    }
                }),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// CommentError
// ---------------------------------------------------------------------------

/// Failure surfaced to callers of the mutation operations.
///
/// By the time one of these is returned, local state already reflects the
/// failure (a visibly failed item, or a rollback to the pre-mutation
/// snapshot) — callers only need it for toasts and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentError {
    /// Body was empty or longer than [`MAX_BODY_CHARS`] after trimming.
    #[error("comment body must be 1-{MAX_BODY_CHARS} characters (got {chars})")]
    InvalidBody { chars: usize },
    /// No current viewer; mutations require a signed-in user.
    #[error("not signed in")]
    SignedOut,
    /// The referenced comment (or parent) is not in this thread's state.
    #[error("comment '{id}' not found in thread")]
    NotFound { id: String },
    /// The operation requires a server-confirmed comment id.
    #[error("comment '{id}' is not confirmed yet")]
    Unconfirmed { id: String },
    /// The underlying API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_error_shape() {
        let network = ApiError::Network("dns".into());
        assert_eq!(network.classify(), ThreadStatus::NetworkError);
        assert_eq!(network.status(), None);

        let parse = ApiError::Parse("unexpected eof".into());
        assert_eq!(parse.classify(), ThreadStatus::ParseError);

        let server = ApiError::Status { status: 503, message: None };
        assert_eq!(server.classify(), ThreadStatus::ServerError);

        let client = ApiError::Status { status: 422, message: None };
        assert_eq!(client.classify(), ThreadStatus::ClientError);
    }

    #[test]
    fn known_client_statuses_get_fixed_copy() {
        let unauthorized = ApiError::Status { status: 401, message: None };
        assert!(unauthorized.is_unauthorized());
        assert!(unauthorized.user_message().contains("Session expired"));

        let suspended = ApiError::Status { status: 403, message: None };
        assert!(suspended.user_message().contains("suspended"));

        let conflict = ApiError::Status { status: 409, message: None };
        assert!(conflict.user_message().contains("Restore"));
    }

    #[test]
    fn server_message_wins_for_other_statuses() {
        let err = ApiError::Status {
            status: 418,
            message: Some("I'm a teapot".into()),
        };
        assert_eq!(err.user_message(), "I'm a teapot");
        assert!(!err.is_unauthorized());
    }
}
