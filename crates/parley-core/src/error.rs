//! Error types for the chat core.
//!
//! Two recoverable failure classes exist: [`TransportError`] for any
//! failure communicating with the backing service, and
//! [`ValidationError`] for caller input rejected before a transport
//! call is made. Neither is ever fatal to a session; every suspending
//! operation degrades to an explicit error value.

use thiserror::Error;

use crate::model::{MessageId, RoomId, UserId};

/// Failure communicating with the backing service.
///
/// Always recoverable. The stores report it and leave their state
/// unchanged or reverted to last-known-good, never partially applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Network-level failure (connect, DNS, dropped connection).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("server rejected request: status {code}: {message}")]
    Status {
        /// HTTP-style status code.
        code: u16,
        /// Server-provided failure description.
        message: String,
    },

    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request did not resolve within the transport's timeout.
    #[error("request timed out")]
    Timeout,
}

impl TransportError {
    /// Returns true if this error is transient and may succeed on
    /// retry.
    ///
    /// Malformed responses are never transient; they indicate a
    /// contract mismatch with the server, not a flaky link. The core
    /// never retries automatically either way; this informs the UI's
    /// retry affordance.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { code, .. } => *code >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// Caller-supplied input rejected before any transport call.
///
/// No state mutation occurs when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Message content was empty or whitespace-only.
    #[error("message content is empty")]
    EmptyContent,

    /// A user may not open a room with themself.
    #[error("cannot open a room with yourself (user {user})")]
    SelfRoom {
        /// The id supplied for both participants.
        user: UserId,
    },

    /// The referenced room is not in the local room list.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// The operation requires a selected room and none is selected.
    #[error("no room is selected")]
    NoRoomSelected,

    /// The referenced message is not in the loaded history.
    #[error("unknown message: {0}")]
    UnknownMessage(MessageId),
}

/// Any failure surfaced by a chat core operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Communication with the backing service failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Input was rejected before reaching the transport.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_timeout_are_transient() {
        assert!(TransportError::Network("connection reset".to_owned()).is_transient());
        assert!(TransportError::Timeout.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        assert!(
            TransportError::Status { code: 503, message: "unavailable".to_owned() }.is_transient()
        );
        assert!(
            !TransportError::Status { code: 404, message: "not found".to_owned() }.is_transient()
        );
    }

    #[test]
    fn malformed_responses_are_fatal_to_retry() {
        assert!(!TransportError::Decode("missing field".to_owned()).is_transient());
    }

    #[test]
    fn chat_error_preserves_source_message() {
        let err: ChatError = ValidationError::EmptyContent.into();
        assert_eq!(err.to_string(), "message content is empty");

        let err: ChatError = TransportError::Timeout.into();
        assert_eq!(err.to_string(), "request timed out");
    }
}
