//! Observable view types.
//!
//! These are the read-only shapes the UI renders from: the controller
//! state machine and the per-message view annotated for the current
//! viewer.

use parley_core::{Message, RoomId};

/// Controller state, one machine per session.
///
/// Transitions are driven exclusively by [`crate::ChatSession`]
/// methods; see the session documentation for the full diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No conversation is open.
    NoRoomSelected,
    /// A room was selected and its history load is in flight.
    LoadingMessages {
        /// Room whose history is loading.
        room_id: RoomId,
    },
    /// A room is open with its history loaded.
    RoomReady {
        /// The open room.
        room_id: RoomId,
    },
    /// A message submit is in flight for the open room.
    Sending {
        /// The open room.
        room_id: RoomId,
    },
}

impl SessionState {
    /// The room this state refers to, if any.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::NoRoomSelected => None,
            Self::LoadingMessages { room_id }
            | Self::RoomReady { room_id }
            | Self::Sending { room_id } => Some(room_id),
        }
    }
}

/// A message annotated for display to the current viewer.
///
/// `is_own` is derived, never persisted: it is recomputed whenever
/// history is loaded or a message is appended, against the session's
/// current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// The underlying message.
    pub message: Message,
    /// Whether the session's current user authored it.
    pub is_own: bool,
}
