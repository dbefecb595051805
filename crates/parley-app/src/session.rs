//! Chat session controller.
//!
//! [`ChatSession`] is the façade the UI drives. It composes
//! [`RoomStore`] and [`MessageStore`] over an injected
//! [`ChatTransport`] and enforces the cross-cutting protocol rules:
//!
//! - Read-state mutation is coupled to a successful history *load*,
//!   not to room selection, so a room that fails to load never reports
//!   itself as read.
//! - Every history response passes through [`ChatSession::apply_history`],
//!   which discards responses for rooms that are no longer selected
//!   (the stale-response guard).
//! - Sends await the server-assigned message before anything is
//!   appended; a failed send hands the submitted content back to the
//!   caller and drops nothing silently.
//!
//! # State machine
//!
//! ```text
//! NoRoomSelected ──open_room──► LoadingMessages ──ok──► RoomReady
//!        ▲                            │                  │     ▲
//!        │◄──────────load failed──────┘       send_message     │
//!        │                                         ▼           │
//!        └────────────close_room (any state)    Sending ───────┘
//! ```

use parley_core::{
    ChatError, ChatTransport, Message, MessageId, Room, RoomId, UserId, ValidationError,
};
use thiserror::Error;

use crate::{
    message_store::MessageStore,
    room_store::RoomStore,
    state::{MessageView, SessionState},
};

/// Outcome of applying a fetched message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The history was applied to the selected room.
    Applied {
        /// Number of messages now loaded.
        count: usize,
    },
    /// The response belonged to a room that is no longer selected and
    /// was discarded. Not an error: a required control-flow outcome of
    /// switching rooms while a load is in flight.
    Stale {
        /// Room the late response belonged to.
        room_id: RoomId,
    },
}

/// A failed send, carrying the submitted content back to the caller.
///
/// The controller never keeps failed content; returning it here is
/// what guarantees it is available for a retry affordance.
#[derive(Error, Debug)]
#[error("message send failed: {source}")]
pub struct SendError {
    /// The content that failed to send, exactly as submitted.
    pub content: String,
    /// Why the send failed.
    #[source]
    pub source: ChatError,
}

/// The single stateful core a chat UI binds to.
///
/// Constructed once per authenticated session and torn down on logout;
/// all observable state (`rooms`, `messages`, unread total, controller
/// state) is read through the accessors and mutated only by the
/// methods here.
#[derive(Debug)]
pub struct ChatSession<T> {
    transport: T,
    rooms: RoomStore,
    messages: MessageStore,
    state: SessionState,
}

impl<T: ChatTransport> ChatSession<T> {
    /// Create a session for `viewer` over the given transport.
    pub fn new(transport: T, viewer: UserId) -> Self {
        Self {
            transport,
            rooms: RoomStore::new(viewer),
            messages: MessageStore::new(viewer),
            state: SessionState::NoRoomSelected,
        }
    }

    /// Fetch the viewer's rooms and replace the local room list.
    ///
    /// Fail-open: on transport failure the previous valid list (empty
    /// at session start) is kept untouched and the error is surfaced
    /// for the UI to display. No automatic retry. If the reload shows
    /// the selected room no longer exists, the open room is closed.
    pub async fn load_rooms(&mut self) -> Result<(), ChatError> {
        let rooms = match self.transport.list_rooms().await {
            Ok(rooms) => rooms,
            Err(e) => {
                tracing::warn!(error = %e, "room list fetch failed, keeping previous state");
                return Err(e.into());
            },
        };

        self.rooms.replace_all(rooms);
        if self.state.room_id().is_some() && self.rooms.selected().is_none() {
            self.close_room();
        }
        Ok(())
    }

    /// Create the room with `other_user`, or fetch the existing one.
    ///
    /// Rejected before any transport call if `other_user` is the
    /// viewer. The result is inserted at the head of the room list
    /// unless already present (the transport enforces pair uniqueness;
    /// the store additionally dedupes by room id).
    pub async fn create_or_get_room(&mut self, other_user: UserId) -> Result<Room, ChatError> {
        if other_user == self.rooms.viewer() {
            return Err(ValidationError::SelfRoom { user: other_user }.into());
        }

        let room = self.transport.create_or_get_room(other_user).await?;
        tracing::debug!(room = %room.id, other = %other_user, "room created or fetched");
        self.rooms.upsert_front(room.clone());
        Ok(room)
    }

    /// Open a room: select it, load its history, and, once the load
    /// succeeds, mark it read if it had unread messages at selection
    /// time.
    ///
    /// On load failure the selection is cleared and the session returns
    /// to [`SessionState::NoRoomSelected`], so the UI never shows a
    /// stale or half-loaded room. A failure to *persist* the read state
    /// after a successful load is logged and tolerated: the local zero
    /// stands and is reconciled on the next room reload.
    pub async fn open_room(&mut self, room_id: &RoomId) -> Result<(), ChatError> {
        let unread_at_open = self
            .rooms
            .get(room_id)
            .map(|room| room.unread_count)
            .ok_or_else(|| ValidationError::UnknownRoom(room_id.clone()))?;
        self.rooms.select(room_id)?;
        self.messages.clear();
        self.state = SessionState::LoadingMessages { room_id: room_id.clone() };
        tracing::debug!(room = %room_id, unread = unread_at_open, "opening room");

        let history = match self.transport.list_messages(room_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(room = %room_id, error = %e, "history load failed, closing room");
                self.close_room();
                return Err(e.into());
            },
        };

        if let HistoryOutcome::Applied { .. } = self.apply_history(room_id, history)
            && unread_at_open > 0
        {
            if let Err(e) = self.mark_room_read(room_id).await {
                tracing::warn!(room = %room_id, error = %e, "read-state persist failed");
            }
        }
        Ok(())
    }

    /// Apply a fetched history to the session.
    ///
    /// This is the single application point for history responses, and
    /// where the stale-response guard lives: if `room_id` no longer
    /// matches the current selection the history is discarded, so a
    /// slow, late-arriving load can never clobber a newer room's
    /// messages. Also the entry point for a future push-based refresh.
    pub fn apply_history(&mut self, room_id: &RoomId, history: Vec<Message>) -> HistoryOutcome {
        if self.rooms.selected() != Some(room_id) {
            tracing::warn!(room = %room_id, "discarding history for unselected room");
            return HistoryOutcome::Stale { room_id: room_id.clone() };
        }

        let count = history.len();
        self.messages.replace_all(room_id.clone(), history);
        self.state = SessionState::RoomReady { room_id: room_id.clone() };
        tracing::debug!(room = %room_id, count, "history applied");
        HistoryOutcome::Applied { count }
    }

    /// Close the open room, if any. Valid from every state.
    pub fn close_room(&mut self) {
        self.rooms.clear_selection();
        self.messages.clear();
        self.state = SessionState::NoRoomSelected;
    }

    /// Send a message to the open room.
    ///
    /// Rejected before any transport call if no room is open or the
    /// content is empty or whitespace-only. The message is appended
    /// only once the server returns it with its assigned id and
    /// timestamp; there is no speculative placeholder. On failure the
    /// session returns to [`SessionState::RoomReady`] and the error
    /// carries the submitted content for retry.
    pub async fn send_message(&mut self, content: impl Into<String>) -> Result<Message, SendError> {
        let content = content.into();

        let room_id = match &self.state {
            SessionState::RoomReady { room_id } => room_id.clone(),
            _ => {
                return Err(SendError {
                    content,
                    source: ValidationError::NoRoomSelected.into(),
                });
            },
        };
        if content.trim().is_empty() {
            return Err(SendError { content, source: ValidationError::EmptyContent.into() });
        }

        self.state = SessionState::Sending { room_id: room_id.clone() };
        let sent = self.transport.post_message(&room_id, &content).await;
        self.state = SessionState::RoomReady { room_id: room_id.clone() };

        match sent {
            Ok(message) => {
                self.messages.append_confirmed(message.clone());
                self.rooms.apply_incoming_message(&message);
                tracing::debug!(room = %room_id, message = %message.id, "message sent");
                Ok(message)
            },
            Err(e) => {
                tracing::warn!(room = %room_id, error = %e, "message send failed");
                Err(SendError { content, source: e.into() })
            },
        }
    }

    /// Delete one of the viewer's messages from the open room.
    ///
    /// Mirrors the send path's no-optimistic-mutation rule: the local
    /// copy is removed only after the transport confirms, and the
    /// owning room's preview is recomputed from the remaining tail.
    pub async fn delete_message(&mut self, message_id: &MessageId) -> Result<(), ChatError> {
        let room_id = match &self.state {
            SessionState::RoomReady { room_id } => room_id.clone(),
            _ => return Err(ValidationError::NoRoomSelected.into()),
        };
        if !self.messages.contains(message_id) {
            return Err(ValidationError::UnknownMessage(message_id.clone()).into());
        }

        self.transport.delete_message(message_id).await?;
        self.messages.remove(message_id);
        self.rooms.apply_deleted_message(&room_id, self.messages.tail());
        tracing::debug!(room = %room_id, message = %message_id, "message deleted");
        Ok(())
    }

    /// Ask the server for its unread total, for badge reconciliation.
    ///
    /// The local total remains the sum over the room collection (the
    /// invariant the UI can rely on); a divergent server figure is
    /// logged and returned without overwriting the local sum, and
    /// resolves itself on the next room reload.
    pub async fn refresh_unread_total(&mut self) -> Result<u64, ChatError> {
        let server_total = self.transport.unread_total().await?;
        let local_total = self.rooms.total_unread();
        if server_total != local_total {
            tracing::warn!(server_total, local_total, "unread totals diverged, keeping local sum");
        }
        Ok(server_total)
    }

    /// Zero the room's unread count locally, persist the read state,
    /// then recompute the total from the room collection rather than
    /// trusting a server-provided delta.
    async fn mark_room_read(&mut self, room_id: &RoomId) -> Result<(), ChatError> {
        self.rooms.mark_read_local(room_id);
        self.transport.mark_read(room_id).await?;
        Ok(())
    }

    /// Current controller state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The viewer this session authenticates as.
    pub fn viewer(&self) -> UserId {
        self.rooms.viewer()
    }

    /// Rooms ordered by last activity, most recent first.
    pub fn rooms(&self) -> &[Room] {
        self.rooms.rooms()
    }

    /// The selected room, if any.
    pub fn selected_room(&self) -> Option<&Room> {
        self.rooms.selected_room()
    }

    /// History of the selected room, `(created_at, id)` ascending.
    pub fn messages(&self) -> &[MessageView] {
        self.messages.messages()
    }

    /// Sum of unread counts across all rooms.
    pub fn total_unread(&self) -> u64 {
        self.rooms.total_unread()
    }
}
