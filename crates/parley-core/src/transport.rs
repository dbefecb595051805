//! Transport abstraction for room/message CRUD.
//!
//! The [`ChatTransport`] trait is the single seam between the chat core
//! and whatever performs the actual network I/O. The core depends on it
//! only through this interface; consumers are generic over the
//! implementation rather than holding trait objects.
//!
//! All operations are asynchronous request/response. They suspend the
//! calling logical task until resolution and must eventually resolve to
//! success or a reported [`TransportError`]; request timeout policy is
//! the implementation's concern.

use std::future::Future;

use crate::{
    error::TransportError,
    model::{Message, MessageId, Room, RoomId, UserId},
};

/// Async request/response interface to the chat backend.
///
/// The current user is implicit: an implementation is constructed for
/// one authenticated viewer and every operation acts on that viewer's
/// behalf.
pub trait ChatTransport: Send + Sync {
    /// Create the room for `(viewer, other_user)` or return the
    /// existing one.
    ///
    /// Idempotent: a room is unique per unordered participant pair, so
    /// repeated calls (from either side of the pair) must yield the
    /// same room, never a duplicate.
    fn create_or_get_room(
        &self,
        other_user: UserId,
    ) -> impl Future<Output = Result<Room, TransportError>> + Send;

    /// List all rooms visible to the viewer.
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, TransportError>> + Send;

    /// Full message history for a room.
    ///
    /// Implementations should return ascending order but callers must
    /// not rely on it; the stores re-sort by `(created_at, id)`.
    fn list_messages(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Vec<Message>, TransportError>> + Send;

    /// Persist a message and return it with its server-assigned id and
    /// timestamp.
    ///
    /// Content format validation beyond non-emptiness is the
    /// implementation's concern and surfaces as a
    /// [`TransportError::Status`] rejection.
    fn post_message(
        &self,
        room_id: &RoomId,
        content: &str,
    ) -> impl Future<Output = Result<Message, TransportError>> + Send;

    /// Mark every counterpart message in the room as read by the
    /// viewer.
    fn mark_read(&self, room_id: &RoomId)
    -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Server-side total of unread messages across all of the viewer's
    /// rooms.
    fn unread_total(&self) -> impl Future<Output = Result<u64, TransportError>> + Send;

    /// Delete a message the viewer authored.
    fn delete_message(
        &self,
        message_id: &MessageId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
