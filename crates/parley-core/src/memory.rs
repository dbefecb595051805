//! In-memory reference transport.
//!
//! [`MemoryServer`] is a process-local stand-in for the real chat
//! backend: it owns rooms keyed by participant pair, per-room message
//! logs with server-assigned ids and timestamps, and per-viewer read
//! state. [`MemoryServer::client`] hands out a [`MemoryTransport`] view
//! bound to one viewer, so tests can drive both sides of a
//! conversation against shared state.
//!
//! Timestamps are a deterministic logical clock (one second per
//! mutation), which keeps message ordering reproducible in tests.
//!
//! Failure injection: [`MemoryServer::fail_requests`] makes the next
//! `n` requests (from any client) fail with a network error, for
//! exercising the stores' fail-open paths.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::TransportError,
    model::{Message, MessageId, MessageKind, ParticipantPair, Room, RoomId, UserId, UserProfile},
    transport::ChatTransport,
};

/// Shared in-memory chat backend.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

/// A [`ChatTransport`] bound to one viewer of a [`MemoryServer`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    server: MemoryServer,
    viewer: UserId,
}

#[derive(Debug, Default)]
struct ServerState {
    profiles: HashMap<UserId, UserProfile>,
    rooms: HashMap<RoomId, StoredRoom>,
    rooms_by_pair: HashMap<ParticipantPair, RoomId>,
    messages: HashMap<RoomId, Vec<StoredMessage>>,
    next_room: u64,
    next_message: u64,
    clock: i64,
    pending_failures: u32,
}

#[derive(Debug)]
struct StoredRoom {
    id: RoomId,
    pair: ParticipantPair,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StoredMessage {
    id: MessageId,
    sender: UserId,
    content: String,
    created_at: DateTime<Utc>,
    read: bool,
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl ServerState {
    /// Advance the logical clock and return the new instant.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        timestamp(self.clock)
    }

    /// Consume one injected failure, if armed.
    fn take_failure(&mut self) -> Result<(), TransportError> {
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(TransportError::Network("injected failure".to_owned()));
        }
        Ok(())
    }

    fn profile(&self, user: UserId) -> UserProfile {
        self.profiles.get(&user).cloned().unwrap_or_else(|| UserProfile::placeholder(user))
    }

    /// Room view for one viewer: counterpart profile, preview fields,
    /// and the viewer's unread count.
    fn room_view(&self, room: &StoredRoom, viewer: UserId) -> Room {
        let other_id = room.pair.other_of(viewer).unwrap_or(room.pair.ids().0);
        let log = self.messages.get(&room.id);
        let tail = log.and_then(|log| log.last());
        let unread = log.map_or(0, |log| {
            log.iter().filter(|m| m.sender != viewer && !m.read).count() as u32
        });

        Room {
            id: room.id.clone(),
            participants: room.pair,
            other_user: self.profile(other_id),
            last_message: tail.map(|m| m.content.clone()),
            last_message_at: tail.map(|m| m.created_at),
            unread_count: unread,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }

    fn message_view(&self, room_id: &RoomId, stored: &StoredMessage) -> Message {
        let sender = self.profile(stored.sender);
        Message {
            id: stored.id.clone(),
            room_id: room_id.clone(),
            sender_id: stored.sender,
            content: stored.content.clone(),
            kind: MessageKind::Text,
            created_at: stored.created_at,
            read: stored.read,
            sender_name: Some(sender.display_name),
            sender_avatar: sender.avatar,
        }
    }
}

impl MemoryServer {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register identity metadata so room and message views carry real
    /// display names instead of placeholders.
    pub async fn register_user(&self, profile: UserProfile) {
        let mut state = self.state.lock().await;
        state.profiles.insert(profile.id, profile);
    }

    /// Transport view bound to `viewer`.
    pub fn client(&self, viewer: UserId) -> MemoryTransport {
        MemoryTransport { server: self.clone(), viewer }
    }

    /// Arm the next `n` requests (from any client) to fail with a
    /// network error.
    pub async fn fail_requests(&self, n: u32) {
        let mut state = self.state.lock().await;
        state.pending_failures = n;
    }
}

impl ChatTransport for MemoryTransport {
    async fn create_or_get_room(&self, other_user: UserId) -> Result<Room, TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        // The server enforces the pair invariant independently of the
        // client-side guard.
        let pair = ParticipantPair::new(self.viewer, other_user).map_err(|e| {
            TransportError::Status { code: 400, message: e.to_string() }
        })?;

        if let Some(id) = state.rooms_by_pair.get(&pair).cloned() {
            if let Some(room) = state.rooms.get(&id) {
                return Ok(state.room_view(room, self.viewer));
            }
        }

        state.next_room += 1;
        let id = RoomId::new(format!("room-{}", state.next_room));
        let now = state.tick();
        let room = StoredRoom { id: id.clone(), pair, created_at: now, updated_at: now };
        let view = state.room_view(&room, self.viewer);
        state.rooms_by_pair.insert(pair, id.clone());
        state.rooms.insert(id.clone(), room);
        state.messages.insert(id, Vec::new());
        Ok(view)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|room| room.pair.contains(self.viewer))
            .map(|room| state.room_view(room, self.viewer))
            .collect();
        rooms.sort_by(|a, b| {
            b.last_activity_at().cmp(&a.last_activity_at()).then_with(|| a.id.cmp(&b.id))
        });
        Ok(rooms)
    }

    async fn list_messages(&self, room_id: &RoomId) -> Result<Vec<Message>, TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        let log = state
            .messages
            .get(room_id)
            .ok_or_else(|| TransportError::Status {
                code: 404,
                message: format!("room not found: {room_id}"),
            })?;
        Ok(log.iter().map(|stored| state.message_view(room_id, stored)).collect())
    }

    async fn post_message(&self, room_id: &RoomId, content: &str) -> Result<Message, TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        if content.trim().is_empty() {
            return Err(TransportError::Status {
                code: 400,
                message: "message content is empty".to_owned(),
            });
        }
        if !state.rooms.contains_key(room_id) {
            return Err(TransportError::Status {
                code: 404,
                message: format!("room not found: {room_id}"),
            });
        }

        state.next_message += 1;
        let id = MessageId::new(format!("msg-{}", state.next_message));
        let now = state.tick();
        let stored = StoredMessage {
            id,
            sender: self.viewer,
            content: content.to_owned(),
            created_at: now,
            read: false,
        };
        let view = state.message_view(room_id, &stored);

        state.messages.entry(room_id.clone()).or_default().push(stored);
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.updated_at = now;
        }
        Ok(view)
    }

    async fn mark_read(&self, room_id: &RoomId) -> Result<(), TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        let viewer = self.viewer;
        let log = state
            .messages
            .get_mut(room_id)
            .ok_or_else(|| TransportError::Status {
                code: 404,
                message: format!("room not found: {room_id}"),
            })?;
        for message in log.iter_mut().filter(|m| m.sender != viewer) {
            message.read = true;
        }
        Ok(())
    }

    async fn unread_total(&self) -> Result<u64, TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        let viewer = self.viewer;
        let total = state
            .rooms
            .values()
            .filter(|room| room.pair.contains(viewer))
            .map(|room| {
                state.messages.get(&room.id).map_or(0u64, |log| {
                    log.iter().filter(|m| m.sender != viewer && !m.read).count() as u64
                })
            })
            .sum();
        Ok(total)
    }

    async fn delete_message(&self, message_id: &MessageId) -> Result<(), TransportError> {
        let mut state = self.server.state.lock().await;
        state.take_failure()?;

        for log in state.messages.values_mut() {
            if let Some(index) = log.iter().position(|m| m.id == *message_id) {
                if log[index].sender != self.viewer {
                    return Err(TransportError::Status {
                        code: 403,
                        message: "cannot delete another user's message".to_owned(),
                    });
                }
                log.remove(index);
                return Ok(());
            }
        }
        Err(TransportError::Status {
            code: 404,
            message: format!("message not found: {message_id}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    #[tokio::test]
    async fn room_creation_is_idempotent_across_both_sides() {
        let server = MemoryServer::new();
        let alice = server.client(ALICE);
        let bob = server.client(BOB);

        let from_alice = alice.create_or_get_room(BOB).await.unwrap();
        let from_bob = bob.create_or_get_room(ALICE).await.unwrap();
        assert_eq!(from_alice.id, from_bob.id);

        let again = alice.create_or_get_room(BOB).await.unwrap();
        assert_eq!(again.id, from_alice.id);
    }

    #[tokio::test]
    async fn self_room_is_rejected_server_side() {
        let server = MemoryServer::new();
        let alice = server.client(ALICE);

        let err = alice.create_or_get_room(ALICE).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { code: 400, .. }));
        assert!(alice.list_rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unread_counts_are_per_viewer() {
        let server = MemoryServer::new();
        let alice = server.client(ALICE);
        let bob = server.client(BOB);

        let room = alice.create_or_get_room(BOB).await.unwrap();
        alice.post_message(&room.id, "hi bob").await.unwrap();
        alice.post_message(&room.id, "are you there?").await.unwrap();

        // Unread for the recipient, already-read for the author.
        assert_eq!(bob.unread_total().await.unwrap(), 2);
        assert_eq!(alice.unread_total().await.unwrap(), 0);

        bob.mark_read(&room.id).await.unwrap();
        assert_eq!(bob.unread_total().await.unwrap(), 0);

        let rooms = bob.list_rooms().await.unwrap();
        assert_eq!(rooms[0].unread_count, 0);
        assert_eq!(rooms[0].last_message.as_deref(), Some("are you there?"));
    }

    #[tokio::test]
    async fn messages_carry_server_assigned_identity() {
        let server = MemoryServer::new();
        server
            .register_user(UserProfile {
                id: ALICE,
                display_name: "alice".to_owned(),
                avatar: None,
            })
            .await;
        let alice = server.client(ALICE);

        let room = alice.create_or_get_room(BOB).await.unwrap();
        let first = alice.post_message(&room.id, "one").await.unwrap();
        let second = alice.post_message(&room.id, "two").await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.created_at < second.created_at);
        assert_eq!(first.sender_name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn delete_is_author_only() {
        let server = MemoryServer::new();
        let alice = server.client(ALICE);
        let bob = server.client(BOB);

        let room = alice.create_or_get_room(BOB).await.unwrap();
        let message = alice.post_message(&room.id, "oops").await.unwrap();

        let err = bob.delete_message(&message.id).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { code: 403, .. }));

        alice.delete_message(&message.id).await.unwrap();
        assert!(alice.list_messages(&room.id).await.unwrap().is_empty());

        let err = alice.delete_message(&message.id).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { code: 404, .. }));
    }

    #[tokio::test]
    async fn injected_failures_hit_then_clear() {
        let server = MemoryServer::new();
        let alice = server.client(ALICE);

        server.fail_requests(1).await;
        let err = alice.list_rooms().await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert!(err.is_transient());

        assert!(alice.list_rooms().await.is_ok());
    }
}
