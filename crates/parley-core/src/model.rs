//! Chat data model.
//!
//! Rooms are persistent 1:1 conversation channels between exactly two
//! users, uniquely identified by the unordered pair of participant ids.
//! Messages are owned by their room and totally ordered by
//! `(created_at, id)` ascending.
//!
//! Identity (display name, avatar) is owned by an external identity
//! provider; the model only carries denormalized views of it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stable numeric user identifier, assigned by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque room identifier, assigned by the transport layer at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a server-assigned room identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Opaque message identifier, unique within its room, assigned by the
/// transport layer. Never client-generated for persisted state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a server-assigned message identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Unordered pair of distinct participant ids.
///
/// A room is uniquely identified by this pair: creating a room for a
/// pair that already has one must return the existing room. The pair is
/// stored canonically (lower id first) so that `(a, b)` and `(b, a)`
/// compare and hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    /// Build the canonical pair for two participants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SelfRoom`] if both ids are equal: a
    /// user may not open a room with themself.
    pub fn new(a: UserId, b: UserId) -> Result<Self, ValidationError> {
        if a == b {
            return Err(ValidationError::SelfRoom { user: a });
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    /// Whether `user` is one of the two participants.
    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// The counterpart of `viewer`, or `None` if the viewer is not a
    /// participant.
    pub fn other_of(&self, viewer: UserId) -> Option<UserId> {
        if viewer == self.low {
            Some(self.high)
        } else if viewer == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Both participant ids in canonical order.
    pub fn ids(&self) -> (UserId, UserId) {
        (self.low, self.high)
    }
}

/// Denormalized display metadata for a user.
///
/// Derived from the identity provider; never independently
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity-provider user id.
    pub id: UserId,
    /// Human-readable display name.
    pub display_name: String,
    /// Optional avatar reference (URL or asset key).
    pub avatar: Option<String>,
}

impl UserProfile {
    /// Placeholder profile for a user the identity provider has no
    /// metadata for.
    pub fn placeholder(id: UserId) -> Self {
        Self { id, display_name: format!("user-{id}"), avatar: None }
    }
}

/// A 1:1 conversation room as seen by the current viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Server-assigned room id.
    pub id: RoomId,
    /// The unordered participant pair; immutable after creation.
    pub participants: ParticipantPair,
    /// Display view of the counterpart relative to the viewer.
    pub other_user: UserProfile,
    /// Content of the most recent message, if any.
    pub last_message: Option<String>,
    /// Timestamp of the most recent message; monotonically
    /// non-decreasing as messages arrive.
    pub last_message_at: Option<DateTime<Utc>>,
    /// Messages from the counterpart not yet marked read by the viewer.
    pub unread_count: u32,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
    /// When the room last changed server-side.
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Ordering key for the room list: the last message timestamp, or
    /// the room's own update time for rooms with no messages yet.
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.updated_at)
    }
}

/// Kind of message payload.
///
/// Only text is produced in-scope; unknown kinds coming off the wire
/// are preserved rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Plain text content.
    Text,
    /// A kind this client does not interpret.
    Other(String),
}

impl From<String> for MessageKind {
    fn from(kind: String) -> Self {
        if kind == "text" { Self::Text } else { Self::Other(kind) }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => "text".to_owned(),
            MessageKind::Other(other) => other,
        }
    }
}

/// A single message within a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message id.
    pub id: MessageId,
    /// Owning room.
    pub room_id: RoomId,
    /// Sender; one of the room's two participants.
    pub sender_id: UserId,
    /// Text payload. The core does not interpret or sanitize it.
    pub content: String,
    /// Payload kind.
    pub kind: MessageKind,
    /// Server-assigned creation time, used for ordering.
    pub created_at: DateTime<Utc>,
    /// Read from the recipient's perspective. The sender's own messages
    /// are implicitly read to the sender.
    pub read: bool,
    /// Denormalized sender display name, if the server provided one.
    pub sender_name: Option<String>,
    /// Denormalized sender avatar reference.
    pub sender_avatar: Option<String>,
}

impl Message {
    /// Total-order key within a room: `(created_at, id)` ascending.
    pub fn sort_key(&self) -> (DateTime<Utc>, &MessageId) {
        (self.created_at, &self.id)
    }
}

/// Sort messages into their room-total order, `(created_at, id)`
/// ascending, regardless of the order the transport returned them in.
pub fn sort_chronological(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(id: &str, at_secs: i64) -> Message {
        Message {
            id: MessageId::from(id),
            room_id: RoomId::from("room-1"),
            sender_id: UserId(1),
            content: "hello".to_owned(),
            kind: MessageKind::Text,
            created_at: DateTime::from_timestamp(at_secs, 0).unwrap(),
            read: false,
            sender_name: None,
            sender_avatar: None,
        }
    }

    #[test]
    fn pair_is_order_insensitive() {
        let ab = ParticipantPair::new(UserId(1), UserId(2));
        let ba = ParticipantPair::new(UserId(2), UserId(1));
        assert_eq!(ab, ba);
    }

    #[test]
    fn pair_rejects_self() {
        let err = ParticipantPair::new(UserId(7), UserId(7));
        assert!(matches!(err, Err(ValidationError::SelfRoom { user: UserId(7) })));
    }

    #[test]
    fn pair_other_of_viewer() {
        let pair = ParticipantPair::new(UserId(9), UserId(4)).unwrap();
        assert_eq!(pair.other_of(UserId(9)), Some(UserId(4)));
        assert_eq!(pair.other_of(UserId(4)), Some(UserId(9)));
        assert_eq!(pair.other_of(UserId(5)), None);
        assert!(pair.contains(UserId(4)));
        assert!(!pair.contains(UserId(5)));
    }

    #[test]
    fn sort_orders_by_timestamp_then_id() {
        let mut messages = vec![message("b", 30), message("a", 10), message("z", 20)];
        sort_chronological(&mut messages);
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "z", "b"]);

        // Equal timestamps fall back to id order
        let mut tied = vec![message("m2", 10), message("m1", 10)];
        sort_chronological(&mut tied);
        assert_eq!(tied[0].id.as_str(), "m1");
    }

    #[test]
    fn message_kind_round_trips_unknown_values() {
        assert_eq!(MessageKind::from("text".to_owned()), MessageKind::Text);
        let kind = MessageKind::from("image".to_owned());
        assert_eq!(kind, MessageKind::Other("image".to_owned()));
        assert_eq!(String::from(kind), "image");
    }

    #[test]
    fn room_activity_falls_back_to_updated_at() {
        let updated = DateTime::from_timestamp(100, 0).unwrap();
        let mut room = Room {
            id: RoomId::from("room-1"),
            participants: ParticipantPair::new(UserId(1), UserId(2)).unwrap(),
            other_user: UserProfile::placeholder(UserId(2)),
            last_message: None,
            last_message_at: None,
            unread_count: 0,
            created_at: updated,
            updated_at: updated,
        };
        assert_eq!(room.last_activity_at(), updated);

        let later = DateTime::from_timestamp(200, 0).unwrap();
        room.last_message_at = Some(later);
        assert_eq!(room.last_activity_at(), later);
    }
}
