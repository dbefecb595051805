//! Wire representations for the chat REST API.
//!
//! The server wraps every payload in an envelope:
//!
//! ```json
//! { "success": true, "data": { "rooms": [...] }, "message": "..." }
//! ```
//!
//! Room and message bodies use the server's own field names
//! (`user1_id`, `other_user_name`, `is_read`); the conversions here
//! are the only place those names appear. Conversions into model types
//! validate what the model requires (distinct participants) and
//! preserve what it tolerates (unknown message kinds).

use chrono::{DateTime, Utc};
use parley_core::{
    Message, MessageId, MessageKind, ParticipantPair, Room, RoomId, TransportError, UserId,
    UserProfile,
};
use serde::{Deserialize, Serialize};

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default = "success_default")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

fn success_default() -> bool {
    true
}

/// `data` payload of the room-list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct RoomsData {
    #[serde(default)]
    pub rooms: Vec<RoomDto>,
}

/// `data` payload of the room-creation endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct RoomData {
    pub room: RoomDto,
}

/// `data` payload of the message-list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MessagesData {
    #[serde(default)]
    pub messages: Vec<MessageDto>,
}

/// `data` payload of the message-send endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageData {
    pub message: MessageDto,
}

/// `data` payload of the unread-count endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct UnreadData {
    #[serde(rename = "unreadCount", default)]
    pub unread_count: u64,
}

/// Request body for room creation.
#[derive(Debug, Serialize)]
pub(crate) struct CreateRoomBody {
    #[serde(rename = "otherUserId")]
    pub other_user_id: u64,
}

/// Request body for sending a message.
#[derive(Debug, Serialize)]
pub(crate) struct SendMessageBody<'a> {
    pub content: &'a str,
}

/// A room as the server serializes it.
#[derive(Debug, Deserialize)]
pub(crate) struct RoomDto {
    pub id: String,
    pub user1_id: u64,
    pub user2_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub other_user_id: u64,
    pub other_user_name: String,
    #[serde(default)]
    pub other_user_image: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
}

impl TryFrom<RoomDto> for Room {
    type Error = TransportError;

    fn try_from(dto: RoomDto) -> Result<Self, Self::Error> {
        let participants = ParticipantPair::new(UserId(dto.user1_id), UserId(dto.user2_id))
            .map_err(|e| TransportError::Decode(format!("room {}: {e}", dto.id)))?;
        Ok(Self {
            id: RoomId::new(dto.id),
            participants,
            other_user: UserProfile {
                id: UserId(dto.other_user_id),
                display_name: dto.other_user_name,
                avatar: dto.other_user_image,
            },
            last_message: dto.last_message,
            last_message_at: dto.last_message_time,
            unread_count: dto.unread_count,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

/// A message as the server serializes it.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageDto {
    pub id: String,
    pub room_id: String,
    pub sender_id: u64,
    pub content: String,
    pub message_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_image: Option<String>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Self {
            id: MessageId::new(dto.id),
            room_id: RoomId::new(dto.room_id),
            sender_id: UserId(dto.sender_id),
            content: dto.content,
            kind: MessageKind::from(dto.message_type),
            created_at: dto.created_at,
            read: dto.is_read,
            sender_name: dto.sender_name,
            sender_avatar: dto.sender_image,
        }
    }
}
