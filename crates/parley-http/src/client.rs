//! REST client implementing [`ChatTransport`].
//!
//! Paths and bodies mirror the chat service's API:
//!
//! - `POST /chat/rooms` creates or fetches the room for a pair
//! - `GET /chat/rooms` lists the viewer's rooms
//! - `GET/POST /chat/rooms/{id}/messages` reads and appends history
//! - `PATCH /chat/rooms/{id}/read` persists read state
//! - `GET /chat/unread-count` reports the server's unread total
//! - `DELETE /chat/messages/{id}` removes a message
//!
//! The viewer's identity rides on the bearer token; the server scopes
//! every response to it. List endpoints treat 404 as an empty
//! collection, matching the service's behavior for users with no chat
//! history yet.

use std::time::Duration;

use parley_core::{ChatTransport, Message, MessageId, Room, RoomId, TransportError, UserId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::wire::{
    CreateRoomBody, Envelope, MessageData, MessagesData, RoomData, RoomsData, SendMessageBody,
    UnreadData,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Service root, e.g. `https://api.example.com/api`.
    pub base_url: String,
    /// Bearer token identifying the viewer.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Settings for the given service root with the default timeout
    /// and no credentials.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), bearer_token: None, timeout: DEFAULT_TIMEOUT }
    }

    /// Attach the viewer's bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Failure constructing an [`HttpTransport`].
#[derive(Error, Debug)]
pub enum HttpConfigError {
    /// The bearer token contains bytes not valid in an HTTP header.
    #[error("bearer token is not a valid header value")]
    InvalidToken,

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`ChatTransport`] over the chat service's REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from connection settings.
    pub fn new(config: HttpConfig) -> Result<Self, HttpConfigError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| HttpConfigError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Unwrap an envelope response into its `data` payload.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                message: envelope_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(TransportError::Status {
                code: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| "request failed".to_owned()),
            });
        }
        envelope.data.ok_or_else(|| TransportError::Decode("envelope has no data".to_owned()))
    }

    /// Check status of a response whose payload is irrelevant.
    async fn expect_success(response: reqwest::Response) -> Result<(), TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            code: status.as_u16(),
            message: envelope_message(&body).unwrap_or_else(|| status.to_string()),
        })
    }
}

/// Pull the server's failure description out of an error envelope.
fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<serde_json::Value>>(body).ok()?.message
}

fn send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

impl ChatTransport for HttpTransport {
    async fn create_or_get_room(&self, other_user: UserId) -> Result<Room, TransportError> {
        tracing::debug!(other = %other_user, "POST /chat/rooms");
        let response = self
            .client
            .post(self.url("/chat/rooms"))
            .json(&CreateRoomBody { other_user_id: other_user.0 })
            .send()
            .await
            .map_err(send_error)?;
        let data: RoomData = Self::decode(response).await?;
        data.room.try_into()
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, TransportError> {
        tracing::debug!("GET /chat/rooms");
        let response =
            self.client.get(self.url("/chat/rooms")).send().await.map_err(send_error)?;

        let data: RoomsData = match Self::decode(response).await {
            Ok(data) => data,
            Err(TransportError::Status { code: 404, .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        data.rooms.into_iter().map(Room::try_from).collect()
    }

    async fn list_messages(&self, room_id: &RoomId) -> Result<Vec<Message>, TransportError> {
        tracing::debug!(room = %room_id, "GET /chat/rooms/{{id}}/messages");
        let response = self
            .client
            .get(self.url(&format!("/chat/rooms/{room_id}/messages")))
            .send()
            .await
            .map_err(send_error)?;

        let data: MessagesData = match Self::decode(response).await {
            Ok(data) => data,
            Err(TransportError::Status { code: 404, .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(data.messages.into_iter().map(Message::from).collect())
    }

    async fn post_message(
        &self,
        room_id: &RoomId,
        content: &str,
    ) -> Result<Message, TransportError> {
        tracing::debug!(room = %room_id, "POST /chat/rooms/{{id}}/messages");
        let response = self
            .client
            .post(self.url(&format!("/chat/rooms/{room_id}/messages")))
            .json(&SendMessageBody { content })
            .send()
            .await
            .map_err(send_error)?;
        let data: MessageData = Self::decode(response).await?;
        Ok(data.message.into())
    }

    async fn mark_read(&self, room_id: &RoomId) -> Result<(), TransportError> {
        tracing::debug!(room = %room_id, "PATCH /chat/rooms/{{id}}/read");
        let response = self
            .client
            .patch(self.url(&format!("/chat/rooms/{room_id}/read")))
            .send()
            .await
            .map_err(send_error)?;
        Self::expect_success(response).await
    }

    async fn unread_total(&self) -> Result<u64, TransportError> {
        tracing::debug!("GET /chat/unread-count");
        let response =
            self.client.get(self.url("/chat/unread-count")).send().await.map_err(send_error)?;
        let data: UnreadData = Self::decode(response).await?;
        Ok(data.unread_count)
    }

    async fn delete_message(&self, message_id: &MessageId) -> Result<(), TransportError> {
        tracing::debug!(message = %message_id, "DELETE /chat/messages/{{id}}");
        let response = self
            .client
            .delete(self.url(&format!("/chat/messages/{message_id}")))
            .send()
            .await
            .map_err(send_error)?;
        Self::expect_success(response).await
    }
}
