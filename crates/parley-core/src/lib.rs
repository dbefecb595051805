//! Core types for the Parley chat layer.
//!
//! This crate defines the data model shared by every layer of the chat
//! core, the [`ChatTransport`] abstraction that performs the actual
//! room/message CRUD against a backend, and the error taxonomy.
//!
//! # Components
//!
//! - Model: [`Room`], [`Message`], [`UserProfile`] and their id types
//! - [`ChatTransport`]: async request/response seam to the backend
//! - [`MemoryTransport`]: in-memory reference backend for tests
//! - Errors: [`TransportError`], [`ValidationError`], [`ChatError`]
//!
//! The crate performs no I/O of its own; concrete transports live in
//! sibling crates (`parley-http`) or in test code.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod memory;
mod model;
mod transport;

pub use error::{ChatError, TransportError, ValidationError};
pub use memory::{MemoryServer, MemoryTransport};
pub use model::{
    Message, MessageId, MessageKind, ParticipantPair, Room, RoomId, UserId, UserProfile,
    sort_chronological,
};
pub use transport::ChatTransport;
