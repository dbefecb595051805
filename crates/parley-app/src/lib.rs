//! Application layer for Parley.
//!
//! The single stateful core a chat UI binds to: it composes the room
//! list cache and the per-room message history behind one controller
//! and enforces the cross-cutting protocol rules (read-on-load, the
//! stale-response guard, confirmed-only sends).
//!
//! # Components
//!
//! - [`ChatSession`]: controller façade the UI drives
//! - [`RoomStore`]: room list cache with unread bookkeeping
//! - [`MessageStore`]: ordered history for the selected room
//! - [`SessionState`]: the controller's observable state machine
//!
//! The UI layer never mutates `rooms`, `messages`, or the unread total
//! directly; every mutation flows through the controller, which keeps
//! the unread-sum invariant (`total == sum of per-room counts`) intact
//! across every settling operation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod message_store;
mod room_store;
mod session;
mod state;

pub use message_store::MessageStore;
pub use room_store::RoomStore;
pub use session::{ChatSession, HistoryOutcome, SendError};
pub use state::{MessageView, SessionState};
