//! Message history for the selected room.
//!
//! Holds the ordered history of exactly one room at a time. Switching
//! rooms discards the previous history rather than caching it: history
//! is re-fetchable, and a single-room store cannot leak another room's
//! messages into the view.
//!
//! Every message in the store carries a server-assigned identity; there
//! are no speculative client-side placeholders to reconcile.

use parley_core::{Message, MessageId, RoomId, UserId, sort_chronological};

use crate::state::MessageView;

/// Ordered message history for the currently selected room.
#[derive(Debug)]
pub struct MessageStore {
    viewer: UserId,
    room_id: Option<RoomId>,
    entries: Vec<MessageView>,
}

impl MessageStore {
    /// Create an empty store for `viewer`.
    pub fn new(viewer: UserId) -> Self {
        Self { viewer, room_id: None, entries: Vec::new() }
    }

    /// Room the current history belongs to, if any is loaded.
    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Messages in `(created_at, id)` ascending order, annotated for
    /// the viewer.
    pub fn messages(&self) -> &[MessageView] {
        &self.entries
    }

    /// The most recent message, if any.
    pub fn tail(&self) -> Option<&Message> {
        self.entries.last().map(|entry| &entry.message)
    }

    /// Replace the history with a freshly fetched one.
    ///
    /// Sorts by `(created_at, id)` regardless of the order the
    /// transport returned, and annotates each message with the derived
    /// `is_own` flag.
    pub fn replace_all(&mut self, room_id: RoomId, mut history: Vec<Message>) {
        sort_chronological(&mut history);
        let viewer = self.viewer;
        self.entries = history
            .into_iter()
            .map(|message| MessageView { is_own: message.sender_id == viewer, message })
            .collect();
        self.room_id = Some(room_id);
    }

    /// Append a server-confirmed message.
    ///
    /// The request/response send path always lands at the tail; a
    /// sorted insert covers the degenerate case of a server clock that
    /// stamped the new message behind the existing tail, preserving
    /// the ordering invariant either way.
    pub fn append_confirmed(&mut self, message: Message) {
        let view = MessageView { is_own: message.sender_id == self.viewer, message };
        let at_tail = self
            .tail()
            .is_none_or(|tail| tail.sort_key() <= view.message.sort_key());
        if at_tail {
            self.entries.push(view);
        } else {
            let index = self
                .entries
                .partition_point(|entry| entry.message.sort_key() <= view.message.sort_key());
            self.entries.insert(index, view);
        }
    }

    /// Remove a message by id, returning it if present.
    pub fn remove(&mut self, message_id: &MessageId) -> Option<Message> {
        let index = self.entries.iter().position(|entry| entry.message.id == *message_id)?;
        Some(self.entries.remove(index).message)
    }

    /// Whether a message with this id is loaded.
    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.entries.iter().any(|entry| entry.message.id == *message_id)
    }

    /// Drop the loaded history and room association.
    pub fn clear(&mut self) {
        self.room_id = None;
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::DateTime;
    use parley_core::MessageKind;

    use super::*;

    const VIEWER: UserId = UserId(1);

    fn message(id: &str, sender: u64, at_secs: i64) -> Message {
        Message {
            id: MessageId::from(id),
            room_id: RoomId::from("room-1"),
            sender_id: UserId(sender),
            content: id.to_owned(),
            kind: MessageKind::Text,
            created_at: DateTime::from_timestamp(at_secs, 0).unwrap(),
            read: false,
            sender_name: None,
            sender_avatar: None,
        }
    }

    #[test]
    fn replace_all_sorts_and_annotates() {
        let mut store = MessageStore::new(VIEWER);
        store.replace_all(
            RoomId::from("room-1"),
            vec![message("c", 2, 30), message("a", 1, 10), message("b", 2, 20)],
        );

        let ids: Vec<&str> = store.messages().iter().map(|m| m.message.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        let own: Vec<bool> = store.messages().iter().map(|m| m.is_own).collect();
        assert_eq!(own, [true, false, false]);
    }

    #[test]
    fn append_lands_at_tail() {
        let mut store = MessageStore::new(VIEWER);
        store.replace_all(RoomId::from("room-1"), vec![message("a", 2, 10)]);

        store.append_confirmed(message("b", 1, 20));
        assert_eq!(store.tail().map(|m| m.id.as_str()), Some("b"));
        assert!(store.messages()[1].is_own);
    }

    #[test]
    fn append_with_earlier_timestamp_keeps_order() {
        let mut store = MessageStore::new(VIEWER);
        store.replace_all(RoomId::from("room-1"), vec![message("a", 2, 10), message("c", 2, 30)]);

        store.append_confirmed(message("b", 1, 20));
        let ids: Vec<&str> = store.messages().iter().map(|m| m.message.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn remove_returns_the_message() {
        let mut store = MessageStore::new(VIEWER);
        store.replace_all(RoomId::from("room-1"), vec![message("a", 1, 10), message("b", 2, 20)]);

        let removed = store.remove(&MessageId::from("a")).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert!(!store.contains(&MessageId::from("a")));
        assert!(store.remove(&MessageId::from("a")).is_none());
        assert_eq!(store.tail().map(|m| m.id.as_str()), Some("b"));
    }

    #[test]
    fn clear_drops_history_and_room() {
        let mut store = MessageStore::new(VIEWER);
        store.replace_all(RoomId::from("room-1"), vec![message("a", 1, 10)]);

        store.clear();
        assert!(store.messages().is_empty());
        assert_eq!(store.room_id(), None);
    }
}
