//! Room list cache.
//!
//! Authoritative local cache of the viewer's rooms and their summary
//! fields (preview, last activity, unread count). Ordering is last
//! activity descending with room id as deterministic tie-break, so the
//! most recent conversation is always at the head.
//!
//! Every mutation keeps the unread invariant: the cached total always
//! equals the sum of per-room unread counts. The total is recomputed
//! from the collection, never adjusted by server-provided deltas.

use parley_core::{Message, Room, RoomId, UserId, ValidationError};

/// Local cache of the viewer's room list.
#[derive(Debug)]
pub struct RoomStore {
    viewer: UserId,
    rooms: Vec<Room>,
    selected: Option<RoomId>,
    total_unread: u64,
}

fn sort_rooms(rooms: &mut [Room]) {
    rooms.sort_by(|a, b| {
        b.last_activity_at().cmp(&a.last_activity_at()).then_with(|| a.id.cmp(&b.id))
    });
}

impl RoomStore {
    /// Create an empty store for `viewer`.
    pub fn new(viewer: UserId) -> Self {
        Self { viewer, rooms: Vec::new(), selected: None, total_unread: 0 }
    }

    /// The viewer this store was built for.
    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    /// Rooms ordered by last activity, most recent first.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up a room by id.
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == *room_id)
    }

    /// Id of the selected room, if any.
    pub fn selected(&self) -> Option<&RoomId> {
        self.selected.as_ref()
    }

    /// The selected room, if any.
    pub fn selected_room(&self) -> Option<&Room> {
        self.selected.as_ref().and_then(|id| self.rooms.iter().find(|room| room.id == *id))
    }

    /// Sum of unread counts across all rooms.
    pub fn total_unread(&self) -> u64 {
        self.total_unread
    }

    /// Replace the whole collection with a fresh server snapshot.
    ///
    /// Re-sorts, recomputes the unread total, and drops the selection
    /// if the selected room is no longer present.
    pub fn replace_all(&mut self, mut rooms: Vec<Room>) {
        sort_rooms(&mut rooms);
        self.rooms = rooms;
        if let Some(selected) = &self.selected
            && !self.rooms.iter().any(|room| room.id == *selected)
        {
            tracing::debug!(room = %selected, "selected room missing from reload, clearing");
            self.selected = None;
        }
        self.recompute_total();
        tracing::debug!(rooms = self.rooms.len(), unread = self.total_unread, "room list replaced");
    }

    /// Insert a freshly created (or re-fetched) room at the head if it
    /// is not already present. Dedupes by room id: repeated creation
    /// for the same pair never yields a duplicate entry.
    pub fn upsert_front(&mut self, room: Room) {
        if self.rooms.iter().any(|existing| existing.id == room.id) {
            return;
        }
        self.rooms.insert(0, room);
        self.recompute_total();
    }

    /// Select a room. Selection alone loads no messages and marks
    /// nothing read; those are separate, explicit steps.
    pub fn select(&mut self, room_id: &RoomId) -> Result<(), ValidationError> {
        if self.get(room_id).is_none() {
            return Err(ValidationError::UnknownRoom(room_id.clone()));
        }
        self.selected = Some(room_id.clone());
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Fold a newly arrived message into the owning room's summary.
    ///
    /// This is the single mutation path for preview, ordering, and
    /// unread logic, used both by the local send path and by any future
    /// push integration. The unread count increments only when the
    /// message is not the viewer's own and the room is not currently
    /// selected. Returns false if the room is unknown (the message is
    /// ignored).
    pub fn apply_incoming_message(&mut self, message: &Message) -> bool {
        let selected = self.selected.clone();
        let Some(room) = self.rooms.iter_mut().find(|room| room.id == message.room_id) else {
            tracing::warn!(room = %message.room_id, "message for unknown room ignored");
            return false;
        };

        room.last_message = Some(message.content.clone());
        // last_message_at is monotonically non-decreasing
        room.last_message_at = Some(match room.last_message_at {
            Some(existing) => existing.max(message.created_at),
            None => message.created_at,
        });
        room.updated_at = room.updated_at.max(message.created_at);

        if message.sender_id != self.viewer && selected.as_ref() != Some(&message.room_id) {
            room.unread_count += 1;
        }

        sort_rooms(&mut self.rooms);
        self.recompute_total();
        true
    }

    /// Recompute a room's preview fields after a deletion, from the new
    /// tail of its history. Unread counts are untouched: deleting the
    /// viewer's own message cannot un-read the counterpart's.
    pub fn apply_deleted_message(&mut self, room_id: &RoomId, new_tail: Option<&Message>) {
        let Some(room) = self.rooms.iter_mut().find(|room| room.id == *room_id) else {
            return;
        };
        room.last_message = new_tail.map(|m| m.content.clone());
        room.last_message_at = new_tail.map(|m| m.created_at);
        sort_rooms(&mut self.rooms);
    }

    /// Zero a room's unread count and recompute the total from the
    /// collection. Returns false if the room is unknown.
    pub fn mark_read_local(&mut self, room_id: &RoomId) -> bool {
        let Some(room) = self.rooms.iter_mut().find(|room| room.id == *room_id) else {
            return false;
        };
        room.unread_count = 0;
        self.recompute_total();
        true
    }

    fn recompute_total(&mut self) {
        self.total_unread = self.rooms.iter().map(|room| u64::from(room.unread_count)).sum();
    }
}
