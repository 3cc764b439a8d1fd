//! Joined-room state tracking.
//!
//! [`RoomTracker`] owns the set of currently-joined rooms plus a single
//! arena of user profiles. Rooms reference members by [`UserId`] into that
//! arena, so a profile seen in many rooms is stored once. A room id lives
//! in the tracker's joined set or not at all; invited and left rooms are
//! only ever reported to listeners, never inserted here.

use std::collections::{BTreeSet, HashMap};
use sync_types::{Event, RoomId, UserId};

/// Accumulated state for one joined room.
#[derive(Debug, Clone)]
pub struct Room {
    room_id: RoomId,
    /// Pagination cursor marking the oldest timeline position fetched so
    /// far. Updated from each sync response's per-room timeline section.
    pub prev_batch: Option<String>,
    state: HashMap<(String, String), Event>,
    timeline: Vec<Event>,
    members: BTreeSet<UserId>,
    name: Option<String>,
    topic: Option<String>,
    typing: Vec<UserId>,
    encrypted: bool,
}

impl Room {
    /// Create an empty room record.
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            prev_batch: None,
            state: HashMap::new(),
            timeline: Vec::new(),
            members: BTreeSet::new(),
            name: None,
            topic: None,
            typing: Vec::new(),
            encrypted: false,
        }
    }

    /// The room's server-assigned identifier.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Append a timeline event. State events delivered through the
    /// timeline also fold into the state table.
    pub fn put_event(&mut self, event: Event) {
        if event.is_state() {
            self.fold_state(event.clone());
        }
        self.timeline.push(event);
    }

    /// Hand the room a transient signal. `m.typing` replaces the set of
    /// currently-typing members; other ephemeral types carry no room state.
    pub fn put_ephemeral_event(&mut self, event: &Event) {
        if event.event_type == "m.typing" {
            self.typing = event
                .content
                .get("user_ids")
                .and_then(|ids| ids.as_array())
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| id.as_str())
                        .filter_map(|id| UserId::parse(id).ok())
                        .collect()
                })
                .unwrap_or_default();
        }
    }

    /// Apply a state event: last write wins per (event type, state key).
    pub fn apply_state_event(&mut self, event: Event) {
        self.fold_state(event);
    }

    fn fold_state(&mut self, event: Event) {
        let Some((event_type, state_key)) = event.state_pair() else {
            return;
        };
        let key = (event_type.to_string(), state_key.to_string());

        match event.event_type.as_str() {
            "m.room.name" => {
                self.name = event
                    .content
                    .get("name")
                    .and_then(|n| n.as_str())
                    .map(String::from);
            }
            "m.room.topic" => {
                self.topic = event
                    .content
                    .get("topic")
                    .and_then(|t| t.as_str())
                    .map(String::from);
            }
            "m.room.member" => {
                if let Ok(user_id) = UserId::parse(state_key) {
                    match event.content.get("membership").and_then(|m| m.as_str()) {
                        Some("join") => {
                            self.members.insert(user_id);
                        }
                        Some("leave") | Some("ban") => {
                            self.members.remove(&user_id);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        self.state.insert(key, event);
    }

    /// The latest state event stored under (event type, state key).
    pub fn state_event(&self, event_type: &str, state_key: &str) -> Option<&Event> {
        self.state
            .get(&(event_type.to_string(), state_key.to_string()))
    }

    /// The accumulated timeline, oldest first.
    pub fn timeline(&self) -> &[Event] {
        &self.timeline
    }

    /// Members currently joined to the room.
    pub fn members(&self) -> impl Iterator<Item = &UserId> {
        self.members.iter()
    }

    /// Whether the given user is currently a member.
    pub fn has_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }

    /// Latest `m.room.name`, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Latest `m.room.topic`, if any.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Members reported as typing by the latest `m.typing` signal.
    pub fn typing(&self) -> &[UserId] {
        &self.typing
    }

    /// Whether the room has protocol-level encryption enabled.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Record the result of the encryption capability probe.
    pub fn set_encrypted(&mut self, encrypted: bool) {
        self.encrypted = encrypted;
    }
}

/// A user profile, stored once and shared across rooms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// The user's federated identifier.
    pub user_id: UserId,
    /// Latest reported display name.
    pub display_name: Option<String>,
    /// Latest reported avatar URL.
    pub avatar_url: Option<String>,
}

/// The set of currently-joined rooms plus the shared user arena.
#[derive(Debug, Default)]
pub struct RoomTracker {
    rooms: HashMap<RoomId, Room>,
    users: HashMap<UserId, UserProfile>,
}

impl RoomTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tracked room, creating and registering it first if this
    /// id has not been seen. Idempotent on room id.
    pub fn ensure_room(&mut self, room_id: RoomId) -> &mut Room {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id))
    }

    /// Whether the room id is in the joined set.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Shared access to a tracked room.
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Mutable access to a tracked room.
    pub fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Drop the room from the joined set. No listener notification happens
    /// here; the sync loop dispatches leave listeners before removal.
    pub fn remove_room(&mut self, room_id: &RoomId) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    /// Apply a state event to a tracked room, updating the room's state
    /// table and, for `m.room.member`, the shared user arena.
    ///
    /// A no-op for rooms not in the joined set.
    pub fn apply_state_event(&mut self, room_id: &RoomId, event: Event) {
        if event.event_type == "m.room.member" {
            self.update_profile(&event);
        }
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.apply_state_event(event);
        }
    }

    fn update_profile(&mut self, event: &Event) {
        let Some(user_id) = event.state_key.as_deref().and_then(|k| UserId::parse(k).ok())
        else {
            return;
        };
        let profile = self
            .users
            .entry(user_id.clone())
            .or_insert_with(|| UserProfile {
                user_id,
                display_name: None,
                avatar_url: None,
            });
        if let Some(name) = event.content.get("displayname").and_then(|n| n.as_str()) {
            profile.display_name = Some(name.to_string());
        }
        if let Some(url) = event.content.get("avatar_url").and_then(|u| u.as_str()) {
            profile.avatar_url = Some(url.to_string());
        }
    }

    /// The profile stored for a user, if any room has reported one.
    pub fn user(&self, user_id: &UserId) -> Option<&UserProfile> {
        self.users.get(user_id)
    }

    /// Iterate over the joined rooms (unspecified order).
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Number of joined rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are tracked.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
