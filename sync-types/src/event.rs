//! The event structure delivered by `/sync`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RoomId, UserId};

/// A single event from the homeserver's stream.
///
/// The wire payload does not self-report its room; the sync engine stamps
/// `room_id` onto each event as it files it under the room section being
/// processed. The `content` body is room/event-type-specific and carried
/// opaquely; the engine interprets it only for a handful of well-known
/// state and ephemeral types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type tag, e.g. `m.room.message` or `m.typing`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Originating room, stamped by the engine on receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,

    /// The user that emitted the event, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserId>,

    /// Server-assigned event identifier, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Present on state events; keys the event within the room state table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,

    /// Origin server timestamp in milliseconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_server_ts: Option<u64>,

    /// Opaque event body.
    #[serde(default)]
    pub content: Value,
}

impl Event {
    /// Whether this is a state event (carries a `state_key`).
    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    /// The (event type, state key) pair that keys this event in a room's
    /// state table, or `None` for non-state events.
    pub fn state_pair(&self) -> Option<(&str, &str)> {
        self.state_key
            .as_deref()
            .map(|key| (self.event_type.as_str(), key))
    }

    /// Stamp the originating room onto the event.
    pub fn stamp_room(&mut self, room_id: RoomId) {
        self.room_id = Some(room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_timeline_event() {
        let event: Event = serde_json::from_value(json!({
            "type": "m.room.message",
            "sender": "@alice:example.org",
            "event_id": "$1:example.org",
            "origin_server_ts": 1_700_000_000_000u64,
            "content": {"msgtype": "m.text", "body": "hi"},
        }))
        .unwrap();

        assert_eq!(event.event_type, "m.room.message");
        assert_eq!(event.sender.as_ref().unwrap().as_str(), "@alice:example.org");
        assert!(event.room_id.is_none());
        assert!(!event.is_state());
        assert_eq!(event.content["body"], "hi");
    }

    #[test]
    fn state_pair_requires_state_key() {
        let mut event: Event = serde_json::from_value(json!({
            "type": "m.room.name",
            "state_key": "",
            "content": {"name": "Ops"},
        }))
        .unwrap();

        assert!(event.is_state());
        assert_eq!(event.state_pair(), Some(("m.room.name", "")));

        event.state_key = None;
        assert_eq!(event.state_pair(), None);
    }

    #[test]
    fn stamping_sets_room_id() {
        let mut event: Event =
            serde_json::from_value(json!({"type": "m.typing", "content": {}})).unwrap();
        event.stamp_room(RoomId::parse("!abc:example.org").unwrap());
        assert_eq!(event.room_id.unwrap().as_str(), "!abc:example.org");
    }

    #[test]
    fn missing_content_defaults_to_null() {
        let event: Event = serde_json::from_value(json!({"type": "m.typing"})).unwrap();
        assert!(event.content.is_null());
    }
}
