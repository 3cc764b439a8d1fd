//! Schema for the tiered `/sync` long-poll response.
//!
//! Every section below `next_batch` is optional on the wire. The engine
//! treats an absent section and an empty section identically, so all of
//! them default when missing; unknown fields are ignored rather than
//! rejected, since homeservers add sections over time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Event, RoomId};

/// A homeserver's answer to one `/sync` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// The cursor to present on the next request.
    pub next_batch: String,

    /// Presence updates for users the account shares a room with.
    #[serde(default)]
    pub presence: EventContainer,

    /// Per-membership room sections.
    #[serde(default)]
    pub rooms: RoomUpdates,

    /// Room-independent state section. The wire format may report state
    /// updates once across all rooms rather than per room; see the sync
    /// engine for how these are applied.
    #[serde(default)]
    pub state: EventContainer,

    /// Remaining one-time keys per algorithm, for the encryption capability.
    #[serde(default)]
    pub device_one_time_keys_count: BTreeMap<String, u64>,
}

/// A list of events wrapped in the protocol's `{"events": [...]}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContainer {
    /// The events, in server-reported order.
    #[serde(default)]
    pub events: Vec<Event>,
}

/// The `rooms` section, split by membership.
///
/// A room id appears under at most one key within a single response;
/// `BTreeMap` keeps processing order deterministic within each section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomUpdates {
    /// Rooms the account is joined to.
    #[serde(default)]
    pub join: BTreeMap<RoomId, JoinedRoomUpdate>,

    /// Rooms the account has been invited to.
    #[serde(default)]
    pub invite: BTreeMap<RoomId, InvitedRoomUpdate>,

    /// Rooms the account has left or been removed from.
    #[serde(default)]
    pub leave: BTreeMap<RoomId, LeftRoomUpdate>,
}

/// Updates for a single joined room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinedRoomUpdate {
    /// Message and state-change events, plus the pagination token.
    #[serde(default)]
    pub timeline: Timeline,

    /// Transient signals (typing, receipts) for this room.
    #[serde(default)]
    pub ephemeral: EventContainer,
}

/// The ordered event window delivered for one room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Events in delivery order.
    #[serde(default)]
    pub events: Vec<Event>,

    /// Pagination token marking the oldest position fetched so far.
    #[serde(default)]
    pub prev_batch: Option<String>,
}

/// Updates for a room the account has been invited to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvitedRoomUpdate {
    /// Stripped state giving the invitee context about the room.
    #[serde(default)]
    pub invite_state: EventContainer,
}

/// Updates for a room the account has left. Handed whole to leave
/// listeners, mirroring how the protocol reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeftRoomUpdate {
    /// Events delivered up to the point of leaving.
    #[serde(default)]
    pub timeline: Timeline,

    /// State of the room as of the leave.
    #[serde(default)]
    pub state: EventContainer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_response_only_needs_next_batch() {
        let response: SyncResponse = serde_json::from_value(json!({"next_batch": "s1"})).unwrap();
        assert_eq!(response.next_batch, "s1");
        assert!(response.presence.events.is_empty());
        assert!(response.rooms.join.is_empty());
        assert!(response.rooms.invite.is_empty());
        assert!(response.rooms.leave.is_empty());
        assert!(response.state.events.is_empty());
        assert!(response.device_one_time_keys_count.is_empty());
    }

    #[test]
    fn full_response_decomposes() {
        let response: SyncResponse = serde_json::from_value(json!({
            "next_batch": "s2",
            "presence": {"events": [{"type": "m.presence", "sender": "@bob:example.org"}]},
            "state": {"events": [{"type": "m.room.name", "state_key": "", "content": {"name": "Ops"}}]},
            "rooms": {
                "join": {
                    "!abc:example.org": {
                        "timeline": {
                            "events": [{"type": "m.room.message", "content": {"body": "hi"}}],
                            "prev_batch": "p1"
                        },
                        "ephemeral": {"events": [{"type": "m.typing", "content": {"user_ids": []}}]}
                    }
                },
                "invite": {
                    "!inv:example.org": {
                        "invite_state": {"events": [{"type": "m.room.member", "state_key": "@me:example.org"}]}
                    }
                },
                "leave": {
                    "!old:example.org": {}
                }
            },
            "device_one_time_keys_count": {"signed_curve25519": 50}
        }))
        .unwrap();

        assert_eq!(response.presence.events.len(), 1);
        assert_eq!(response.state.events.len(), 1);

        let joined = &response.rooms.join[&RoomId::parse("!abc:example.org").unwrap()];
        assert_eq!(joined.timeline.events.len(), 1);
        assert_eq!(joined.timeline.prev_batch.as_deref(), Some("p1"));
        assert_eq!(joined.ephemeral.events.len(), 1);

        let invited = &response.rooms.invite[&RoomId::parse("!inv:example.org").unwrap()];
        assert_eq!(invited.invite_state.events.len(), 1);

        assert!(response
            .rooms
            .leave
            .contains_key(&RoomId::parse("!old:example.org").unwrap()));
        assert_eq!(response.device_one_time_keys_count["signed_curve25519"], 50);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let response: SyncResponse = serde_json::from_value(json!({
            "next_batch": "s3",
            "to_device": {"events": []},
            "rooms": {"join": {"!abc:example.org": {"summary": {}, "unread_notifications": {}}}}
        }))
        .unwrap();
        assert_eq!(response.next_batch, "s3");
        assert_eq!(response.rooms.join.len(), 1);
    }
}
