//! Wire shapes of the remote hub's REST and websocket protocol.
//!
//! These mirror what the hub sends; converting them into [`Entity`] values
//! happens here so adapters and services share one interpretation.

use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::{Attributes, Entity};
use crate::error::{MalformedEvent, ValidationError};
use crate::id::EntityId;
use crate::time::Timestamp;

/// Event type carrying entity state changes.
pub const STATE_CHANGED: &str = "state_changed";

/// State the hub reports for entities it has no value for.
pub const UNKNOWN_STATE: &str = "unknown";

/// One entity state as returned by `GET /api/states` or embedded in events.
///
/// `entity_id` may be absent inside events, where the envelope carries it. A
/// missing or `null` state reads as [`UNKNOWN_STATE`], `null` attributes as
/// an empty map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default = "unknown_state", deserialize_with = "state_or_unknown")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Attributes,
    #[serde(default)]
    pub last_changed: Option<Timestamp>,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
}

fn unknown_state() -> String {
    UNKNOWN_STATE.to_string()
}

fn state_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_state))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Attributes, D::Error> {
    Ok(Option::<Attributes>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawState {
    /// Convert into an [`Entity`], using `now` for missing timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEntityId`] when `entity_id` is not
    /// of the form `domain.name`.
    pub fn into_entity(self, now: Timestamp) -> Result<Entity, ValidationError> {
        self.into_entity_after(None, now)
    }

    /// Convert into an [`Entity`] replacing `previous`.
    ///
    /// Timestamps the hub left out are carried over from `previous` while the
    /// value they date is unchanged: `last_changed` while the state is the
    /// same, `last_updated` while state and attributes are. A new state dates
    /// both from `now`, new attributes only `last_updated`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEntityId`] when `entity_id` is not
    /// of the form `domain.name`.
    pub fn into_entity_after(
        self,
        previous: Option<&Entity>,
        now: Timestamp,
    ) -> Result<Entity, ValidationError> {
        let id = EntityId::parse(self.entity_id)?;
        let same_state = previous.filter(|prev| prev.id == id && prev.state == self.state);
        let same_row = same_state.filter(|prev| prev.attributes == self.attributes);

        let last_changed = self
            .last_changed
            .or_else(|| same_state.map(|prev| prev.last_changed))
            .unwrap_or(now);
        let last_updated = self
            .last_updated
            .or_else(|| same_row.map(|prev| prev.last_updated))
            .unwrap_or(if same_state.is_some() { now } else { last_changed });
        Ok(Entity::new(id, self.state, self.attributes, now)
            .with_timestamps(last_changed, last_updated))
    }

    /// Whether the hub left out either timestamp.
    #[must_use]
    pub fn lacks_timestamps(&self) -> bool {
        self.last_changed.is_none() || self.last_updated.is_none()
    }
}

/// Services exposed by the hub for one domain (`GET /api/services`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDomain {
    pub domain: String,
    #[serde(default)]
    pub services: serde_json::Map<String, serde_json::Value>,
}

/// A decoded websocket frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        id: u64,
        success: bool,
        #[serde(default)]
        result: serde_json::Value,
    },
    Event {
        id: u64,
        event: HubEvent,
    },
    Pong {
        id: u64,
    },
    #[serde(other)]
    Unknown,
}

/// An event delivered on a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub time_fired: Option<Timestamp>,
}

#[derive(Deserialize)]
struct StateChangedData {
    entity_id: String,
    #[serde(default)]
    new_state: Option<RawState>,
}

/// A validated state change extracted from a [`HubEvent`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub entity_id: EntityId,
    pub new_state: RawState,
}

impl HubEvent {
    /// Extract the state change carried by this event.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedEvent`] describing why the event is not an
    /// applicable state change (other event type, missing `new_state` as on
    /// entity removal, undecodable payload, or invalid entity id).
    pub fn state_change(&self) -> Result<StateChange, MalformedEvent> {
        if self.event_type != STATE_CHANGED {
            return Err(MalformedEvent::Irrelevant(self.event_type.clone()));
        }
        let data: StateChangedData =
            serde_json::from_value(self.data.clone()).map_err(MalformedEvent::Decode)?;
        let entity_id = EntityId::parse(data.entity_id)?;
        let mut new_state = data.new_state.ok_or(MalformedEvent::MissingNewState)?;
        // the envelope id is authoritative
        new_state.entity_id = entity_id.to_string();
        Ok(StateChange {
            entity_id,
            new_state,
        })
    }
}

/// Client → hub frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth { access_token: String },
    SubscribeEvents { id: u64, event_type: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_rfc3339;
    use serde_json::json;

    fn state_changed(data: serde_json::Value) -> HubEvent {
        HubEvent {
            event_type: STATE_CHANGED.to_string(),
            data,
            time_fired: None,
        }
    }

    #[test]
    fn should_decode_auth_required_frame() {
        let msg: HubMessage =
            serde_json::from_str(r#"{"type":"auth_required","ha_version":"2024.1.0"}"#).unwrap();
        assert_eq!(
            msg,
            HubMessage::AuthRequired {
                ha_version: Some("2024.1.0".to_string())
            }
        );
    }

    #[test]
    fn should_decode_unknown_frame_type_as_unknown() {
        let msg: HubMessage = serde_json::from_str(r#"{"type":"something_new","x":1}"#).unwrap();
        assert_eq!(msg, HubMessage::Unknown);
    }

    #[test]
    fn should_decode_event_frame() {
        let raw = json!({
            "id": 1,
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": "light.kitchen",
                    "new_state": {"entity_id": "light.kitchen", "state": "on", "attributes": {"brightness": 180}}
                },
                "time_fired": "2024-01-01T12:00:00.000000+00:00"
            }
        });
        let msg: HubMessage = serde_json::from_value(raw).unwrap();
        let HubMessage::Event { id, event } = msg else {
            panic!("expected event frame");
        };
        assert_eq!(id, 1);
        let change = event.state_change().unwrap();
        assert_eq!(change.entity_id.as_str(), "light.kitchen");
        assert_eq!(change.new_state.state, "on");
        assert_eq!(change.new_state.attributes["brightness"], json!(180));
    }

    #[test]
    fn should_reject_state_change_without_new_state() {
        let event = state_changed(json!({"entity_id": "light.kitchen", "new_state": null}));
        assert!(matches!(
            event.state_change(),
            Err(MalformedEvent::MissingNewState)
        ));
    }

    #[test]
    fn should_reject_other_event_types() {
        let event = HubEvent {
            event_type: "call_service".to_string(),
            data: json!({}),
            time_fired: None,
        };
        assert!(matches!(
            event.state_change(),
            Err(MalformedEvent::Irrelevant(_))
        ));
    }

    #[test]
    fn should_reject_invalid_entity_id() {
        let event = state_changed(json!({
            "entity_id": "nodot",
            "new_state": {"entity_id": "nodot", "state": "on"}
        }));
        assert!(matches!(
            event.state_change(),
            Err(MalformedEvent::InvalidEntityId(_))
        ));
    }

    #[test]
    fn should_reject_undecodable_payload() {
        let event = state_changed(json!({"new_state": {"state": "on"}}));
        assert!(matches!(event.state_change(), Err(MalformedEvent::Decode(_))));
    }

    #[test]
    fn should_convert_raw_state_using_hub_timestamps() {
        let raw: RawState = serde_json::from_value(json!({
            "entity_id": "switch.porch",
            "state": "off",
            "attributes": {"friendly_name": "Porch"},
            "last_changed": "2024-01-01T10:00:00+00:00",
            "last_updated": "2024-01-01T11:00:00+00:00"
        }))
        .unwrap();
        let entity = raw.into_entity(crate::time::now()).unwrap();
        assert_eq!(entity.friendly_name.as_deref(), Some("Porch"));
        assert_eq!(entity.last_changed.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        assert_eq!(entity.last_updated.to_rfc3339(), "2024-01-01T11:00:00+00:00");
    }

    #[test]
    fn should_take_entity_id_from_envelope_when_new_state_omits_it() {
        let event = state_changed(json!({
            "entity_id": "light.kitchen",
            "new_state": {"state": "on", "attributes": {}}
        }));

        let change = event.state_change().unwrap();

        assert_eq!(change.entity_id.as_str(), "light.kitchen");
        assert_eq!(change.new_state.entity_id, "light.kitchen");
        assert_eq!(change.new_state.state, "on");
    }

    #[test]
    fn should_read_null_or_missing_state_as_unknown() {
        let states: Vec<RawState> = serde_json::from_value(json!([
            {"entity_id": "light.a", "state": "on"},
            {"entity_id": "sensor.b", "state": null, "attributes": null},
            {"entity_id": "sensor.c"}
        ]))
        .unwrap();

        let values: Vec<&str> = states.iter().map(|s| s.state.as_str()).collect();
        assert_eq!(values, vec!["on", UNKNOWN_STATE, UNKNOWN_STATE]);
        assert!(states[1].attributes.is_empty());
    }

    #[test]
    fn should_keep_previous_timestamps_when_hub_omits_them_and_nothing_changed() {
        let earlier = parse_rfc3339("2024-01-01T10:00:00+00:00").unwrap();
        let later = parse_rfc3339("2024-01-01T12:00:00+00:00").unwrap();
        let raw = |state: &str, attributes: serde_json::Value| -> RawState {
            serde_json::from_value(json!({"entity_id": "light.a", "state": state, "attributes": attributes}))
                .unwrap()
        };
        let previous = raw("on", json!({"brightness": 1})).into_entity(earlier).unwrap();

        let same = raw("on", json!({"brightness": 1}))
            .into_entity_after(Some(&previous), later)
            .unwrap();
        assert_eq!(same, previous);

        let dimmed = raw("on", json!({"brightness": 2}))
            .into_entity_after(Some(&previous), later)
            .unwrap();
        assert_eq!(dimmed.last_changed, earlier);
        assert_eq!(dimmed.last_updated, later);

        let off = raw("off", json!({"brightness": 1}))
            .into_entity_after(Some(&previous), later)
            .unwrap();
        assert_eq!(off.last_changed, later);
        assert_eq!(off.last_updated, later);
    }

    #[test]
    fn should_encode_client_frames_with_type_tag() {
        let auth = serde_json::to_value(ClientMessage::Auth {
            access_token: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(auth, json!({"type": "auth", "access_token": "secret"}));

        let sub = serde_json::to_value(ClientMessage::SubscribeEvents {
            id: 1,
            event_type: STATE_CHANGED.to_string(),
        })
        .unwrap();
        assert_eq!(
            sub,
            json!({"type": "subscribe_events", "id": 1, "event_type": "state_changed"})
        );
    }
}
