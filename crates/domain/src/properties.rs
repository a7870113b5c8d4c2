//! Adjustable-property projection.
//!
//! A heuristic, read-only view of what a caller could set on an entity,
//! derived purely from its current state and attributes.

use serde_json::{Map, Value};

use crate::entity::Entity;

const LIGHT_ATTRIBUTES: [&str; 3] = ["brightness", "color_temp", "hs_color"];
const CLIMATE_ATTRIBUTES: [&str; 3] = ["hvac_mode", "temperature", "fan_mode"];

/// Project the adjustable properties of `entity`.
///
/// Unrecognised domains yield an empty map.
#[must_use]
pub fn adjustable(entity: &Entity) -> Map<String, Value> {
    let mut props = Map::new();
    match entity.domain() {
        "light" => {
            props.insert("on".to_string(), Value::Bool(entity.state != "off"));
            copy_present(entity, &LIGHT_ATTRIBUTES, &mut props);
        }
        "switch" => {
            props.insert("on".to_string(), Value::Bool(entity.state == "on"));
        }
        "climate" => copy_present(entity, &CLIMATE_ATTRIBUTES, &mut props),
        _ => {}
    }
    props
}

fn copy_present(entity: &Entity, keys: &[&str], props: &mut Map<String, Value>) {
    for key in keys {
        if let Some(value) = entity.attribute(key) {
            props.insert((*key).to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Attributes;
    use crate::id::EntityId;
    use crate::time::now;
    use serde_json::json;

    fn entity(id: &str, state: &str, attributes: Value) -> Entity {
        let Value::Object(attributes) = attributes else {
            panic!("attributes must be an object");
        };
        Entity::new(EntityId::parse(id).unwrap(), state, attributes, now())
    }

    #[test]
    fn should_project_light_on_flag_and_present_attributes() {
        let e = entity(
            "light.kitchen",
            "on",
            json!({"brightness": 180, "hs_color": [30, 50], "friendly_name": "Kitchen"}),
        );
        let props = adjustable(&e);
        assert_eq!(props["on"], json!(true));
        assert_eq!(props["brightness"], json!(180));
        assert_eq!(props["hs_color"], json!([30, 50]));
        assert!(!props.contains_key("color_temp"));
        assert!(!props.contains_key("friendly_name"));
    }

    #[test]
    fn should_treat_unavailable_light_as_on() {
        // only an explicit "off" turns the flag off
        let e = entity("light.hall", "unavailable", json!({}));
        assert_eq!(adjustable(&e)["on"], json!(true));
    }

    #[test]
    fn should_project_switch_on_only_when_state_is_on() {
        assert_eq!(adjustable(&entity("switch.a", "on", json!({})))["on"], json!(true));
        assert_eq!(
            adjustable(&entity("switch.a", "unavailable", json!({})))["on"],
            json!(false)
        );
    }

    #[test]
    fn should_project_climate_attributes() {
        let e = entity(
            "climate.living",
            "heat",
            json!({"hvac_mode": "heat", "temperature": 21.5, "current_temperature": 20}),
        );
        let props = adjustable(&e);
        assert_eq!(props.len(), 2);
        assert_eq!(props["temperature"], json!(21.5));
    }

    #[test]
    fn should_return_empty_map_for_unknown_domain() {
        let e = entity("vacuum.robot", "docked", Value::Object(Attributes::new()));
        assert!(adjustable(&e).is_empty());
    }
}
