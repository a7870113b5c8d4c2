//! Entities mirrored from the hub.
//!
//! An entity represents a single observable/controllable unit (e.g. a light,
//! a thermostat). Its state is always a string as reported by the hub, and
//! its attributes are an open JSON mapping.

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::time::Timestamp;

/// Open attribute mapping, kept in the order the hub reported it.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Attribute key the hub uses for the human-readable name.
pub const FRIENDLY_NAME: &str = "friendly_name";

/// The local mirror of one hub entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub friendly_name: Option<String>,
    pub state: String,
    pub attributes: Attributes,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    /// Build an entity from its id, state and attributes.
    ///
    /// The friendly name is taken from the `friendly_name` attribute when it
    /// holds a string.
    #[must_use]
    pub fn new(id: EntityId, state: impl Into<String>, attributes: Attributes, ts: Timestamp) -> Self {
        let friendly_name = attributes
            .get(FRIENDLY_NAME)
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);
        Self {
            id,
            friendly_name,
            state: state.into(),
            attributes,
            last_changed: ts,
            last_updated: ts,
        }
    }

    /// Override the hub-reported timestamps.
    #[must_use]
    pub fn with_timestamps(mut self, last_changed: Timestamp, last_updated: Timestamp) -> Self {
        self.last_changed = last_changed;
        self.last_updated = last_updated;
        self
    }

    /// Domain derived from the id.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.id.domain()
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

/// Read-side filter for listing entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntityFilter {
    /// Case-insensitive substring matched against `id + " " + friendly_name`.
    #[serde(default, rename = "q")]
    pub query: Option<String>,
    /// Exact domain match.
    #[serde(default)]
    pub domain: Option<String>,
}

impl EntityFilter {
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        let query_matches = self
            .query
            .as_deref()
            .filter(|q| !q.is_empty())
            .is_none_or(|query| {
                format!(
                    "{} {}",
                    entity.id.as_str(),
                    entity.friendly_name.as_deref().unwrap_or_default()
                )
                .to_lowercase()
                .contains(&query.to_lowercase())
            });
        let domain_matches = self
            .domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .is_none_or(|domain| entity.domain() == domain);
        query_matches && domain_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;
    use serde_json::json;

    fn entity(id: &str, name: Option<&str>) -> Entity {
        let mut attributes = Attributes::new();
        if let Some(name) = name {
            attributes.insert(FRIENDLY_NAME.to_string(), json!(name));
        }
        Entity::new(EntityId::parse(id).unwrap(), "on", attributes, now())
    }

    #[test]
    fn should_take_friendly_name_from_attributes() {
        let e = entity("light.kitchen", Some("Kitchen Light"));
        assert_eq!(e.friendly_name.as_deref(), Some("Kitchen Light"));
        assert_eq!(e.domain(), "light");
    }

    #[test]
    fn should_ignore_non_string_friendly_name() {
        let mut attributes = Attributes::new();
        attributes.insert(FRIENDLY_NAME.to_string(), json!(42));
        let e = Entity::new(EntityId::parse("light.a").unwrap(), "on", attributes, now());
        assert!(e.friendly_name.is_none());
    }

    #[test]
    fn should_match_everything_when_filter_is_empty() {
        assert!(EntityFilter::default().matches(&entity("light.kitchen", None)));
    }

    #[test]
    fn should_match_query_against_id_and_name_case_insensitively() {
        let e = entity("light.k1", Some("Kitchen Ceiling"));
        let by_name = EntityFilter {
            query: Some("CEILING".to_string()),
            domain: None,
        };
        let by_id = EntityFilter {
            query: Some("light.k".to_string()),
            domain: None,
        };
        let miss = EntityFilter {
            query: Some("garage".to_string()),
            domain: None,
        };
        assert!(by_name.matches(&e));
        assert!(by_id.matches(&e));
        assert!(!miss.matches(&e));
    }

    #[test]
    fn should_match_domain_exactly() {
        let e = entity("switch.porch", None);
        let exact = EntityFilter {
            query: None,
            domain: Some("switch".to_string()),
        };
        let prefix = EntityFilter {
            query: None,
            domain: Some("swit".to_string()),
        };
        assert!(exact.matches(&e));
        assert!(!prefix.matches(&e));
    }

    #[test]
    fn should_require_both_query_and_domain_when_both_set() {
        let e = entity("light.porch", Some("Porch"));
        let filter = EntityFilter {
            query: Some("porch".to_string()),
            domain: Some("switch".to_string()),
        };
        assert!(!filter.matches(&e));
    }
}
