//! Change records: immutable notifications of an accepted entity update.
//!
//! Change records only exist on the broadcast path; they are never persisted.

use serde::{Deserialize, Serialize};

use crate::entity::{Attributes, Entity};
use crate::id::EntityId;

/// Kind of change carried by a [`ChangeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// An entity's state and/or attributes were overwritten.
    #[default]
    State,
}

impl ChangeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a change record, as sent to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeData {
    pub entity_id: EntityId,
    pub state: String,
    pub attributes: Attributes,
}

/// One broadcastable state update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "event")]
    pub kind: ChangeKind,
    pub data: ChangeData,
}

impl ChangeRecord {
    /// Build a state change record reflecting exactly what `entity` holds.
    #[must_use]
    pub fn state(entity: &Entity) -> Self {
        Self {
            kind: ChangeKind::State,
            data: ChangeData {
                entity_id: entity.id.clone(),
                state: entity.state.clone(),
                attributes: entity.attributes.clone(),
            },
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.data.entity_id
    }
}
