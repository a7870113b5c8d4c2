//! Entity identifiers of the form `domain.name`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Unique identifier for an [`Entity`](crate::entity::Entity), e.g. `light.kitchen`.
///
/// The domain is the part before the first `.`. Both parts are non-empty, so
/// [`domain`](Self::domain) is always derivable from the id itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse and validate an entity id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEntityId`] when the value does not
    /// have the `domain.name` shape.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        match value.split_once('.') {
            Some((domain, name)) if !domain.is_empty() && !name.is_empty() => Ok(Self(value)),
            _ => Err(ValidationError::InvalidEntityId(value)),
        }
    }

    /// The category prefix, e.g. `light` for `light.kitchen`.
    #[must_use]
    pub fn domain(&self) -> &str {
        // validated in `parse`, the separator is always present
        self.0.split_once('.').map_or(self.0.as_str(), |(domain, _)| domain)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}
