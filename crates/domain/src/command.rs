//! Service calls — the hub's command vocabulary.
//!
//! Examples: `light.turn_on`, `switch.turn_off`, `climate.set_temperature`.
//! A set-properties request is planned into a list of [`ServiceCall`]s, each
//! executed against the hub and reported as a [`CallReport`].

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, RemoteError};

/// JSON object sent as a service call payload.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Payload key carrying the target entity.
pub const ENTITY_ID: &str = "entity_id";

/// A fully resolved remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub data: Payload,
}

/// What a property transform asks the dispatcher to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CallPlan {
    /// Send `data` to the property's default target.
    Merge(Payload),
    /// Send `data` to a different target altogether.
    Override {
        domain: &'static str,
        service: &'static str,
        data: Payload,
    },
}

/// Result of executing one [`ServiceCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Ok { result: serde_json::Value },
    Error { kind: String, message: String },
}

impl CallOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

impl From<Result<serde_json::Value, RemoteError>> for CallOutcome {
    fn from(value: Result<serde_json::Value, RemoteError>) -> Self {
        match value {
            Ok(result) => Self::Ok { result },
            Err(err) => {
                let message = match &err {
                    RemoteError::Rejected { body, .. } if !body.is_empty() => {
                        format!("{err}: {body}")
                    }
                    RemoteError::Rejected { status, .. } => format!("status {status}"),
                    RemoteError::Unavailable(source) => format!("{err}: {source}"),
                };
                Self::Error {
                    kind: err.kind().to_string(),
                    message,
                }
            }
        }
    }
}

/// One executed call and what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallReport {
    pub call: ServiceCall,
    pub outcome: CallOutcome,
}

/// Aggregate status over a list of [`CallReport`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Partial,
    Failed,
}

impl CommandStatus {
    #[must_use]
    pub fn of(reports: &[CallReport]) -> Self {
        let succeeded = reports.iter().filter(|r| r.outcome.is_ok()).count();
        if succeeded == reports.len() {
            Self::Ok
        } else if succeeded == 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }
}

/// Value coercions used by property transforms.
pub mod coerce {
    use serde_json::Value;

    use super::CommandError;

    /// JSON truthiness: `false`, `null`, zero, and empty strings/arrays/objects are falsy.
    #[must_use]
    pub fn truthy(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }

    /// Coerce to an integer, truncating floats toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidValue`] for values with no integer reading.
    #[allow(clippy::cast_possible_truncation)]
    pub fn integer(property: &str, value: &Value) -> Result<i64, CommandError> {
        let parsed = match value {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| invalid(property, "an integer"))
    }

    /// Coerce to a floating-point number.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidValue`] for values with no numeric reading.
    pub fn float(property: &str, value: &Value) -> Result<f64, CommandError> {
        let parsed = match value {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|f| f.is_finite())
            .ok_or_else(|| invalid(property, "a number"))
    }

    fn invalid(property: &str, expected: &'static str) -> CommandError {
        CommandError::InvalidValue {
            property: property.to_string(),
            expected,
        }
    }
}
