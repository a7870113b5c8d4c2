//! Property → service-call mapping table.
//!
//! Each supported `(domain, property)` pair has exactly one [`PropertyRule`]:
//! a default target service plus a transform that coerces the caller's value
//! into a [`CallPlan`]. The table is built once and never mutated.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Value, json};

use habridge_domain::command::{CallPlan, Payload, coerce};
use habridge_domain::error::CommandError;

/// Converts a caller-supplied value into a call plan.
pub type Transform = fn(property: &str, value: &Value) -> Result<CallPlan, CommandError>;

/// How one property of one domain is set.
#[derive(Debug, Clone, Copy)]
pub struct PropertyRule {
    pub domain: &'static str,
    pub service: &'static str,
    pub transform: Transform,
}

impl PropertyRule {
    #[must_use]
    pub const fn new(domain: &'static str, service: &'static str, transform: Transform) -> Self {
        Self {
            domain,
            service,
            transform,
        }
    }
}

/// Read-only `domain → property → rule` table.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    domains: HashMap<&'static str, HashMap<&'static str, PropertyRule>>,
}

static STANDARD: LazyLock<MappingTable> = LazyLock::new(MappingTable::build_standard);

impl MappingTable {
    /// The built-in table covering lights, switches and climate devices.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Register `rule` for `property` of `domain`, replacing any previous rule.
    #[must_use]
    pub fn with_rule(mut self, domain: &'static str, property: &'static str, rule: PropertyRule) -> Self {
        self.domains.entry(domain).or_default().insert(property, rule);
        self
    }

    /// Rules for a domain, if the domain is supported at all.
    #[must_use]
    pub fn domain(&self, domain: &str) -> Option<&HashMap<&'static str, PropertyRule>> {
        self.domains.get(domain)
    }

    /// Look up the rule for `(domain, property)`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnsupportedDomain`] or
    /// [`CommandError::UnsupportedProperty`] when no rule exists.
    pub fn rule(&self, domain: &str, property: &str) -> Result<&PropertyRule, CommandError> {
        self.domain(domain)
            .ok_or_else(|| CommandError::UnsupportedDomain {
                domain: domain.to_string(),
            })?
            .get(property)
            .ok_or_else(|| CommandError::UnsupportedProperty {
                domain: domain.to_string(),
                property: property.to_string(),
            })
    }

    fn build_standard() -> Self {
        Self::default()
            .with_rule("light", "on", PropertyRule::new("light", "turn_on", light_on))
            .with_rule("light", "brightness", PropertyRule::new("light", "turn_on", integer))
            .with_rule("light", "color_temp", PropertyRule::new("light", "turn_on", integer))
            .with_rule("light", "hs_color", PropertyRule::new("light", "turn_on", passthrough))
            .with_rule("switch", "on", PropertyRule::new("switch", "turn_on", switch_on))
            .with_rule("climate", "hvac_mode", PropertyRule::new("climate", "set_hvac_mode", passthrough))
            .with_rule("climate", "temperature", PropertyRule::new("climate", "set_temperature", float))
            .with_rule("climate", "fan_mode", PropertyRule::new("climate", "set_fan_mode", passthrough))
    }
}

fn single(property: &str, value: Value) -> Payload {
    let mut data = Payload::new();
    data.insert(property.to_string(), value);
    data
}

fn on_off(domain: &'static str, value: &Value) -> CallPlan {
    if coerce::truthy(value) {
        CallPlan::Merge(Payload::new())
    } else {
        CallPlan::Override {
            domain,
            service: "turn_off",
            data: Payload::new(),
        }
    }
}

fn light_on(_property: &str, value: &Value) -> Result<CallPlan, CommandError> {
    Ok(on_off("light", value))
}

fn switch_on(_property: &str, value: &Value) -> Result<CallPlan, CommandError> {
    Ok(on_off("switch", value))
}

fn integer(property: &str, value: &Value) -> Result<CallPlan, CommandError> {
    let n = coerce::integer(property, value)?;
    Ok(CallPlan::Merge(single(property, json!(n))))
}

fn float(property: &str, value: &Value) -> Result<CallPlan, CommandError> {
    let f = coerce::float(property, value)?;
    Ok(CallPlan::Merge(single(property, json!(f))))
}

fn passthrough(property: &str, value: &Value) -> Result<CallPlan, CommandError> {
    Ok(CallPlan::Merge(single(property, value.clone())))
}
