//! Command dispatcher — turns "set these properties" into hub service calls.
//!
//! Planning resolves every property through the [`MappingTable`] before any
//! call is issued, so caller errors are rejected upfront. Execution then runs
//! the calls one after another and reports every outcome; a failed call does
//! not stop the remaining ones and nothing is rolled back.

use habridge_domain::command::{CallOutcome, CallPlan, CallReport, ENTITY_ID, Payload, ServiceCall};
use habridge_domain::error::{BridgeError, CommandError};
use habridge_domain::id::EntityId;

use crate::mapping::MappingTable;
use crate::ports::HubClient;

/// Application service executing set-properties requests.
pub struct CommandDispatcher<H> {
    hub: H,
    table: &'static MappingTable,
}

impl<H: HubClient + Sync> CommandDispatcher<H> {
    /// Create a dispatcher using the built-in mapping table.
    pub fn new(hub: H) -> Self {
        Self::with_table(hub, MappingTable::standard())
    }

    /// Create a dispatcher using a custom mapping table.
    pub fn with_table(hub: H, table: &'static MappingTable) -> Self {
        Self { hub, table }
    }

    /// Resolve `properties` into service calls, in the caller's order.
    ///
    /// Two properties resolving to the same service still produce two calls.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Command`] when the domain or a property is not
    /// mapped, or when a value cannot be coerced.
    pub fn plan(&self, entity_id: &EntityId, properties: &Payload) -> Result<Vec<ServiceCall>, BridgeError> {
        let domain = entity_id.domain();
        if self.table.domain(domain).is_none() {
            return Err(CommandError::UnsupportedDomain {
                domain: domain.to_string(),
            }
            .into());
        }

        properties
            .iter()
            .map(|(property, value)| {
                let rule = self.table.rule(domain, property)?;
                let call = match (rule.transform)(property, value)? {
                    CallPlan::Merge(data) => ServiceCall {
                        domain: rule.domain.to_string(),
                        service: rule.service.to_string(),
                        data,
                    },
                    CallPlan::Override {
                        domain,
                        service,
                        data,
                    } => ServiceCall {
                        domain: domain.to_string(),
                        service: service.to_string(),
                        data,
                    },
                };
                Ok(with_entity_id(call, entity_id))
            })
            .collect()
    }

    /// Plan and execute a set-properties request.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Command`] when planning fails; no remote call
    /// is made in that case. Remote failures are reported per call instead.
    pub async fn dispatch(
        &self,
        entity_id: &EntityId,
        properties: &Payload,
    ) -> Result<Vec<CallReport>, BridgeError> {
        let calls = self.plan(entity_id, properties)?;
        let mut reports = Vec::with_capacity(calls.len());
        for call in calls {
            let outcome = CallOutcome::from(self.hub.invoke(&call).await);
            match &outcome {
                CallOutcome::Ok { .. } => {
                    tracing::debug!(%entity_id, domain = %call.domain, service = %call.service, "service call succeeded");
                }
                CallOutcome::Error { kind, message } => {
                    tracing::warn!(%entity_id, domain = %call.domain, service = %call.service, kind, message, "service call failed");
                }
            }
            reports.push(CallReport { call, outcome });
        }
        Ok(reports)
    }
}

fn with_entity_id(mut call: ServiceCall, entity_id: &EntityId) -> ServiceCall {
    call.data
        .insert(ENTITY_ID.to_string(), serde_json::Value::String(entity_id.to_string()));
    call
}
