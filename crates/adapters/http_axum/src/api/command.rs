//! Set-properties command endpoint.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use habridge_app::ports::{EntityRepository, HubClient};
use habridge_domain::command::{CallReport, CommandStatus, Payload};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_ACTOR: &str = "api";

/// Request body for `POST /api/v1/command`.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub entity_id: String,
    #[serde(default)]
    pub properties: Payload,
    /// Who issued the command; only logged.
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    pub results: Vec<CallReport>,
}

/// `POST /api/v1/command`
///
/// Every call is attempted even when an earlier one fails; the response lists
/// one outcome per call in execution order.
pub async fn execute<R, H>(
    State(state): State<AppState<R, H>>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    let entity_id = super::parse_id(req.entity_id)?;
    let actor = req.actor.as_deref().unwrap_or(DEFAULT_ACTOR);

    let results = state.dispatcher.dispatch(&entity_id, &req.properties).await?;
    let status = CommandStatus::of(&results);
    tracing::info!(%entity_id, actor, calls = results.len(), ?status, "command dispatched");

    Ok(Json(CommandResponse { status, results }))
}
