//! Adjustable-properties view of an entity.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{Map, Value};

use habridge_app::ports::{EntityRepository, HubClient};
use habridge_domain::properties::adjustable;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PropertiesResponse {
    pub entity_id: String,
    pub domain: String,
    pub properties: Map<String, Value>,
}

/// `GET /api/v1/properties/{id}`
pub async fn get<R, H>(
    State(state): State<AppState<R, H>>,
    Path(id): Path<String>,
) -> Result<Json<PropertiesResponse>, ApiError>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    let id = super::parse_id(id)?;
    let entity = state.catalog.get(&id).await?;
    Ok(Json(PropertiesResponse {
        entity_id: entity.id.to_string(),
        domain: entity.domain().to_string(),
        properties: adjustable(&entity),
    }))
}
