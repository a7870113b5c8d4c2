//! JSON handlers for entities.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use habridge_app::ports::{EntityRepository, HubClient};
use habridge_domain::entity::{Attributes, Entity, EntityFilter};

use crate::error::ApiError;
use crate::state::AppState;

/// Entity as exposed to API clients.
#[derive(Debug, Serialize)]
pub struct EntityResponse {
    pub entity_id: String,
    pub domain: String,
    pub friendly_name: Option<String>,
    pub state: String,
    pub attributes: Attributes,
}

impl From<Entity> for EntityResponse {
    fn from(entity: Entity) -> Self {
        Self {
            entity_id: entity.id.to_string(),
            domain: entity.domain().to_string(),
            friendly_name: entity.friendly_name,
            state: entity.state,
            attributes: entity.attributes,
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<EntityResponse>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<EntityResponse>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/v1/entities?q=&domain=`
pub async fn list<R, H>(
    State(state): State<AppState<R, H>>,
    Query(filter): Query<EntityFilter>,
) -> Result<ListResponse, ApiError>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    let entities = state.catalog.list(&filter).await?;
    Ok(ListResponse::Ok(Json(
        entities.into_iter().map(EntityResponse::from).collect(),
    )))
}

/// `GET /api/v1/entities/{id}`
pub async fn get<R, H>(
    State(state): State<AppState<R, H>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    let id = super::parse_id(id)?;
    let entity = state.catalog.get(&id).await?;
    Ok(GetResponse::Ok(Json(entity.into())))
}
