//! JSON API handler modules, mounted under `/api/v1`.

#[allow(clippy::missing_errors_doc)]
pub mod command;
#[allow(clippy::missing_errors_doc)]
pub mod entities;
#[allow(clippy::missing_errors_doc)]
pub mod properties;
pub mod services;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use habridge_app::ports::{EntityRepository, HubClient};
use habridge_domain::error::BridgeError;
use habridge_domain::id::EntityId;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api/v1` sub-router.
pub fn routes<R, H>() -> Router<AppState<R, H>>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    Router::new()
        .route("/entities", get(entities::list::<R, H>))
        .route("/entities/{id}", get(entities::get::<R, H>))
        .route("/properties/{id}", get(properties::get::<R, H>))
        .route("/command", post(command::execute::<R, H>))
        .route("/services", get(services::list::<R, H>))
        .route("/status/stream", get(sse::stream::<R, H>))
}

/// Parse a path segment into an [`EntityId`], mapping failures to `400`.
fn parse_id(raw: String) -> Result<EntityId, ApiError> {
    EntityId::parse(raw).map_err(|err| ApiError::from(BridgeError::from(err)))
}
