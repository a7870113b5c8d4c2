//! Cached hub service list.

use axum::Json;
use axum::extract::State;

use habridge_app::ports::{EntityRepository, HubClient};
use habridge_domain::hub::ServiceDomain;

use crate::state::AppState;

/// `GET /api/v1/services`
///
/// Empty until the first successful full sync.
pub async fn list<R, H>(State(state): State<AppState<R, H>>) -> Json<Vec<ServiceDomain>>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    Json(state.services.snapshot().as_ref().clone())
}
