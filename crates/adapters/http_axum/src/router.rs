//! Axum router assembly.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use habridge_app::ports::{EntityRepository, HubClient};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api/v1`. Includes a permissive CORS layer and a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG` level.
pub fn build<R, H>(state: AppState<R, H>) -> Router
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", crate::api::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct RootStatus {
    name: &'static str,
    status: &'static str,
}

async fn root() -> Json<RootStatus> {
    Json(RootStatus {
        name: "habridge",
        status: "ok",
    })
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingHub, get_json, post_json, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state(RecordingHub::default()).await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_report_name_and_status_at_root() {
        let app = build(test_state(RecordingHub::default()).await);

        let (status, body) = get_json(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"name": "habridge", "status": "ok"}));
    }

    #[tokio::test]
    async fn should_allow_any_origin() {
        let app = build(test_state(RecordingHub::default()).await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/entities")
                    .header("origin", "http://dashboard.local")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_route() {
        let app = build(test_state(RecordingHub::default()).await);

        let (status, _) = post_json(app, "/api/v1/nope", json!({})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
