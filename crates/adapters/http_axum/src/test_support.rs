//! In-memory ports and request helpers shared by handler tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use habridge_app::broadcaster::Broadcaster;
use habridge_app::ports::{EntityRepository, HubClient};
use habridge_app::services::catalog::StateCatalog;
use habridge_app::services::dispatcher::CommandDispatcher;
use habridge_app::services::service_registry::ServiceRegistry;
use habridge_domain::command::ServiceCall;
use habridge_domain::entity::Entity;
use habridge_domain::error::{BridgeError, RemoteError};
use habridge_domain::hub::{RawState, ServiceDomain};
use habridge_domain::id::EntityId;

use crate::state::AppState;

#[derive(Default)]
pub(crate) struct InMemoryRepo {
    store: Mutex<BTreeMap<EntityId, Entity>>,
}

impl EntityRepository for InMemoryRepo {
    fn upsert(&self, entity: Entity) -> impl Future<Output = Result<Entity, BridgeError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(entity.id.clone(), entity.clone());
        async { Ok(entity) }
    }

    fn get_by_id(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, BridgeError>> + Send {
        let result = self.store.lock().unwrap().get(id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, BridgeError>> + Send {
        let result: Vec<Entity> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }
}

/// Records invoked calls; rejects the services listed in `failing`.
#[derive(Default)]
pub(crate) struct RecordingHub {
    pub calls: Mutex<Vec<ServiceCall>>,
    pub failing: Vec<&'static str>,
}

impl HubClient for RecordingHub {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Vec<RawState>, RemoteError>> + Send {
        async { Ok(vec![]) }
    }

    fn fetch_services(&self) -> impl Future<Output = Result<Vec<ServiceDomain>, RemoteError>> + Send {
        async { Ok(vec![]) }
    }

    fn invoke(&self, call: &ServiceCall) -> impl Future<Output = Result<Value, RemoteError>> + Send {
        self.calls.lock().unwrap().push(call.clone());
        let result = if self.failing.contains(&call.service.as_str()) {
            Err(RemoteError::Unavailable("connection reset".into()))
        } else {
            Ok(json!([]))
        };
        async { result }
    }
}

/// State seeded with a light, a switch and a climate device.
pub(crate) async fn test_state<H>(hub: H) -> AppState<InMemoryRepo, H>
where
    H: HubClient + Send + Sync + 'static,
{
    let catalog = Arc::new(StateCatalog::new(InMemoryRepo::default()));
    let snapshot: Vec<RawState> = serde_json::from_value(json!([
        {"entity_id": "light.kitchen", "state": "on",
         "attributes": {"friendly_name": "Kitchen Ceiling", "brightness": 180}},
        {"entity_id": "switch.porch", "state": "off", "attributes": {"friendly_name": "Porch"}},
        {"entity_id": "climate.hall", "state": "heat",
         "attributes": {"hvac_mode": "heat", "temperature": 21, "current_temperature": 19.5}}
    ]))
    .unwrap();
    catalog.hydrate(snapshot).await.unwrap();

    AppState::new(
        catalog,
        CommandDispatcher::new(hub),
        Arc::new(Broadcaster::new(16)),
        Arc::new(ServiceRegistry::new()),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub(crate) async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub(crate) async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}
