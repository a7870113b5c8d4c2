//! Shared application state for axum handlers.

use std::sync::Arc;

use habridge_app::broadcaster::Broadcaster;
use habridge_app::ports::{EntityRepository, HubClient};
use habridge_app::services::catalog::StateCatalog;
use habridge_app::services::dispatcher::CommandDispatcher;
use habridge_app::services::service_registry::ServiceRegistry;

/// Application state shared across all axum handlers.
///
/// Generic over the entity repository and the hub client to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<R, H> {
    /// Entity reads.
    pub catalog: Arc<StateCatalog<R>>,
    /// Set-properties commands.
    pub dispatcher: Arc<CommandDispatcher<H>>,
    /// Change record fan-out for the SSE stream.
    pub broadcaster: Arc<Broadcaster>,
    /// Cached hub service list.
    pub services: Arc<ServiceRegistry>,
}

impl<R, H> Clone for AppState<R, H> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            dispatcher: Arc::clone(&self.dispatcher),
            broadcaster: Arc::clone(&self.broadcaster),
            services: Arc::clone(&self.services),
        }
    }
}

impl<R, H> AppState<R, H>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// The catalog, broadcaster and registry are shared with the ingestion
    /// loop, so they are built before the HTTP state.
    pub fn new(
        catalog: Arc<StateCatalog<R>>,
        dispatcher: CommandDispatcher<H>,
        broadcaster: Arc<Broadcaster>,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            catalog,
            dispatcher: Arc::new(dispatcher),
            broadcaster,
            services,
        }
    }
}
