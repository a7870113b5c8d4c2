//! The remote hub, as seen by the core.
//!
//! The hub exposes one-shot REST calls ([`HubClient`]) and a persistent
//! event stream ([`EventSource`]). Neither retries one-shot failures; the
//! event source alone hides reconnects from its consumer.

use std::future::Future;

use tokio_stream::Stream;

use habridge_domain::command::ServiceCall;
use habridge_domain::error::RemoteError;
use habridge_domain::hub::{HubMessage, RawState, ServiceDomain};

/// One-shot REST access to the hub.
pub trait HubClient {
    /// Read the current state of every entity.
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Vec<RawState>, RemoteError>> + Send;

    /// Read the list of services the hub exposes, per domain.
    fn fetch_services(
        &self,
    ) -> impl Future<Output = Result<Vec<ServiceDomain>, RemoteError>> + Send;

    /// Execute a service call and return the hub's response body.
    fn invoke(
        &self,
        call: &ServiceCall,
    ) -> impl Future<Output = Result<serde_json::Value, RemoteError>> + Send;
}

impl<T: HubClient + Send + Sync> HubClient for std::sync::Arc<T> {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Vec<RawState>, RemoteError>> + Send {
        (**self).fetch_snapshot()
    }

    fn fetch_services(
        &self,
    ) -> impl Future<Output = Result<Vec<ServiceDomain>, RemoteError>> + Send {
        (**self).fetch_services()
    }

    fn invoke(
        &self,
        call: &ServiceCall,
    ) -> impl Future<Output = Result<serde_json::Value, RemoteError>> + Send {
        (**self).invoke(call)
    }
}

/// The hub's persistent event stream.
pub trait EventSource {
    /// The stream type returned by [`events`](Self::events).
    type Stream: Stream<Item = HubMessage> + Send + Unpin + 'static;

    /// Open the event stream.
    ///
    /// The returned stream reconnects transparently and only ends when the
    /// source is shut down.
    fn events(&self) -> Self::Stream;
}
