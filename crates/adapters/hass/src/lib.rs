//! # habridge-adapter-hass
//!
//! Remote hub adapter — talks to the home-automation hub over its REST API
//! and its websocket event API.
//!
//! ## Responsibilities
//! - [`HassClient`] implements the `HubClient` port: snapshot, service list
//!   and service calls, each with a fixed request timeout
//! - [`HassEventStream`] implements the `EventSource` port: one background
//!   task per stream owns the websocket, performs the auth handshake,
//!   subscribes to state changes and reconnects after a fixed delay
//!
//! ## Dependency rule
//! Same as other adapters: depends on `habridge-app` and `habridge-domain`.

mod client;
mod config;
mod error;
mod stream;

pub use client::HassClient;
pub use config::HassConfig;
pub use error::HassError;
pub use stream::HassEventStream;
