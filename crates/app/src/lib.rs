//! # habridge-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `EntityRepository` — persisted entity state
//!   - `HubClient` — one-shot REST access to the hub
//!   - `EventSource` — the hub's reconnecting event stream
//!   - `ChangePublisher` — outbound change notifications
//! - Provide the use-cases:
//!   - `StateCatalog` — hydrate, apply events, list, get
//!   - `CommandDispatcher` — map property writes to service calls
//!   - `IngestionLoop` — keep the catalog in sync with the hub
//! - Provide **in-process infrastructure** (the change broadcaster) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `habridge-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod broadcaster;
pub mod ingestion;
pub mod mapping;
pub mod ports;
pub mod services;
