//! Application services — use-case implementations.
//!
//! Each service accepts port implementations through generic parameters
//! (constructor injection), keeping this layer decoupled from adapters.

pub mod catalog;
pub mod dispatcher;
pub mod service_registry;
