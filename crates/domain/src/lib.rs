//! # habridge-domain
//!
//! Pure domain model for the habridge home-automation bridge.
//!
//! ## Responsibilities
//! - Foundational types: entity identifiers, error conventions, timestamps
//! - Define **Entities** (the local mirror of hub state: lights, switches, climate, …)
//! - Define **Change records** (what subscribers receive after an accepted update)
//! - Define **Service calls** (the hub's command vocabulary) and value coercions
//! - Describe the hub's **wire messages** (REST states, websocket frames)
//! - Project the **adjustable properties** of an entity
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod change;
pub mod command;
pub mod entity;
pub mod hub;
pub mod properties;
