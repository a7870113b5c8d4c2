//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! via `#[from]`. Adapter-specific failures (`sqlx`, `reqwest`, …) are boxed
//! into the [`Storage`](BridgeError::Storage) or [`Remote`](BridgeError::Remote)
//! variants so the domain never depends on IO crates.

/// Boxed source error carried across layer boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error returned by application services.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Caller supplied a value that violates a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A set-properties request could not be mapped to service calls.
    #[error("command rejected")]
    Command(#[from] CommandError),

    /// The remote hub could not be reached or refused a request.
    #[error("remote hub error")]
    Remote(#[from] RemoteError),

    /// The storage layer failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Entity ids must look like `domain.name`.
    #[error("invalid entity id {0:?}: expected `domain.name`")]
    InvalidEntityId(String),
}

/// An item looked up by id was not found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Caller errors detected while planning a set-properties request.
///
/// These are deterministic: retrying the same request fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("domain {domain} not supported for generic set")]
    UnsupportedDomain { domain: String },

    #[error("property {property} not supported for domain {domain}")]
    UnsupportedProperty { domain: String, property: String },

    #[error("invalid value for {property}: expected {expected}")]
    InvalidValue {
        property: String,
        expected: &'static str,
    },
}

/// Failures talking to the remote hub.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Transport or HTTP-layer failure, including timeouts.
    #[error("remote hub unavailable")]
    Unavailable(#[source] BoxError),

    /// The hub answered with a non-success status.
    #[error("remote hub rejected the request with status {status}")]
    Rejected { status: u16, body: String },
}

impl RemoteError {
    /// Short machine-readable tag, used when reporting per-call outcomes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "remote_unavailable",
            Self::Rejected { .. } => "remote_rejected",
        }
    }
}

/// Why an event-stream message was dropped.
///
/// Never surfaced to callers; only logged.
#[derive(Debug, thiserror::Error)]
pub enum MalformedEvent {
    #[error("event type {0:?} is not a state change")]
    Irrelevant(String),

    #[error("state change carries no new state")]
    MissingNewState,

    #[error("event payload could not be decoded")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidEntityId(#[from] ValidationError),
}
