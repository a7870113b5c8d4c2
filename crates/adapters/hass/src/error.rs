//! Hub adapter error types.

use habridge_domain::error::RemoteError;
use tokio_tungstenite::tungstenite;

/// Errors specific to the hub adapter.
#[derive(Debug, thiserror::Error)]
pub enum HassError {
    /// The configured hub URL cannot be turned into an endpoint.
    #[error("invalid hub URL {0:?}")]
    InvalidUrl(String),

    /// Transport failure, timeout or undecodable REST body.
    #[error("hub request failed")]
    Http(#[from] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub rejected request with status {status}")]
    Status { status: u16, body: String },

    /// Websocket transport failure.
    #[error("hub websocket error")]
    WebSocket(#[source] Box<tungstenite::Error>),

    /// The hub refused our access token.
    #[error("hub rejected access token: {0}")]
    AuthInvalid(String),

    /// The hub did not follow the expected handshake.
    #[error("unexpected handshake message: {0}")]
    Handshake(String),

    /// The websocket closed before the handshake completed.
    #[error("hub websocket closed")]
    Closed,

    /// A frame could not be decoded or encoded.
    #[error("invalid websocket frame")]
    Frame(#[source] serde_json::Error),
}

impl From<tungstenite::Error> for HassError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

impl HassError {
    /// Convert into the port-level [`RemoteError`].
    #[must_use]
    pub fn into_remote(self) -> RemoteError {
        match self {
            Self::Status { status, body } => RemoteError::Rejected { status, body },
            other => RemoteError::Unavailable(Box::new(other)),
        }
    }
}

impl From<HassError> for RemoteError {
    fn from(err: HassError) -> Self {
        err.into_remote()
    }
}
