//! Reconnecting websocket event stream.
//!
//! Each call to [`EventSource::events`] spawns one task that owns the
//! websocket. The task authenticates, subscribes to state changes and forwards
//! every decoded frame through a bounded channel. When the connection drops
//! for any reason it waits the reconnect delay and starts over; the consumer
//! only ever sees a gap. The task stops once the consumer drops the stream.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use habridge_app::ports::EventSource;
use habridge_domain::hub::{ClientMessage, HubMessage, STATE_CHANGED};

use crate::config::HassConfig;
use crate::error::HassError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_ID: u64 = 1;
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
struct Settings {
    url: String,
    token: String,
    reconnect_delay: Duration,
}

/// The hub's websocket event API as an [`EventSource`].
#[derive(Debug, Clone)]
pub struct HassEventStream {
    settings: Arc<Settings>,
}

impl HassEventStream {
    #[must_use]
    pub fn new(url: impl Into<String>, token: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            settings: Arc::new(Settings {
                url: url.into(),
                token: token.into(),
                reconnect_delay,
            }),
        }
    }

    /// Build the stream from the hub configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HassError::InvalidUrl`] when no websocket URL can be derived.
    pub fn from_config(config: &HassConfig) -> Result<Self, HassError> {
        Ok(Self::new(
            config.websocket_url()?,
            config.token.clone(),
            config.reconnect_delay(),
        ))
    }
}

impl EventSource for HassEventStream {
    type Stream = ReceiverStream<HubMessage>;

    fn events(&self) -> Self::Stream {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run(Arc::clone(&self.settings), tx));
        ReceiverStream::new(rx)
    }
}

async fn run(settings: Arc<Settings>, tx: mpsc::Sender<HubMessage>) {
    loop {
        match session(&settings, &tx).await {
            Ok(()) if tx.is_closed() => break,
            Ok(()) => tracing::warn!(url = %settings.url, "hub websocket closed"),
            Err(err) => tracing::warn!(url = %settings.url, %err, "hub websocket failed"),
        }
        if tx.is_closed() {
            break;
        }
        tracing::info!(
            delay_ms = settings.reconnect_delay.as_millis(),
            "reconnecting to hub websocket"
        );
        tokio::time::sleep(settings.reconnect_delay).await;
    }
    tracing::debug!("event consumer gone, stopping hub websocket");
}

/// One connection: handshake, subscribe, forward until the socket ends.
async fn session(settings: &Settings, tx: &mpsc::Sender<HubMessage>) -> Result<(), HassError> {
    let (mut socket, _) = connect_async(settings.url.as_str()).await?;
    tracing::info!(url = %settings.url, "connected to hub websocket");

    authenticate(&mut socket, &settings.token).await?;
    send(
        &mut socket,
        &ClientMessage::SubscribeEvents {
            id: SUBSCRIBE_ID,
            event_type: STATE_CHANGED.to_string(),
        },
    )
    .await?;
    tracing::info!("subscribed to hub state changes");

    loop {
        let Some(frame) = (tokio::select! {
            frame = socket.next() => Some(frame),
            () = tx.closed() => None,
        }) else {
            socket.close(None).await?;
            return Ok(());
        };
        let Some(frame) = frame else {
            return Ok(());
        };
        match frame? {
            Message::Text(text) => match serde_json::from_str::<HubMessage>(text.as_str()) {
                Ok(message) => {
                    if tx.send(message).await.is_err() {
                        return Ok(());
                    }
                }
                Err(err) => tracing::debug!(%err, "dropping undecodable frame"),
            },
            Message::Close(_) => return Ok(()),
            _ => {}
        }
    }
}

async fn authenticate(socket: &mut Socket, token: &str) -> Result<(), HassError> {
    match receive(socket).await? {
        HubMessage::AuthRequired { .. } => {}
        other => return Err(HassError::Handshake(format!("{other:?}"))),
    }
    send(
        socket,
        &ClientMessage::Auth {
            access_token: token.to_string(),
        },
    )
    .await?;
    match receive(socket).await? {
        HubMessage::AuthOk { ha_version } => {
            tracing::info!(?ha_version, "authenticated with hub");
            Ok(())
        }
        HubMessage::AuthInvalid { message } => Err(HassError::AuthInvalid(message.unwrap_or_default())),
        other => Err(HassError::Handshake(format!("{other:?}"))),
    }
}

async fn send(socket: &mut Socket, message: &ClientMessage) -> Result<(), HassError> {
    let text = serde_json::to_string(message).map_err(HassError::Frame)?;
    socket.send(Message::text(text)).await?;
    Ok(())
}

/// Next decoded text frame, skipping control frames.
async fn receive(socket: &mut Socket) -> Result<HubMessage, HassError> {
    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).map_err(HassError::Frame);
            }
            Message::Close(_) => return Err(HassError::Closed),
            _ => {}
        }
    }
    Err(HassError::Closed)
}
