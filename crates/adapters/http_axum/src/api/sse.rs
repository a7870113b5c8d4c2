//! Server-Sent Events (SSE) stream of change records.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt};

use habridge_app::ports::{EntityRepository, HubClient};

use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `GET /api/v1/status/stream`: SSE stream of change records.
///
/// Each record is sent as an event named after its kind (`state`) whose data
/// is the JSON-encoded payload. Records published before the client connects
/// are not replayed. A keep-alive comment is sent every 15 seconds.
pub async fn stream<R, H>(
    State(state): State<AppState<R, H>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    R: EntityRepository + Send + Sync + 'static,
    H: HubClient + Send + Sync + 'static,
{
    let events = state.broadcaster.subscribe().filter_map(|record| {
        match Event::default().event(record.kind.as_str()).json_data(&record.data) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize change record for SSE stream");
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
