//! In-process change broadcaster backed by a tokio broadcast channel.
//!
//! Every subscriber owns a bounded slot in the channel's ring buffer. A
//! subscriber that falls more than `capacity` records behind loses the oldest
//! ones (logged with the skipped count) while the publisher and the other
//! subscribers carry on.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::broadcast;
use tokio_stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use habridge_domain::change::ChangeRecord;
use habridge_domain::error::BridgeError;

use crate::ports::ChangePublisher;

/// Fan-out hub for [`ChangeRecord`]s.
///
/// Publishing succeeds even when there are no active subscribers
/// (the record is simply dropped).
pub struct Broadcaster {
    sender: broadcast::Sender<ChangeRecord>,
}

impl Broadcaster {
    /// Create a new broadcaster where each subscriber may lag by at most
    /// `capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to records published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            inner: BroadcastStream::new(self.sender.subscribe()),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangePublisher for Broadcaster {
    async fn publish(&self, record: ChangeRecord) -> Result<(), BridgeError> {
        // send only fails when there are zero receivers
        if let Err(broadcast::error::SendError(record)) = self.sender.send(record) {
            tracing::trace!(entity_id = %record.entity_id(), "no subscribers, change record dropped");
        }
        Ok(())
    }
}

/// A live subscription; dropping it unregisters the subscriber.
///
/// Yields records in publish order and suspends while none are queued.
pub struct Subscription {
    inner: BroadcastStream<ChangeRecord>,
}

impl Stream for Subscription {
    type Item = ChangeRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(record))) => return Poll::Ready(Some(record)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    tracing::warn!(skipped, "subscriber lagged, oldest change records dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
