//! Change publisher port — fan-out of accepted catalog updates.

use std::future::Future;

use habridge_domain::change::ChangeRecord;
use habridge_domain::error::BridgeError;

/// Publishes change records to interested subscribers.
pub trait ChangePublisher {
    /// Publish a record to all current subscribers.
    ///
    /// Must not wait on slow subscribers.
    fn publish(
        &self,
        record: ChangeRecord,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: ChangePublisher + Send + Sync> ChangePublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        record: ChangeRecord,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).publish(record)
    }
}
