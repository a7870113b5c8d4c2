//! Failures of the entity store.

use habridge_domain::error::BridgeError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database URL is invalid or the file cannot be opened.
    #[error("cannot open entity store")]
    Open(#[source] sqlx::Error),

    #[error("schema migration failed")]
    Schema(#[from] sqlx::migrate::MigrateError),

    #[error("entity query failed")]
    Query(#[from] sqlx::Error),

    /// Attributes of one entity could not be written as JSON.
    #[error("cannot encode attributes of {entity_id}")]
    EncodeAttributes {
        entity_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StorageError> for BridgeError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value.into())
    }
}
