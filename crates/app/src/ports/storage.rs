//! Storage port: the keyed entity table behind the catalog.

use std::future::Future;

use habridge_domain::entity::Entity;
use habridge_domain::error::BridgeError;
use habridge_domain::id::EntityId;

/// Repository for persisting and querying [`Entity`] rows.
///
/// Implementations must replace a row wholly or not at all, and must be safe
/// to read while a single writer is upserting.
pub trait EntityRepository {
    /// Insert or wholly replace an entity, returning what was stored.
    fn upsert(&self, entity: Entity) -> impl Future<Output = Result<Entity, BridgeError>> + Send;

    /// Insert or replace a batch of entities.
    ///
    /// The default implementation upserts one row at a time.
    fn upsert_all(
        &self,
        entities: Vec<Entity>,
    ) -> impl Future<Output = Result<usize, BridgeError>> + Send
    where
        Self: Sync,
    {
        async move {
            let count = entities.len();
            for entity in entities {
                self.upsert(entity).await?;
            }
            Ok(count)
        }
    }

    /// Get an entity by id.
    fn get_by_id(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, BridgeError>> + Send;

    /// Get all entities, ordered by id.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, BridgeError>> + Send;
}

impl<T: EntityRepository + Send + Sync> EntityRepository for std::sync::Arc<T> {
    fn upsert(&self, entity: Entity) -> impl Future<Output = Result<Entity, BridgeError>> + Send {
        (**self).upsert(entity)
    }

    fn upsert_all(
        &self,
        entities: Vec<Entity>,
    ) -> impl Future<Output = Result<usize, BridgeError>> + Send {
        (**self).upsert_all(entities)
    }

    fn get_by_id(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, BridgeError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, BridgeError>> + Send {
        (**self).get_all()
    }
}
