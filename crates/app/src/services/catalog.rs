//! State catalog — the canonical local view of every hub entity.
//!
//! The catalog is the only writer to the [`EntityRepository`]. It applies
//! full snapshots (hydration) and incremental state-change events, and
//! answers read queries.

use std::collections::HashMap;

use habridge_domain::change::ChangeRecord;
use habridge_domain::entity::{Entity, EntityFilter};
use habridge_domain::error::{BridgeError, NotFoundError};
use habridge_domain::hub::{HubEvent, RawState};
use habridge_domain::id::EntityId;
use habridge_domain::time::now;

use crate::ports::EntityRepository;

/// Application service owning entity state.
pub struct StateCatalog<R> {
    repo: R,
}

impl<R: EntityRepository + Sync> StateCatalog<R> {
    /// Create a new catalog backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Upsert every state of a full snapshot.
    ///
    /// States with malformed ids are skipped. Applying the same snapshot
    /// twice leaves the catalog as applying it once, also when the hub omits
    /// timestamps: those are then resolved against the stored rows.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn hydrate(&self, snapshot: Vec<RawState>) -> Result<usize, BridgeError> {
        let stored: HashMap<EntityId, Entity> = if snapshot.iter().any(RawState::lacks_timestamps) {
            self.repo
                .get_all()
                .await?
                .into_iter()
                .map(|entity| (entity.id.clone(), entity))
                .collect()
        } else {
            HashMap::new()
        };
        let ts = now();
        let entities: Vec<Entity> = snapshot
            .into_iter()
            .filter_map(|raw| {
                let previous = EntityId::parse(raw.entity_id.as_str())
                    .ok()
                    .and_then(|id| stored.get(&id));
                match raw.into_entity_after(previous, ts) {
                    Ok(entity) => Some(entity),
                    Err(err) => {
                        tracing::debug!(%err, "skipping snapshot state");
                        None
                    }
                }
            })
            .collect();
        self.repo.upsert_all(entities).await
    }

    /// Apply one event from the hub's stream.
    ///
    /// Returns the change record to broadcast, built from the row just
    /// written, or `None` when the event is not an applicable state change.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn apply_event(&self, event: &HubEvent) -> Result<Option<ChangeRecord>, BridgeError> {
        let change = match event.state_change() {
            Ok(change) => change,
            Err(err) => {
                tracing::debug!(%err, event_type = %event.event_type, "ignoring event");
                return Ok(None);
            }
        };
        let previous = if change.new_state.lacks_timestamps() {
            self.repo.get_by_id(&change.entity_id).await?
        } else {
            None
        };
        let entity = change.new_state.into_entity_after(previous.as_ref(), now())?;
        let stored = self.repo.upsert(entity).await?;
        tracing::debug!(entity_id = %stored.id, state = %stored.state, "entity updated");
        Ok(Some(ChangeRecord::state(&stored)))
    }

    /// Read an entity, if known.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn read(&self, id: &EntityId) -> Result<Option<Entity>, BridgeError> {
        self.repo.get_by_id(id).await
    }

    /// Look up an entity, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] when no entity with `id` exists,
    /// or a storage error from the repository.
    pub async fn get(&self, id: &EntityId) -> Result<Entity, BridgeError> {
        self.read(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Entity",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List entities matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self, filter: &EntityFilter) -> Result<Vec<Entity>, BridgeError> {
        let mut entities = self.repo.get_all().await?;
        entities.retain(|entity| filter.matches(entity));
        Ok(entities)
    }
}
