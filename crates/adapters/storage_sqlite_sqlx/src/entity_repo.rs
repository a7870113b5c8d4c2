//! Entity rows in `SQLite`, one per entity id.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool};

use habridge_app::ports::EntityRepository;
use habridge_domain::entity::{Attributes, Entity};
use habridge_domain::error::BridgeError;
use habridge_domain::id::EntityId;
use habridge_domain::time::parse_rfc3339;

use crate::error::StorageError;

/// Row decoding lives here so the domain types stay free of sqlx.
struct Wrapper(Entity);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Entity> {
        value.map(|w| w.0)
    }
}

fn decode<E: std::error::Error + Send + Sync + 'static>(err: E) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let friendly_name: Option<String> = row.try_get("friendly_name")?;
        let state: String = row.try_get("state")?;
        let attributes_json: String = row.try_get("attributes")?;
        let last_changed: String = row.try_get("last_changed")?;
        let last_updated: String = row.try_get("last_updated")?;

        let id = EntityId::parse(id).map_err(decode)?;
        let attributes: Attributes = serde_json::from_str(&attributes_json).map_err(decode)?;
        let last_changed = parse_rfc3339(&last_changed).map_err(decode)?;
        let last_updated = parse_rfc3339(&last_updated).map_err(decode)?;

        Ok(Self(Entity {
            id,
            friendly_name,
            state,
            attributes,
            last_changed,
            last_updated,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO entities (id, domain, friendly_name, state, attributes, last_changed, last_updated)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (id) DO UPDATE SET
        domain = excluded.domain,
        friendly_name = excluded.friendly_name,
        state = excluded.state,
        attributes = excluded.attributes,
        last_changed = excluded.last_changed,
        last_updated = excluded.last_updated
";

const SELECT_BY_ID: &str = "SELECT * FROM entities WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM entities ORDER BY id";

/// [`EntityRepository`] over the `entities` table.
#[derive(Clone)]
pub struct SqliteEntityRepository {
    pool: SqlitePool,
}

impl SqliteEntityRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn upsert_one<'e, E>(executor: E, entity: &Entity) -> Result<(), StorageError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let attributes_json = serde_json::to_string(&entity.attributes).map_err(|source| {
        StorageError::EncodeAttributes {
            entity_id: entity.id.to_string(),
            source,
        }
    })?;
    sqlx::query(UPSERT)
        .bind(entity.id.as_str())
        .bind(entity.domain())
        .bind(entity.friendly_name.as_deref())
        .bind(&entity.state)
        .bind(attributes_json)
        .bind(entity.last_changed.to_rfc3339())
        .bind(entity.last_updated.to_rfc3339())
        .execute(executor)
        .await?;
    Ok(())
}

impl EntityRepository for SqliteEntityRepository {
    async fn upsert(&self, entity: Entity) -> Result<Entity, BridgeError> {
        upsert_one(&self.pool, &entity).await?;
        Ok(entity)
    }

    async fn upsert_all(&self, entities: Vec<Entity>) -> Result<usize, BridgeError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for entity in &entities {
            upsert_one(&mut *tx, entity).await?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(entities.len())
    }

    async fn get_by_id(&self, id: &EntityId) -> Result<Option<Entity>, BridgeError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Entity>, BridgeError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
