use super::{EntityStore, Record, StoreError};
use crate::domain::EntityKind;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// Entity store over the `entities` table.
///
/// Records are stored as JSON bodies; a batch is written in one transaction.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn load(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query("SELECT body FROM entities WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.get("body");
        Record::from_json(kind, &body)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                kind,
                id: id.to_string(),
                source,
            })
    }

    async fn save_all(&self, records: Vec<Record>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        // Serialize everything before touching the database.
        let rows = records
            .iter()
            .map(|record| -> Result<_, StoreError> {
                Ok((record.kind(), record.id(), record.to_json()?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut tx = self.pool.begin().await?;

        for (kind, id, body) in rows {
            sqlx::query(
                r#"
                INSERT INTO entities (kind, id, body)
                VALUES (?, ?, ?)
                ON CONFLICT(kind, id) DO UPDATE SET body = excluded.body
                "#,
            )
            .bind(kind.as_str())
            .bind(id)
            .bind(body)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
