use super::store::{check_index, Index, Record, RecordStore};
use crate::error::StoreError;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Record store backed by the local SQLite file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decode_all<R: Record>(bodies: Vec<String>) -> Result<Vec<R>, StoreError> {
    bodies
        .iter()
        .map(|body| serde_json::from_str(body).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn put<R: Record>(&self, record: &R) -> Result<String, StoreError> {
        let collection = R::COLLECTION.name();
        let key = record.key().to_string();
        let body = serde_json::to_string(record)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO records (collection, id, body)
            VALUES (?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(collection)
        .bind(&key)
        .bind(&body)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM record_index WHERE collection = ? AND record_id = ?")
            .bind(collection)
            .bind(&key)
            .execute(&mut *tx)
            .await?;

        for index in R::COLLECTION.indexes() {
            let Some(value) = record.index_value(*index) else {
                continue;
            };
            sqlx::query(
                "INSERT INTO record_index (collection, index_name, value, record_id) VALUES (?, ?, ?, ?)",
            )
            .bind(collection)
            .bind(index.name())
            .bind(value)
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!("put {}/{}", collection, key);
        Ok(key)
    }

    async fn get<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError> {
        let body = sqlx::query_scalar::<_, String>(
            "SELECT body FROM records WHERE collection = ? AND id = ?",
        )
        .bind(R::COLLECTION.name())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let bodies = sqlx::query_scalar::<_, String>(
            "SELECT body FROM records WHERE collection = ? ORDER BY id",
        )
        .bind(R::COLLECTION.name())
        .fetch_all(&self.pool)
        .await?;

        decode_all(bodies)
    }

    async fn get_all_by_index<R: Record>(&self, index: Index, value: &str) -> Result<Vec<R>, StoreError> {
        check_index::<R>(index)?;

        let bodies = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.body
            FROM records r
            INNER JOIN record_index i
                ON i.collection = r.collection AND i.record_id = r.id
            WHERE i.collection = ?
              AND i.index_name = ?
              AND i.value = ?
            ORDER BY r.id
            "#,
        )
        .bind(R::COLLECTION.name())
        .bind(index.name())
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        decode_all(bodies)
    }

    async fn delete<R: Record>(&self, key: &str) -> Result<(), StoreError> {
        let collection = R::COLLECTION.name();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM record_index WHERE collection = ? AND record_id = ?")
            .bind(collection)
            .bind(key)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(key)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!("delete {}/{}, {} row(s)", collection, key, result.rows_affected());
        Ok(())
    }
}
