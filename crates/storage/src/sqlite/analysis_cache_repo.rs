use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{AnalysisCacheRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{conn, ser};

#[async_trait]
impl AnalysisCacheRepository for SqliteRepository {
    async fn get_cached_analysis(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT payload FROM analysis_cache WHERE cache_key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| row.try_get::<String, _>("payload").map_err(ser))
            .transpose()
    }

    async fn put_cached_analysis(&self, key: &str, json: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO analysis_cache (cache_key, payload, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(cache_key) DO UPDATE SET
                payload = excluded.payload,
                stored_at = excluded.stored_at
            ",
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
