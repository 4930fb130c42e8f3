use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{SettingsRepository, StorageError};
use dokkai_core::model::{AppSettings, AppSettingsDraft, StudySettings};

use super::SqliteRepository;
use super::mapping::{conn, ser};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_study_settings(&self) -> Result<Option<StudySettings>, StorageError> {
        let row = sqlx::query(
            "SELECT new_words_per_day, chunk_size FROM study_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let new_words: i64 = row.try_get("new_words_per_day").map_err(ser)?;
        let chunk: i64 = row.try_get("chunk_size").map_err(ser)?;
        let new_words = u32::try_from(new_words)
            .map_err(|_| StorageError::Serialization("new_words_per_day out of range".into()))?;
        let chunk = u32::try_from(chunk)
            .map_err(|_| StorageError::Serialization("chunk_size out of range".into()))?;

        StudySettings::new(new_words, chunk).map(Some).map_err(ser)
    }

    async fn save_study_settings(&self, settings: &StudySettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO study_settings (id, new_words_per_day, chunk_size)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                new_words_per_day = excluded.new_words_per_day,
                chunk_size = excluded.chunk_size
            ",
        )
        .bind(i64::from(settings.new_words_per_day()))
        .bind(i64::from(settings.chunk_size()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_app_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        let row = sqlx::query(
            "SELECT api_key, api_model, api_base_url FROM app_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        AppSettings::from_persisted(AppSettingsDraft {
            api_key: row.try_get("api_key").map_err(ser)?,
            api_model: row.try_get("api_model").map_err(ser)?,
            api_base_url: row.try_get("api_base_url").map_err(ser)?,
        })
        .map(Some)
        .map_err(ser)
    }

    async fn save_app_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_settings (id, api_key, api_model, api_base_url)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                api_key = excluded.api_key,
                api_model = excluded.api_model,
                api_base_url = excluded.api_base_url
            ",
        )
        .bind(settings.api_key())
        .bind(settings.api_model())
        .bind(settings.api_base_url())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
