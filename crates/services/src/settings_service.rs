use std::env;
use std::sync::Arc;

use dokkai_core::model::{AppSettings, AppSettingsDraft, StudySettings};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

pub const API_KEY_ENV: &str = "DOKKAI_AI_API_KEY";
pub const MODEL_ENV: &str = "DOKKAI_AI_MODEL";
pub const BASE_URL_ENV: &str = "DOKKAI_AI_BASE_URL";

/// Reads the analysis-service overrides from the process environment.
#[must_use]
pub fn app_settings_from_env() -> AppSettingsDraft {
    AppSettingsDraft {
        api_key: env::var(API_KEY_ENV).ok(),
        api_model: env::var(MODEL_ENV).ok(),
        api_base_url: env::var(BASE_URL_ENV).ok(),
    }
}

/// Loads and saves study and analysis settings.
#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    env_overrides: AppSettingsDraft,
}

impl SettingsService {
    /// Service layering the process environment over persisted app settings.
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self::with_overrides(repo, app_settings_from_env())
    }

    #[must_use]
    pub fn with_overrides(repo: Arc<dyn SettingsRepository>, overrides: AppSettingsDraft) -> Self {
        Self {
            repo,
            env_overrides: overrides,
        }
    }

    /// Persisted study settings, or defaults if none were saved.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn load_study_settings(&self) -> Result<StudySettings, SettingsServiceError> {
        Ok(self.repo.get_study_settings().await?.unwrap_or_default())
    }

    /// Validate and persist study settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::StudySettings` for a zero chunk size and
    /// `SettingsServiceError::Storage` if persistence fails.
    pub async fn save_study_settings(
        &self,
        new_words_per_day: u32,
        chunk_size: u32,
    ) -> Result<StudySettings, SettingsServiceError> {
        let settings = StudySettings::new(new_words_per_day, chunk_size)?;
        self.repo.save_study_settings(&settings).await?;
        Ok(settings)
    }

    /// Persisted app settings with environment overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load_app_settings(&self) -> Result<AppSettings, SettingsServiceError> {
        let persisted = self.repo.get_app_settings().await?.unwrap_or_default();
        Ok(persisted.merged_with(self.env_overrides.clone()))
    }

    /// Validate and persist app settings. Environment overrides are not saved.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation or persistence fails.
    pub async fn save_app_settings(
        &self,
        draft: AppSettingsDraft,
    ) -> Result<AppSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_app_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dokkai_core::model::{AppSettingsError, StudySettingsError};
    use storage::repository::InMemoryRepository;

    fn service(overrides: AppSettingsDraft) -> (InMemoryRepository, SettingsService) {
        let repo = InMemoryRepository::new();
        let svc = SettingsService::with_overrides(Arc::new(repo.clone()), overrides);
        (repo, svc)
    }

    #[tokio::test]
    async fn study_settings_default_then_round_trip() {
        let (_repo, svc) = service(AppSettingsDraft::default());
        assert_eq!(
            svc.load_study_settings().await.unwrap(),
            StudySettings::default()
        );

        svc.save_study_settings(20, 4).await.unwrap();
        let loaded = svc.load_study_settings().await.unwrap();
        assert_eq!(loaded.new_words_per_day(), 20);
        assert_eq!(loaded.chunk_size(), 4);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_rejected_and_not_saved() {
        let (repo, svc) = service(AppSettingsDraft::default());
        let err = svc.save_study_settings(10, 0).await.unwrap_err();
        assert!(matches!(
            err,
            SettingsServiceError::StudySettings(StudySettingsError::InvalidChunkSize)
        ));
        assert!(repo.get_study_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn env_overrides_layer_over_persisted() {
        let overrides = AppSettingsDraft {
            api_key: Some("env-key".into()),
            api_model: Some("  ".into()),
            api_base_url: None,
        };
        let (_repo, svc) = service(overrides);
        svc.save_app_settings(AppSettingsDraft {
            api_key: Some("stored-key".into()),
            api_model: Some("stored-model".into()),
            api_base_url: Some("https://llm.example.com/v1".into()),
        })
        .await
        .unwrap();

        let loaded = svc.load_app_settings().await.unwrap();
        assert_eq!(loaded.api_key(), Some("env-key"));
        assert_eq!(loaded.api_model(), Some("stored-model"));
        assert_eq!(loaded.api_base_url(), Some("https://llm.example.com/v1"));
    }

    #[tokio::test]
    async fn invalid_base_url_is_rejected() {
        let (_repo, svc) = service(AppSettingsDraft::default());
        let err = svc
            .save_app_settings(AppSettingsDraft {
                api_base_url: Some("not a url".into()),
                ..AppSettingsDraft::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsServiceError::AppSettings(AppSettingsError::InvalidBaseUrl(_))
        ));
    }
}
