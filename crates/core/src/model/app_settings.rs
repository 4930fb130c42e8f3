use thiserror::Error;
use url::Url;

/// Connection settings for the sentence-analysis backend.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AppSettings {
    api_key: Option<String>,
    api_model: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AppSettingsDraft {
    pub api_key: Option<String>,
    pub api_model: Option<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl AppSettingsDraft {
    /// Validate and normalize the draft into persisted settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the base URL is present but invalid.
    pub fn validate(self) -> Result<AppSettings, AppSettingsError> {
        let api_key = normalize_optional(self.api_key);
        let api_model = normalize_optional(self.api_model);
        let api_base_url = normalize_optional(self.api_base_url);

        if let Some(url) = api_base_url.as_ref() {
            if Url::parse(url).is_err() {
                return Err(AppSettingsError::InvalidBaseUrl(url.clone()));
            }
        }

        Ok(AppSettings {
            api_key,
            api_model,
            api_base_url,
        })
    }
}

impl AppSettings {
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the stored base URL no longer parses.
    pub fn from_persisted(draft: AppSettingsDraft) -> Result<Self, AppSettingsError> {
        draft.validate()
    }

    /// Layers non-empty values from `overrides` on top of these settings.
    #[must_use]
    pub fn merged_with(&self, overrides: AppSettingsDraft) -> Self {
        Self {
            api_key: normalize_optional(overrides.api_key).or_else(|| self.api_key.clone()),
            api_model: normalize_optional(overrides.api_model).or_else(|| self.api_model.clone()),
            api_base_url: normalize_optional(overrides.api_base_url)
                .filter(|url| Url::parse(url).is_ok())
                .or_else(|| self.api_base_url.clone()),
        }
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn api_model(&self) -> Option<&str> {
        self.api_model.as_deref()
    }

    #[must_use]
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
