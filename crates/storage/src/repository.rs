use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dokkai_core::model::{
    AppSettings, ItemContent, ItemKind, ReviewItem, ReviewItemId, SrsStage, StudySettings,
    TextEntryId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a review item.
///
/// Content is kept as JSON text next to its kind tag; timestamps are epoch
/// milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItemRecord {
    pub id: String,
    pub kind: String,
    pub content: String,
    pub text_entry_id: Option<String>,
    pub srs_stage: i64,
    pub interval_modifier: Option<f64>,
    pub incorrect_answer_count: i64,
    pub next_review_ms: i64,
    pub added_at_ms: i64,
}

impl ReviewItemRecord {
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the content cannot be encoded.
    pub fn from_item(item: &ReviewItem) -> Result<Self, StorageError> {
        let content = match item.content() {
            ItemContent::Word(word) => serde_json::to_string(word),
            ItemContent::Grammar(grammar) => serde_json::to_string(grammar),
        }
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Self {
            id: item.id().as_str().to_owned(),
            kind: item.kind().as_str().to_owned(),
            content,
            text_entry_id: item.text_entry_id().map(|t| t.as_str().to_owned()),
            srs_stage: i64::from(item.srs_stage().value()),
            interval_modifier: Some(item.interval_modifier()),
            incorrect_answer_count: i64::from(item.incorrect_answer_count()),
            next_review_ms: item.next_review_date().timestamp_millis(),
            added_at_ms: item.added_at().timestamp_millis(),
        })
    }

    /// Convert the record back into a domain `ReviewItem`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unknown kind, undecodable
    /// content, an out-of-range stage or count, or unrepresentable timestamps.
    pub fn into_item(self) -> Result<ReviewItem, StorageError> {
        let kind = ItemKind::parse(&self.kind)
            .ok_or_else(|| StorageError::Serialization(format!("invalid kind: {}", self.kind)))?;
        let content = match kind {
            ItemKind::Word => serde_json::from_str(&self.content).map(ItemContent::Word),
            ItemKind::Grammar => serde_json::from_str(&self.content).map(ItemContent::Grammar),
        }
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let stage = SrsStage::try_from(self.srs_stage)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let incorrect = u32::try_from(self.incorrect_answer_count).map_err(|_| {
            StorageError::Serialization("incorrect_answer_count out of range".into())
        })?;

        Ok(ReviewItem::from_persisted(
            ReviewItemId::new(self.id),
            content,
            self.text_entry_id.map(TextEntryId::new),
            stage,
            self.interval_modifier,
            incorrect,
            millis_to_datetime("next_review_date", self.next_review_ms)?,
            millis_to_datetime("added_at", self.added_at_ms)?,
        ))
    }
}

fn millis_to_datetime(field: &'static str, ms: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::Serialization(format!("{field} out of range: {ms}")))
}

/// The deck store: every review item the user has collected.
#[async_trait]
pub trait ReviewItemRepository: Send + Sync {
    /// Fetch every stored item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if items cannot be read.
    async fn get_all_review_items(&self) -> Result<Vec<ReviewItem>, StorageError>;

    /// Insert or replace an item by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the item cannot be stored.
    async fn upsert_review_item(&self, item: &ReviewItem) -> Result<(), StorageError>;

    /// Delete an item. Deleting an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_review_item(&self, id: &ReviewItemId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be read.
    async fn get_study_settings(&self) -> Result<Option<StudySettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be stored.
    async fn save_study_settings(&self, settings: &StudySettings) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be read or no longer validate.
    async fn get_app_settings(&self) -> Result<Option<AppSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be stored.
    async fn save_app_settings(&self, settings: &AppSettings) -> Result<(), StorageError>;
}

/// Local cache of sentence analyses, keyed by `"depth:sentence"`.
#[async_trait]
pub trait AnalysisCacheRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_cached_analysis(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn put_cached_analysis(&self, key: &str, json: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<Mutex<HashMap<ReviewItemId, ReviewItem>>>,
    study_settings: Arc<Mutex<Option<StudySettings>>>,
    app_settings: Arc<Mutex<Option<AppSettings>>>,
    analyses: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ReviewItemRepository for InMemoryRepository {
    async fn get_all_review_items(&self) -> Result<Vec<ReviewItem>, StorageError> {
        let guard = self.items.lock().map_err(poisoned)?;
        let mut items: Vec<ReviewItem> = guard.values().cloned().collect();
        items.sort_by(|a, b| (a.added_at(), a.id()).cmp(&(b.added_at(), b.id())));
        Ok(items)
    }

    async fn upsert_review_item(&self, item: &ReviewItem) -> Result<(), StorageError> {
        let mut guard = self.items.lock().map_err(poisoned)?;
        guard.insert(item.id().clone(), item.clone());
        Ok(())
    }

    async fn delete_review_item(&self, id: &ReviewItemId) -> Result<(), StorageError> {
        let mut guard = self.items.lock().map_err(poisoned)?;
        guard.remove(id);
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_study_settings(&self) -> Result<Option<StudySettings>, StorageError> {
        Ok(*self.study_settings.lock().map_err(poisoned)?)
    }

    async fn save_study_settings(&self, settings: &StudySettings) -> Result<(), StorageError> {
        *self.study_settings.lock().map_err(poisoned)? = Some(*settings);
        Ok(())
    }

    async fn get_app_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        Ok(self.app_settings.lock().map_err(poisoned)?.clone())
    }

    async fn save_app_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        *self.app_settings.lock().map_err(poisoned)? = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl AnalysisCacheRepository for InMemoryRepository {
    async fn get_cached_analysis(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.analyses.lock().map_err(poisoned)?.get(key).cloned())
    }

    async fn put_cached_analysis(&self, key: &str, json: &str) -> Result<(), StorageError> {
        self.analyses
            .lock()
            .map_err(poisoned)?
            .insert(key.to_owned(), json.to_owned());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub review_items: Arc<dyn ReviewItemRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub analyses: Arc<dyn AnalysisCacheRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let review_items: Arc<dyn ReviewItemRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo.clone());
        let analyses: Arc<dyn AnalysisCacheRepository> = Arc::new(repo);
        Self {
            review_items,
            settings,
            analyses,
        }
    }
}
