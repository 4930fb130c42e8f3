//! Shared error types for the services crate.

use std::sync::Arc;

use thiserror::Error;

use dokkai_core::model::{AppSettingsError, ContentError, ReviewItemId, StudySettingsError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::SessionMode;

/// Errors emitted by the sentence-analysis stack.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("sentence analysis is not configured")]
    Disabled,
    #[error("cannot analyze an empty sentence")]
    EmptySentence,
    #[error("analysis service returned an empty response")]
    EmptyResponse,
    #[error("analysis request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("analysis response could not be parsed: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Failure of an in-flight request shared by several callers.
    #[error(transparent)]
    Shared(Arc<AnalysisError>),
}

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DeckService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeckServiceError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    AppSettings(#[from] AppSettingsError),
    #[error(transparent)]
    StudySettings(#[from] StudySettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
///
/// Everything except `Storage` is a caller contract violation: the action is
/// not valid for the session's current state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("`{action}` is not allowed in {mode:?} mode")]
    InvalidAction {
        action: &'static str,
        mode: SessionMode,
    },
    #[error("item {got} is not the current item")]
    NotCurrentItem { got: ReviewItemId },
    #[error("item {0} is not part of this session")]
    UnknownItem(ReviewItemId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
}
