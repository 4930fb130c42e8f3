use thiserror::Error;

use crate::model::{AppSettingsError, ContentError, ReviewError, StageError, StudySettingsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    StudySettings(#[from] StudySettingsError),
    #[error(transparent)]
    AppSettings(#[from] AppSettingsError),
}
