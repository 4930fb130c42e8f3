use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_NEW_WORDS_PER_DAY: u32 = 10;
pub const DEFAULT_CHUNK_SIZE: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySettingsError {
    #[error("learning chunk size must be > 0")]
    InvalidChunkSize,
}

/// Per-user knobs for building study sessions.
///
/// A `new_words_per_day` of zero turns off learning and leaves only reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySettings {
    new_words_per_day: u32,
    #[serde(default = "default_chunk_size")]
    chunk_size: u32,
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

impl StudySettings {
    /// # Errors
    ///
    /// Returns `StudySettingsError::InvalidChunkSize` if `chunk_size` is zero.
    pub fn new(new_words_per_day: u32, chunk_size: u32) -> Result<Self, StudySettingsError> {
        if chunk_size == 0 {
            return Err(StudySettingsError::InvalidChunkSize);
        }
        Ok(Self {
            new_words_per_day,
            chunk_size,
        })
    }

    #[must_use]
    pub fn new_words_per_day(&self) -> u32 {
        self.new_words_per_day
    }

    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Daily cap as a `usize`, saturating on narrow targets.
    #[must_use]
    pub fn new_item_cap(&self) -> usize {
        usize::try_from(self.new_words_per_day).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn chunk_len(&self) -> usize {
        usize::try_from(self.chunk_size).unwrap_or(usize::MAX).max(1)
    }
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            new_words_per_day: DEFAULT_NEW_WORDS_PER_DAY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
