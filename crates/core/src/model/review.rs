use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur at the review API boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid review quality value: {0} (expected 1-4)")]
    InvalidQuality(u8),
}

//
// ─── REVIEW QUALITY ───────────────────────────────────────────────────────────
//

/// Four-level recall judgment given by the learner.
///
/// - `Again`: failed to recall; the item regresses
/// - `Hard`: recalled with difficulty; stage holds, interval shrinks
/// - `Good`: recalled; stage advances
/// - `Easy`: recalled instantly; stage advances and interval grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewQuality {
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewQuality {
    pub const ALL: [ReviewQuality; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// Converts the numeric 1-4 rating used by the UI.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` if the value is not in the range 1-4.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        match value {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidQuality(value)),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            ReviewQuality::Again => 1,
            ReviewQuality::Hard => 2,
            ReviewQuality::Good => 3,
            ReviewQuality::Easy => 4,
        }
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, ReviewQuality::Again)
    }
}

impl TryFrom<u8> for ReviewQuality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

impl From<ReviewQuality> for u8 {
    fn from(quality: ReviewQuality) -> Self {
        quality.as_u8()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
