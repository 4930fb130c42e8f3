use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("SRS stage must be between 0 and 9, got {0}")]
    OutOfRange(i64),
}

/// Base review interval, in hours, for each stage. Index 0 is unused.
const BASE_INTERVAL_HOURS: [i64; 9] = [0, 4, 8, 24, 48, 168, 336, 720, 2880];

/// Position of an item on the SRS ladder.
///
/// - `0`: new, never studied
/// - `1..=8`: active review stages (4h, 8h, 1d, 2d, 1wk, 2wk, 1mo, 4mo)
/// - `9`: burned, retired from review
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SrsStage(u8);

impl SrsStage {
    pub const NEW: Self = Self(0);
    pub const FIRST: Self = Self(1);
    pub const LAST_ACTIVE: Self = Self(8);
    pub const BURNED: Self = Self(9);

    /// # Errors
    ///
    /// Returns `StageError::OutOfRange` for values above 9.
    pub fn new(value: u8) -> Result<Self, StageError> {
        Self::try_from(i64::from(value))
    }

    /// Clamps any integer onto the ladder. Values past the top burn the item.
    #[must_use]
    pub fn saturating(value: i64) -> Self {
        let clamped = value.clamp(0, i64::from(Self::BURNED.0));
        // clamped to 0..=9
        Self(u8::try_from(clamped).unwrap_or(Self::BURNED.0))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_new(self) -> bool {
        self == Self::NEW
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        (Self::FIRST..=Self::LAST_ACTIVE).contains(&self)
    }

    #[must_use]
    pub fn is_burned(self) -> bool {
        self == Self::BURNED
    }

    /// Unscaled interval before the next review at this stage.
    ///
    /// Returns `None` for burned items, which are never reviewed again.
    #[must_use]
    pub fn base_interval(self) -> Option<Duration> {
        BASE_INTERVAL_HOURS
            .get(usize::from(self.0))
            .map(|hours| Duration::hours(*hours))
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn base_interval_hours(self) -> Option<f64> {
        BASE_INTERVAL_HOURS
            .get(usize::from(self.0))
            .map(|hours| *hours as f64)
    }
}

impl TryFrom<i64> for SrsStage {
    type Error = StageError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::BURNED.0 => Ok(Self(v)),
            _ => Err(StageError::OutOfRange(value)),
        }
    }
}

impl From<SrsStage> for u8 {
    fn from(stage: SrsStage) -> Self {
        stage.0
    }
}

impl Default for SrsStage {
    fn default() -> Self {
        Self::NEW
    }
}

impl fmt::Debug for SrsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SrsStage({})", self.0)
    }
}

impl fmt::Display for SrsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
