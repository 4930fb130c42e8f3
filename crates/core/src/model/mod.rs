mod app_settings;
pub mod content;
mod ids;
mod review;
mod review_item;
mod stage;
mod study_settings;

pub use content::{ContentError, GrammarContent, ItemContent, ItemKind, WordContent};
pub use ids::{ParseIdError, ReviewItemId, TextEntryId};

pub use app_settings::{AppSettings, AppSettingsDraft, AppSettingsError};
pub use review::{ReviewError, ReviewQuality};
pub use review_item::{DEFAULT_INTERVAL_MODIFIER, ReviewItem, normalize_interval_modifier};
pub use stage::{SrsStage, StageError};
pub use study_settings::{
    DEFAULT_CHUNK_SIZE, DEFAULT_NEW_WORDS_PER_DAY, StudySettings, StudySettingsError,
};
