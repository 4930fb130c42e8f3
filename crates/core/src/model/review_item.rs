use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::content::{ContentError, ItemContent, ItemKind};
use crate::model::ids::{ReviewItemId, TextEntryId};
use crate::model::stage::SrsStage;
use crate::time::start_of_day;

pub const DEFAULT_INTERVAL_MODIFIER: f64 = 1.0;

fn default_interval_modifier() -> f64 {
    DEFAULT_INTERVAL_MODIFIER
}

/// Interval modifier with legacy gaps (missing or non-finite) read as the default.
#[must_use]
pub fn normalize_interval_modifier(raw: Option<f64>) -> f64 {
    raw.filter(|m| m.is_finite())
        .unwrap_or(DEFAULT_INTERVAL_MODIFIER)
}

/// A unit of memorization: a vocabulary word or a grammar pattern.
///
/// Scheduling fields are only changed by [`crate::scheduler::calculate_next_review`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub(crate) id: ReviewItemId,
    #[serde(flatten)]
    pub(crate) content: ItemContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) text_entry_id: Option<TextEntryId>,
    pub(crate) srs_stage: SrsStage,
    #[serde(default = "default_interval_modifier")]
    pub(crate) interval_modifier: f64,
    #[serde(default)]
    pub(crate) incorrect_answer_count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub(crate) next_review_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub(crate) added_at: DateTime<Utc>,
}

impl ReviewItem {
    /// Creates a brand-new, unstudied item due from the start of `added_at`'s day.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content fails validation.
    pub fn new(
        id: ReviewItemId,
        content: impl Into<ItemContent>,
        text_entry_id: Option<TextEntryId>,
        added_at: DateTime<Utc>,
    ) -> Result<Self, ContentError> {
        let content = content.into();
        content.validate()?;

        Ok(Self {
            id,
            content,
            text_entry_id,
            srs_stage: SrsStage::NEW,
            interval_modifier: DEFAULT_INTERVAL_MODIFIER,
            incorrect_answer_count: 0,
            next_review_date: start_of_day(added_at),
            added_at,
        })
    }

    /// Rehydrate an item from persisted storage.
    ///
    /// A missing or non-finite `interval_modifier` loads as `1.0`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: ReviewItemId,
        content: ItemContent,
        text_entry_id: Option<TextEntryId>,
        srs_stage: SrsStage,
        interval_modifier: Option<f64>,
        incorrect_answer_count: u32,
        next_review_date: DateTime<Utc>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content,
            text_entry_id,
            srs_stage,
            interval_modifier: normalize_interval_modifier(interval_modifier),
            incorrect_answer_count,
            next_review_date,
            added_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ReviewItemId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.content.kind()
    }

    #[must_use]
    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    #[must_use]
    pub fn text_entry_id(&self) -> Option<&TextEntryId> {
        self.text_entry_id.as_ref()
    }

    #[must_use]
    pub fn srs_stage(&self) -> SrsStage {
        self.srs_stage
    }

    #[must_use]
    pub fn interval_modifier(&self) -> f64 {
        normalize_interval_modifier(Some(self.interval_modifier))
    }

    #[must_use]
    pub fn incorrect_answer_count(&self) -> u32 {
        self.incorrect_answer_count
    }

    #[must_use]
    pub fn next_review_date(&self) -> DateTime<Utc> {
        self.next_review_date
    }

    #[must_use]
    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Stage 0 items are new no matter what their review date says.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.srs_stage.is_new()
    }

    /// Active (stage 1-8) and scheduled at or before `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.srs_stage.is_active() && self.next_review_date <= now
    }

    /// True when the item belongs to `scope`: same text entry, or global.
    ///
    /// With no scope every item matches.
    #[must_use]
    pub fn in_scope(&self, scope: Option<&TextEntryId>) -> bool {
        match (scope, self.text_entry_id.as_ref()) {
            (None, _) | (Some(_), None) => true,
            (Some(scope), Some(own)) => scope == own,
        }
    }
}
