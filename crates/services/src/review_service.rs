use chrono::{DateTime, Utc};

use dokkai_core::{
    model::{ReviewItem, ReviewItemId, ReviewQuality},
    scheduler::calculate_next_review,
    time::Clock,
};
use storage::repository::{ReviewItemRepository, StorageError};

use crate::error::ReviewServiceError;

/// Result of a persisted review: the item before and after scheduling.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedReview {
    pub previous: ReviewItem,
    pub item: ReviewItem,
}

/// Applies recall judgments to review items using the SRS scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewService {
    clock: Clock,
}

impl ReviewService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Schedule `item` for `quality` at the given review time.
    #[must_use]
    pub fn review_item(
        &self,
        item: &ReviewItem,
        quality: ReviewQuality,
        reviewed_at: DateTime<Utc>,
    ) -> ReviewItem {
        calculate_next_review(item, quality, reviewed_at)
    }

    /// Schedule `item` and upsert the result. On failure `item` is untouched.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if persistence fails.
    pub async fn review_item_persisted(
        &self,
        item: &mut ReviewItem,
        quality: ReviewQuality,
        items: &dyn ReviewItemRepository,
    ) -> Result<PersistedReview, ReviewServiceError> {
        let updated = self.review_item(item, quality, self.now());
        items.upsert_review_item(&updated).await?;
        let previous = std::mem::replace(item, updated.clone());
        Ok(PersistedReview {
            previous,
            item: updated,
        })
    }

    /// Load an item by id, schedule it, and persist the update.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the item is missing, or any storage
    /// failure from loading or saving.
    pub async fn review_item_persisted_by_id(
        &self,
        id: &ReviewItemId,
        quality: ReviewQuality,
        items: &dyn ReviewItemRepository,
    ) -> Result<PersistedReview, ReviewServiceError> {
        let mut item = items
            .get_all_review_items()
            .await?
            .into_iter()
            .find(|item| item.id() == id)
            .ok_or(StorageError::NotFound)?;

        self.review_item_persisted(&mut item, quality, items).await
    }
}
