use chrono::{DateTime, Utc};

use dokkai_core::model::{ReviewItem, StudySettings, TextEntryId};

use super::SessionMode;

/// Partition of a deck into what this session should teach and review.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionPlan {
    /// Number of items visible under the active scope.
    pub scoped_total: usize,
    /// New items for this session, oldest first, capped at the daily limit.
    pub new_items: Vec<ReviewItem>,
    /// Due items, soonest first.
    pub due_items: Vec<ReviewItem>,
    /// `new_items` split into learning chunks, order preserved.
    pub chunks: Vec<Vec<ReviewItem>>,
}

impl SessionPlan {
    /// Phase a session built from this plan starts in.
    #[must_use]
    pub fn entry_mode(&self) -> SessionMode {
        if self.scoped_total == 0 {
            SessionMode::Empty
        } else if self.new_items.is_empty() && self.due_items.is_empty() {
            SessionMode::Complete
        } else {
            SessionMode::Start
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty() && self.due_items.is_empty()
    }
}

/// Builds a session plan from the full deck according to study settings.
pub struct SessionBuilder<'a> {
    settings: StudySettings,
    scope: Option<&'a TextEntryId>,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(settings: StudySettings) -> Self {
        Self {
            settings,
            scope: None,
        }
    }

    /// Restrict the plan to one text entry plus global items.
    #[must_use]
    pub fn with_scope(mut self, scope: Option<&'a TextEntryId>) -> Self {
        self.scope = scope;
        self
    }

    /// Select new and due items from `items` as of `now`.
    ///
    /// - new: stage 0, ordered by `added_at`, truncated to `new_words_per_day`
    /// - due: stage 1-8 with `next_review_date <= now`, ordered by that date
    ///
    /// Ties break on id so the order is stable across reloads.
    pub fn build<'i>(
        self,
        items: impl IntoIterator<Item = &'i ReviewItem>,
        now: DateTime<Utc>,
    ) -> SessionPlan {
        let scoped: Vec<&ReviewItem> = items
            .into_iter()
            .filter(|item| item.in_scope(self.scope))
            .collect();

        let mut new_items: Vec<ReviewItem> = scoped
            .iter()
            .filter(|item| item.is_new())
            .map(|item| (*item).clone())
            .collect();
        new_items.sort_by(|a, b| (a.added_at(), a.id()).cmp(&(b.added_at(), b.id())));
        new_items.truncate(self.settings.new_item_cap());

        let mut due_items: Vec<ReviewItem> = scoped
            .iter()
            .filter(|item| item.is_due(now))
            .map(|item| (*item).clone())
            .collect();
        due_items.sort_by(|a, b| {
            (a.next_review_date(), a.id()).cmp(&(b.next_review_date(), b.id()))
        });

        let chunks = new_items
            .chunks(self.settings.chunk_len())
            .map(<[ReviewItem]>::to_vec)
            .collect();

        SessionPlan {
            scoped_total: scoped.len(),
            new_items,
            due_items,
            chunks,
        }
    }
}
