use std::sync::Arc;

use dokkai_core::model::{ReviewItem, ReviewItemId, ReviewQuality, TextEntryId};
use storage::repository::{ReviewItemRepository, SettingsRepository};

use super::service::{SessionMode, SessionOrchestrator, SessionStats};
use crate::Clock;
use crate::error::SessionError;

/// Outcome of writing a scheduler update back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// The answer did not change any item.
    Unchanged,
    Saved { item_id: ReviewItemId },
    /// The session moved on but the store still holds the old item.
    Failed {
        item_id: ReviewItemId,
        message: String,
    },
}

impl SyncStatus {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed { .. })
    }
}

/// Result of answering a single quiz or review item in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub updated: Option<ReviewItem>,
    pub sync: SyncStatus,
    pub mode: SessionMode,
    pub stats: SessionStats,
}

/// Drives a `SessionOrchestrator` against the store.
///
/// Every scheduler update is written through before returning; a failed write
/// is reported on the result instead of failing the answer.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    items: Arc<dyn ReviewItemRepository>,
    settings: Arc<dyn SettingsRepository>,
    shuffle_quiz: bool,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        items: Arc<dyn ReviewItemRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            clock,
            items,
            settings,
            shuffle_quiz: true,
        }
    }

    #[must_use]
    pub fn with_shuffle_quiz(mut self, shuffle_quiz: bool) -> Self {
        self.shuffle_quiz = shuffle_quiz;
        self
    }

    /// Load the deck and study settings and open a session over `scope`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the deck or settings cannot be read.
    pub async fn start_session(
        &self,
        scope: Option<TextEntryId>,
    ) -> Result<SessionOrchestrator, SessionError> {
        let settings = self.settings.get_study_settings().await?.unwrap_or_default();
        let mut session = SessionOrchestrator::loading(settings, scope)
            .with_clock(self.clock)
            .with_shuffle_quiz(self.shuffle_quiz);
        self.reload(&mut session).await?;
        tracing::debug!(mode = ?session.mode(), "session started");
        Ok(session)
    }

    /// Re-read the deck from the store and re-evaluate the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the deck cannot be read.
    pub async fn reload(&self, session: &mut SessionOrchestrator) -> Result<(), SessionError> {
        let deck = self.items.get_all_review_items().await?;
        session.reload(deck);
        Ok(())
    }

    /// Answer the current quiz item and persist it if it was learned.
    ///
    /// # Errors
    ///
    /// Returns orchestrator contract violations unchanged.
    pub async fn answer_quiz(
        &self,
        session: &mut SessionOrchestrator,
        id: &ReviewItemId,
        remembered: bool,
    ) -> Result<SessionAnswerResult, SessionError> {
        let updated = session.answer_quiz_item(id, remembered)?;
        Ok(self.finish_answer(session, updated).await)
    }

    /// Grade the current review item and persist any scheduler update.
    ///
    /// # Errors
    ///
    /// Returns orchestrator contract violations unchanged.
    pub async fn answer_review(
        &self,
        session: &mut SessionOrchestrator,
        quality: ReviewQuality,
    ) -> Result<SessionAnswerResult, SessionError> {
        let updated = session.answer_review_item(quality)?;
        Ok(self.finish_answer(session, updated).await)
    }

    /// Delete an item while managing the deck, both from the session and the store.
    ///
    /// If the store rejects the delete the item stays in the session deck.
    ///
    /// # Errors
    ///
    /// Returns orchestrator contract violations, or `SessionError::Storage` if
    /// the store rejects the delete.
    pub async fn delete_item(
        &self,
        session: &mut SessionOrchestrator,
        id: &ReviewItemId,
    ) -> Result<ReviewItem, SessionError> {
        let removed = session.delete_item(id)?;
        if let Err(err) = self.items.delete_review_item(id).await {
            tracing::warn!(item_id = %id, error = %err, "failed to delete review item");
            session.restore_item(removed);
            return Err(err.into());
        }
        Ok(removed)
    }

    async fn finish_answer(
        &self,
        session: &SessionOrchestrator,
        updated: Option<ReviewItem>,
    ) -> SessionAnswerResult {
        let sync = match &updated {
            Some(item) => self.persist(item).await,
            None => SyncStatus::Unchanged,
        };
        SessionAnswerResult {
            updated,
            sync,
            mode: session.mode(),
            stats: session.stats(),
        }
    }

    async fn persist(&self, item: &ReviewItem) -> SyncStatus {
        match self.items.upsert_review_item(item).await {
            Ok(()) => SyncStatus::Saved {
                item_id: item.id().clone(),
            },
            Err(err) => {
                tracing::warn!(item_id = %item.id(), error = %err, "failed to persist review item");
                SyncStatus::Failed {
                    item_id: item.id().clone(),
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use dokkai_core::model::{SrsStage, StudySettings, WordContent};
    use dokkai_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, StorageError};

    fn new_item(id: &str) -> ReviewItem {
        ReviewItem::new(
            ReviewItemId::new(id),
            WordContent::new(id, "よみ", "meaning"),
            None,
            fixed_now() - Duration::hours(2),
        )
        .unwrap()
    }

    /// Reads from an inner repo but refuses every write.
    struct ReadOnlyRepo(InMemoryRepository);

    #[async_trait]
    impl ReviewItemRepository for ReadOnlyRepo {
        async fn get_all_review_items(&self) -> Result<Vec<ReviewItem>, StorageError> {
            self.0.get_all_review_items().await
        }

        async fn upsert_review_item(&self, _item: &ReviewItem) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }

        async fn delete_review_item(&self, _id: &ReviewItemId) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    #[tokio::test]
    async fn start_session_uses_persisted_settings() {
        let repo = InMemoryRepository::new();
        for id in ["a", "b", "c"] {
            repo.upsert_review_item(&new_item(id)).await.unwrap();
        }
        repo.save_study_settings(&StudySettings::new(2, 1).unwrap())
            .await
            .unwrap();

        let service =
            SessionLoopService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo));
        let session = service.start_session(None).await.unwrap();

        assert_eq!(session.mode(), SessionMode::Start);
        assert_eq!(session.plan().new_items.len(), 2);
        assert_eq!(session.learning_chunks().len(), 2);
    }

    #[tokio::test]
    async fn failed_write_is_reported_and_session_moves_on() {
        let inner = InMemoryRepository::new();
        inner.upsert_review_item(&new_item("a")).await.unwrap();

        let service = SessionLoopService::new(
            fixed_clock(),
            Arc::new(ReadOnlyRepo(inner.clone())),
            Arc::new(inner.clone()),
        )
        .with_shuffle_quiz(false);
        let mut session = service.start_session(None).await.unwrap();
        session.start_learning().unwrap();
        session.next_study_card().unwrap();

        let result = service
            .answer_quiz(&mut session, &ReviewItemId::new("a"), true)
            .await
            .unwrap();

        assert!(result.sync.is_failed());
        assert_eq!(result.updated.unwrap().srs_stage(), SrsStage::FIRST);
        assert_eq!(result.stats.learned, 1);
        assert_eq!(
            inner.get_all_review_items().await.unwrap()[0].srs_stage(),
            SrsStage::NEW
        );
    }

    #[tokio::test]
    async fn quiz_miss_does_not_touch_the_store() {
        let repo = InMemoryRepository::new();
        repo.upsert_review_item(&new_item("a")).await.unwrap();
        let service =
            SessionLoopService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo));
        let mut session = service.start_session(None).await.unwrap();
        session.start_learning().unwrap();
        session.next_study_card().unwrap();

        let result = service
            .answer_quiz(&mut session, &ReviewItemId::new("a"), false)
            .await
            .unwrap();
        assert_eq!(result.sync, SyncStatus::Unchanged);
        assert!(result.updated.is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_item_in_the_session() {
        let inner = InMemoryRepository::new();
        inner.upsert_review_item(&new_item("a")).await.unwrap();

        let service = SessionLoopService::new(
            fixed_clock(),
            Arc::new(ReadOnlyRepo(inner.clone())),
            Arc::new(inner.clone()),
        );
        let mut session = service.start_session(None).await.unwrap();
        session.enter_manage().unwrap();

        let err = service
            .delete_item(&mut session, &ReviewItemId::new("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.deck().len(), 1);
        assert_eq!(inner.get_all_review_items().await.unwrap().len(), 1);

        session.exit_manage().unwrap();
        assert_eq!(session.mode(), SessionMode::Start);
        assert_eq!(session.plan().new_items.len(), 1);
    }
}
