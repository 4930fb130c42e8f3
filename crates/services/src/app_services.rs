use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::analysis::{
    AnalysisService, CachedAnalysisService, DedupAnalysisService, HttpAnalysisService,
};
use crate::deck_service::DeckService;
use crate::error::AppServicesError;
use crate::review_service::ReviewService;
use crate::sessions::SessionLoopService;
use crate::settings_service::SettingsService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    session_loop: Arc<SessionLoopService>,
    deck_service: Arc<DeckService>,
    settings: Arc<SettingsService>,
    review_service: ReviewService,
    analysis: Arc<dyn AnalysisService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or settings
    /// loading fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock).await
    }

    /// Build services over an existing storage aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if app settings cannot be loaded.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        let app_settings = settings.load_app_settings().await?;

        let http: Arc<dyn AnalysisService> =
            Arc::new(HttpAnalysisService::from_settings(&app_settings));
        let dedup: Arc<dyn AnalysisService> = Arc::new(DedupAnalysisService::new(http));
        let analysis: Arc<dyn AnalysisService> = Arc::new(CachedAnalysisService::new(
            dedup,
            Arc::clone(&storage.analyses),
        ));

        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            Arc::clone(&storage.review_items),
            Arc::clone(&storage.settings),
        ));
        let deck_service = Arc::new(DeckService::new(clock, Arc::clone(&storage.review_items)));

        Ok(Self {
            storage,
            session_loop,
            deck_service,
            settings,
            review_service: ReviewService::new().with_clock(clock),
            analysis,
        })
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn deck_service(&self) -> Arc<DeckService> {
        Arc::clone(&self.deck_service)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn review_service(&self) -> ReviewService {
        self.review_service
    }

    /// Cached, de-duplicated analysis client.
    #[must_use]
    pub fn analysis(&self) -> Arc<dyn AnalysisService> {
        Arc::clone(&self.analysis)
    }
}
