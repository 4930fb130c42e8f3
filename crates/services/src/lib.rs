#![forbid(unsafe_code)]

pub mod analysis;
pub mod app_services;
pub mod deck_service;
pub mod error;
pub mod review_service;
pub mod sessions;
pub mod settings_service;

pub use dokkai_core::Clock;

pub use analysis::{
    AnalysisConfig, AnalysisDepth, AnalysisService, CachedAnalysisService,
    DedupAnalysisService, GrammarPoint, HttpAnalysisService, Segment, SentenceAnalysis,
    split_sentences,
};
pub use app_services::AppServices;
pub use deck_service::DeckService;
pub use error::{
    AnalysisError, AppServicesError, DeckServiceError, ReviewServiceError, SessionError,
    SettingsServiceError,
};
pub use review_service::{PersistedReview, ReviewService};
pub use settings_service::SettingsService;

pub use sessions::{
    LearningPhase, SessionAnswerResult, SessionLoopService, SessionMode, SessionOrchestrator,
    SessionProgress, SessionStats, SessionView, SyncStatus,
};
