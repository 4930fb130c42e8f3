mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use service::{LearningPhase, SessionMode, SessionOrchestrator, SessionStats};
pub use view::{ChunkPosition, SessionView};
pub use workflow::{SessionAnswerResult, SessionLoopService, SyncStatus};
