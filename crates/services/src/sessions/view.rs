use dokkai_core::model::ReviewItem;

use super::progress::SessionProgress;
use super::service::{LearningPhase, SessionMode, SessionOrchestrator, SessionStats};

/// Where the user is inside the learning chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPosition {
    /// Zero-based chunk index.
    pub chunk: usize,
    pub chunk_count: usize,
    /// Zero-based card index within the chunk while studying.
    pub card: usize,
    pub card_count: usize,
}

/// Presentation-agnostic snapshot of a session.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings and
/// no localization. Renderers read it after every action.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub mode: SessionMode,
    pub current_item: Option<ReviewItem>,
    pub chunk: Option<ChunkPosition>,
    pub quiz_remaining: usize,
    pub review_remaining: usize,
    pub new_count: usize,
    pub due_count: usize,
    pub stats: SessionStats,
    pub progress: SessionProgress,
}

impl SessionOrchestrator {
    /// Snapshot of everything a renderer needs for the current phase.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let mode = self.mode();
        let chunk = match mode {
            SessionMode::Learning(phase) => {
                let chunk_count = self.learning_chunks().len();
                let card_count = self
                    .learning_chunks()
                    .get(self.chunk_index())
                    .map_or(0, Vec::len);
                let card = if phase == LearningPhase::Study {
                    self.study_index()
                } else {
                    card_count
                };
                Some(ChunkPosition {
                    chunk: self.chunk_index(),
                    chunk_count,
                    card,
                    card_count,
                })
            }
            _ => None,
        };

        let stats = self.stats();
        let plan = self.plan();
        let answered = usize::try_from(self.answered_in_plan()).unwrap_or(usize::MAX);

        SessionView {
            mode,
            current_item: self.current_item().cloned(),
            chunk,
            quiz_remaining: self.quiz_queue().len(),
            review_remaining: self.review_queue().len(),
            new_count: plan.new_items.len(),
            due_count: plan.due_items.len(),
            stats,
            progress: SessionProgress::new(
                plan.new_items.len() + plan.due_items.len(),
                answered,
                mode == SessionMode::Complete,
            ),
        }
    }
}
