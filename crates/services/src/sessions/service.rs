use std::collections::{HashSet, VecDeque};
use std::fmt;

use rand::rng;
use rand::seq::SliceRandom;

use dokkai_core::model::{ReviewItem, ReviewItemId, ReviewQuality, StudySettings, TextEntryId};
use dokkai_core::scheduler::calculate_next_review;

use super::plan::{SessionBuilder, SessionPlan};
use crate::Clock;
use crate::error::SessionError;

//
// ─── MODES ─────────────────────────────────────────────────────────────────────
//

/// Sub-phase of a learning chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LearningPhase {
    Study,
    Quiz,
    ChunkComplete,
}

/// Phase of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// No deck has been supplied yet.
    Loading,
    /// Nothing in scope at all.
    Empty,
    /// Something to learn or review; waiting for the user to begin.
    Start,
    Learning(LearningPhase),
    Review,
    /// Everything in scope is done for now.
    Complete,
    Manage,
}

/// Running counters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub learned: u32,
    pub reviewed: u32,
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl SessionStats {
    fn record(&mut self, quality: ReviewQuality) {
        let slot = match quality {
            ReviewQuality::Again => &mut self.again,
            ReviewQuality::Hard => &mut self.hard,
            ReviewQuality::Good => &mut self.good,
            ReviewQuality::Easy => &mut self.easy,
        };
        *slot += 1;
    }
}

//
// ─── ORCHESTRATOR ──────────────────────────────────────────────────────────────
//

/// In-memory state machine driving a learn-then-review session over a deck.
///
/// Performs no I/O. Every action that runs the scheduler returns the updated
/// item so the caller can persist it; the session itself moves on immediately.
pub struct SessionOrchestrator {
    clock: Clock,
    settings: StudySettings,
    scope: Option<TextEntryId>,
    shuffle_quiz: bool,

    deck: Vec<ReviewItem>,
    plan: SessionPlan,
    mode: SessionMode,

    chunk_index: usize,
    study_index: usize,
    quiz_queue: VecDeque<ReviewItem>,

    review_queue: VecDeque<ReviewItem>,
    penalized_in_session: HashSet<ReviewItemId>,
    reviewed_this_round: u32,

    stats: SessionStats,
    /// `learned + reviewed` when the current plan was built.
    answered_before_plan: u32,
}

impl SessionOrchestrator {
    /// Create a session that has not seen its deck yet.
    #[must_use]
    pub fn loading(settings: StudySettings, scope: Option<TextEntryId>) -> Self {
        Self {
            clock: Clock::default(),
            settings,
            scope,
            shuffle_quiz: true,
            deck: Vec::new(),
            plan: SessionPlan::default(),
            mode: SessionMode::Loading,
            chunk_index: 0,
            study_index: 0,
            quiz_queue: VecDeque::new(),
            review_queue: VecDeque::new(),
            penalized_in_session: HashSet::new(),
            reviewed_this_round: 0,
            stats: SessionStats::default(),
            answered_before_plan: 0,
        }
    }

    /// Create a session over `deck` and evaluate its entry phase.
    #[must_use]
    pub fn new(deck: Vec<ReviewItem>, settings: StudySettings, scope: Option<TextEntryId>) -> Self {
        let mut session = Self::loading(settings, scope);
        session.reload(deck);
        session
    }

    /// Override the clock and re-evaluate if a deck is already loaded.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        if self.mode != SessionMode::Loading {
            self.reevaluate_mode();
        }
        self
    }

    /// Enable or disable shuffling each chunk before its quiz.
    #[must_use]
    pub fn with_shuffle_quiz(mut self, shuffle: bool) -> Self {
        self.shuffle_quiz = shuffle;
        self
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn settings(&self) -> StudySettings {
        self.settings
    }

    #[must_use]
    pub fn scope(&self) -> Option<&TextEntryId> {
        self.scope.as_ref()
    }

    /// Every item the session knows about, including out-of-scope ones.
    #[must_use]
    pub fn deck(&self) -> &[ReviewItem] {
        &self.deck
    }

    #[must_use]
    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    #[must_use]
    pub fn learning_chunks(&self) -> &[Vec<ReviewItem>] {
        &self.plan.chunks
    }

    #[must_use]
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    #[must_use]
    pub fn study_index(&self) -> usize {
        self.study_index
    }

    #[must_use]
    pub fn quiz_queue(&self) -> &VecDeque<ReviewItem> {
        &self.quiz_queue
    }

    #[must_use]
    pub fn review_queue(&self) -> &VecDeque<ReviewItem> {
        &self.review_queue
    }

    /// Items learned or reviewed since the current plan was built.
    #[must_use]
    pub fn answered_in_plan(&self) -> u32 {
        (self.stats.learned + self.stats.reviewed).saturating_sub(self.answered_before_plan)
    }

    #[must_use]
    pub fn is_penalized(&self, id: &ReviewItemId) -> bool {
        self.penalized_in_session.contains(id)
    }

    /// The item the user should be looking at right now, if any.
    #[must_use]
    pub fn current_item(&self) -> Option<&ReviewItem> {
        match self.mode {
            SessionMode::Learning(LearningPhase::Study) => self
                .plan
                .chunks
                .get(self.chunk_index)
                .and_then(|chunk| chunk.get(self.study_index)),
            SessionMode::Learning(LearningPhase::Quiz) => self.quiz_queue.front(),
            SessionMode::Review => self.review_queue.front(),
            _ => None,
        }
    }

    /// Replace the deck with fresh state and re-evaluate the session.
    pub fn reload(&mut self, deck: Vec<ReviewItem>) {
        self.deck = deck;
        self.reevaluate_mode();
    }

    /// Recompute the plan from the deck and jump to the matching entry phase.
    ///
    /// Drops any in-progress learning or review round.
    pub fn reevaluate_mode(&mut self) {
        let plan = SessionBuilder::new(self.settings)
            .with_scope(self.scope.as_ref())
            .build(&self.deck, self.clock.now());
        self.mode = plan.entry_mode();
        self.plan = plan;
        self.chunk_index = 0;
        self.study_index = 0;
        self.quiz_queue.clear();
        self.review_queue.clear();
        self.penalized_in_session.clear();
        self.reviewed_this_round = 0;
        self.answered_before_plan = self.stats.learned + self.stats.reviewed;
        tracing::debug!(
            mode = ?self.mode,
            new = self.plan.new_items.len(),
            due = self.plan.due_items.len(),
            "session re-evaluated"
        );
    }

    //
    // ─── LEARNING ──────────────────────────────────────────────────────────────
    //

    /// Begin studying the first learning chunk.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside `Start` or when there is
    /// nothing new to learn.
    pub fn start_learning(&mut self) -> Result<(), SessionError> {
        self.expect_mode("start_learning", &[SessionMode::Start])?;
        if self.plan.chunks.is_empty() {
            return Err(self.invalid("start_learning"));
        }
        self.enter_study(0);
        Ok(())
    }

    /// Advance to the next study card, or into the quiz after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside the study phase.
    pub fn next_study_card(&mut self) -> Result<(), SessionError> {
        self.expect_mode(
            "next_study_card",
            &[SessionMode::Learning(LearningPhase::Study)],
        )?;
        let chunk_len = self.current_chunk().map_or(0, Vec::len);
        if self.study_index + 1 < chunk_len {
            self.study_index += 1;
        } else {
            self.enter_quiz();
        }
        Ok(())
    }

    /// Step back one study card; stays put on the first card.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside the study phase.
    pub fn previous_study_card(&mut self) -> Result<(), SessionError> {
        self.expect_mode(
            "previous_study_card",
            &[SessionMode::Learning(LearningPhase::Study)],
        )?;
        self.study_index = self.study_index.saturating_sub(1);
        Ok(())
    }

    /// Record whether the user remembered the item at the front of the quiz.
    ///
    /// Remembered items are scheduled as `Good` and leave the quiz; the
    /// returned item must be persisted. Forgotten items go to the back of the
    /// queue untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside the quiz phase and
    /// `SessionError::NotCurrentItem` if `id` is not at the front.
    pub fn answer_quiz_item(
        &mut self,
        id: &ReviewItemId,
        remembered: bool,
    ) -> Result<Option<ReviewItem>, SessionError> {
        self.expect_mode(
            "answer_quiz_item",
            &[SessionMode::Learning(LearningPhase::Quiz)],
        )?;
        if self.quiz_queue.front().map(ReviewItem::id) != Some(id) {
            return Err(SessionError::NotCurrentItem { got: id.clone() });
        }
        let Some(item) = self.quiz_queue.pop_front() else {
            return Err(SessionError::NotCurrentItem { got: id.clone() });
        };

        let updated = if remembered {
            let updated = calculate_next_review(&item, ReviewQuality::Good, self.clock.now());
            self.replace_in_deck(&updated);
            self.stats.learned += 1;
            Some(updated)
        } else {
            self.quiz_queue.push_back(item);
            None
        };

        if self.quiz_queue.is_empty() {
            self.mode = SessionMode::Learning(LearningPhase::ChunkComplete);
        }
        Ok(updated)
    }

    /// Move on from a finished chunk: next chunk, then due reviews, then done.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` unless a chunk was just completed.
    pub fn continue_after_chunk(&mut self) -> Result<(), SessionError> {
        self.expect_mode(
            "continue_after_chunk",
            &[SessionMode::Learning(LearningPhase::ChunkComplete)],
        )?;
        let next = self.chunk_index + 1;
        if next < self.plan.chunks.len() {
            self.enter_study(next);
        } else if !self.plan.due_items.is_empty() {
            self.enter_review();
        } else {
            self.reevaluate_mode();
        }
        Ok(())
    }

    //
    // ─── REVIEW ────────────────────────────────────────────────────────────────
    //

    /// Begin a review round over every due item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside `Start` or when nothing
    /// is due.
    pub fn start_reviewing(&mut self) -> Result<(), SessionError> {
        self.expect_mode("start_reviewing", &[SessionMode::Start])?;
        if self.plan.due_items.is_empty() {
            return Err(self.invalid("start_reviewing"));
        }
        self.enter_review();
        Ok(())
    }

    /// Grade the item at the front of the review queue.
    ///
    /// `Again` penalizes an item at most once per round and always sends it to
    /// the back. Any other grade removes it; an item already penalized this
    /// round is not scheduled again. Returns the item to persist, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside the review phase.
    pub fn answer_review_item(
        &mut self,
        quality: ReviewQuality,
    ) -> Result<Option<ReviewItem>, SessionError> {
        self.expect_mode("answer_review_item", &[SessionMode::Review])?;
        let Some(item) = self.review_queue.pop_front() else {
            return Err(self.invalid("answer_review_item"));
        };
        self.stats.record(quality);

        let already_penalized = self.penalized_in_session.contains(item.id());
        let updated = match (quality, already_penalized) {
            (ReviewQuality::Again, false) => {
                let updated = calculate_next_review(&item, quality, self.clock.now());
                self.replace_in_deck(&updated);
                self.penalized_in_session.insert(updated.id().clone());
                self.review_queue.push_back(updated.clone());
                Some(updated)
            }
            (ReviewQuality::Again, true) => {
                self.review_queue.push_back(item);
                None
            }
            (_, true) => {
                self.count_reviewed();
                None
            }
            (_, false) => {
                let updated = calculate_next_review(&item, quality, self.clock.now());
                self.replace_in_deck(&updated);
                self.count_reviewed();
                Some(updated)
            }
        };

        if self.review_queue.is_empty() && self.reviewed_this_round > 0 {
            self.reevaluate_mode();
        }
        Ok(updated)
    }

    //
    // ─── MANAGE ────────────────────────────────────────────────────────────────
    //

    /// Open deck management from an idle phase.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside `Empty`, `Complete` or `Start`.
    pub fn enter_manage(&mut self) -> Result<(), SessionError> {
        self.expect_mode(
            "enter_manage",
            &[SessionMode::Empty, SessionMode::Complete, SessionMode::Start],
        )?;
        self.mode = SessionMode::Manage;
        Ok(())
    }

    /// Remove an item from the session deck while managing.
    ///
    /// The caller is responsible for deleting it from the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside `Manage` and
    /// `SessionError::UnknownItem` if the id is not in the deck.
    pub fn delete_item(&mut self, id: &ReviewItemId) -> Result<ReviewItem, SessionError> {
        self.expect_mode("delete_item", &[SessionMode::Manage])?;
        let index = self
            .deck
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| SessionError::UnknownItem(id.clone()))?;
        Ok(self.deck.remove(index))
    }

    /// Put back an item removed by `delete_item` whose store delete failed.
    pub(crate) fn restore_item(&mut self, item: ReviewItem) {
        self.deck.push(item);
    }

    /// Leave deck management and re-evaluate.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAction` outside `Manage`.
    pub fn exit_manage(&mut self) -> Result<(), SessionError> {
        self.expect_mode("exit_manage", &[SessionMode::Manage])?;
        self.reevaluate_mode();
        Ok(())
    }

    /// End the session, discarding queue state.
    #[must_use]
    pub fn exit(self) -> SessionStats {
        tracing::debug!(stats = ?self.stats, "session exited");
        self.stats
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidAction {
            action,
            mode: self.mode,
        }
    }

    fn expect_mode(&self, action: &'static str, allowed: &[SessionMode]) -> Result<(), SessionError> {
        if allowed.contains(&self.mode) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn current_chunk(&self) -> Option<&Vec<ReviewItem>> {
        self.plan.chunks.get(self.chunk_index)
    }

    fn enter_study(&mut self, chunk_index: usize) {
        self.chunk_index = chunk_index;
        self.study_index = 0;
        self.mode = SessionMode::Learning(LearningPhase::Study);
    }

    fn enter_quiz(&mut self) {
        let mut items = self.current_chunk().cloned().unwrap_or_default();
        if self.shuffle_quiz {
            items.as_mut_slice().shuffle(&mut rng());
        }
        self.quiz_queue = items.into();
        self.mode = if self.quiz_queue.is_empty() {
            SessionMode::Learning(LearningPhase::ChunkComplete)
        } else {
            SessionMode::Learning(LearningPhase::Quiz)
        };
    }

    fn enter_review(&mut self) {
        self.review_queue = self.plan.due_items.iter().cloned().collect();
        self.penalized_in_session.clear();
        self.reviewed_this_round = 0;
        self.mode = SessionMode::Review;
    }

    fn count_reviewed(&mut self) {
        self.reviewed_this_round += 1;
        self.stats.reviewed += 1;
    }

    fn replace_in_deck(&mut self, updated: &ReviewItem) {
        if let Some(slot) = self.deck.iter_mut().find(|item| item.id() == updated.id()) {
            *slot = updated.clone();
        }
    }
}

impl fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("mode", &self.mode)
            .field("deck_len", &self.deck.len())
            .field("chunk_index", &self.chunk_index)
            .field("study_index", &self.study_index)
            .field("quiz_len", &self.quiz_queue.len())
            .field("review_len", &self.review_queue.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dokkai_core::model::{GrammarContent, SrsStage, WordContent};
    use dokkai_core::time::{fixed_clock, fixed_now};

    fn new_item(id: &str, minutes: i64) -> ReviewItem {
        ReviewItem::new(
            ReviewItemId::new(id),
            WordContent::new(id, "よみ", "meaning"),
            None,
            fixed_now() - Duration::days(1) + Duration::minutes(minutes),
        )
        .unwrap()
    }

    /// Item at `stage` that came due an hour ago.
    fn due_item(id: &str, stage: u8) -> ReviewItem {
        ReviewItem::from_persisted(
            ReviewItemId::new(id),
            GrammarContent::new(id, "explanation").into(),
            None,
            SrsStage::new(stage).unwrap(),
            Some(1.0),
            0,
            fixed_now() - Duration::hours(1),
            fixed_now() - Duration::days(10),
        )
    }

    fn session(deck: Vec<ReviewItem>, per_day: u32, chunk: u32) -> SessionOrchestrator {
        SessionOrchestrator::new(deck, StudySettings::new(per_day, chunk).unwrap(), None)
            .with_clock(fixed_clock())
            .with_shuffle_quiz(false)
    }

    fn front_id(session: &SessionOrchestrator) -> ReviewItemId {
        session.current_item().unwrap().id().clone()
    }

    #[test]
    fn loading_until_deck_arrives() {
        let mut session = SessionOrchestrator::loading(StudySettings::default(), None);
        assert_eq!(session.mode(), SessionMode::Loading);
        session.reload(vec![new_item("a", 0)]);
        assert_eq!(session.mode(), SessionMode::Start);
    }

    #[test]
    fn entry_modes_follow_the_deck() {
        assert_eq!(session(Vec::new(), 5, 5).mode(), SessionMode::Empty);

        let single = session(vec![new_item("a", 0)], 5, 5);
        assert_eq!(single.mode(), SessionMode::Start);
        assert_eq!(single.plan().new_items.len(), 1);
        assert_eq!(single.learning_chunks().len(), 1);

        let mut future = due_item("f", 2);
        future = ReviewItem::from_persisted(
            future.id().clone(),
            future.content().clone(),
            None,
            future.srs_stage(),
            Some(1.0),
            0,
            fixed_now() + Duration::days(1),
            future.added_at(),
        );
        assert_eq!(session(vec![future], 5, 5).mode(), SessionMode::Complete);
    }

    #[test]
    fn study_walks_chunk_then_quiz() {
        let mut session = session(vec![new_item("a", 0), new_item("b", 1)], 5, 5);
        session.start_learning().unwrap();
        assert_eq!(session.mode(), SessionMode::Learning(LearningPhase::Study));
        assert_eq!(front_id(&session).as_str(), "a");

        session.previous_study_card().unwrap();
        assert_eq!(session.study_index(), 0);
        session.next_study_card().unwrap();
        assert_eq!(front_id(&session).as_str(), "b");
        session.previous_study_card().unwrap();
        assert_eq!(front_id(&session).as_str(), "a");
        session.next_study_card().unwrap();
        session.next_study_card().unwrap();

        assert_eq!(session.mode(), SessionMode::Learning(LearningPhase::Quiz));
        assert_eq!(session.quiz_queue().len(), 2);
    }

    #[test]
    fn quiz_miss_requeues_without_scheduling() {
        let mut session = session(vec![new_item("a", 0), new_item("b", 1)], 5, 5);
        session.start_learning().unwrap();
        session.next_study_card().unwrap();
        session.next_study_card().unwrap();

        let missed = session
            .answer_quiz_item(&ReviewItemId::new("a"), false)
            .unwrap();
        assert!(missed.is_none());
        let order: Vec<&str> = session.quiz_queue().iter().map(|i| i.id().as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert!(session.deck().iter().all(ReviewItem::is_new));

        let err = session
            .answer_quiz_item(&ReviewItemId::new("a"), true)
            .unwrap_err();
        assert!(matches!(err, SessionError::NotCurrentItem { .. }));

        let learned = session
            .answer_quiz_item(&ReviewItemId::new("b"), true)
            .unwrap()
            .unwrap();
        assert_eq!(learned.srs_stage(), SrsStage::FIRST);
        assert_eq!(learned.next_review_date(), fixed_now() + Duration::hours(4));

        session
            .answer_quiz_item(&ReviewItemId::new("a"), true)
            .unwrap();
        assert_eq!(
            session.mode(),
            SessionMode::Learning(LearningPhase::ChunkComplete)
        );
        assert_eq!(session.stats().learned, 2);
        assert!(session.deck().iter().all(|i| i.srs_stage() == SrsStage::FIRST));
    }

    #[test]
    fn chunks_advance_then_review_then_complete() {
        let deck = vec![
            new_item("a", 0),
            new_item("b", 1),
            new_item("c", 2),
            due_item("d", 3),
        ];
        let mut session = session(deck, 10, 2);
        assert_eq!(session.learning_chunks().len(), 2);

        session.start_learning().unwrap();
        for expected_chunk in 0..2 {
            assert_eq!(session.chunk_index(), expected_chunk);
            while session.mode() == SessionMode::Learning(LearningPhase::Study) {
                session.next_study_card().unwrap();
            }
            while session.mode() == SessionMode::Learning(LearningPhase::Quiz) {
                let id = front_id(&session);
                session.answer_quiz_item(&id, true).unwrap();
            }
            session.continue_after_chunk().unwrap();
        }

        assert_eq!(session.mode(), SessionMode::Review);
        assert_eq!(front_id(&session).as_str(), "d");
        let updated = session
            .answer_review_item(ReviewQuality::Good)
            .unwrap()
            .unwrap();
        assert_eq!(updated.srs_stage().value(), 4);

        assert_eq!(session.mode(), SessionMode::Complete);
        let stats = session.exit();
        assert_eq!(stats.learned, 3);
        assert_eq!(stats.reviewed, 1);
        assert_eq!(stats.good, 1);
    }

    #[test]
    fn last_chunk_without_due_items_completes() {
        let mut session = session(vec![new_item("a", 0)], 5, 5);
        session.start_learning().unwrap();
        session.next_study_card().unwrap();
        session
            .answer_quiz_item(&ReviewItemId::new("a"), true)
            .unwrap();
        session.continue_after_chunk().unwrap();
        assert_eq!(session.mode(), SessionMode::Complete);
    }

    #[test]
    fn review_penalizes_once_per_round() {
        let mut session = session(vec![due_item("x", 6), due_item("y", 2)], 5, 5);
        session.start_reviewing().unwrap();
        assert_eq!(front_id(&session).as_str(), "x");

        let first_fail = session
            .answer_review_item(ReviewQuality::Again)
            .unwrap()
            .unwrap();
        assert_eq!(first_fail.srs_stage().value(), 4);
        assert_eq!(first_fail.incorrect_answer_count(), 1);
        assert!(session.is_penalized(first_fail.id()));
        assert_eq!(session.review_queue().len(), 2);
        assert_eq!(front_id(&session).as_str(), "y");

        session.answer_review_item(ReviewQuality::Easy).unwrap();
        assert_eq!(front_id(&session).as_str(), "x");

        let second_fail = session.answer_review_item(ReviewQuality::Again).unwrap();
        assert!(second_fail.is_none());
        assert_eq!(front_id(&session).as_str(), "x");

        let recovered = session.answer_review_item(ReviewQuality::Good).unwrap();
        assert!(recovered.is_none());

        assert_eq!(session.mode(), SessionMode::Complete);
        let x = session
            .deck()
            .iter()
            .find(|i| i.id().as_str() == "x")
            .unwrap();
        assert_eq!(x.srs_stage().value(), 4);
        assert_eq!(x.incorrect_answer_count(), 1);

        let stats = session.stats();
        assert_eq!(stats.reviewed, 2);
        assert_eq!(stats.again, 2);
        assert_eq!((stats.hard, stats.good, stats.easy), (0, 1, 1));
    }

    #[test]
    fn hard_on_stage_one_holds_stage_and_completes() {
        let mut session = session(vec![due_item("z", 1)], 5, 5);
        session.start_reviewing().unwrap();
        session.answer_review_item(ReviewQuality::Hard).unwrap();
        assert_eq!(session.mode(), SessionMode::Complete);

        let z = &session.deck()[0];
        assert_eq!(z.srs_stage(), SrsStage::FIRST);
        assert!(z.next_review_date() > fixed_now());
    }

    #[test]
    fn invalid_actions_are_rejected() {
        let mut session = session(vec![due_item("d", 2)], 5, 5);
        assert!(matches!(
            session.start_learning(),
            Err(SessionError::InvalidAction {
                action: "start_learning",
                mode: SessionMode::Start
            })
        ));
        assert!(session.answer_review_item(ReviewQuality::Good).is_err());
        assert!(session.continue_after_chunk().is_err());
        assert!(session.exit_manage().is_err());

        session.start_reviewing().unwrap();
        assert!(session.enter_manage().is_err());
        assert!(session.next_study_card().is_err());
    }

    #[test]
    fn manage_deletes_and_reevaluates() {
        let mut session = session(vec![new_item("a", 0), due_item("d", 2)], 5, 5);
        session.enter_manage().unwrap();
        assert_eq!(session.mode(), SessionMode::Manage);

        let removed = session.delete_item(&ReviewItemId::new("a")).unwrap();
        assert_eq!(removed.id().as_str(), "a");
        assert!(matches!(
            session.delete_item(&ReviewItemId::new("a")),
            Err(SessionError::UnknownItem(_))
        ));

        session.exit_manage().unwrap();
        assert_eq!(session.mode(), SessionMode::Start);
        assert!(session.plan().new_items.is_empty());
        assert_eq!(session.plan().due_items.len(), 1);

        session.enter_manage().unwrap();
        session.delete_item(&ReviewItemId::new("d")).unwrap();
        session.exit_manage().unwrap();
        assert_eq!(session.mode(), SessionMode::Empty);
    }

    #[test]
    fn shuffled_quiz_keeps_every_chunk_item() {
        let deck: Vec<ReviewItem> = (0..5).map(|i| new_item(&format!("n{i}"), i)).collect();
        let mut session = SessionOrchestrator::new(deck, StudySettings::default(), None)
            .with_clock(fixed_clock());
        session.start_learning().unwrap();
        for _ in 0..5 {
            session.next_study_card().unwrap();
        }
        let mut ids: Vec<&str> = session.quiz_queue().iter().map(|i| i.id().as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["n0", "n1", "n2", "n3", "n4"]);
    }
}
