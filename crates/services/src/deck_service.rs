use std::sync::Arc;

use dokkai_core::model::{
    GrammarContent, ItemContent, ReviewItem, ReviewItemId, TextEntryId, WordContent,
};
use storage::repository::ReviewItemRepository;

use crate::Clock;
use crate::analysis::{GrammarPoint, Segment};
use crate::error::DeckServiceError;

/// Turns analysis results into review items and manages the deck.
#[derive(Clone)]
pub struct DeckService {
    clock: Clock,
    items: Arc<dyn ReviewItemRepository>,
}

impl DeckService {
    #[must_use]
    pub fn new(clock: Clock, items: Arc<dyn ReviewItemRepository>) -> Self {
        Self { clock, items }
    }

    /// Add a vocabulary item built from an analyzed segment.
    ///
    /// If the same word with the same reading already exists in this scope,
    /// that item is returned and nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Content` if the segment lacks a meaning and
    /// `DeckServiceError::Storage` if the store fails.
    pub async fn add_word(
        &self,
        segment: &Segment,
        text_entry: Option<TextEntryId>,
    ) -> Result<ReviewItem, DeckServiceError> {
        let mut word = WordContent::new(
            segment.text.trim(),
            segment.reading.as_deref().unwrap_or(segment.text.as_str()).trim(),
            segment.meaning.as_deref().unwrap_or_default().trim(),
        );
        if let Some(pos) = segment.part_of_speech.as_deref() {
            word = word.with_part_of_speech(pos);
        }
        if let Some(downstep) = segment.pitch_accent {
            word = word.with_pitch_accent(downstep);
        }
        self.add_content(word.into(), text_entry).await
    }

    /// Add a grammar item built from an analyzed grammar point.
    ///
    /// Duplicates are detected by pattern within the scope.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Content` for a blank pattern or explanation
    /// and `DeckServiceError::Storage` if the store fails.
    pub async fn add_grammar(
        &self,
        point: &GrammarPoint,
        text_entry: Option<TextEntryId>,
    ) -> Result<ReviewItem, DeckServiceError> {
        let mut grammar = GrammarContent::new(point.pattern.trim(), point.explanation.trim());
        if let Some(example) = point.example.as_deref() {
            grammar = grammar.with_example(example.trim(), None);
        }
        self.add_content(grammar.into(), text_entry).await
    }

    /// Every item in the deck, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if the store fails.
    pub async fn list_items(&self) -> Result<Vec<ReviewItem>, DeckServiceError> {
        let mut items = self.items.get_all_review_items().await?;
        items.sort_by(|a, b| (a.added_at(), a.id()).cmp(&(b.added_at(), b.id())));
        Ok(items)
    }

    /// Delete an item. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if the store fails.
    pub async fn delete_item(&self, id: &ReviewItemId) -> Result<(), DeckServiceError> {
        self.items.delete_review_item(id).await?;
        Ok(())
    }

    async fn add_content(
        &self,
        content: ItemContent,
        text_entry: Option<TextEntryId>,
    ) -> Result<ReviewItem, DeckServiceError> {
        content.validate()?;

        let existing = self.items.get_all_review_items().await?;
        if let Some(found) = existing.into_iter().find(|item| {
            item.text_entry_id() == text_entry.as_ref() && same_content(item.content(), &content)
        }) {
            tracing::debug!(item_id = %found.id(), "skipping duplicate deck item");
            return Ok(found);
        }

        let item = ReviewItem::new(ReviewItemId::generate(), content, text_entry, self.clock.now())?;
        self.items.upsert_review_item(&item).await?;
        Ok(item)
    }
}

fn same_content(a: &ItemContent, b: &ItemContent) -> bool {
    match (a, b) {
        (ItemContent::Word(a), ItemContent::Word(b)) => a.word == b.word && a.reading == b.reading,
        (ItemContent::Grammar(a), ItemContent::Grammar(b)) => a.pattern == b.pattern,
        _ => false,
    }
}
