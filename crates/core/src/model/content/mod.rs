mod grammar;
mod word;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use grammar::GrammarContent;
pub use word::WordContent;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("pitch accent position {0} is out of range")]
    InvalidPitchAccent(u8),
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        return Err(ContentError::EmptyField { field });
    }
    Ok(())
}

//
// ─── ITEM KIND ─────────────────────────────────────────────────────────────────
//

/// Discriminates how a review item's content is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Word,
    Grammar,
}

impl ItemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Word => "word",
            ItemKind::Grammar => "grammar",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "word" => Some(Self::Word),
            "grammar" => Some(Self::Grammar),
            _ => None,
        }
    }
}

//
// ─── ITEM CONTENT ──────────────────────────────────────────────────────────────
//

/// Payload of a review item, tagged by its kind.
///
/// Serialized adjacently tagged as `{"type": "word", "content": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ItemContent {
    Word(WordContent),
    Grammar(GrammarContent),
}

impl ItemContent {
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemContent::Word(_) => ItemKind::Word,
            ItemContent::Grammar(_) => ItemKind::Grammar,
        }
    }

    /// Short label suitable for lists: the word or the grammar pattern.
    #[must_use]
    pub fn headline(&self) -> &str {
        match self {
            ItemContent::Word(word) => &word.word,
            ItemContent::Grammar(grammar) => &grammar.pattern,
        }
    }

    /// Validates whichever variant is present.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when a required field is blank.
    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            ItemContent::Word(word) => word.validate(),
            ItemContent::Grammar(grammar) => grammar.validate(),
        }
    }

    #[must_use]
    pub fn as_word(&self) -> Option<&WordContent> {
        match self {
            ItemContent::Word(word) => Some(word),
            ItemContent::Grammar(_) => None,
        }
    }

    #[must_use]
    pub fn as_grammar(&self) -> Option<&GrammarContent> {
        match self {
            ItemContent::Grammar(grammar) => Some(grammar),
            ItemContent::Word(_) => None,
        }
    }
}

impl From<WordContent> for ItemContent {
    fn from(value: WordContent) -> Self {
        Self::Word(value)
    }
}

impl From<GrammarContent> for ItemContent {
    fn from(value: GrammarContent) -> Self {
        Self::Grammar(value)
    }
}
