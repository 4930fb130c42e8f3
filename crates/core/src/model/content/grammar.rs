use serde::{Deserialize, Serialize};

use super::{ContentError, require_text};

/// A grammar pattern with its explanation and an optional example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarContent {
    pub pattern: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_translation: Option<String>,
}

impl GrammarContent {
    pub fn new(pattern: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            explanation: explanation.into(),
            example: None,
            example_translation: None,
        }
    }

    #[must_use]
    pub fn with_example(
        mut self,
        example: impl Into<String>,
        translation: Option<String>,
    ) -> Self {
        self.example = Some(example.into());
        self.example_translation = translation;
        self
    }

    /// # Errors
    ///
    /// Returns `ContentError::EmptyField` if the pattern or explanation is blank.
    pub fn validate(&self) -> Result<(), ContentError> {
        require_text("pattern", &self.pattern)?;
        require_text("explanation", &self.explanation)
    }
}
