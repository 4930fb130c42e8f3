use serde::{Deserialize, Serialize};

use super::{ContentError, require_text};

/// A vocabulary entry harvested from analyzed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordContent {
    pub word: String,
    pub reading: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    /// Downstep position in morae (0 = heiban).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_accent: Option<u8>,
}

impl WordContent {
    pub fn new(
        word: impl Into<String>,
        reading: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            reading: reading.into(),
            meaning: meaning.into(),
            part_of_speech: None,
            pitch_accent: None,
        }
    }

    #[must_use]
    pub fn with_part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = Some(pos.into());
        self
    }

    #[must_use]
    pub fn with_pitch_accent(mut self, downstep: u8) -> Self {
        self.pitch_accent = Some(downstep);
        self
    }

    /// # Errors
    ///
    /// Returns `ContentError::EmptyField` if the word or meaning is blank and
    /// `ContentError::InvalidPitchAccent` if the downstep lies past the reading.
    pub fn validate(&self) -> Result<(), ContentError> {
        require_text("word", &self.word)?;
        require_text("meaning", &self.meaning)?;
        if let Some(downstep) = self.pitch_accent {
            let morae = self.reading.chars().count();
            if morae > 0 && usize::from(downstep) > morae {
                return Err(ContentError::InvalidPitchAccent(downstep));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_word_fails() {
        let err = WordContent::new("  ", "ねこ", "cat").validate().unwrap_err();
        assert_eq!(err, ContentError::EmptyField { field: "word" });
    }

    #[test]
    fn blank_meaning_fails() {
        let err = WordContent::new("猫", "ねこ", "").validate().unwrap_err();
        assert_eq!(err, ContentError::EmptyField { field: "meaning" });
    }

    #[test]
    fn pitch_accent_must_fit_reading() {
        let ok = WordContent::new("箸", "はし", "chopsticks").with_pitch_accent(1);
        assert!(ok.validate().is_ok());

        let bad = WordContent::new("箸", "はし", "chopsticks").with_pitch_accent(5);
        assert_eq!(bad.validate(), Err(ContentError::InvalidPitchAccent(5)));
    }
}
