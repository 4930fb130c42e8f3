//! Sentence analysis: the service contract plus HTTP, de-duplicating and
//! caching implementations that stack on top of each other.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

mod cache;
mod client;
mod dedup;

pub use cache::CachedAnalysisService;
pub use client::{AnalysisConfig, HttpAnalysisService};
pub use dedup::DedupAnalysisService;

/// How much detail to ask the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    Quick,
    Detailed,
}

impl AnalysisDepth {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisDepth::Quick => "quick",
            AnalysisDepth::Detailed => "detailed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quick" => Some(AnalysisDepth::Quick),
            "detailed" => Some(AnalysisDepth::Detailed),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One token of a segmented sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub reading: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub pitch_accent: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarPoint {
    pub pattern: String,
    pub explanation: String,
    #[serde(default)]
    pub example: Option<String>,
}

/// Linguistic breakdown of a single sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceAnalysis {
    pub sentence: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub grammar_points: Vec<GrammarPoint>,
    #[serde(default)]
    pub translation: String,
}

/// Anything that can analyze a Japanese sentence.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// # Errors
    ///
    /// Returns `AnalysisError` if the sentence cannot be analyzed.
    async fn analyze(
        &self,
        sentence: &str,
        depth: AnalysisDepth,
    ) -> Result<SentenceAnalysis, AnalysisError>;
}

/// Key shared by request de-duplication and the local cache.
#[must_use]
pub fn cache_key(depth: AnalysisDepth, sentence: &str) -> String {
    format!("{depth}:{}", sentence.trim())
}

const SENTENCE_TERMINATORS: [char; 5] = ['。', '！', '？', '!', '?'];

/// Split pasted text into sentences.
///
/// Breaks after `。！？!?` and at newlines, keeps the terminator with its
/// sentence, and drops blank pieces.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_owned());
        }
        current.clear();
    };

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            flush(&mut current);
            continue;
        }
        current.push(ch);
        if SENTENCE_TERMINATORS.contains(&ch) {
            flush(&mut current);
        }
    }
    flush(&mut current);

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_terminators_and_drops_blanks() {
        let text = "今日は晴れです。明日は？\n\n  雨かもしれない！ Really?\nおわり";
        assert_eq!(
            split_sentences(text),
            vec![
                "今日は晴れです。",
                "明日は？",
                "雨かもしれない！",
                "Really?",
                "おわり",
            ]
        );
    }

    #[test]
    fn split_handles_empty_and_whitespace() {
        assert!(split_sentences("").is_empty());
        assert_eq!(split_sentences(" \n\r\n 。"), vec!["。"]);
    }

    #[test]
    fn analysis_json_uses_camel_case_and_tolerates_gaps() {
        let json = r#"{
            "sentence": "猫がいる。",
            "segments": [{"text": "猫", "reading": "ねこ", "partOfSpeech": "noun", "pitchAccent": 1}],
            "grammarPoints": [{"pattern": "〜がいる", "explanation": "existence of animate things"}]
        }"#;
        let parsed: SentenceAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.segments[0].part_of_speech.as_deref(), Some("noun"));
        assert_eq!(parsed.segments[0].pitch_accent, Some(1));
        assert!(parsed.segments[0].meaning.is_none());
        assert!(parsed.translation.is_empty());
        assert_eq!(parsed.grammar_points.len(), 1);
    }

    #[test]
    fn cache_key_combines_depth_and_sentence() {
        assert_eq!(cache_key(AnalysisDepth::Quick, " 猫。 "), "quick:猫。");
        assert_eq!(AnalysisDepth::parse("Detailed"), Some(AnalysisDepth::Detailed));
        assert_eq!(AnalysisDepth::parse("deep"), None);
    }
}
