use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use dokkai_core::model::AppSettings;

use super::{AnalysisDepth, AnalysisService, SentenceAnalysis};
use crate::error::AnalysisError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles on each further attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl AnalysisConfig {
    /// Build a config from app settings; `None` without an API key.
    #[must_use]
    pub fn from_settings(settings: &AppSettings) -> Option<Self> {
        let api_key = settings.api_key()?.to_owned();
        Some(Self {
            base_url: settings
                .api_base_url()
                .unwrap_or(DEFAULT_BASE_URL)
                .to_owned(),
            api_key,
            model: settings.api_model().unwrap_or(DEFAULT_MODEL).to_owned(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// OpenAI-compatible chat-completions client producing sentence analyses.
#[derive(Clone)]
pub struct HttpAnalysisService {
    client: Client,
    config: Option<AnalysisConfig>,
}

impl HttpAnalysisService {
    #[must_use]
    pub fn new(config: Option<AnalysisConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(AnalysisConfig::from_settings(settings))
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn request_once(
        &self,
        config: &AnalysisConfig,
        payload: &ChatRequest,
    ) -> Result<String, AnalysisError> {
        let response = self
            .client
            .post(config.endpoint())
            .bearer_auth(&config.api_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(
        &self,
        sentence: &str,
        depth: AnalysisDepth,
    ) -> Result<SentenceAnalysis, AnalysisError> {
        let config = self.config.as_ref().ok_or(AnalysisError::Disabled)?;
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Err(AnalysisError::EmptySentence);
        }

        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(depth).to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: sentence.to_owned(),
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let mut attempt = 1;
        let content = loop {
            match self.request_once(config, &payload).await {
                Ok(content) => break content,
                Err(AnalysisError::HttpStatus(status))
                    if is_retryable(status) && attempt < MAX_ATTEMPTS =>
                {
                    let delay = RETRY_BACKOFF * 2_u32.pow(attempt - 1);
                    tracing::warn!(%status, attempt, ?delay, "analysis request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        parse_analysis(sentence, &content)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn system_prompt(depth: AnalysisDepth) -> &'static str {
    match depth {
        AnalysisDepth::Quick => {
            "You analyze one Japanese sentence for a learner. Reply with a JSON object: \
             {\"segments\":[{\"text\",\"reading\",\"meaning\",\"partOfSpeech\"}],\
             \"grammarPoints\":[{\"pattern\",\"explanation\"}],\"translation\"}. \
             Readings in hiragana. Keep explanations to one short sentence."
        }
        AnalysisDepth::Detailed => {
            "You analyze one Japanese sentence for a learner. Reply with a JSON object: \
             {\"segments\":[{\"text\",\"reading\",\"meaning\",\"partOfSpeech\",\"pitchAccent\"}],\
             \"grammarPoints\":[{\"pattern\",\"explanation\",\"example\"}],\"translation\"}. \
             Readings in hiragana; pitchAccent is the downstep mora number (0 for heiban). \
             Explain every grammar point with a natural example sentence."
        }
    }
}

/// Parse the model's reply, tolerating a surrounding markdown code fence.
fn parse_analysis(sentence: &str, content: &str) -> Result<SentenceAnalysis, AnalysisError> {
    let json = strip_code_fence(content);
    let reply: AnalysisReply =
        serde_json::from_str(json).map_err(|e| AnalysisError::Malformed(e.to_string()))?;
    Ok(SentenceAnalysis {
        sentence: sentence.to_owned(),
        segments: reply.segments,
        grammar_points: reply.grammar_points,
        translation: reply.translation.trim().to_owned(),
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReply {
    #[serde(default)]
    segments: Vec<super::Segment>,
    #[serde(default)]
    grammar_points: Vec<super::GrammarPoint>,
    #[serde(default)]
    translation: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
