use std::sync::Arc;

use async_trait::async_trait;
use storage::repository::AnalysisCacheRepository;

use super::{AnalysisDepth, AnalysisService, SentenceAnalysis, cache_key};
use crate::error::AnalysisError;

/// Serves analyses from the local cache, falling back to the inner service
/// and storing what it returns.
///
/// Cache read and write failures are logged and never fail the request.
#[derive(Clone)]
pub struct CachedAnalysisService {
    inner: Arc<dyn AnalysisService>,
    cache: Arc<dyn AnalysisCacheRepository>,
}

impl CachedAnalysisService {
    #[must_use]
    pub fn new(inner: Arc<dyn AnalysisService>, cache: Arc<dyn AnalysisCacheRepository>) -> Self {
        Self { inner, cache }
    }

    async fn lookup(&self, key: &str) -> Option<SentenceAnalysis> {
        let json = match self.cache.get_cached_analysis(key).await {
            Ok(json) => json?,
            Err(err) => {
                tracing::warn!(key, error = %err, "analysis cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(analysis) => Some(analysis),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable cached analysis");
                None
            }
        }
    }

    async fn store(&self, key: &str, analysis: &SentenceAnalysis) {
        let json = match serde_json::to_string(analysis) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(key, error = %err, "analysis could not be serialized");
                return;
            }
        };
        if let Err(err) = self.cache.put_cached_analysis(key, &json).await {
            tracing::warn!(key, error = %err, "analysis cache write failed");
        }
    }
}

#[async_trait]
impl AnalysisService for CachedAnalysisService {
    async fn analyze(
        &self,
        sentence: &str,
        depth: AnalysisDepth,
    ) -> Result<SentenceAnalysis, AnalysisError> {
        let key = cache_key(depth, sentence);
        if let Some(hit) = self.lookup(&key).await {
            tracing::debug!(key, "analysis cache hit");
            return Ok(hit);
        }

        let analysis = self.inner.analyze(sentence, depth).await?;
        self.store(&key, &analysis).await;
        Ok(analysis)
    }
}
