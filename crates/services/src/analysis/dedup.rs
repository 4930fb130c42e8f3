use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};

use super::{AnalysisDepth, AnalysisService, SentenceAnalysis, cache_key};
use crate::error::AnalysisError;

type PendingAnalysis = Shared<BoxFuture<'static, Result<SentenceAnalysis, Arc<AnalysisError>>>>;

/// Collapses concurrent requests for the same sentence and depth into one
/// call to the inner service.
///
/// The pending entry is dropped as soon as the shared request finishes, so a
/// later call for the same key issues a fresh request.
#[derive(Clone)]
pub struct DedupAnalysisService {
    inner: Arc<dyn AnalysisService>,
    pending: Arc<DashMap<String, PendingAnalysis>>,
}

impl DedupAnalysisService {
    #[must_use]
    pub fn new(inner: Arc<dyn AnalysisService>) -> Self {
        Self {
            inner,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn pending_request(&self, sentence: &str, depth: AnalysisDepth) -> PendingAnalysis {
        let key = cache_key(depth, sentence);

        let entry = self.pending.entry(key.clone()).or_insert_with(|| {
            let inner = Arc::clone(&self.inner);
            let pending = Arc::clone(&self.pending);
            let sentence = sentence.to_owned();
            async move {
                let result = inner.analyze(&sentence, depth).await.map_err(Arc::new);
                pending.remove(&key);
                result
            }
            .boxed()
            .shared()
        });
        entry.value().clone()
    }
}

#[async_trait]
impl AnalysisService for DedupAnalysisService {
    async fn analyze(
        &self,
        sentence: &str,
        depth: AnalysisDepth,
    ) -> Result<SentenceAnalysis, AnalysisError> {
        let request = self.pending_request(sentence, depth);
        request.await.map_err(AnalysisError::Shared)
    }
}
