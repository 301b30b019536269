//! # Analysis Engine
//! Bounded worker pool around the pure scoring pipeline.
//!
//! Every unary call and every item of a stream takes one permit from a shared
//! semaphore, so at most `workers` analyses run at once across all callers.
//! Within one stream, responses come back in request order; separate streams
//! and unary calls make progress independently of each other.
//!
//! Work is plain futures: if a caller goes away and the future is dropped, the
//! analysis is abandoned at its next suspension point. The lexicon is only ever
//! read through a snapshot, so an abandoned call leaves nothing behind.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{Stream, StreamExt};
use metrics::{counter, histogram};
use rand::Rng;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::analyze::{self, text_id, AnalysisRequest, AnalysisResponse};
use crate::config::{DelayRange, ServiceConfig};
use crate::lexicon::LexiconHandle;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("worker pool is shut down")]
    PoolClosed,
}

#[derive(Debug)]
struct Inner {
    lexicon: LexiconHandle,
    permits: Semaphore,
    workers: usize,
    delay: Option<DelayRange>,
    keyword_limit: usize,
    stream_pipeline: usize,
}

/// Cheap to clone; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    pub fn from_config(lexicon: LexiconHandle, cfg: &ServiceConfig) -> Self {
        Self::build(
            lexicon,
            cfg.workers,
            cfg.simulated_delay,
            cfg.keyword_limit,
            cfg.stream_pipeline,
        )
    }

    fn build(
        lexicon: LexiconHandle,
        workers: usize,
        delay: Option<DelayRange>,
        keyword_limit: usize,
        stream_pipeline: usize,
    ) -> Self {
        let workers = workers.max(1);
        Self {
            inner: Arc::new(Inner {
                lexicon,
                permits: Semaphore::new(workers),
                workers,
                delay,
                keyword_limit,
                stream_pipeline: stream_pipeline.max(1),
            }),
        }
    }

    pub fn lexicon(&self) -> &LexiconHandle {
        &self.inner.lexicon
    }

    pub fn workers(&self) -> usize {
        self.inner.workers
    }

    /// Permits not currently held by a running analysis.
    pub fn idle_workers(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Run one request on a worker. `request_id` is echoed verbatim.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, EngineError> {
        let _permit = self
            .inner
            .permits
            .acquire()
            .await
            .map_err(|_| EngineError::PoolClosed)?;

        let started = Instant::now();
        debug!(
            target: "sentiment",
            request_id = %request.request_id,
            id = %text_id(&request.text),
            chars = request.text.chars().count(),
            language = %request.language,
            "analysis started"
        );

        if let Some(range) = self.inner.delay {
            let ms = rand::rng().random_range(range.min_ms..=range.max_ms);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let store = self.inner.lexicon.snapshot();
        let result = analyze::analyze_with_limit(
            &store,
            &request.text,
            &request.language,
            self.inner.keyword_limit,
        );

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!("sentiment_requests_total", "sentiment" => result.sentiment.as_str()).increment(1);
        histogram!("sentiment_analysis_duration_ms").record(elapsed_ms);
        info!(
            target: "sentiment",
            request_id = %request.request_id,
            sentiment = result.sentiment.as_str(),
            score = result.score,
            elapsed_ms,
            "analysis complete"
        );

        Ok(AnalysisResponse {
            request_id: request.request_id,
            result,
        })
    }

    /// Answer a stream of requests. Response N always belongs to request N;
    /// up to `stream_pipeline` items of this stream may be scored concurrently.
    ///
    /// Items that already failed upstream (e.g. a line that did not decode) pass
    /// through as errors in their slot without touching the pool.
    pub fn analyze_stream<S, E>(
        &self,
        requests: S,
    ) -> impl Stream<Item = Result<AnalysisResponse, E>> + Send + 'static
    where
        S: Stream<Item = Result<AnalysisRequest, E>> + Send + 'static,
        E: From<EngineError> + Send + 'static,
    {
        let engine = self.clone();
        let depth = self.inner.stream_pipeline;
        requests
            .map(move |item| {
                let engine = engine.clone();
                async move { engine.analyze(item?).await.map_err(E::from) }
            })
            .buffered(depth)
    }

    /// Score a finite batch, keeping input order.
    pub async fn analyze_batch(
        &self,
        requests: Vec<AnalysisRequest>,
    ) -> Result<Vec<AnalysisResponse>, EngineError> {
        let items = futures::stream::iter(requests.into_iter().map(Ok::<_, EngineError>));
        self.analyze_stream(items)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }
}
