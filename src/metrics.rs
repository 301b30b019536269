use anyhow::anyhow;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

// The recorder is process-global; every router built afterwards shares it.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish the pool size.
    pub fn init(workers: usize) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .map_err(|e| anyhow!("prometheus: install recorder: {e}"))?;
                describe_counter!(
                    "sentiment_requests_total",
                    "Completed analyses, labelled by sentiment"
                );
                describe_counter!(
                    "sentiment_language_fallback_total",
                    "Requests whose language fell back to the default"
                );
                describe_counter!("sentiment_streams_total", "Streaming batch calls accepted");
                describe_counter!("sentiment_lexicon_reloads_total", "Lexicon swaps");
                describe_histogram!(
                    "sentiment_analysis_duration_ms",
                    "Time from worker acquisition to result, in milliseconds"
                );
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();

        gauge!("sentiment_workers").set(workers as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
