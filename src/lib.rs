// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod engine;
pub mod lexicon;
pub mod metrics;

use anyhow::Context;
use axum::Router;
use tracing::info;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    analyze, analyze_with_limit, AnalysisRequest, AnalysisResponse, ConfidenceScores, Sentiment,
    SentimentResult,
};
pub use crate::api::{router, AppState};
pub use crate::config::ServiceConfig;
pub use crate::engine::Engine;
pub use crate::lexicon::{LanguageCode, LexiconHandle, LexiconStore};

/// Load the configured lexicon file, or the bundled one when none is set.
/// A lexicon that fails to load is a startup error, never a per-request one.
pub fn load_lexicon(cfg: &ServiceConfig) -> anyhow::Result<LexiconHandle> {
    match &cfg.lexicon_path {
        Some(path) => {
            let store = LexiconStore::load_from_file(path)
                .with_context(|| format!("loading lexicon from {}", path.display()))?;
            info!(
                target: "sentiment",
                path = %path.display(),
                languages = store.languages().count(),
                "lexicon loaded"
            );
            Ok(LexiconHandle::new(store).with_source(path.clone()))
        }
        None => {
            let store = LexiconStore::builtin().context("bundled lexicon is invalid")?;
            info!(target: "sentiment", languages = store.languages().count(), "bundled lexicon loaded");
            Ok(LexiconHandle::new(store))
        }
    }
}

/// Build the full in-process app (routes + metrics) from a config.
pub fn app(cfg: &ServiceConfig) -> anyhow::Result<Router> {
    let lexicon = load_lexicon(cfg)?;
    let metrics = crate::metrics::Metrics::init(cfg.workers)?;
    let engine = Engine::from_config(lexicon, cfg);
    Ok(router(AppState::new(engine).with_metrics(metrics)))
}
