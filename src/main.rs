//! Sentiment Service: binary entrypoint
//! Boots the Axum HTTP server: config from env, lexicon, worker pool, routes.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentiment_service::{
    config::ServiceConfig, lexicon::start_hot_reload_thread, load_lexicon, metrics::Metrics,
    router, AppState, Engine,
};

/// How often the hot-reload thread checks the lexicon file.
const LEXICON_POLL: Duration = Duration::from_secs(2);

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentiment=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target: "sentiment", "shutdown requested");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ServiceConfig::from_env().context("invalid service configuration")?;

    let lexicon = load_lexicon(&cfg)?;
    start_hot_reload_thread(lexicon.clone(), LEXICON_POLL);

    let metrics = Metrics::init(cfg.workers)?;
    let engine = Engine::from_config(lexicon, &cfg);
    let app = router(AppState::new(engine).with_metrics(metrics));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        target: "sentiment",
        %addr,
        workers = cfg.workers,
        stream_pipeline = cfg.stream_pipeline,
        simulated_delay = ?cfg.simulated_delay,
        "server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(target: "sentiment", "server stopped");
    Ok(())
}
