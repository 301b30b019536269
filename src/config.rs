// src/config.rs
//! Service configuration from the environment (optionally seeded by `.env`).
//!
//! None of these knobs change scoring results; they size the server around it.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use crate::analyze::DEFAULT_KEYWORD_LIMIT;

// --- env names ---
pub const ENV_PORT: &str = "SENTIMENT_PORT";
/// Older deployments set the port under this name.
pub const ENV_PORT_FALLBACK: &str = "GRPC_PORT";
pub const ENV_WORKERS: &str = "SENTIMENT_WORKERS";
pub const ENV_LEXICON_PATH: &str = "SENTIMENT_LEXICON_PATH";
pub const ENV_KEYWORD_LIMIT: &str = "SENTIMENT_KEYWORD_LIMIT";
pub const ENV_SIMULATED_DELAY_MS: &str = "SENTIMENT_SIMULATED_DELAY_MS";
pub const ENV_STREAM_PIPELINE: &str = "SENTIMENT_STREAM_PIPELINE";

// --- defaults ---
pub const DEFAULT_PORT: u16 = 50051;
pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_STREAM_PIPELINE: usize = 1;

/// Inclusive bounds of the simulated processing delay, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl FromStr for DelayRange {
    type Err = anyhow::Error;

    /// Accepts `"250"` or `"100-500"`. Reversed bounds are swapped.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (lo, hi) = match s.split_once('-') {
            Some((lo, hi)) => (lo.trim(), hi.trim()),
            None => (s, s),
        };
        let mut min_ms: u64 = lo.parse().with_context(|| format!("bad delay bound `{lo}`"))?;
        let mut max_ms: u64 = hi.parse().with_context(|| format!("bad delay bound `{hi}`"))?;
        if min_ms > max_ms {
            // swap to keep a valid interval
            std::mem::swap(&mut min_ms, &mut max_ms);
        }
        Ok(Self { min_ms, max_ms })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    /// Maximum number of analyses running at once.
    pub workers: usize,
    /// External lexicon file; the bundled lexicon is used when `None`.
    pub lexicon_path: Option<PathBuf>,
    pub keyword_limit: usize,
    /// `None` disables the simulated delay.
    pub simulated_delay: Option<DelayRange>,
    /// How many items of one stream may be in flight; responses stay in order.
    pub stream_pipeline: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            lexicon_path: None,
            keyword_limit: DEFAULT_KEYWORD_LIMIT,
            simulated_delay: None,
            stream_pipeline: DEFAULT_STREAM_PIPELINE,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (env, map in tests, ...).
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let port = match get(ENV_PORT).or_else(|| get(ENV_PORT_FALLBACK)) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid port `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        let workers = parse_or(get(ENV_WORKERS), ENV_WORKERS, DEFAULT_WORKERS)?;
        if workers == 0 {
            bail!("{ENV_WORKERS} must be at least 1");
        }

        let stream_pipeline =
            parse_or(get(ENV_STREAM_PIPELINE), ENV_STREAM_PIPELINE, DEFAULT_STREAM_PIPELINE)?;
        if stream_pipeline == 0 {
            bail!("{ENV_STREAM_PIPELINE} must be at least 1");
        }

        let keyword_limit = parse_or(get(ENV_KEYWORD_LIMIT), ENV_KEYWORD_LIMIT, DEFAULT_KEYWORD_LIMIT)?;

        let simulated_delay = match get(ENV_SIMULATED_DELAY_MS) {
            None => None,
            Some(raw) if matches!(raw.trim().to_ascii_lowercase().as_str(), "off" | "0" | "false") => {
                None
            }
            Some(raw) => Some(
                raw.parse::<DelayRange>()
                    .map_err(|e| anyhow!("{ENV_SIMULATED_DELAY_MS}: {e:#}"))?,
            ),
        };

        Ok(Self {
            port,
            workers,
            lexicon_path: get(ENV_LEXICON_PATH).map(PathBuf::from),
            keyword_limit,
            simulated_delay,
            stream_pipeline,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value `{v}` for {key}")),
        None => Ok(default),
    }
}
