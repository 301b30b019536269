// src/lexicon/handle.rs
//! Shared, swappable reference to the active [`LexiconStore`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use metrics::counter;
use tracing::{info, warn};

use super::{LexiconError, LexiconStore};

/// A threadsafe handle; readers get an `Arc` snapshot, reloads replace the whole store.
#[derive(Debug, Clone)]
pub struct LexiconHandle {
    inner: Arc<RwLock<Arc<LexiconStore>>>,
    source: Option<PathBuf>,
}

impl LexiconHandle {
    pub fn new(store: LexiconStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(store))),
            source: None,
        }
    }

    /// Remember the file the store came from so it can be reloaded on demand.
    pub fn with_source(mut self, path: PathBuf) -> Self {
        self.source = Some(path);
        self
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    /// Current store. The lock is only held long enough to clone the `Arc`.
    pub fn snapshot(&self) -> Arc<LexiconStore> {
        // The guarded value is a single Arc, so a poisoned lock still holds a whole store.
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomically install a new store. In-flight readers keep their old snapshot.
    pub fn replace(&self, store: LexiconStore) {
        let fresh = Arc::new(store);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        counter!("sentiment_lexicon_reloads_total").increment(1);
    }

    /// Re-read the source file and swap it in. The old store stays on failure.
    pub fn reload(&self) -> Result<(), ReloadError> {
        let path = self.source.as_ref().ok_or(ReloadError::NoSource)?;
        let store = LexiconStore::load_from_file(path)?;
        self.replace(store);
        info!(target: "sentiment", path = %path.display(), "lexicon reloaded");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("lexicon was not loaded from a file; nothing to reload")]
    NoSource,
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

fn hot_reload_enabled() -> bool {
    std::env::var("LEXICON_HOT_RELOAD")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Poll the lexicon file's mtime and swap in a fresh store when it changes.
/// No-op unless `LEXICON_HOT_RELOAD=1` and the handle has a source file.
pub fn start_hot_reload_thread(handle: LexiconHandle, poll: Duration) {
    if !hot_reload_enabled() {
        return;
    }
    let Some(path) = handle.source().cloned() else {
        return;
    };

    info!(target: "sentiment", path = %path.display(), "lexicon hot reload enabled");

    // Baseline is the file as it is now, so the first change after startup counts.
    let mut last_mtime = file_mtime(&path);

    thread::spawn(move || loop {
        thread::sleep(poll);
        let Some(mtime) = file_mtime(&path) else {
            continue;
        };
        if last_mtime == Some(mtime) {
            continue;
        }
        if let Err(e) = handle.reload() {
            warn!(target: "sentiment", error = %e, "lexicon reload failed; keeping previous");
        }
        last_mtime = Some(mtime);
    });
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
