// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-wide artifact cache
//!
//! Compiling the WASM artifact and opening the shared library are done once
//! per path per process. Every adapter loaded for the same path holds the
//! same `Arc`. Failed loads are not cached, so a corrected artifact is picked
//! up on the next attempt.

use crate::errors::ArtifactLoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Loaded artifacts keyed by path.
pub(crate) struct ArtifactCache<T> {
    entries: OnceLock<Mutex<HashMap<PathBuf, Arc<T>>>>,
}

/// Outcome of [`ArtifactCache::get_or_load`].
pub(crate) struct Cached<T> {
    pub value: Arc<T>,
    /// False when this call performed the load.
    pub reused: bool,
}

impl<T> ArtifactCache<T> {
    pub const fn new() -> Self {
        Self {
            entries: OnceLock::new(),
        }
    }

    /// Returns the artifact cached for `path`, loading it on first use.
    ///
    /// The lock is held across `load`, so concurrent first callers for any
    /// path wait for one load instead of each performing their own.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<Cached<T>, ArtifactLoadError>
    where
        F: FnOnce(&Path) -> Result<T, ArtifactLoadError>,
    {
        let key = cache_key(path);
        let mut entries = self.lock();

        if let Some(value) = entries.get(&key) {
            return Ok(Cached {
                value: Arc::clone(value),
                reused: true,
            });
        }

        let value = Arc::new(load(path)?);
        entries.insert(key, Arc::clone(&value));
        Ok(Cached {
            value,
            reused: false,
        })
    }

    #[cfg(test)]
    pub fn get(&self, path: &Path) -> Option<Arc<T>> {
        self.lock().get(&cache_key(path)).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<T>>> {
        self.entries
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// Bare library names resolved by the system loader have no file to
// canonicalize and are keyed as given.
fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
