// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{ArtifactLoadError, BackendError, ConfigError};
use crate::config::BackendKind;
use std::error::Error as _;
use thiserror::Error;

/// Error returned by the public detection API.
///
/// A call either completes with a typed result or fails with one of these;
/// there is no best-effort `matched = false` in place of a failure.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// The engine configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The artifact for the selected backend could not be loaded.
    #[error("Artifact load error: {0}")]
    ArtifactLoad(#[from] ArtifactLoadError),

    /// A call failed at the foreign boundary; `source` holds the cause.
    #[error("{backend} backend failure: {source}")]
    BackendFailure {
        backend: BackendKind,
        #[source]
        source: BackendError,
    },
}

impl DetectionError {
    pub(crate) fn backend(backend: BackendKind, source: BackendError) -> Self {
        DetectionError::BackendFailure { backend, source }
    }

    /// The backend-level cause, if this is a per-call failure.
    pub fn backend_cause(&self) -> Option<&BackendError> {
        match self {
            DetectionError::BackendFailure { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Full cause chain on one line, for diagnostics.
    pub fn chain(&self) -> String {
        render_chain(self)
    }
}

/// `error` followed by each source not already present in the text.
pub(crate) fn render_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut cause = error.source();
    while let Some(err) = cause {
        let text = err.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        cause = err.source();
    }
    out
}
