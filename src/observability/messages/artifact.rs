// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for artifact loading and engine construction.

use std::fmt::{Display, Formatter};

/// Artifact loaded and validated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use libinjection_bridge::observability::messages::artifact::ArtifactLoaded;
///
/// let msg = ArtifactLoaded {
///     backend: "embedded_interpreter",
///     artifact: "wasm/libinjection.wasm",
///     detail: "182304 bytes",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ArtifactLoaded<'a> {
    pub backend: &'a str,
    pub artifact: &'a str,
    pub detail: &'a str,
}

impl Display for ArtifactLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded {} artifact: {} ({})",
            self.backend, self.artifact, self.detail
        )
    }
}

/// Artifact already loaded by this process; the cached copy is shared.
///
/// # Log Level
/// `debug!` - Repeated, low-value event
pub struct ArtifactReused<'a> {
    pub backend: &'a str,
    pub artifact: &'a str,
}

impl Display for ArtifactReused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reusing loaded {} artifact: {}",
            self.backend, self.artifact
        )
    }
}

/// Artifact loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ArtifactLoadFailed<'a> {
    pub backend: &'a str,
    pub artifact: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ArtifactLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load {} artifact '{}': {}",
            self.backend, self.artifact, self.error
        )
    }
}

/// Detection engine ready for calls.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EngineCreated<'a> {
    pub backend: &'a str,
    pub artifact: &'a str,
    pub capacity: usize,
}

impl Display for EngineCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created detection engine: backend={} artifact={} pool_capacity={}",
            self.backend, self.artifact, self.capacity
        )
    }
}
