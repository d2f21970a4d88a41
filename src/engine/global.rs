// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-wide engine built from the environment on first use.

use super::detection::DetectionEngine;
use super::result::DetectionResult;
use crate::config::EngineConfig;
use crate::errors::{ArtifactLoadError, ConfigError, DetectionError};
use std::sync::OnceLock;

static GLOBAL_ENGINE: OnceLock<Result<DetectionEngine, InitFailure>> = OnceLock::new();

/// Initialization outcome cached for every later caller.
#[derive(Debug, Clone)]
enum InitFailure {
    Config(ConfigError),
    Artifact(ArtifactLoadError),
}

impl InitFailure {
    fn to_error(&self) -> DetectionError {
        match self {
            InitFailure::Config(e) => DetectionError::Config(e.clone()),
            InitFailure::Artifact(e) => DetectionError::ArtifactLoad(e.clone()),
        }
    }
}

fn init_from_env() -> Result<DetectionEngine, InitFailure> {
    let config = EngineConfig::from_env().map_err(InitFailure::Config)?;
    DetectionEngine::build(&config).map_err(InitFailure::Artifact)
}

/// The shared engine, configured by `EngineConfig::from_env()`.
///
/// Built at most once, even under concurrent first use. A failed build is
/// remembered: every call returns the same error without retrying.
pub fn global() -> Result<&'static DetectionEngine, DetectionError> {
    GLOBAL_ENGINE
        .get_or_init(init_from_env)
        .as_ref()
        .map_err(InitFailure::to_error)
}

/// SQLi detection through the shared engine.
///
/// ```rust,no_run
/// let result = libinjection_bridge::detect_sqli("1' OR '1'='1")?;
/// assert!(result.matched);
/// # Ok::<(), libinjection_bridge::errors::DetectionError>(())
/// ```
pub fn detect_sqli(input: impl AsRef<[u8]>) -> Result<DetectionResult, DetectionError> {
    global()?.detect_sqli(input.as_ref())
}

/// XSS detection through the shared engine.
pub fn detect_xss(input: impl AsRef<[u8]>) -> Result<DetectionResult, DetectionError> {
    global()?.detect_xss(input.as_ref())
}
