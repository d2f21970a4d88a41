// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::result::DetectionResult;
use crate::backends::BackendFactory;
use crate::config::{BackendKind, EngineConfig, PoolConfig};
use crate::errors::{render_chain, ArtifactLoadError, BackendError, BackendResult, DetectionError};
use crate::observability::messages::artifact::EngineCreated;
use crate::observability::messages::detection::{DetectionCompleted, DetectionFailed};
use crate::pool::{InstancePool, PoolStats};
use crate::traits::{BackendAdapter, ExportedFunction, RawVerdict};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// SQL-injection and XSS detection over one backend.
///
/// Cloning is cheap; clones share the instance pool. The backend is fixed
/// when the engine is built and never re-evaluated per call.
///
/// # Example
/// ```rust,no_run
/// use libinjection_bridge::config::EngineConfig;
/// use libinjection_bridge::engine::DetectionEngine;
///
/// let engine = DetectionEngine::from_config(&EngineConfig::from_env()?)?;
/// let result = engine.detect_sqli(b"1' OR '1'='1")?;
/// if result.matched {
///     println!("sqli: {}", result.fingerprint_str().unwrap_or("?"));
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct DetectionEngine {
    pool: Arc<InstancePool>,
}

impl DetectionEngine {
    /// Validates `config`, loads the selected artifact and creates the pool.
    pub fn from_config(config: &EngineConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        Ok(Self::build(config)?)
    }

    pub(crate) fn build(config: &EngineConfig) -> Result<Self, ArtifactLoadError> {
        let adapter = BackendFactory::create_adapter(config)?;
        Self::with_adapter(adapter, &config.pool)
    }

    /// Builds an engine around an already loaded adapter.
    ///
    /// The first instance is created here, so an artifact that cannot be
    /// instantiated fails now rather than on the first call.
    pub fn with_adapter(
        adapter: Arc<dyn BackendAdapter>,
        pool: &PoolConfig,
    ) -> Result<Self, ArtifactLoadError> {
        let capacity = pool.capacity();
        let backend = adapter.kind();
        let artifact = adapter.artifact().to_string();

        let pool = InstancePool::new(adapter, capacity)
            .map_err(|e| ArtifactLoadError::Instantiation(render_chain(&e)))?;

        tracing::info!(
            "{}",
            EngineCreated {
                backend: backend.as_str(),
                artifact: &artifact,
                capacity,
            }
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn backend(&self) -> BackendKind {
        self.pool.backend()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Runs the SQLi detector. Empty input is benign and never reaches the
    /// backend.
    pub fn detect_sqli(&self, input: &[u8]) -> Result<DetectionResult, DetectionError> {
        self.detect(ExportedFunction::Sqli, input, None)
    }

    /// Runs the XSS detector. Results never carry a fingerprint.
    pub fn detect_xss(&self, input: &[u8]) -> Result<DetectionResult, DetectionError> {
        self.detect(ExportedFunction::Xss, input, None)
    }

    /// [`detect_sqli`](Self::detect_sqli), giving up with `PoolExhausted` if
    /// no instance frees up within `timeout`. The call itself is not bounded.
    pub fn detect_sqli_timeout(
        &self,
        input: &[u8],
        timeout: Duration,
    ) -> Result<DetectionResult, DetectionError> {
        self.detect(ExportedFunction::Sqli, input, Some(timeout))
    }

    pub fn detect_xss_timeout(
        &self,
        input: &[u8],
        timeout: Duration,
    ) -> Result<DetectionResult, DetectionError> {
        self.detect(ExportedFunction::Xss, input, Some(timeout))
    }

    /// Runs the SQLi detector on tokio's blocking pool.
    pub async fn detect_sqli_async(
        &self,
        input: impl Into<Vec<u8>>,
    ) -> Result<DetectionResult, DetectionError> {
        self.detect_blocking(ExportedFunction::Sqli, input.into()).await
    }

    pub async fn detect_xss_async(
        &self,
        input: impl Into<Vec<u8>>,
    ) -> Result<DetectionResult, DetectionError> {
        self.detect_blocking(ExportedFunction::Xss, input.into()).await
    }

    async fn detect_blocking(
        &self,
        function: ExportedFunction,
        input: Vec<u8>,
    ) -> Result<DetectionResult, DetectionError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.detect(function, &input, None))
            .await
            .map_err(|e| DetectionError::backend(self.backend(), BackendError::Join(e.to_string())))?
    }

    fn detect(
        &self,
        function: ExportedFunction,
        input: &[u8],
        timeout: Option<Duration>,
    ) -> Result<DetectionResult, DetectionError> {
        if input.is_empty() {
            return Ok(DetectionResult::benign());
        }

        let backend = self.backend();
        match self.invoke(function, input, timeout) {
            Ok(verdict) => {
                let result = DetectionResult::from(verdict);
                tracing::debug!(
                    "{}",
                    DetectionCompleted {
                        backend: backend.as_str(),
                        function: function.label(),
                        input_size: input.len(),
                        matched: result.matched,
                    }
                );
                Ok(result)
            }
            Err(error) => {
                tracing::error!(
                    "{}",
                    DetectionFailed {
                        backend: backend.as_str(),
                        function: function.label(),
                        input_size: input.len(),
                        error: &error,
                    }
                );
                Err(DetectionError::backend(backend, error))
            }
        }
    }

    fn invoke(
        &self,
        function: ExportedFunction,
        input: &[u8],
        timeout: Option<Duration>,
    ) -> BackendResult<RawVerdict> {
        let mut instance = match timeout {
            Some(timeout) => self.pool.acquire_timeout(timeout)?,
            None => self.pool.acquire()?,
        };
        instance.invoke(function, input)
    }
}

impl fmt::Debug for DetectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionEngine")
            .field("backend", &self.backend())
            .field("capacity", &self.pool.capacity())
            .finish()
    }
}
