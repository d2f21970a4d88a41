// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::native::NativeAdapter;
use crate::backends::wasm::WasmAdapter;
use crate::config::{BackendKind, EngineConfig};
use crate::errors::ArtifactLoadError;
use crate::traits::BackendAdapter;
use std::sync::Arc;

/// Creates the backend adapter selected by configuration.
///
/// # Configuration
///
/// ```yaml
/// backend: embedded_interpreter   # or native_foreign_call
/// wasm:
///   artifact_path: "wasm/libinjection.wasm"
/// native:
///   library_path: "/usr/local/lib/libinjection.so"
/// ```
pub struct BackendFactory;

impl BackendFactory {
    /// Loads the artifact for `config.backend` and wraps it in an adapter.
    ///
    /// # Errors
    /// Any `ArtifactLoadError` from reading, validating or linking the artifact.
    pub fn create_adapter(config: &EngineConfig) -> Result<Arc<dyn BackendAdapter>, ArtifactLoadError> {
        match config.backend {
            BackendKind::EmbeddedInterpreter => Ok(Arc::new(WasmAdapter::load(&config.wasm)?)),
            BackendKind::NativeForeignCall => Ok(Arc::new(NativeAdapter::load(&config.native)?)),
        }
    }
}
