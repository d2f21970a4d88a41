// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::instance::{InstanceLimits, WasmInstance};
use super::module_loader::CompiledModule;
use crate::backends::cache::{ArtifactCache, Cached};
use crate::config::{BackendKind, WasmConfig};
use crate::errors::{ArtifactLoadError, BackendResult};
use crate::observability::messages::artifact::{ArtifactLoadFailed, ArtifactLoaded, ArtifactReused};
use crate::traits::{BackendAdapter, ModuleInstance};
use std::sync::Arc;

static MODULES: ArtifactCache<CompiledModule> = ArtifactCache::new();

/// Backend adapter for the embedded interpreter.
///
/// Holds the artifact compiled once per process; every `instantiate`
/// creates a fresh store and instance from it with the configured fuel and
/// memory limits. Limits belong to the adapter, so adapters sharing a
/// module may still differ in fuel and memory ceiling.
pub struct WasmAdapter {
    module: Arc<CompiledModule>,
    limits: InstanceLimits,
}

impl WasmAdapter {
    /// Loads and compiles the artifact named by `config`, or reuses the
    /// module already compiled for that path.
    pub fn load(config: &WasmConfig) -> Result<Self, ArtifactLoadError> {
        let backend = BackendKind::EmbeddedInterpreter.as_str();
        let artifact = config.artifact_path.display().to_string();

        match MODULES.get_or_load(&config.artifact_path, |path| CompiledModule::load(path)) {
            Ok(Cached { value, reused }) => {
                if reused {
                    tracing::debug!(
                        "{}",
                        ArtifactReused {
                            backend,
                            artifact: &artifact,
                        }
                    );
                } else {
                    tracing::info!(
                        "{}",
                        ArtifactLoaded {
                            backend,
                            artifact: &artifact,
                            detail: &format!("{} bytes", value.size_bytes()),
                        }
                    );
                }
                Ok(Self::from_shared(value, config))
            }
            Err(error) => {
                tracing::error!(
                    "{}",
                    ArtifactLoadFailed {
                        backend,
                        artifact: &artifact,
                        error: &error,
                    }
                );
                Err(error)
            }
        }
    }

    pub fn from_module(module: CompiledModule, config: &WasmConfig) -> Self {
        Self::from_shared(Arc::new(module), config)
    }

    pub fn from_shared(module: Arc<CompiledModule>, config: &WasmConfig) -> Self {
        Self {
            module,
            limits: InstanceLimits {
                fuel: config.fuel_level(),
                max_memory_bytes: config.max_memory_bytes,
            },
        }
    }

    pub fn limits(&self) -> InstanceLimits {
        self.limits
    }

    pub fn module(&self) -> &Arc<CompiledModule> {
        &self.module
    }
}

impl BackendAdapter for WasmAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::EmbeddedInterpreter
    }

    fn artifact(&self) -> &str {
        self.module.artifact()
    }

    fn instantiate(&self) -> BackendResult<Box<dyn ModuleInstance>> {
        let instance = WasmInstance::new(&self.module, self.limits)?;
        Ok(Box::new(instance))
    }
}
