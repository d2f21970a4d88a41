// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM engine configuration and host capabilities
//!
//! Creates the single wasmtime `Engine` an artifact is compiled with, and the
//! `Linker` that satisfies its imports. libinjection artifacts built with
//! wasi-sdk import a handful of WASI preview 1 functions; they get a WASI
//! context with no preopened directories, no environment and no inherited
//! stdio.

use super::detector::ArtifactProfile;
use super::instance::InstanceState;
use crate::errors::ArtifactLoadError;
use wasmtime::{Config, Engine, Linker};

/// Creates the wasmtime engine for libinjection artifacts.
///
/// - `consume_fuel(true)` - every exported call runs on a fuel budget
/// - `epoch_interruption(false)` - fuel is the only interruption mechanism
/// - threads, relaxed SIMD, multi-memory, memory64 and the component model
///   are disabled
pub fn create_engine() -> Result<Engine, ArtifactLoadError> {
    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| ArtifactLoadError::Engine(e.to_string()))
}

/// Builds the linker for an artifact, adding WASI preview 1 only when the
/// artifact imports it.
pub fn create_linker(
    engine: &Engine,
    profile: &ArtifactProfile,
) -> Result<Linker<InstanceState>, ArtifactLoadError> {
    let mut linker = Linker::new(engine);

    if profile.imports_wasi() {
        tracing::debug!("Linking WASI preview 1 for libinjection artifact");
        wasmtime_wasi::p1::add_to_linker_sync(&mut linker, |state: &mut InstanceState| {
            &mut state.wasi
        })
        .map_err(|e| ArtifactLoadError::Link(e.to_string()))?;
    }

    Ok(linker)
}
