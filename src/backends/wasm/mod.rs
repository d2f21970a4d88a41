// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Embedded interpreter backend
//!
//! Runs a precompiled libinjection WASM artifact under wasmtime.
//!
//! - `loader` reads the artifact and enforces the size limit
//! - `detector` rejects components and profiles imports
//! - `capability_manager` builds the engine and the WASI preview 1 linker
//! - `module_loader` compiles once and validates the export contract
//! - `instance` owns a store per instance and drives one call at a time
//! - `bridge` moves bytes across the linear-memory boundary

pub mod adapter;
pub mod bridge;
pub mod capability_manager;
pub mod detector;
pub mod instance;
pub mod loader;
pub mod module_loader;

pub use adapter::WasmAdapter;
pub use bridge::WasmMemoryBridge;
pub use instance::{InstanceLimits, InstanceState, WasmInstance};
pub use module_loader::CompiledModule;
