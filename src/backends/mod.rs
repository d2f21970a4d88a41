// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution backends for libinjection.
//!
//! Both backends implement `BackendAdapter` and produce `ModuleInstance`s
//! that the instance pool hands out one caller at a time.
//!
//! # Available Backends
//!
//! ## Embedded Interpreter (`wasm`)
//! A precompiled libinjection WASM artifact run under wasmtime:
//! - **Isolation**: each instance owns its store and linear memory
//! - **Limits**: per-call fuel budget and optional memory ceiling
//! - **Memory Bridge**: inputs are copied into scratch regions allocated by
//!   the artifact's own `malloc`
//!
//! ## Native Foreign Call (`native`)
//! libinjection built for the host, loaded with libloading:
//! - **Zero copy**: input passed by pointer and length
//! - **Stateless**: instances share one loaded library
//!
//! ## Stub Backend (Test-Only)
//! A WAT artifact, C-ABI stub functions and an in-process adapter sharing
//! one toy detection rule. Not available in production builds.
//!
//! # Architecture
//!
//! ```text
//! EngineConfig → BackendFactory → BackendAdapter → InstancePool → ModuleInstance
//! ```
//!
//! Loaded artifacts are cached per path for the whole process: adapters
//! built from the same path share one compiled module or one loaded
//! library.

mod cache;
pub mod factory;
pub mod native;
#[cfg(test)]
pub mod stub;
pub mod wasm;

pub use factory::BackendFactory;
