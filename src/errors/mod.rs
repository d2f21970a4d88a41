// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for the binding layer.
//!
//! * `ConfigError` - invalid configuration, raised before any artifact is touched
//! * `ArtifactLoadError` - the compiled artifact is missing or incompatible; fatal
//!   for the selected backend
//! * `BridgeError` - a scratch allocation or memory access could not be satisfied
//! * `BackendError` - any failure at the foreign-call boundary, bridge errors included
//! * `DetectionError` - what the public API returns

mod artifact;
mod backend;
mod config;
mod detection;

pub use artifact::{ArtifactLoadError, ARTIFACT_UNSUPPORTED_ENCODING};
pub use backend::{BackendError, BackendResult, BridgeError};
pub use config::ConfigError;
pub use detection::DetectionError;
pub(crate) use detection::render_chain;
