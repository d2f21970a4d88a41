// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Error message for Component Model binaries handed to the core-module loader.
pub const ARTIFACT_UNSUPPORTED_ENCODING: &str = "Component Model binaries are not supported: \
the libinjection artifact must be a core WASM module exporting malloc, free, \
libinjection_sqli and libinjection_xss.";

/// The compiled artifact could not be loaded for the selected backend.
///
/// Raised only while an engine is being built. Once an engine exists its
/// artifact is known to satisfy the exported-function contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLoadError {
    /// The artifact file does not exist or cannot be read.
    #[error("Artifact not found at '{path}': {reason}")]
    Missing { path: String, reason: String },

    /// The artifact exceeds the maximum accepted size.
    #[error("Artifact '{path}' too large: {size} bytes (max: {max} bytes)")]
    TooLarge {
        path: String,
        size: usize,
        max: usize,
    },

    /// The artifact is not a well-formed WASM binary.
    #[error("Corrupt artifact '{path}': {reason}")]
    Corrupt { path: String, reason: String },

    /// The artifact is valid WASM of a kind this loader does not accept.
    #[error("Unsupported artifact encoding: {0}")]
    UnsupportedEncoding(String),

    /// A required export is absent.
    #[error("Artifact does not export '{name}'")]
    MissingExport { name: String },

    /// A required export exists with the wrong kind or signature.
    #[error("Export '{name}' has signature {found}, expected {expected}")]
    SignatureMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// The wasmtime engine could not be configured.
    #[error("Engine creation error: {0}")]
    Engine(String),

    /// The artifact imports something the host does not provide.
    #[error("Failed to link artifact imports: {0}")]
    Link(String),

    /// The first instance of the artifact could not be created.
    #[error("Failed to instantiate artifact: {0}")]
    Instantiation(String),

    /// The native library could not be opened.
    #[error("Failed to load native library '{path}': {reason}")]
    Library { path: String, reason: String },

    /// The native library lacks a required symbol.
    #[error("Native library '{path}' does not export '{symbol}': {reason}")]
    MissingSymbol {
        path: String,
        symbol: String,
        reason: String,
    },
}
