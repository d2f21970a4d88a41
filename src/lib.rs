// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! SQL-injection and XSS detection through libinjection.
//!
//! Two interchangeable backends run the same detectors: a precompiled WASM
//! artifact embedded with wasmtime, or libinjection built for the host and
//! called through its C ABI. Either way callers get the same
//! [`DetectionResult`].
//!
//! ```rust,no_run
//! let result = libinjection_bridge::detect_sqli(b"1' OR '1'='1")?;
//! if result.matched {
//!     println!("fingerprint: {}", result.fingerprint_str().unwrap_or_default());
//! }
//! # Ok::<(), libinjection_bridge::errors::DetectionError>(())
//! ```

pub mod backends;      // embedded interpreter and native foreign-call adapters
pub mod bridge;        // scratch regions across the foreign memory boundary
pub mod config;        // YAML + environment configuration
pub mod engine;        // detection façade and process-wide engine
pub mod errors;        // error handling
pub mod observability;
pub mod pool;          // bounded instance pool
pub mod traits;        // backend and memory bridge abstractions

pub use config::{BackendKind, EngineConfig};
pub use engine::{detect_sqli, detect_xss, DetectionEngine, DetectionResult, Fingerprint};
pub use errors::DetectionError;
