// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Backend capability contract
//!
//! Both bindings to libinjection implement the same two traits:
//! - `BackendAdapter` holds the once-loaded artifact and stamps out instances
//! - `ModuleInstance` is one exclusively-owned instantiation that can invoke
//!   the exported detection functions
//!
//! The engine only ever sees `Arc<dyn BackendAdapter>` and
//! `Box<dyn ModuleInstance>`, so the choice of binding is made once and
//! injected.

use crate::config::BackendKind;
use crate::errors::BackendResult;

/// Size of the fingerprint output buffer `libinjection_sqli` writes into.
///
/// At most five token characters followed by a NUL terminator.
pub const FINGERPRINT_BUFFER_LEN: usize = 8;

/// The detection functions an artifact must export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportedFunction {
    /// `int libinjection_sqli(const char* s, size_t slen, char fingerprint[])`
    Sqli,
    /// `int libinjection_xss(const char* s, size_t slen)`
    Xss,
}

impl ExportedFunction {
    /// Export / symbol name the function is resolved by.
    pub const fn symbol(self) -> &'static str {
        match self {
            ExportedFunction::Sqli => "libinjection_sqli",
            ExportedFunction::Xss => "libinjection_xss",
        }
    }

    /// Short label used in log messages.
    pub const fn label(self) -> &'static str {
        match self {
            ExportedFunction::Sqli => "sqli",
            ExportedFunction::Xss => "xss",
        }
    }
}

/// Undecoded outcome of one exported call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawVerdict {
    /// Return value of the exported function; non-zero means matched.
    pub code: i32,
    /// Contents of the fingerprint buffer after the call (SQLi only).
    pub fingerprint: Option<[u8; FINGERPRINT_BUFFER_LEN]>,
}

impl RawVerdict {
    pub fn flag(code: i32) -> Self {
        Self {
            code,
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(code: i32, fingerprint: [u8; FINGERPRINT_BUFFER_LEN]) -> Self {
        Self {
            code,
            fingerprint: Some(fingerprint),
        }
    }
}

/// A loaded artifact able to produce ready-to-call instances.
pub trait BackendAdapter: Send + Sync {
    /// Which binding this adapter implements.
    fn kind(&self) -> BackendKind;

    /// Human-readable artifact location for logs.
    fn artifact(&self) -> &str;

    /// Create a new instance with its exported functions resolved.
    ///
    /// Never touches an existing instance.
    fn instantiate(&self) -> BackendResult<Box<dyn ModuleInstance>>;
}

/// One instantiation of the artifact.
///
/// Not safe for concurrent calls; `&mut self` plus the instance pool make
/// sure only one caller holds it at a time.
pub trait ModuleInstance: Send {
    /// Invoke an exported detection function on `input`.
    fn invoke(&mut self, function: ExportedFunction, input: &[u8]) -> BackendResult<RawVerdict>;

    /// Scratch bytes currently allocated inside the instance by the host.
    fn outstanding_scratch_bytes(&self) -> usize {
        0
    }

    /// Whether a previous call left the instance unusable.
    fn is_poisoned(&self) -> bool {
        false
    }
}
