// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for detection calls.

use std::fmt::{Display, Formatter};

/// Detection call completed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use libinjection_bridge::observability::messages::detection::DetectionCompleted;
///
/// let msg = DetectionCompleted {
///     backend: "native_foreign_call",
///     function: "sqli",
///     input_size: 12,
///     matched: true,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "sqli detection via native_foreign_call: input_size=12 matched=true"
/// );
/// ```
pub struct DetectionCompleted<'a> {
    pub backend: &'a str,
    pub function: &'a str,
    pub input_size: usize,
    pub matched: bool,
}

impl Display for DetectionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} detection via {}: input_size={} matched={}",
            self.function, self.backend, self.input_size, self.matched
        )
    }
}

/// Detection call failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DetectionFailed<'a> {
    pub backend: &'a str,
    pub function: &'a str,
    pub input_size: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for DetectionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} detection via {} failed: input_size={} error={}",
            self.function, self.backend, self.input_size, self.error
        )
    }
}

/// A scratch region could not be released while unwinding a call.
///
/// # Log Level
/// `warn!` - Recoverable issue
pub struct ScratchReleaseFailed<'a> {
    pub address: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for ScratchReleaseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to release scratch region at {:#x}: {}",
            self.address, self.error
        )
    }
}
