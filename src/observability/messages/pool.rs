// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for instance pool events.

use std::fmt::{Display, Formatter};

/// A new module instance joined the pool.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct InstanceCreated<'a> {
    pub backend: &'a str,
    pub instantiated: usize,
    pub capacity: usize,
}

impl Display for InstanceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Instantiated {} module ({}/{} instances)",
            self.backend, self.instantiated, self.capacity
        )
    }
}

/// A poisoned instance was dropped instead of returning to the pool.
///
/// # Log Level
/// `warn!` - Recoverable issue
pub struct InstanceDiscarded<'a> {
    pub backend: &'a str,
    pub replaced_total: u64,
}

impl Display for InstanceDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarded poisoned {} instance; it will be re-instantiated on demand (replaced so far: {})",
            self.backend, self.replaced_total
        )
    }
}

/// Growing the pool failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct InstanceCreationFailed<'a> {
    pub backend: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InstanceCreationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to instantiate {} module: {}",
            self.backend, self.error
        )
    }
}
