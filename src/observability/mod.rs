// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log lines are built from message structs implementing `Display` and
//! emitted through `tracing` macros, so wording lives in one place:
//!
//! * `messages::artifact` - artifact loading and engine construction
//! * `messages::pool` - instance lifecycle inside the pool
//! * `messages::detection` - per-call outcomes and scratch cleanup
//!
//! # Usage
//!
//! ```rust
//! use libinjection_bridge::observability::messages::pool::InstanceCreated;
//!
//! let msg = InstanceCreated {
//!     backend: "embedded_interpreter",
//!     instantiated: 2,
//!     capacity: 4,
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// For applications and tests that do not set up their own subscriber.
/// Calling it more than once, or after another subscriber was installed, is
/// harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
