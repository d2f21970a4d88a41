// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `artifact` - artifact loading, validation and engine construction
//! * `pool` - instance creation, replacement and failures
//! * `detection` - detection call outcomes and scratch release

pub mod artifact;
pub mod detection;
pub mod pool;
