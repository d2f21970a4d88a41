// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Detection engine façade
//!
//! `DetectionEngine` ties a backend adapter to an instance pool and turns
//! raw verdicts into [`DetectionResult`]s. [`global`] provides a
//! process-wide engine configured from the environment.

mod detection;
mod global;
mod result;

pub use detection::DetectionEngine;
pub use global::{detect_sqli, detect_xss, global};
pub use result::{DetectionResult, Fingerprint};
