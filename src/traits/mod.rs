// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backend;
pub mod bridge;

pub use backend::{BackendAdapter, ExportedFunction, ModuleInstance, RawVerdict, FINGERPRINT_BUFFER_LEN};
pub use bridge::{Address, MemoryBridge};
