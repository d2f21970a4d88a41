// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Memory bridge between caller space and callee address space
//!
//! Every detection call runs the same scoped sequence against its instance:
//!
//! ```text
//! allocate → write input → invoke export → read result → release
//! ```
//!
//! `ScratchScope` owns that sequence. Regions it allocates are released when
//! the scope finishes or, on any early return, when it is dropped. The
//! embedded backend drives it through `WasmMemoryBridge`; the native backend
//! shares the caller's address space and passes pointers straight through,
//! so it never allocates scratch at all.

mod scratch;

pub use scratch::ScratchScope;

use crate::traits::Address;
use std::collections::HashMap;

/// Host-side record of scratch regions currently live inside one instance.
///
/// Used to prove that a call released everything it allocated.
#[derive(Debug, Default)]
pub struct ScratchLedger {
    regions: HashMap<Address, usize>,
}

impl ScratchLedger {
    pub fn record(&mut self, address: Address, size: usize) {
        self.regions.insert(address, size);
    }

    pub fn forget(&mut self, address: Address) -> Option<usize> {
        self.regions.remove(&address)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.regions.contains_key(&address)
    }

    pub fn live_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn outstanding_bytes(&self) -> usize {
        self.regions.values().sum()
    }
}
