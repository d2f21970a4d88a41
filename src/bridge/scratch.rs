// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::BackendResult;
use crate::observability::messages::detection::ScratchReleaseFailed;
use crate::traits::{Address, MemoryBridge};

/// Call-scoped set of scratch regions inside one instance.
///
/// Regions are released in reverse allocation order by `finish`, which
/// reports the first release failure, or by `Drop` on early exit, which can
/// only log it.
pub struct ScratchScope<'b, B: MemoryBridge> {
    bridge: &'b mut B,
    regions: Vec<Address>,
}

impl<'b, B: MemoryBridge> ScratchScope<'b, B> {
    pub fn new(bridge: &'b mut B) -> Self {
        Self {
            bridge,
            regions: Vec::new(),
        }
    }

    /// Allocate `size` bytes; zero-sized requests reserve one byte.
    pub fn alloc(&mut self, size: usize) -> BackendResult<Address> {
        let address = self.bridge.allocate(size.max(1))?;
        self.regions.push(address);
        Ok(address)
    }

    /// Allocate a region holding a copy of `bytes`.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> BackendResult<Address> {
        let address = self.alloc(bytes.len())?;
        // Already tracked: a failed write still releases the region.
        self.bridge.write(address, bytes)?;
        Ok(address)
    }

    pub fn read(&mut self, address: Address, length: usize) -> BackendResult<Vec<u8>> {
        self.bridge.read(address, length)
    }

    /// The underlying bridge, for invoking exports between bridge operations.
    pub fn bridge(&mut self) -> &mut B {
        &mut *self.bridge
    }

    pub fn live_regions(&self) -> usize {
        self.regions.len()
    }

    /// Release every region, surfacing the first failure.
    pub fn finish(mut self) -> BackendResult<()> {
        self.release_all()
    }

    fn release_all(&mut self) -> BackendResult<()> {
        let mut first_error = None;
        while let Some(address) = self.regions.pop() {
            if let Err(e) = self.bridge.release(address) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<B: MemoryBridge> Drop for ScratchScope<'_, B> {
    fn drop(&mut self) {
        while let Some(address) = self.regions.pop() {
            if let Err(error) = self.bridge.release(address) {
                tracing::warn!(
                    "{}",
                    ScratchReleaseFailed {
                        address,
                        error: &error,
                    }
                );
            }
        }
    }
}
