// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::BackendResult;

/// Offset inside a callee's 32-bit linear memory.
pub type Address = u32;

/// Byte traffic between caller space and one instance's address space.
///
/// Implementations are bound to a single instance for the duration of one
/// call. They are not used directly by call sites; `ScratchScope` wraps them
/// so every allocated region is released on every exit path.
pub trait MemoryBridge {
    /// Reserve `size` bytes inside the instance.
    ///
    /// Fails with `BridgeError::OutOfMemory` when the instance cannot grow.
    fn allocate(&mut self, size: usize) -> BackendResult<Address>;

    /// Copy `bytes` into the instance at `address`.
    ///
    /// Fails with `BridgeError::OutOfBounds` when `address + bytes.len()`
    /// exceeds the instance's current memory size.
    fn write(&mut self, address: Address, bytes: &[u8]) -> BackendResult<()>;

    /// Copy `length` bytes out of the instance, with the same bounds rule.
    fn read(&mut self, address: Address, length: usize) -> BackendResult<Vec<u8>>;

    /// Return a region obtained from `allocate` to the instance allocator.
    fn release(&mut self, address: Address) -> BackendResult<()>;
}
