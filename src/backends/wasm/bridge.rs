// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::instance::{InstanceExports, InstanceState};
use crate::errors::{BackendError, BackendResult, BridgeError};
use crate::observability::messages::detection::ScratchReleaseFailed;
use crate::traits::{Address, MemoryBridge};
use wasmtime::{Memory, Store, TypedFunc};

/// Memory bridge over one instance's linear memory, allocating through the
/// artifact's own `malloc`/`free`.
///
/// Every address handed out is recorded in the store's scratch ledger until
/// it is released, so leaked regions are visible after the call.
pub struct WasmMemoryBridge<'s> {
    store: &'s mut Store<InstanceState>,
    memory: Memory,
    malloc: TypedFunc<i32, i32>,
    free: TypedFunc<i32, ()>,
}

impl<'s> WasmMemoryBridge<'s> {
    pub fn new(store: &'s mut Store<InstanceState>, exports: &InstanceExports) -> Self {
        Self {
            store,
            memory: exports.memory,
            malloc: exports.malloc.clone(),
            free: exports.free.clone(),
        }
    }

    /// The store, for calling exports between bridge operations.
    pub fn store(&mut self) -> &mut Store<InstanceState> {
        &mut *self.store
    }

    fn memory_size(&self) -> usize {
        self.memory.data_size(&*self.store)
    }

    fn out_of_bounds(&self, address: Address, len: usize) -> BackendError {
        BridgeError::OutOfBounds {
            address,
            len,
            memory_size: self.memory_size(),
        }
        .into()
    }
}

impl MemoryBridge for WasmMemoryBridge<'_> {
    fn allocate(&mut self, size: usize) -> BackendResult<Address> {
        let requested = i32::try_from(size).map_err(|_| BridgeError::SizeOverflow(size))?;
        let pointer = self
            .malloc
            .call(&mut *self.store, requested)
            .map_err(|source| BackendError::Trap {
                function: "malloc",
                source,
            })?;

        if pointer == 0 {
            return Err(BridgeError::OutOfMemory { requested: size }.into());
        }

        let address = pointer as u32;
        if (address as usize).saturating_add(size) > self.memory_size() {
            let error = self.out_of_bounds(address, size);
            // Never recorded, so no scope will release it.
            if let Err(source) = self.free.call(&mut *self.store, pointer) {
                tracing::warn!(
                    "{}",
                    ScratchReleaseFailed {
                        address,
                        error: &BackendError::Trap {
                            function: "free",
                            source,
                        },
                    }
                );
            }
            return Err(error);
        }

        self.store.data_mut().scratch.record(address, size);
        Ok(address)
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> BackendResult<()> {
        if self
            .memory
            .write(&mut *self.store, address as usize, bytes)
            .is_err()
        {
            return Err(self.out_of_bounds(address, bytes.len()));
        }
        Ok(())
    }

    fn read(&mut self, address: Address, length: usize) -> BackendResult<Vec<u8>> {
        let mut buffer = vec![0u8; length];
        if self
            .memory
            .read(&*self.store, address as usize, &mut buffer)
            .is_err()
        {
            return Err(self.out_of_bounds(address, length));
        }
        Ok(buffer)
    }

    fn release(&mut self, address: Address) -> BackendResult<()> {
        self.free
            .call(&mut *self.store, address as i32)
            .map_err(|source| BackendError::Trap {
                function: "free",
                source,
            })?;
        self.store.data_mut().scratch.forget(address);
        Ok(())
    }
}

/// Converts an input length to the `i32` the exports take.
pub(crate) fn wasm_len(len: usize) -> BackendResult<i32> {
    i32::try_from(len).map_err(|_| BridgeError::SizeOverflow(len).into())
}

