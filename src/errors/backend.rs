// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

/// The memory bridge could not satisfy an allocation or access request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The instance allocator returned null: linear memory could not grow.
    #[error("Out of memory: instance could not allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    /// An access reached past the end of the instance's current memory.
    #[error("Memory access out of bounds: address={address} len={len} memory_size={memory_size}")]
    OutOfBounds {
        address: u32,
        len: usize,
        memory_size: usize,
    },

    /// The requested size cannot be expressed in the 32-bit callee address space.
    #[error("Size {0} does not fit the instance address space")]
    SizeOverflow(usize),
}

/// Failure at the foreign-call boundary.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// An exported function trapped (including fuel exhaustion).
    #[error("Exported function '{function}' failed: {source}")]
    Trap {
        function: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Host-side runtime setup for a call failed.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A new module instance could not be created.
    #[error("Failed to instantiate module: {0}")]
    Instantiation(String),

    /// No instance was released within the caller's deadline.
    #[error("No instance became available within {0:?}")]
    PoolExhausted(Duration),

    /// The blocking task running an async detection call did not complete.
    #[error("Detection task failed: {0}")]
    Join(String),
}

impl BackendError {
    /// Whether the instance that produced this error must not serve another call.
    ///
    /// Traps and out-of-bounds pointers leave callee state unknown; running
    /// out of memory does not.
    pub fn poisons_instance(&self) -> bool {
        matches!(
            self,
            BackendError::Trap { .. } | BackendError::Bridge(BridgeError::OutOfBounds { .. })
        )
    }
}

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_does_not_poison() {
        let err = BackendError::from(BridgeError::OutOfMemory { requested: 16 });
        assert!(!err.poisons_instance());
        assert_eq!(
            err.to_string(),
            "Out of memory: instance could not allocate 16 bytes"
        );
    }

    #[test]
    fn traps_and_bad_pointers_poison() {
        let trap = BackendError::Trap {
            function: "libinjection_sqli",
            source: anyhow::anyhow!("wasm trap: unreachable"),
        };
        assert!(trap.poisons_instance());
        assert!(trap.to_string().contains("libinjection_sqli"));

        let oob = BackendError::from(BridgeError::OutOfBounds {
            address: 70_000,
            len: 8,
            memory_size: 65_536,
        });
        assert!(oob.poisons_instance());
    }

    #[test]
    fn pool_exhaustion_does_not_poison() {
        let err = BackendError::PoolExhausted(Duration::from_millis(5));
        assert!(!err.poisons_instance());
        assert!(err.to_string().contains("5ms"));
    }
}
