// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One instantiated copy of the artifact
//!
//! Each `WasmInstance` owns its `Store`, so instances never share linear
//! memory and one instance serves one call at a time. A call:
//!
//! 1. refuels the store
//! 2. copies the input (and, for SQLi, a zeroed fingerprint buffer) into
//!    scratch regions allocated by the artifact's `malloc`
//! 3. invokes the detector export
//! 4. reads the fingerprint back and releases every scratch region
//!
//! An instance that trapped, hit a bad pointer or leaked scratch memory is
//! marked poisoned and must not serve further calls.

use super::bridge::{wasm_len, WasmMemoryBridge};
use super::module_loader::{CompiledModule, FREE_EXPORT, INITIALIZE_EXPORT, MALLOC_EXPORT, MEMORY_EXPORT};
use crate::bridge::{ScratchLedger, ScratchScope};
use crate::errors::{BackendError, BackendResult};
use crate::traits::{ExportedFunction, ModuleInstance, RawVerdict, FINGERPRINT_BUFFER_LEN};
use wasmtime::{Instance, Memory, Store, StoreLimits, StoreLimitsBuilder, TypedFunc};
use wasmtime_wasi::p1::WasiP1Ctx;
use wasmtime_wasi::WasiCtxBuilder;

/// Host state carried by each store.
pub struct InstanceState {
    pub(crate) wasi: WasiP1Ctx,
    pub(crate) limits: StoreLimits,
    pub(crate) scratch: ScratchLedger,
}

impl InstanceState {
    fn new(limits: StoreLimits) -> Self {
        Self {
            // No preopens, env, args or inherited stdio.
            wasi: WasiCtxBuilder::new().build_p1(),
            limits,
            scratch: ScratchLedger::default(),
        }
    }
}

/// Per-instance resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLimits {
    /// Fuel granted to each exported call.
    pub fuel: u64,
    /// Linear memory ceiling; `None` leaves growth to the module's own maximum.
    pub max_memory_bytes: Option<usize>,
}

/// Typed handles to the exports, resolved once at instantiation.
#[derive(Clone)]
pub struct InstanceExports {
    pub(crate) memory: Memory,
    pub(crate) malloc: TypedFunc<i32, i32>,
    pub(crate) free: TypedFunc<i32, ()>,
    sqli: TypedFunc<(i32, i32, i32), i32>,
    xss: TypedFunc<(i32, i32), i32>,
}

impl InstanceExports {
    fn resolve(store: &mut Store<InstanceState>, instance: &Instance) -> BackendResult<Self> {
        let memory = instance
            .get_memory(&mut *store, MEMORY_EXPORT)
            .ok_or_else(|| BackendError::Instantiation(format!("missing '{MEMORY_EXPORT}' export")))?;

        Ok(Self {
            memory,
            malloc: typed(store, instance, MALLOC_EXPORT)?,
            free: typed(store, instance, FREE_EXPORT)?,
            sqli: typed(store, instance, ExportedFunction::Sqli.symbol())?,
            xss: typed(store, instance, ExportedFunction::Xss.symbol())?,
        })
    }
}

fn typed<P, R>(
    store: &mut Store<InstanceState>,
    instance: &Instance,
    name: &str,
) -> BackendResult<TypedFunc<P, R>>
where
    P: wasmtime::WasmParams,
    R: wasmtime::WasmResults,
{
    instance
        .get_typed_func::<P, R>(&mut *store, name)
        .map_err(|e| BackendError::Instantiation(format!("export '{name}': {e:#}")))
}

pub struct WasmInstance {
    store: Store<InstanceState>,
    exports: InstanceExports,
    fuel: u64,
    poisoned: bool,
}

impl WasmInstance {
    pub fn new(module: &CompiledModule, limits: InstanceLimits) -> BackendResult<Self> {
        let store_limits = match limits.max_memory_bytes {
            Some(max) => StoreLimitsBuilder::new().memory_size(max).build(),
            None => StoreLimits::default(),
        };

        let mut store = Store::new(module.engine(), InstanceState::new(store_limits));
        store.limiter(|state| &mut state.limits);
        store
            .set_fuel(limits.fuel)
            .map_err(|e| BackendError::Runtime(format!("failed to set fuel: {e}")))?;

        let instance = module
            .pre()
            .instantiate(&mut store)
            .map_err(|e| BackendError::Instantiation(format!("{e:#}")))?;

        if module.has_initializer() {
            let initialize = typed::<(), ()>(&mut store, &instance, INITIALIZE_EXPORT)?;
            initialize
                .call(&mut store, ())
                .map_err(|source| BackendError::Trap {
                    function: INITIALIZE_EXPORT,
                    source,
                })?;
        }

        let exports = InstanceExports::resolve(&mut store, &instance)?;

        Ok(Self {
            store,
            exports,
            fuel: limits.fuel,
            poisoned: false,
        })
    }
}

impl ModuleInstance for WasmInstance {
    fn invoke(&mut self, function: ExportedFunction, input: &[u8]) -> BackendResult<RawVerdict> {
        if self.poisoned {
            return Err(BackendError::Runtime(
                "instance is poisoned and cannot serve calls".to_string(),
            ));
        }

        self.store
            .set_fuel(self.fuel)
            .map_err(|e| BackendError::Runtime(format!("failed to refuel store: {e}")))?;

        let exports = self.exports.clone();
        let result = {
            let mut bridge = WasmMemoryBridge::new(&mut self.store, &exports);
            let mut scope = ScratchScope::new(&mut bridge);
            match call_detector(&mut scope, &exports, function, input) {
                Ok(verdict) => scope.finish().map(|()| verdict),
                Err(e) => Err(e),
            }
        };

        if let Err(e) = &result {
            if e.poisons_instance() {
                self.poisoned = true;
            }
        }
        if self.store.data().scratch.live_regions() > 0 {
            self.poisoned = true;
        }

        result
    }

    fn outstanding_scratch_bytes(&self) -> usize {
        self.store.data().scratch.outstanding_bytes()
    }

    fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

fn call_detector(
    scope: &mut ScratchScope<'_, WasmMemoryBridge<'_>>,
    exports: &InstanceExports,
    function: ExportedFunction,
    input: &[u8],
) -> BackendResult<RawVerdict> {
    let len = wasm_len(input.len())?;
    let input_ptr = scope.alloc_bytes(input)? as i32;
    let trap = |source: anyhow::Error| BackendError::Trap {
        function: function.symbol(),
        source,
    };

    match function {
        ExportedFunction::Sqli => {
            let fingerprint_ptr = scope.alloc_bytes(&[0u8; FINGERPRINT_BUFFER_LEN])?;
            let code = exports
                .sqli
                .call(scope.bridge().store(), (input_ptr, len, fingerprint_ptr as i32))
                .map_err(trap)?;

            let bytes = scope.read(fingerprint_ptr, FINGERPRINT_BUFFER_LEN)?;
            let mut fingerprint = [0u8; FINGERPRINT_BUFFER_LEN];
            fingerprint.copy_from_slice(&bytes);
            Ok(RawVerdict::with_fingerprint(code, fingerprint))
        }
        ExportedFunction::Xss => {
            let code = exports
                .xss
                .call(scope.bridge().store(), (input_ptr, len))
                .map_err(trap)?;
            Ok(RawVerdict::flag(code))
        }
    }
}
