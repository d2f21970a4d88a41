/// Default fuel budget for one exported call (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel budget (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel budget (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Default location of the precompiled libinjection WASM artifact
pub const DEFAULT_WASM_ARTIFACT: &str = "wasm/libinjection.wasm";
/// Base name of the native library, expanded to the platform file name
pub const NATIVE_LIBRARY_NAME: &str = "injection";

/// Upper bound on instances held by one pool, whatever the policy
pub const MAX_POOL_SIZE: usize = 64;

/// Selects the backend: `wasm` / `embedded` or `native` / `ffi`
pub const ENV_BACKEND: &str = "LIBINJECTION_BACKEND";
/// Overrides `wasm.artifact_path`
pub const ENV_WASM_PATH: &str = "LIBINJECTION_WASM_PATH";
/// Overrides `native.library_path`
pub const ENV_NATIVE_LIB: &str = "LIBINJECTION_NATIVE_LIB";
/// Fixes the pool size (implies the `fixed` policy)
pub const ENV_POOL_SIZE: &str = "LIBINJECTION_POOL_SIZE";
/// YAML file loaded before the other overrides are applied
pub const ENV_CONFIG: &str = "LIBINJECTION_CONFIG";
