// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_FUEL_LEVEL, DEFAULT_WASM_ARTIFACT, ENV_BACKEND, ENV_CONFIG, ENV_NATIVE_LIB,
    ENV_POOL_SIZE, ENV_WASM_PATH, MAX_FUEL_LEVEL, MAX_POOL_SIZE, MIN_FUEL_LEVEL,
    NATIVE_LIBRARY_NAME,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration for a detection engine.
///
/// Every section is optional; an empty document yields the embedded backend
/// with the default artifact location and a per-core instance pool.
///
/// # Example
/// ```yaml
/// backend: embedded_interpreter
/// wasm:
///   artifact_path: wasm/libinjection.wasm
///   fuel: 100000000
///   max_memory_bytes: 16777216
/// native:
///   library_path: /usr/local/lib/libinjection.so
/// pool:
///   policy: fixed
///   size: 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub wasm: WasmConfig,
    #[serde(default)]
    pub native: NativeConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Which binding carries calls into libinjection.
///
/// Fixed for the lifetime of an engine; never re-evaluated per call.
///
/// # Variants
/// * `EmbeddedInterpreter` - precompiled WASM artifact executed by wasmtime
/// * `NativeForeignCall` - locally built shared library called through FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum BackendKind {
    EmbeddedInterpreter,
    NativeForeignCall,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "native-default") {
            BackendKind::NativeForeignCall
        } else {
            BackendKind::EmbeddedInterpreter
        }
    }
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::EmbeddedInterpreter => "embedded_interpreter",
            BackendKind::NativeForeignCall => "native_foreign_call",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "wasm" | "embedded" | "embedded_interpreter" => Ok(BackendKind::EmbeddedInterpreter),
            "native" | "ffi" | "native_foreign_call" => Ok(BackendKind::NativeForeignCall),
            other => Err(ConfigError::InvalidValue {
                key: ENV_BACKEND.to_string(),
                value: other.to_string(),
                reason: "expected one of: wasm, embedded, native, ffi".to_string(),
            }),
        }
    }
}

/// YAML `backend:` accepts the same spellings as `LIBINJECTION_BACKEND`.
impl TryFrom<String> for BackendKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Embedded backend options.
///
/// # Fields
/// * `artifact_path` - Location of the libinjection WASM artifact
/// * `fuel` - Per-call instruction budget (defaults to 100M, clamped to [1M, 500M])
/// * `max_memory_bytes` - Cap on each instance's linear memory (unbounded if absent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasmConfig {
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    pub fuel: Option<u64>,
    pub max_memory_bytes: Option<usize>,
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_WASM_ARTIFACT)
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            fuel: None,
            max_memory_bytes: None,
        }
    }
}

impl WasmConfig {
    /// Fuel granted to each exported call, clamped to the security bounds.
    ///
    /// ```
    /// use libinjection_bridge::config::WasmConfig;
    ///
    /// let config = WasmConfig { fuel: Some(1_000_000_000), ..WasmConfig::default() };
    /// assert_eq!(config.fuel_level(), 500_000_000);
    /// ```
    pub fn fuel_level(&self) -> u64 {
        self.fuel
            .unwrap_or(DEFAULT_FUEL_LEVEL)
            .clamp(MIN_FUEL_LEVEL, MAX_FUEL_LEVEL)
    }
}

/// Native backend options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeConfig {
    pub library_path: Option<PathBuf>,
}

impl NativeConfig {
    /// Configured library path, or the platform file name for `injection`
    /// (`libinjection.so`, `libinjection.dylib`, `injection.dll`) resolved by
    /// the system loader's search path.
    pub fn library_path(&self) -> PathBuf {
        self.library_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(libloading::library_filename(NATIVE_LIBRARY_NAME)))
    }
}

/// How many module instances an engine keeps.
///
/// # Variants
/// * `Shared` - a single instance, calls serialize on it
/// * `Fixed` - exactly `pool.size` instances
/// * `PerCore` - one instance per available core, capped at `MAX_POOL_SIZE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    Shared,
    Fixed,
    #[default]
    PerCore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub policy: PoolPolicy,
    pub size: Option<usize>,
}

impl PoolConfig {
    pub fn shared() -> Self {
        Self {
            policy: PoolPolicy::Shared,
            size: None,
        }
    }

    pub fn fixed(size: usize) -> Self {
        Self {
            policy: PoolPolicy::Fixed,
            size: Some(size),
        }
    }

    /// Number of instances the pool may hold.
    pub fn capacity(&self) -> usize {
        match self.policy {
            PoolPolicy::Shared => 1,
            PoolPolicy::Fixed => self.size.unwrap_or(1).clamp(1, MAX_POOL_SIZE),
            PoolPolicy::PerCore => default_concurrency().min(MAX_POOL_SIZE),
        }
    }
}

/// Number of available CPU cores, falling back to 4 if detection fails.
fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl EngineConfig {
    /// Configuration from the process environment.
    ///
    /// Starts from the YAML file named by `LIBINJECTION_CONFIG` (or the
    /// defaults), then applies `LIBINJECTION_BACKEND`,
    /// `LIBINJECTION_WASM_PATH`, `LIBINJECTION_NATIVE_LIB` and
    /// `LIBINJECTION_POOL_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var_os(ENV_CONFIG) {
            Some(path) => load_config(path)?,
            None => EngineConfig::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, then validates the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(ENV_BACKEND).filter(|v| !v.trim().is_empty()) {
            self.backend = backend.parse()?;
        }
        if let Some(path) = lookup(ENV_WASM_PATH).filter(|v| !v.trim().is_empty()) {
            self.wasm.artifact_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_NATIVE_LIB).filter(|v| !v.trim().is_empty()) {
            self.native.library_path = Some(PathBuf::from(path));
        }
        if let Some(size) = lookup(ENV_POOL_SIZE).filter(|v| !v.trim().is_empty()) {
            let parsed = size.trim().parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                key: ENV_POOL_SIZE.to_string(),
                value: size.clone(),
                reason: e.to_string(),
            })?;
            self.pool = PoolConfig::fixed(parsed);
        }
        self.validate()?;
        Ok(self)
    }

    /// Rejects settings that cannot describe a working engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.policy == PoolPolicy::Fixed {
            match self.pool.size {
                Some(size) if (1..=MAX_POOL_SIZE).contains(&size) => {}
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "pool.size".to_string(),
                        value: other.map_or_else(|| "<unset>".to_string(), |s| s.to_string()),
                        reason: format!("fixed pools need a size between 1 and {}", MAX_POOL_SIZE),
                    })
                }
            }
        }
        if let Some(0) = self.wasm.max_memory_bytes {
            return Err(ConfigError::InvalidValue {
                key: "wasm.max_memory_bytes".to_string(),
                value: "0".to_string(),
                reason: "memory cap must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Load and validate an engine config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let cfg: EngineConfig = serde_yaml::from_str(&content)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
backend: native_foreign_call
wasm:
  artifact_path: /opt/libinjection.wasm
  fuel: 2000000
  max_memory_bytes: 1048576
native:
  library_path: /usr/lib/libinjection.so
pool:
  policy: fixed
  size: 3
"#;
        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.backend, BackendKind::NativeForeignCall);
        assert_eq!(cfg.wasm.artifact_path, PathBuf::from("/opt/libinjection.wasm"));
        assert_eq!(cfg.wasm.fuel_level(), 2_000_000);
        assert_eq!(cfg.wasm.max_memory_bytes, Some(1_048_576));
        assert_eq!(
            cfg.native.library_path(),
            PathBuf::from("/usr/lib/libinjection.so")
        );
        assert_eq!(cfg.pool.capacity(), 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.wasm.artifact_path, PathBuf::from(DEFAULT_WASM_ARTIFACT));
        assert_eq!(cfg.wasm.fuel_level(), DEFAULT_FUEL_LEVEL);
        assert_eq!(cfg.pool.policy, PoolPolicy::PerCore);
    }

    #[cfg(not(feature = "native-default"))]
    #[test]
    fn unset_backend_defaults_to_embedded() {
        assert_eq!(BackendKind::default(), BackendKind::EmbeddedInterpreter);
        let cfg = EngineConfig::default().with_overrides(|_| None).unwrap();
        assert_eq!(cfg.backend, BackendKind::EmbeddedInterpreter);
    }

    #[test]
    fn backend_aliases_parse() {
        assert_eq!("wasm".parse::<BackendKind>().unwrap(), BackendKind::EmbeddedInterpreter);
        assert_eq!("Embedded".parse::<BackendKind>().unwrap(), BackendKind::EmbeddedInterpreter);
        assert_eq!("native".parse::<BackendKind>().unwrap(), BackendKind::NativeForeignCall);
        assert_eq!(" ffi ".parse::<BackendKind>().unwrap(), BackendKind::NativeForeignCall);

        let err = "cgo-ish".parse::<BackendKind>().unwrap_err();
        assert!(err.to_string().contains(ENV_BACKEND));
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = EngineConfig::default()
            .with_overrides(lookup_from(&[
                (ENV_BACKEND, "native"),
                (ENV_WASM_PATH, "/tmp/other.wasm"),
                (ENV_NATIVE_LIB, "/tmp/libinjection.so"),
                (ENV_POOL_SIZE, "2"),
            ]))
            .unwrap();

        assert_eq!(cfg.backend, BackendKind::NativeForeignCall);
        assert_eq!(cfg.wasm.artifact_path, PathBuf::from("/tmp/other.wasm"));
        assert_eq!(cfg.native.library_path(), PathBuf::from("/tmp/libinjection.so"));
        assert_eq!(cfg.pool, PoolConfig::fixed(2));
    }

    #[test]
    fn blank_backend_override_is_ignored() {
        let cfg = EngineConfig {
            backend: BackendKind::NativeForeignCall,
            ..EngineConfig::default()
        }
        .with_overrides(lookup_from(&[(ENV_BACKEND, "  ")]))
        .unwrap();
        assert_eq!(cfg.backend, BackendKind::NativeForeignCall);
    }

    #[test]
    fn blank_pool_size_override_is_ignored() {
        let cfg = EngineConfig::default()
            .with_overrides(lookup_from(&[(ENV_POOL_SIZE, ""), (ENV_WASM_PATH, "")]))
            .unwrap();
        assert_eq!(cfg.pool, PoolConfig::default());
        assert_eq!(cfg.wasm.artifact_path, PathBuf::from(DEFAULT_WASM_ARTIFACT));

        let cfg = EngineConfig::default()
            .with_overrides(lookup_from(&[(ENV_POOL_SIZE, "   ")]))
            .unwrap();
        assert_eq!(cfg.pool, PoolConfig::default());
    }

    #[test]
    fn yaml_backend_accepts_aliases() {
        let cfg: EngineConfig = serde_yaml::from_str("backend: native").unwrap();
        assert_eq!(cfg.backend, BackendKind::NativeForeignCall);

        let cfg: EngineConfig = serde_yaml::from_str("backend: Wasm").unwrap();
        assert_eq!(cfg.backend, BackendKind::EmbeddedInterpreter);

        let cfg: EngineConfig = serde_yaml::from_str("backend: ffi").unwrap();
        assert_eq!(cfg.backend, BackendKind::NativeForeignCall);

        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(yaml.contains("backend: native_foreign_call"));

        let err = serde_yaml::from_str::<EngineConfig>("backend: cgo").unwrap_err();
        assert!(err.to_string().contains("expected one of"));
    }

    #[test]
    fn invalid_pool_size_override() {
        let result =
            EngineConfig::default().with_overrides(lookup_from(&[(ENV_POOL_SIZE, "four")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = EngineConfig::default().with_overrides(lookup_from(&[(ENV_POOL_SIZE, "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn fixed_policy_requires_size() {
        let cfg = EngineConfig {
            pool: PoolConfig {
                policy: PoolPolicy::Fixed,
                size: None,
            },
            ..EngineConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("pool.size"));
    }

    #[test]
    fn pool_capacity_by_policy() {
        assert_eq!(PoolConfig::shared().capacity(), 1);
        assert_eq!(PoolConfig::fixed(5).capacity(), 5);
        assert_eq!(PoolConfig::fixed(10_000).capacity(), MAX_POOL_SIZE);

        let per_core = PoolConfig::default().capacity();
        assert!(per_core >= 1 && per_core <= MAX_POOL_SIZE);
    }

    #[test]
    fn fuel_is_clamped() {
        let low = WasmConfig {
            fuel: Some(10),
            ..WasmConfig::default()
        };
        assert_eq!(low.fuel_level(), MIN_FUEL_LEVEL);

        let high = WasmConfig {
            fuel: Some(u64::MAX),
            ..WasmConfig::default()
        };
        assert_eq!(high.fuel_level(), MAX_FUEL_LEVEL);
    }

    #[test]
    fn load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "backend: wasm_is_not_a_variant").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pool:\n  policy: shared").unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.pool.capacity(), 1);
    }

    #[test]
    fn load_config_missing_file() {
        let result = load_config("/nonexistent/libinjection.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn zero_memory_cap_rejected() {
        let cfg = EngineConfig {
            wasm: WasmConfig {
                max_memory_bytes: Some(0),
                ..WasmConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
