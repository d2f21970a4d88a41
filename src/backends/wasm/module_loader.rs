// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM module compilation and export validation
//!
//! An artifact is compiled exactly once. The resulting `CompiledModule`
//! holds the engine, the compiled module and a pre-linked `InstancePre`, so
//! each pooled instance only pays for instantiation.
//!
//! ## Export contract
//! - `memory` - the linear memory
//! - `malloc(i32) -> i32`, `free(i32)`
//! - `libinjection_sqli(i32, i32, i32) -> i32`
//! - `libinjection_xss(i32, i32) -> i32`
//! - optionally `_initialize()` for reactor-style builds

use super::capability_manager::{create_engine, create_linker};
use super::detector::inspect_artifact;
use super::instance::InstanceState;
use super::loader::load_artifact_bytes;
use crate::errors::ArtifactLoadError;
use crate::traits::ExportedFunction;
use std::path::Path;
use wasmtime::{Engine, ExternType, FuncType, InstancePre, Module, ValType};

pub const MEMORY_EXPORT: &str = "memory";
pub const MALLOC_EXPORT: &str = "malloc";
pub const FREE_EXPORT: &str = "free";
pub const INITIALIZE_EXPORT: &str = "_initialize";

/// Required function exports as (name, parameter count, result count).
/// Every parameter and result is an `i32`.
const REQUIRED_FUNCTIONS: [(&str, usize, usize); 4] = [
    (MALLOC_EXPORT, 1, 1),
    (FREE_EXPORT, 1, 0),
    (ExportedFunction::Sqli.symbol(), 3, 1),
    (ExportedFunction::Xss.symbol(), 2, 1),
];

/// A compiled, validated and pre-linked libinjection artifact.
pub struct CompiledModule {
    engine: Engine,
    pre: InstancePre<InstanceState>,
    artifact: String,
    size_bytes: usize,
    has_initializer: bool,
}

impl CompiledModule {
    /// Reads, inspects, compiles and links the artifact at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let bytes = load_artifact_bytes(path)?;
        Self::from_bytes(&path.display().to_string(), &bytes)
    }

    /// Compiles an in-memory artifact. `artifact` labels it in errors and logs.
    pub fn from_bytes(artifact: &str, bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let profile = inspect_artifact(artifact, bytes)?;
        let engine = create_engine()?;

        let module = Module::new(&engine, bytes).map_err(|e| ArtifactLoadError::Corrupt {
            path: artifact.to_string(),
            reason: format!("{e:#}"),
        })?;

        validate_exports(&module)?;
        let has_initializer = matches!(
            module.get_export(INITIALIZE_EXPORT),
            Some(ExternType::Func(ty)) if ty.params().len() == 0 && ty.results().len() == 0
        );

        let linker = create_linker(&engine, &profile)?;
        let pre = linker
            .instantiate_pre(&module)
            .map_err(|e| ArtifactLoadError::Link(format!("{e:#}")))?;

        Ok(Self {
            engine,
            pre,
            artifact: artifact.to_string(),
            size_bytes: bytes.len(),
            has_initializer,
        })
    }

    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[inline]
    pub fn pre(&self) -> &InstancePre<InstanceState> {
        &self.pre
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Whether the artifact exports a reactor `_initialize` to run once per
    /// instance.
    pub fn has_initializer(&self) -> bool {
        self.has_initializer
    }
}

/// Checks the linear memory and every required function export.
pub fn validate_exports(module: &Module) -> Result<(), ArtifactLoadError> {
    match module.get_export(MEMORY_EXPORT) {
        Some(ExternType::Memory(_)) => {}
        _ => {
            return Err(ArtifactLoadError::MissingExport {
                name: MEMORY_EXPORT.to_string(),
            })
        }
    }

    for (name, params, results) in REQUIRED_FUNCTIONS {
        let ty = match module.get_export(name) {
            Some(ExternType::Func(ty)) => ty,
            _ => {
                return Err(ArtifactLoadError::MissingExport {
                    name: name.to_string(),
                })
            }
        };

        let all_i32 = ty.params().chain(ty.results()).all(|t| matches!(t, ValType::I32));
        if ty.params().len() != params || ty.results().len() != results || !all_i32 {
            return Err(ArtifactLoadError::SignatureMismatch {
                name: name.to_string(),
                expected: expected_signature(params, results),
                found: describe_signature(&ty),
            });
        }
    }

    Ok(())
}

fn expected_signature(params: usize, results: usize) -> String {
    let params = vec!["i32"; params].join(", ");
    let results = vec!["i32"; results].join(", ");
    format!("({params}) -> ({results})")
}

fn describe_signature(ty: &FuncType) -> String {
    let params: Vec<String> = ty.params().map(|t| t.to_string()).collect();
    let results: Vec<String> = ty.results().map(|t| t.to_string()).collect();
    format!("({}) -> ({})", params.join(", "), results.join(", "))
}
