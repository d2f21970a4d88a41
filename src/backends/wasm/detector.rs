// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary inspection
//!
//! Full binary-format parse of the artifact with wasmparser before wasmtime ever
//! compiles it: rejects Component Model binaries and collects the import
//! namespaces so the linker only provides what the artifact asks for.

use crate::errors::{ArtifactLoadError, ARTIFACT_UNSUPPORTED_ENCODING};
use std::collections::BTreeSet;
use wasmparser::{Encoding, Parser, Payload};

/// Import namespace of WASI preview 1 (what wasi-sdk builds link against).
pub const WASI_PREVIEW1_NAMESPACE: &str = "wasi_snapshot_preview1";

/// What the loader needs to know about an artifact before compiling it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactProfile {
    /// Distinct module names appearing in the import section.
    pub import_namespaces: BTreeSet<String>,
    /// Number of exports in the export section.
    pub export_count: usize,
}

impl ArtifactProfile {
    #[inline]
    pub fn imports_wasi(&self) -> bool {
        self.import_namespaces.contains(WASI_PREVIEW1_NAMESPACE)
    }
}

/// Parses `bytes` as a core WASM module and profiles its imports.
///
/// # Errors
/// - `Corrupt` if the input is empty, truncated, or otherwise invalid
/// - `UnsupportedEncoding` if the binary is a Component Model component
pub fn inspect_artifact(artifact: &str, bytes: &[u8]) -> Result<ArtifactProfile, ArtifactLoadError> {
    let corrupt = |reason: String| ArtifactLoadError::Corrupt {
        path: artifact.to_string(),
        reason,
    };

    let mut encoding = None;
    let mut profile = ArtifactProfile::default();

    for payload in Parser::new(0).parse_all(bytes) {
        match payload.map_err(|e| corrupt(e.to_string()))? {
            Payload::Version { encoding: enc, .. } => {
                if enc == Encoding::Component {
                    return Err(ArtifactLoadError::UnsupportedEncoding(
                        ARTIFACT_UNSUPPORTED_ENCODING.to_string(),
                    ));
                }
                encoding = Some(enc);
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import.map_err(|e| corrupt(e.to_string()))?;
                    profile.import_namespaces.insert(import.module.to_string());
                }
            }
            Payload::ExportSection(reader) => {
                profile.export_count = reader.count() as usize;
            }
            _ => {}
        }
    }

    match encoding {
        Some(Encoding::Module) => Ok(profile),
        _ => Err(corrupt("missing WASM module header".to_string())),
    }
}
