// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Native foreign-call backend
//!
//! Calls libinjection compiled for the host through its C ABI. Input bytes
//! are passed by pointer and length without copying; the SQLi fingerprint
//! lands in an 8-byte buffer on the caller's stack. The C functions keep no
//! state between calls, so instances are cheap handles onto one shared
//! library.

mod library;

pub use library::{NativeLibrary, NativeSymbols, SqliFn, XssFn};

use crate::backends::cache::{ArtifactCache, Cached};
use crate::config::{BackendKind, NativeConfig};
use crate::errors::{ArtifactLoadError, BackendResult};
use crate::observability::messages::artifact::{ArtifactLoadFailed, ArtifactLoaded, ArtifactReused};
use crate::traits::{BackendAdapter, ExportedFunction, ModuleInstance, RawVerdict, FINGERPRINT_BUFFER_LEN};
use std::os::raw::c_char;
use std::sync::Arc;

static LIBRARIES: ArtifactCache<NativeLibrary> = ArtifactCache::new();

pub struct NativeAdapter {
    library: Arc<NativeLibrary>,
}

impl NativeAdapter {
    /// Opens the library named by `config`, or reuses the one this process
    /// already opened from that path.
    pub fn load(config: &NativeConfig) -> Result<Self, ArtifactLoadError> {
        let backend = BackendKind::NativeForeignCall.as_str();
        let path = config.library_path();
        let artifact = path.display().to_string();

        match LIBRARIES.get_or_load(&path, |path| NativeLibrary::open(path)) {
            Ok(Cached { value, reused: true }) => {
                tracing::debug!(
                    "{}",
                    ArtifactReused {
                        backend,
                        artifact: &artifact,
                    }
                );
                Ok(Self::from_shared(value))
            }
            Ok(Cached { value, reused: false }) => {
                let detail = match value.version() {
                    Some(version) => format!("libinjection {version}"),
                    None => "version unknown".to_string(),
                };
                tracing::info!(
                    "{}",
                    ArtifactLoaded {
                        backend,
                        artifact: &artifact,
                        detail: &detail,
                    }
                );
                Ok(Self::from_shared(value))
            }
            Err(error) => {
                tracing::error!(
                    "{}",
                    ArtifactLoadFailed {
                        backend,
                        artifact: &artifact,
                        error: &error,
                    }
                );
                Err(error)
            }
        }
    }

    pub fn from_library(library: NativeLibrary) -> Self {
        Self::from_shared(Arc::new(library))
    }

    pub fn from_shared(library: Arc<NativeLibrary>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Arc<NativeLibrary> {
        &self.library
    }
}

impl BackendAdapter for NativeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::NativeForeignCall
    }

    fn artifact(&self) -> &str {
        self.library.path()
    }

    fn instantiate(&self) -> BackendResult<Box<dyn ModuleInstance>> {
        Ok(Box::new(NativeInstance {
            symbols: self.library.symbols(),
            _library: Arc::clone(&self.library),
        }))
    }
}

pub struct NativeInstance {
    symbols: NativeSymbols,
    // Keeps the symbols loaded.
    _library: Arc<NativeLibrary>,
}

impl ModuleInstance for NativeInstance {
    fn invoke(&mut self, function: ExportedFunction, input: &[u8]) -> BackendResult<RawVerdict> {
        let data = input.as_ptr().cast::<c_char>();

        match function {
            ExportedFunction::Sqli => {
                let mut fingerprint = [0u8; FINGERPRINT_BUFFER_LEN];
                // SAFETY: `data` is valid for `input.len()` bytes and the C side
                // writes at most FINGERPRINT_BUFFER_LEN bytes into `fingerprint`.
                let code = unsafe {
                    (self.symbols.sqli)(data, input.len(), fingerprint.as_mut_ptr().cast::<c_char>())
                };
                Ok(RawVerdict::with_fingerprint(code, fingerprint))
            }
            ExportedFunction::Xss => {
                // SAFETY: `data` is valid for `input.len()` bytes.
                let code = unsafe { (self.symbols.xss)(data, input.len()) };
                Ok(RawVerdict::flag(code))
            }
        }
    }
}
