// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ArtifactLoadError;
use crate::traits::ExportedFunction;
use libloading::{Library, Symbol};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::Path;

/// `int libinjection_sqli(const char *s, size_t slen, char fingerprint[])`
pub type SqliFn = unsafe extern "C" fn(*const c_char, usize, *mut c_char) -> c_int;
/// `int libinjection_xss(const char *s, size_t slen)`
pub type XssFn = unsafe extern "C" fn(*const c_char, usize) -> c_int;
/// `const char *libinjection_version(void)`
type VersionFn = unsafe extern "C" fn() -> *const c_char;

const VERSION_SYMBOL: &str = "libinjection_version";

/// Resolved detector entry points.
#[derive(Clone, Copy)]
pub struct NativeSymbols {
    pub sqli: SqliFn,
    pub xss: XssFn,
}

/// A loaded libinjection shared library.
///
/// The symbols stay valid for as long as this value lives; the library is
/// unloaded when it is dropped.
pub struct NativeLibrary {
    path: String,
    symbols: NativeSymbols,
    version: Option<String>,
    _library: Option<Library>,
}

impl NativeLibrary {
    /// Opens the library at `path` and resolves the detector symbols.
    ///
    /// # Errors
    /// - `Library` if the system loader refuses the file
    /// - `MissingSymbol` if either detector symbol is absent
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let label = path.display().to_string();

        // SAFETY: libinjection has no load-time initializers beyond static data.
        let library = unsafe { Library::new(path) }.map_err(|e| ArtifactLoadError::Library {
            path: label.clone(),
            reason: e.to_string(),
        })?;

        // SAFETY: the type aliases mirror the C prototypes in libinjection.h.
        let symbols = unsafe {
            NativeSymbols {
                sqli: resolve::<SqliFn>(&library, &label, ExportedFunction::Sqli.symbol())?,
                xss: resolve::<XssFn>(&library, &label, ExportedFunction::Xss.symbol())?,
            }
        };

        // SAFETY: optional symbol; returns a pointer to a static C string.
        let version = unsafe { resolve::<VersionFn>(&library, &label, VERSION_SYMBOL) }
            .ok()
            .and_then(|version_fn| unsafe { read_version(version_fn) });

        Ok(Self {
            path: label,
            symbols,
            version,
            _library: Some(library),
        })
    }

    /// Wraps entry points already linked into the process.
    pub fn from_symbols(label: impl Into<String>, symbols: NativeSymbols) -> Self {
        Self {
            path: label.into(),
            symbols,
            version: None,
            _library: None,
        }
    }

    /// Raw entry points. Valid only while `self` is alive, so callers hold
    /// an `Arc` to the library next to them.
    #[inline]
    pub(crate) fn symbols(&self) -> NativeSymbols {
        self.symbols
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `libinjection_version()` when the library exports it.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

unsafe fn resolve<T: Copy>(
    library: &Library,
    path: &str,
    symbol: &str,
) -> Result<T, ArtifactLoadError> {
    let name = format!("{symbol}\0");
    let resolved: Symbol<T> =
        library
            .get(name.as_bytes())
            .map_err(|e| ArtifactLoadError::MissingSymbol {
                path: path.to_string(),
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;
    Ok(*resolved)
}

unsafe fn read_version(version_fn: VersionFn) -> Option<String> {
    let raw = version_fn();
    if raw.is_null() {
        return None;
    }
    Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
}
