// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Artifact file loading
//!
//! Reads the precompiled libinjection binary from disk and enforces the size
//! limit. Format checks belong to the detector module.

use crate::errors::ArtifactLoadError;
use std::path::Path;

/// Maximum allowed size for a WASM artifact (16 MB)
pub const MAX_ARTIFACT_SIZE: usize = 16 * 1024 * 1024;

/// Loads artifact bytes from `path`.
///
/// # Errors
/// - `Missing` if the file cannot be read
/// - `TooLarge` if it exceeds [`MAX_ARTIFACT_SIZE`]
pub fn load_artifact_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ArtifactLoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ArtifactLoadError::Missing {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if bytes.len() > MAX_ARTIFACT_SIZE {
        return Err(ArtifactLoadError::TooLarge {
            path: path.display().to_string(),
            size: bytes.len(),
            max: MAX_ARTIFACT_SIZE,
        });
    }

    tracing::debug!(
        "Read {} bytes of WASM artifact from {}",
        bytes.len(),
        path.display()
    );

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_small_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"\0asm").unwrap();

        let bytes = load_artifact_bytes(temp_file.path()).unwrap();
        assert_eq!(bytes, b"\0asm");
    }

    #[test]
    fn test_file_too_large() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&vec![0u8; MAX_ARTIFACT_SIZE + 1]).unwrap();

        match load_artifact_bytes(temp_file.path()) {
            Err(ArtifactLoadError::TooLarge { size, max, .. }) => {
                assert_eq!(size, MAX_ARTIFACT_SIZE + 1);
                assert_eq!(max, MAX_ARTIFACT_SIZE);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_nonexistent_file() {
        let result = load_artifact_bytes("/nonexistent/path/to/libinjection.wasm");
        match result {
            Err(ArtifactLoadError::Missing { path, .. }) => {
                assert!(path.contains("libinjection.wasm"));
            }
            other => panic!("Expected Missing, got {:?}", other),
        }
    }
}
