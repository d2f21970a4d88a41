// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::RawVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;

/// libinjection's token-class signature for a detected SQL injection,
/// e.g. `s&sos`. At most seven bytes, never NUL-terminated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    /// Takes the bytes up to the first NUL (or the whole buffer if none).
    pub fn from_nul_terminated(buffer: &[u8]) -> Self {
        let end = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
        Self(buffer[..end].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The fingerprint as text. libinjection only emits ASCII token codes.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Outcome of one detection call.
///
/// `fingerprint` is only ever present on a matched SQLi result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
}

impl DetectionResult {
    pub fn benign() -> Self {
        Self::default()
    }

    /// Interprets a backend verdict: any non-zero code is a match.
    pub fn from_verdict(verdict: RawVerdict) -> Self {
        let matched = verdict.code != 0;
        let fingerprint = verdict
            .fingerprint
            .filter(|_| matched)
            .map(|buffer| Fingerprint::from_nul_terminated(&buffer))
            .filter(|fingerprint| !fingerprint.is_empty());
        Self {
            matched,
            fingerprint,
        }
    }

    pub fn fingerprint_str(&self) -> Option<&str> {
        self.fingerprint.as_ref().and_then(Fingerprint::as_str)
    }
}

impl From<RawVerdict> for DetectionResult {
    fn from(verdict: RawVerdict) -> Self {
        Self::from_verdict(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_stops_at_nul() {
        let fingerprint = Fingerprint::from_nul_terminated(b"s&sos\0\x7f\x7f");
        assert_eq!(fingerprint.as_bytes(), b"s&sos");
        assert_eq!(fingerprint.to_string(), "s&sos");
    }

    #[test]
    fn fingerprint_without_terminator_uses_whole_buffer() {
        let fingerprint = Fingerprint::from_nul_terminated(b"abcdefgh");
        assert_eq!(fingerprint.as_str(), Some("abcdefgh"));
    }

    #[test]
    fn non_zero_code_matches() {
        let result = DetectionResult::from(RawVerdict::with_fingerprint(-1, *b"1c\0\0\0\0\0\0"));
        assert!(result.matched);
        assert_eq!(result.fingerprint_str(), Some("1c"));
    }

    #[test]
    fn unmatched_result_drops_buffer_contents() {
        let result = DetectionResult::from(RawVerdict::with_fingerprint(0, *b"junk\0\0\0\0"));
        assert_eq!(result, DetectionResult::benign());
    }

    #[test]
    fn xss_verdict_has_no_fingerprint() {
        let result = DetectionResult::from(RawVerdict::flag(1));
        assert!(result.matched);
        assert!(result.fingerprint.is_none());
    }

    #[test]
    fn serializes_without_absent_fingerprint() {
        let json = serde_json::to_string(&DetectionResult::benign()).unwrap();
        assert_eq!(json, r#"{"matched":false}"#);

        let matched = DetectionResult::from(RawVerdict::with_fingerprint(1, *b"s&sos\0\0\0"));
        let json = serde_json::to_string(&matched).unwrap();
        assert_eq!(json, r#"{"matched":true,"fingerprint":[115,38,115,111,115]}"#);
    }
}
