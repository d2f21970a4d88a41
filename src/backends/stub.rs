// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for both backends and for the pool.
//!
//! All of them follow the same toy detection rule so results can be compared
//! across backends:
//! - SQLi matches when the input contains `'` and reports fingerprint `s&sos`
//! - XSS matches when the input contains `<`
//! - the WASM SQLi export traps when the input contains `!`

use crate::backends::native::NativeSymbols;
use crate::config::{BackendKind, WasmConfig};
use crate::errors::{BackendError, BackendResult};
use crate::traits::{BackendAdapter, ExportedFunction, ModuleInstance, RawVerdict};
use std::io::Write;
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

pub const STUB_FINGERPRINT: &[u8] = b"s&sos";

/// Minimal artifact honoring the libinjection export contract: a bump
/// `malloc` that grows memory on demand (returning 0 when growth is refused)
/// and a `free` that resets the heap once every region is released.
pub const STUB_ARTIFACT_WAT: &str = r#"(module
  (memory (export "memory") 1)
  (data (i32.const 16) "s&sos\00")

  (global $heap_base i32 (i32.const 1024))
  (global $next (mut i32) (i32.const 1024))
  (global $live (mut i32) (i32.const 0))

  (func $malloc (export "malloc") (param $size i32) (result i32)
    (local $ptr i32)
    (local $end i32)
    (local $have i32)
    (local.set $ptr (global.get $next))
    (local.set $end (i32.add (local.get $ptr) (local.get $size)))
    (local.set $have (i32.shl (memory.size) (i32.const 16)))
    (if (i32.gt_u (local.get $end) (local.get $have))
      (then
        (if (i32.eq
              (memory.grow
                (i32.shr_u
                  (i32.add (i32.sub (local.get $end) (local.get $have)) (i32.const 65535))
                  (i32.const 16)))
              (i32.const -1))
          (then (return (i32.const 0))))))
    (global.set $next (local.get $end))
    (global.set $live (i32.add (global.get $live) (i32.const 1)))
    (local.get $ptr))

  (func $free (export "free") (param $ptr i32)
    (global.set $live (i32.sub (global.get $live) (i32.const 1)))
    (if (i32.eqz (global.get $live))
      (then (global.set $next (global.get $heap_base)))))

  (func $contains (param $ptr i32) (param $len i32) (param $needle i32) (result i32)
    (local $i i32)
    (block $done
      (loop $scan
        (br_if $done (i32.ge_u (local.get $i) (local.get $len)))
        (if (i32.eq
              (i32.load8_u (i32.add (local.get $ptr) (local.get $i)))
              (local.get $needle))
          (then (return (i32.const 1))))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $scan)))
    (i32.const 0))

  (func (export "libinjection_sqli") (param $ptr i32) (param $len i32) (param $fp i32) (result i32)
    (if (call $contains (local.get $ptr) (local.get $len) (i32.const 33))
      (then (unreachable)))
    (if (call $contains (local.get $ptr) (local.get $len) (i32.const 39))
      (then
        (memory.copy (local.get $fp) (i32.const 16) (i32.const 6))
        (return (i32.const 1))))
    (i32.const 0))

  (func (export "libinjection_xss") (param $ptr i32) (param $len i32) (result i32)
    (call $contains (local.get $ptr) (local.get $len) (i32.const 60)))
)"#;

/// Writes the stub artifact to a temporary `.wasm` file.
pub fn write_stub_artifact() -> NamedTempFile {
    let bytes = wat::parse_str(STUB_ARTIFACT_WAT).unwrap();
    let mut file = tempfile::Builder::new().suffix(".wasm").tempfile().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

pub fn stub_wasm_config(file: &NamedTempFile) -> WasmConfig {
    WasmConfig {
        artifact_path: file.path().to_path_buf(),
        ..WasmConfig::default()
    }
}

unsafe extern "C" fn stub_sqli(input: *const c_char, len: usize, fingerprint: *mut c_char) -> c_int {
    let bytes = std::slice::from_raw_parts(input.cast::<u8>(), len);
    if bytes.contains(&b'\'') {
        std::ptr::copy_nonoverlapping(b"s&sos\0".as_ptr().cast::<c_char>(), fingerprint, 6);
        1
    } else {
        0
    }
}

unsafe extern "C" fn stub_xss(input: *const c_char, len: usize) -> c_int {
    let bytes = std::slice::from_raw_parts(input.cast::<u8>(), len);
    c_int::from(bytes.contains(&b'<'))
}

/// Native entry points with the libinjection C signatures.
pub fn stub_native_symbols() -> NativeSymbols {
    NativeSymbols {
        sqli: stub_sqli,
        xss: stub_xss,
    }
}

/// In-process adapter for pool tests.
///
/// Input `trap` makes an instance fail and poison itself. After
/// `fail_after` successful instantiations every further one fails.
/// With `panic_after`, the instantiation following that many successes
/// panics once.
pub struct StubAdapter {
    delay: Duration,
    fail_after: Option<usize>,
    panic_after: Option<usize>,
    panicked: AtomicBool,
    created: AtomicUsize,
}

impl StubAdapter {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            fail_after: None,
            panic_after: None,
            panicked: AtomicBool::new(false),
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn failing_after(limit: usize) -> Self {
        Self {
            fail_after: Some(limit),
            ..Self::new()
        }
    }

    pub fn panicking_once_after(limit: usize) -> Self {
        Self {
            panic_after: Some(limit),
            ..Self::new()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl BackendAdapter for StubAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::NativeForeignCall
    }

    fn artifact(&self) -> &str {
        "stub"
    }

    fn instantiate(&self) -> BackendResult<Box<dyn ModuleInstance>> {
        if self.panic_after == Some(self.created())
            && !self.panicked.swap(true, Ordering::SeqCst)
        {
            panic!("stub instantiation panicked");
        }
        let created = self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| created >= limit) {
            self.created.fetch_sub(1, Ordering::SeqCst);
            return Err(BackendError::Instantiation("stub refused".to_string()));
        }
        Ok(Box::new(StubInstance {
            delay: self.delay,
            poisoned: false,
        }))
    }
}

pub struct StubInstance {
    delay: Duration,
    poisoned: bool,
}

impl ModuleInstance for StubInstance {
    fn invoke(&mut self, function: ExportedFunction, input: &[u8]) -> BackendResult<RawVerdict> {
        if input == b"trap" {
            self.poisoned = true;
            return Err(BackendError::Trap {
                function: function.symbol(),
                source: anyhow::anyhow!("stub trap"),
            });
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let needle = match function {
            ExportedFunction::Sqli => b'\'',
            ExportedFunction::Xss => b'<',
        };
        Ok(RawVerdict::flag(i32::from(input.contains(&needle))))
    }

    fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
