// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded pool of module instances
//!
//! An instance serves one call at a time, so concurrency is bounded by the
//! pool capacity. Callers beyond it block until an instance is returned,
//! or until their timeout elapses.
//!
//! ## Lifecycle
//! - the first instance is created eagerly by [`InstancePool::new`]
//! - further instances are created on demand up to the capacity
//! - an instance reporting itself poisoned is dropped on return and its
//!   slot is freed for a fresh one

use crate::config::BackendKind;
use crate::errors::{BackendError, BackendResult};
use crate::observability::messages::pool::{InstanceCreated, InstanceCreationFailed, InstanceDiscarded};
use crate::traits::{BackendAdapter, ExportedFunction, ModuleInstance, RawVerdict};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Point-in-time view of a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub backend: BackendKind,
    pub capacity: usize,
    /// Instances currently alive, idle or checked out.
    pub instantiated: usize,
    pub idle: usize,
    /// Poisoned instances discarded so far.
    pub replaced: u64,
    /// Scratch bytes still held by idle instances.
    pub outstanding_scratch_bytes: usize,
}

struct PoolState {
    idle: Vec<Box<dyn ModuleInstance>>,
    instantiated: usize,
    replaced: u64,
}

pub struct InstancePool {
    adapter: Arc<dyn BackendAdapter>,
    capacity: usize,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl InstancePool {
    /// Creates a pool of up to `capacity` instances (at least one) and
    /// instantiates the first immediately.
    pub fn new(adapter: Arc<dyn BackendAdapter>, capacity: usize) -> BackendResult<Self> {
        let capacity = capacity.max(1);
        let first = adapter.instantiate()?;
        tracing::debug!(
            "{}",
            InstanceCreated {
                backend: adapter.kind().as_str(),
                instantiated: 1,
                capacity,
            }
        );

        Ok(Self {
            adapter,
            capacity,
            state: Mutex::new(PoolState {
                idle: vec![first],
                instantiated: 1,
                replaced: 0,
            }),
            available: Condvar::new(),
        })
    }

    pub fn backend(&self) -> BackendKind {
        self.adapter.kind()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks until an instance is available.
    pub fn acquire(&self) -> BackendResult<PooledInstance<'_>> {
        self.checkout(None)
    }

    /// Like [`acquire`](Self::acquire), failing with `PoolExhausted` once
    /// `timeout` elapses.
    pub fn acquire_timeout(&self, timeout: Duration) -> BackendResult<PooledInstance<'_>> {
        self.checkout(Some(timeout))
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            backend: self.adapter.kind(),
            capacity: self.capacity,
            instantiated: state.instantiated,
            idle: state.idle.len(),
            replaced: state.replaced,
            outstanding_scratch_bytes: state
                .idle
                .iter()
                .map(|instance| instance.outstanding_scratch_bytes())
                .sum(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Pool state stays consistent across a panicking caller.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checkout(&self, timeout: Option<Duration>) -> BackendResult<PooledInstance<'_>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        loop {
            if let Some(instance) = state.idle.pop() {
                return Ok(PooledInstance::new(self, instance));
            }

            if state.instantiated < self.capacity {
                state.instantiated += 1;
                let instantiated = state.instantiated;
                drop(state);
                return self.grow(instantiated);
            }

            state = match deadline {
                None => self
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(BackendError::PoolExhausted(timeout.unwrap_or_default()));
                    }
                    self.available
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Creates an instance for a slot already reserved in `instantiated`.
    fn grow(&self, instantiated: usize) -> BackendResult<PooledInstance<'_>> {
        let backend = self.adapter.kind().as_str();
        let reservation = SlotReservation::new(self);
        match self.adapter.instantiate() {
            Ok(instance) => {
                reservation.fill();
                tracing::debug!(
                    "{}",
                    InstanceCreated {
                        backend,
                        instantiated,
                        capacity: self.capacity,
                    }
                );
                Ok(PooledInstance::new(self, instance))
            }
            Err(error) => {
                tracing::error!("{}", InstanceCreationFailed { backend, error: &error });
                Err(error)
            }
        }
    }

    fn restore(&self, instance: Box<dyn ModuleInstance>) {
        let mut state = self.lock();
        if instance.is_poisoned() {
            state.instantiated -= 1;
            state.replaced += 1;
            tracing::warn!(
                "{}",
                InstanceDiscarded {
                    backend: self.adapter.kind().as_str(),
                    replaced_total: state.replaced,
                }
            );
            drop(instance);
        } else {
            state.idle.push(instance);
        }
        drop(state);
        self.available.notify_one();
    }
}

/// A slot counted in `instantiated` before its instance exists.
///
/// Dropped unfilled (the adapter failed or panicked), it hands the slot
/// back and wakes a waiter.
struct SlotReservation<'p> {
    pool: &'p InstancePool,
    filled: bool,
}

impl<'p> SlotReservation<'p> {
    fn new(pool: &'p InstancePool) -> Self {
        Self { pool, filled: false }
    }

    fn fill(mut self) {
        self.filled = true;
    }
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        if !self.filled {
            self.pool.lock().instantiated -= 1;
            self.pool.available.notify_one();
        }
    }
}

/// An instance checked out of the pool; returned on drop.
pub struct PooledInstance<'p> {
    pool: &'p InstancePool,
    instance: Option<Box<dyn ModuleInstance>>,
}

impl<'p> PooledInstance<'p> {
    fn new(pool: &'p InstancePool, instance: Box<dyn ModuleInstance>) -> Self {
        Self {
            pool,
            instance: Some(instance),
        }
    }

    pub fn invoke(&mut self, function: ExportedFunction, input: &[u8]) -> BackendResult<RawVerdict> {
        match self.instance.as_mut() {
            Some(instance) => instance.invoke(function, input),
            None => Err(BackendError::Runtime("instance already returned".to_string())),
        }
    }
}

impl Drop for PooledInstance<'_> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.restore(instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubAdapter;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn pool(adapter: StubAdapter, capacity: usize) -> (Arc<StubAdapter>, InstancePool) {
        let adapter = Arc::new(adapter);
        let pool = InstancePool::new(adapter.clone(), capacity).unwrap();
        (adapter, pool)
    }

    #[test]
    fn first_instance_is_eager() {
        let (adapter, pool) = pool(StubAdapter::new(), 4);
        let stats = pool.stats();

        assert_eq!(adapter.created(), 1);
        assert_eq!(stats.instantiated, 1);
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.capacity, 4);
    }

    #[test]
    fn zero_capacity_means_one() {
        let (_, pool) = pool(StubAdapter::new(), 0);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn grows_on_demand_and_reuses() {
        let (adapter, pool) = pool(StubAdapter::new(), 2);
        {
            let _a = pool.acquire().unwrap();
            let _b = pool.acquire().unwrap();
            assert_eq!(pool.stats().idle, 0);
        }
        let _c = pool.acquire().unwrap();
        assert_eq!(adapter.created(), 2);
        assert_eq!(pool.stats().instantiated, 2);
    }

    #[test]
    fn timeout_when_exhausted() {
        let (_, pool) = pool(StubAdapter::new(), 1);
        let _held = pool.acquire().unwrap();

        let started = Instant::now();
        let result = pool.acquire_timeout(Duration::from_millis(50));
        assert!(matches!(result, Err(BackendError::PoolExhausted(d)) if d == Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn waiter_wakes_when_instance_returns() {
        let (_, pool) = pool(StubAdapter::new(), 1);
        let held = pool.acquire().unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let mut instance = pool.acquire_timeout(Duration::from_secs(5)).unwrap();
                instance.invoke(ExportedFunction::Xss, b"<p>").unwrap().code
            });
            thread::sleep(Duration::from_millis(20));
            drop(held);
            assert_eq!(waiter.join().unwrap(), 1);
        });
    }

    #[test]
    fn concurrency_never_exceeds_capacity() {
        let (_, pool) = pool(StubAdapter::with_delay(Duration::from_millis(5)), 3);
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..12 {
                s.spawn(|| {
                    for _ in 0..5 {
                        let mut instance = pool.acquire().unwrap();
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        instance.invoke(ExportedFunction::Sqli, b"x").unwrap();
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.stats().instantiated, pool.stats().idle);
    }

    #[test]
    fn poisoned_instance_is_replaced() {
        let (adapter, pool) = pool(StubAdapter::new(), 1);
        {
            let mut instance = pool.acquire().unwrap();
            assert!(instance.invoke(ExportedFunction::Sqli, b"trap").is_err());
        }
        let stats = pool.stats();
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.instantiated, 0);

        let mut instance = pool.acquire().unwrap();
        assert_eq!(instance.invoke(ExportedFunction::Sqli, b"'").unwrap().code, 1);
        assert_eq!(adapter.created(), 2);
    }

    #[test]
    fn failed_growth_releases_slot() {
        let (_, pool) = pool(StubAdapter::failing_after(1), 2);

        let _held = pool.acquire().unwrap();
        assert!(matches!(pool.acquire(), Err(BackendError::Instantiation(_))));
        assert_eq!(pool.stats().instantiated, 1);
    }

    #[test]
    fn panicking_growth_releases_slot() {
        let (adapter, pool) = pool(StubAdapter::panicking_once_after(1), 2);
        let _held = pool.acquire().unwrap();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = pool.acquire();
        }));
        assert!(outcome.is_err());
        assert_eq!(pool.stats().instantiated, 1);

        // The freed slot grows again while the first instance is still held.
        let mut instance = pool.acquire_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(instance.invoke(ExportedFunction::Xss, b"<b>").unwrap().code, 1);
        assert_eq!(pool.stats().instantiated, 2);
        assert_eq!(adapter.created(), 2);
    }

    #[test]
    fn repeated_growth_failures_keep_the_count() {
        let (_, pool) = pool(StubAdapter::failing_after(1), 2);
        let held = pool.acquire().unwrap();

        // One free slot; each failure hands it back.
        assert!(pool.acquire().is_err());
        assert!(pool.acquire().is_err());
        assert_eq!(pool.stats().instantiated, 1);
        drop(held);
        assert!(pool.acquire_timeout(Duration::from_millis(200)).is_ok());
    }
}
