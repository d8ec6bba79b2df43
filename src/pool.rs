// Worker pool abstraction modeling a pool that can *reject* a task when
// saturated, something `crossbeam::thread::scope` has no notion of: a scope
// either spawns a thread or it doesn't, nothing asks permission.
// `ScopedThreadPool` stands in for that admission control with an
// `AtomicUsize` in-flight counter — spawn while there's headroom, run the
// task inline otherwise, same effect as a pool that rejects when full.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::OnceLock;

/// Capability every L4 driver needs from its pool: how many workers it has,
/// and whether it currently has headroom to take on one more concurrent
/// task without blocking.
pub trait WorkerPool: Sync {
    fn num_workers(&self) -> usize;

    /// Attempts to reserve one slot of concurrency. Returns `true` if the
    /// caller may spawn a task (and must call `release` once it joins);
    /// `false` means the pool is saturated and the caller should run the
    /// task inline instead.
    fn try_acquire(&self) -> bool;

    fn release(&self);
}

/// The pool this crate ships: `crossbeam::thread::scope` plus the number of
/// logical CPUs, probed once per process via `num_cpus::get()` and cached —
/// the original's `numCPU()`/`thPool()` one-time-init via `pthread_once`
/// translated to Rust's `OnceLock`.
pub struct ScopedThreadPool {
    workers: usize,
    in_flight: AtomicUsize,
}

static CPU_COUNT: OnceLock<usize> = OnceLock::new();

fn cpu_count() -> usize {
    *CPU_COUNT.get_or_init(num_cpus::get)
}

impl ScopedThreadPool {
    /// A pool sized to the machine's logical CPU count.
    pub fn new() -> Self {
        ScopedThreadPool {
            workers: cpu_count(),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// A pool pinned to an explicit worker count, mainly for tests that want
    /// deterministic fan-out regardless of the machine running them.
    pub fn with_workers(workers: usize) -> Self {
        ScopedThreadPool {
            workers: workers.max(1),
            in_flight: AtomicUsize::new(0),
        }
    }
}

impl Default for ScopedThreadPool {
    fn default() -> Self {
        ScopedThreadPool::new()
    }
}

impl WorkerPool for ScopedThreadPool {
    fn num_workers(&self) -> usize {
        self.workers
    }

    fn try_acquire(&self) -> bool {
        let mut current = self.in_flight.load(AtomicOrdering::Relaxed);
        loop {
            if current >= self.workers {
                return false;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                AtomicOrdering::AcqRel,
                AtomicOrdering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn release(&self) {
        self.in_flight.fetch_sub(1, AtomicOrdering::AcqRel);
    }
}
