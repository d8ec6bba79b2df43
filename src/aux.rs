// Per-worker auxiliary state: a growable scratch buffer plus the one error
// code this library ever produces. An `Aux` is owned by exactly one task at
// a time; nothing here is ever shared behind a lock, so `rc` is a plain
// field, written only by its owner and read only after a join (see
// `pool.rs`) — matching the original's own "FIXME: atomic" admission that it
// never actually needed to be atomic under its join discipline.

use std::cell::Cell;

/// Raw result code, mirroring the C core's `aux->rc`: `0` is success, any
/// other value is the first-observed failure. Kept as a thin newtype instead
/// of a bare `i32` so the aggregation code in `pool.rs`/`drivers.rs` reads as
/// intent rather than arithmetic. The public, typed boundary (`SortError`,
/// see `error.rs`) is built from this only once, at the very end of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rc(pub i32);

impl Rc {
    pub const OK: Rc = Rc(0);
    pub const ALLOC_FAILED: Rc = Rc(1);

    pub fn is_ok(self) -> bool {
        self == Rc::OK
    }

    /// First-non-zero-wins reduction, used when rolling worker `rc`s up into
    /// a parent aux after `wait_all()`.
    pub fn combine(self, other: Rc) -> Rc {
        if self.is_ok() {
            other
        } else {
            self
        }
    }
}

/// Per-worker scratch buffer and error code.
///
/// `temp` grows monotonically within one top-level call (never shrinks
/// between passes), so that later, larger merges don't pay for a fresh
/// allocation if an earlier pass already grew the buffer far enough.
pub struct Aux {
    rc: Rc,
    temp: Vec<u8>,
}

impl Aux {
    pub fn new() -> Self {
        Aux {
            rc: Rc::OK,
            temp: Vec::new(),
        }
    }

    pub fn rc(&self) -> Rc {
        self.rc
    }

    /// Marks this aux as failed. A no-op once already failed: the *first*
    /// non-zero code observed by this worker wins.
    pub fn fail(&mut self, rc: Rc) {
        if self.rc.is_ok() {
            self.rc = rc;
        }
    }

    /// Ensures the scratch buffer holds at least `sz` bytes and returns a
    /// pointer to it, or `None` if this aux has already failed or the
    /// reservation itself fails. Marks `rc` on allocation failure.
    ///
    /// Growth-only: shrinking would defeat the point of keeping the buffer
    /// around across passes.
    pub fn alloc(&mut self, sz: usize) -> Option<*mut u8> {
        if !self.rc.is_ok() {
            return None;
        }

        if inject_fault() {
            self.fail(Rc::ALLOC_FAILED);
            return None;
        }

        if self.temp.len() < sz {
            let additional = sz - self.temp.len();
            if self.temp.try_reserve(additional).is_err() {
                self.fail(Rc::ALLOC_FAILED);
                return None;
            }
            self.temp.resize(sz, 0);
        }

        Some(self.temp.as_mut_ptr())
    }
}

impl Default for Aux {
    fn default() -> Self {
        Aux::new()
    }
}

thread_local! {
    // Test instrumentation for the failure-propagation property: lets a test
    // simulate the k-th aux growth failing without actually exhausting
    // process memory. `None` means "never fail". `Some(0)`
    // means "fail on the very next alloc call on this thread", decrementing
    // otherwise.
    static FAULT_COUNTDOWN: Cell<Option<i64>> = Cell::new(None);
}

/// Arranges for the `n`-th call to `Aux::alloc` on the *current thread* to
/// fail (0-indexed). Used only by tests exercising fault injection.
#[doc(hidden)]
pub fn inject_alloc_fault_after(n: i64) {
    FAULT_COUNTDOWN.with(|c| c.set(Some(n)));
}

#[doc(hidden)]
pub fn clear_alloc_fault() {
    FAULT_COUNTDOWN.with(|c| c.set(None));
}

fn inject_fault() -> bool {
    FAULT_COUNTDOWN.with(|c| match c.get() {
        None => false,
        Some(n) if n <= 0 => true,
        Some(n) => {
            c.set(Some(n - 1));
            false
        }
    })
}
