// The sort context: everything a call shares read-only across every task it
// spawns. Built once at the top of `symmergesort`/`pmergesort`/
// `wrapmergesort` and never mutated afterward — the only per-task mutable
// state is each task's own `Aux` (see `aux.rs`).

use std::cmp::Ordering;

use crate::primitives::ElemWidth;

/// A raw pointer wrapper that asserts `Send + Sync` by fiat, exactly the way
/// `concurrent_merge_sort`'s `SendablePtrWrapper` does: Rust won't let a raw
/// pointer cross a thread boundary on its own, but the sort's own discipline
/// (disjoint slices, one aux per task) is what actually keeps it sound, not
/// anything the type system can see.
#[derive(Clone, Copy)]
pub struct RawPtr<T>(pub *mut T);

unsafe impl<T> Send for RawPtr<T> {}
unsafe impl<T> Sync for RawPtr<T> {}

impl<T> RawPtr<T> {
    #[inline]
    pub fn as_ptr(self) -> *mut T {
        self.0
    }
}

/// Which of the three L1 presort kernels a call uses on each `B0`-sized
/// block. Configurable per spec §4.2; default is `BinsortRun`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresortKind {
    Binsort,
    BinsortRun,
    BinsortMergerun,
}

impl Default for PresortKind {
    fn default() -> Self {
        PresortKind::BinsortRun
    }
}

/// The comparator capability. Two ABI shapes, matching §3 ("cmp — either
/// 'two-pointer' or 'thunk+two-pointer' variant"): a plain comparator over
/// two element pointers, or one that additionally receives an opaque
/// `thunk` pointer supplied by the caller (the `_r` entry points). Both
/// arms must be safely callable from any worker thread concurrently and
/// must be re-entrant.
pub enum Comparator<'a> {
    Plain(&'a (dyn Fn(*const u8, *const u8) -> Ordering + Sync)),
    Thunked(RawPtr<()>, &'a (dyn Fn(*mut (), *const u8, *const u8) -> Ordering + Sync)),
}

impl<'a> Comparator<'a> {
    #[inline]
    pub fn compare(&self, a: *const u8, b: *const u8) -> Ordering {
        match self {
            Comparator::Plain(f) => f(a, b),
            Comparator::Thunked(thunk, f) => f(thunk.as_ptr(), a, b),
        }
    }

    #[inline]
    pub fn le(&self, a: *const u8, b: *const u8) -> bool {
        self.compare(a, b) != Ordering::Greater
    }

    #[inline]
    pub fn lt(&self, a: *const u8, b: *const u8) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// An external presort callable, as used by `wrapmergesort`'s per-block
/// presort step (spec §4.4). Receives the base pointer and element count of
/// the chunk to sort; implicitly shares whatever comparator the caller
/// closed over when constructing it.
pub type WSort<'a> = &'a (dyn Fn(*mut u8, usize) + Sync);

/// Immutable, shared context for one top-level call.
pub struct SortContext<'a> {
    pub base: *mut u8,
    pub n: usize,
    pub sz: usize,
    pub width: ElemWidth,
    pub cmp: Comparator<'a>,

    pub workers: usize,

    /// Subrange size below which a parallel split reverts to serial
    /// execution. `None` forces serial execution everywhere (the "second
    /// snapshot" context from the Open Questions, which omitted the knob
    /// entirely) without having to remove the field.
    pub cut_off: Option<usize>,

    pub presort_kind: PresortKind,
    pub wsort: Option<WSort<'a>>,
}

// `base` is a raw pointer, which makes the struct `!Sync` by default. The
// same discipline that lets `RawPtr` cross threads applies here: every task
// spawned over a `SortContext` operates on a disjoint index range, so
// sharing `&SortContext` across worker threads never produces a data race.
unsafe impl<'a> Sync for SortContext<'a> {}

impl<'a> SortContext<'a> {
    pub fn new(
        base: *mut u8,
        n: usize,
        sz: usize,
        cmp: Comparator<'a>,
        workers: usize,
        cut_off: Option<usize>,
    ) -> Self {
        SortContext {
            base,
            n,
            sz,
            width: ElemWidth::classify(sz),
            cmp,
            workers,
            cut_off,
            presort_kind: PresortKind::default(),
            wsort: None,
        }
    }

    #[inline]
    pub unsafe fn elem_ptr(&self, i: usize) -> *mut u8 {
        crate::primitives::elem_ptr(self.base, i, self.sz)
    }

    /// `cut_off` with the "omitted knob" case resolved to "never parallelize".
    #[inline]
    pub fn effective_cut_off(&self) -> usize {
        self.cut_off.unwrap_or(usize::MAX)
    }
}
