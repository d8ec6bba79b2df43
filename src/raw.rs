//! The byte-oriented ABI the algorithmic core is actually written against
//! (spec §6): six entry points over a raw `base`/`n`/`sz` array and a
//! comparator that is either a plain two-pointer function or one that
//! additionally receives an opaque `thunk` pointer (the `_r` variants).
//! Ordinary callers want the typed, safe wrappers at the crate root instead;
//! this module exists for callers crossing an FFI boundary, or building
//! their own typed layer with a different shape than `&mut [T]`.

use crate::config;
use crate::context::{Comparator, RawPtr, SortContext};
use crate::error::SortError;
use crate::parallel;
use crate::pool::{ScopedThreadPool, WorkerPool};

/// C-ABI comparator: negative/zero/positive per the usual convention.
pub type CmpFn = unsafe extern "C" fn(*const u8, *const u8) -> i32;

/// C-ABI comparator carrying an opaque context pointer as its first
/// argument (the `_r` shape).
pub type CmpFnR = unsafe extern "C" fn(*mut (), *const u8, *const u8) -> i32;

/// C-ABI per-block presort callable, as used by `wrapmergesort`/
/// `wrapmergesort_r`.
pub type WSortFn = unsafe extern "C" fn(*mut u8, usize);

/// C-ABI per-block presort callable carrying an opaque context pointer.
pub type WSortFnR = unsafe extern "C" fn(*mut (), *mut u8, usize);

fn ordering_from_c(rc: i32) -> std::cmp::Ordering {
    rc.cmp(&0)
}

fn default_pool_and_cutoff(n: usize, floor: usize) -> (ScopedThreadPool, Option<usize>) {
    let pool = ScopedThreadPool::new();
    let cut_off = Some((config::isqrt(n) * config::CUTOFF_FACTOR_POOL).max(floor));
    (pool, cut_off)
}

/// In-place stable sort; never allocates.
///
/// # Safety
/// `base` must point to `n` valid, writable, mutually non-overlapping
/// elements of size `sz` (`sz != 0`); `cmp` must be callable concurrently
/// from any thread and must define a weak total order over those elements.
pub unsafe fn symmergesort(base: *mut u8, n: usize, sz: usize, cmp: CmpFn) {
    let cmp_fn = move |a: *const u8, b: *const u8| ordering_from_c(cmp(a, b));
    let comparator = Comparator::Plain(&cmp_fn);
    run_symmergesort(base, n, sz, comparator)
}

/// Like [`symmergesort`], but `cmp` receives `thunk` as its first argument
/// (spec §6, the `_r` ABI variant).
///
/// # Safety
/// Same as [`symmergesort`]; additionally `thunk` must be a valid argument
/// for `cmp` for the duration of the call, from any thread `cmp` is invoked
/// on.
pub unsafe fn symmergesort_r(base: *mut u8, n: usize, sz: usize, cmp: CmpFnR, thunk: *mut ()) {
    let cmp_fn = move |t: *mut (), a: *const u8, b: *const u8| ordering_from_c(cmp(t, a, b));
    let comparator = Comparator::Thunked(RawPtr(thunk), &cmp_fn);
    run_symmergesort(base, n, sz, comparator)
}

unsafe fn run_symmergesort(base: *mut u8, n: usize, sz: usize, comparator: Comparator) {
    if n < 2 {
        return;
    }
    debug_assert!(sz != 0, "symmergesort over zero-sized elements is unspecified");
    let (pool, cut_off) = default_pool_and_cutoff(n, config::BLOCKLEN_SYMMERGE);
    let ctx = SortContext::new(base, n, sz, comparator, pool.num_workers(), cut_off);
    parallel::symmergesort_parallel(&ctx, &pool, 0, n);
}

/// Parallel stable sort. Returns `Ok(())` on success, `Err` if a per-worker
/// scratch buffer a merge pass needed could not be grown.
///
/// # Safety
/// Same as [`symmergesort`].
pub unsafe fn pmergesort(base: *mut u8, n: usize, sz: usize, cmp: CmpFn) -> Result<(), SortError> {
    let cmp_fn = move |a: *const u8, b: *const u8| ordering_from_c(cmp(a, b));
    let comparator = Comparator::Plain(&cmp_fn);
    run_pmergesort(base, n, sz, comparator)
}

/// Like [`pmergesort`], but `cmp` receives `thunk` as its first argument.
///
/// # Safety
/// Same as [`symmergesort_r`].
pub unsafe fn pmergesort_r(
    base: *mut u8,
    n: usize,
    sz: usize,
    cmp: CmpFnR,
    thunk: *mut (),
) -> Result<(), SortError> {
    let cmp_fn = move |t: *mut (), a: *const u8, b: *const u8| ordering_from_c(cmp(t, a, b));
    let comparator = Comparator::Thunked(RawPtr(thunk), &cmp_fn);
    run_pmergesort(base, n, sz, comparator)
}

unsafe fn run_pmergesort(base: *mut u8, n: usize, sz: usize, comparator: Comparator) -> Result<(), SortError> {
    if n < 2 {
        return Ok(());
    }
    debug_assert!(sz != 0, "pmergesort over zero-sized elements is unspecified");
    let (pool, cut_off) = default_pool_and_cutoff(n, config::BLOCKLEN_MERGE);
    let ctx = SortContext::new(base, n, sz, comparator, pool.num_workers(), cut_off);
    let rc = parallel::pmergesort_parallel(&ctx, &pool, 0, n);
    if rc.is_ok() {
        Ok(())
    } else {
        Err(SortError::AuxAllocFailed { requested: n * sz })
    }
}

/// Like [`pmergesort`], but delegates each `B0`-sized block's presort step
/// to `wsort`.
///
/// # Safety
/// Same as [`pmergesort`]; additionally `wsort` must be safely callable
/// concurrently from any thread, on any disjoint `[base, base + len*sz)`
/// subrange of the array.
pub unsafe fn wrapmergesort(
    base: *mut u8,
    n: usize,
    sz: usize,
    cmp: CmpFn,
    wsort: WSortFn,
) -> Result<(), SortError> {
    let cmp_fn = move |a: *const u8, b: *const u8| ordering_from_c(cmp(a, b));
    let comparator = Comparator::Plain(&cmp_fn);
    let wsort_fn = move |p: *mut u8, len: usize| wsort(p, len);
    run_wrapmergesort(base, n, sz, comparator, &wsort_fn)
}

/// Like [`wrapmergesort`], but `cmp` and `wsort` each receive `thunk` as
/// their first argument.
///
/// # Safety
/// Same as [`pmergesort_r`] combined with [`wrapmergesort`].
pub unsafe fn wrapmergesort_r(
    base: *mut u8,
    n: usize,
    sz: usize,
    cmp: CmpFnR,
    wsort: WSortFnR,
    thunk: *mut (),
) -> Result<(), SortError> {
    let cmp_fn = move |t: *mut (), a: *const u8, b: *const u8| ordering_from_c(cmp(t, a, b));
    let comparator = Comparator::Thunked(RawPtr(thunk), &cmp_fn);
    let thunk_ptr = RawPtr(thunk);
    let wsort_fn = move |p: *mut u8, len: usize| wsort(thunk_ptr.as_ptr(), p, len);
    run_wrapmergesort(base, n, sz, comparator, &wsort_fn)
}

unsafe fn run_wrapmergesort(
    base: *mut u8,
    n: usize,
    sz: usize,
    comparator: Comparator,
    wsort_fn: &(dyn Fn(*mut u8, usize) + Sync),
) -> Result<(), SortError> {
    if n < 2 {
        return Ok(());
    }
    debug_assert!(sz != 0, "wrapmergesort over zero-sized elements is unspecified");
    let (pool, cut_off) = default_pool_and_cutoff(n, config::BLOCKLEN_MERGE);
    let mut ctx = SortContext::new(base, n, sz, comparator, pool.num_workers(), cut_off);
    ctx.wsort = Some(wsort_fn);
    let rc = parallel::wrapmergesort_parallel(&ctx, &pool, 0, n);
    if rc.is_ok() {
        Ok(())
    } else {
        Err(SortError::AuxAllocFailed { requested: n * sz })
    }
}
