// L3: serial drivers. These turn a whole `[0, n)` array into one sorted run
// by repeatedly invoking the L1/L2 kernels; the L4 parallel driver
// (`parallel.rs`) calls straight into the same presort/merge entry points
// these use, just spread over a worker pool with each worker owning its own
// `Aux`.

use crate::aux::{Aux, Rc};
use crate::config::{BLOCKLEN_MERGE, BLOCKLEN_SYMMERGE};
use crate::context::{PresortKind, SortContext};
use crate::merge::{buffered_merge, inplace_symmerge};
use crate::presort::{binsort, binsort_mergerun, binsort_run};

pub(crate) fn presort_block(ctx: &SortContext, lo: usize, hi: usize) {
    unsafe {
        match ctx.presort_kind {
            PresortKind::Binsort => binsort(ctx, lo, hi),
            PresortKind::BinsortRun => binsort_run(ctx, lo, hi),
            PresortKind::BinsortMergerun => binsort_mergerun(ctx, lo, hi),
        }
    }
}

/// Recursive, partition-based driver. Splits `[lo, hi)` at its midpoint,
/// sorts each half (bottoming out to a single presort pass once a half is
/// `BLOCKLEN_SYMMERGE` elements or smaller), then symmerges the two halves
/// together. Always in place, never allocates — matches spec §5.1's
/// declared infallibility.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn symmergesort(ctx: &SortContext, lo: usize, hi: usize) {
    if hi - lo <= BLOCKLEN_SYMMERGE {
        presort_block(ctx, lo, hi);
        return;
    }

    let mid = lo + (hi - lo) / 2;
    symmergesort(ctx, lo, mid);
    symmergesort(ctx, mid, hi);
    inplace_symmerge(ctx, lo, mid, hi);
}

/// Block-doubling driver. Presorts every `BLOCKLEN_MERGE`-sized block with
/// the context's chosen L1 kernel, then repeatedly merges adjacent block
/// pairs with `buffered_merge`, doubling the merged block size each pass
/// until one block spans the whole array.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn pmergesort(ctx: &SortContext, aux: &mut Aux, lo: usize, hi: usize) -> Rc {
    let mut start = lo;
    while start < hi {
        let end = (start + BLOCKLEN_MERGE).min(hi);
        presort_block(ctx, start, end);
        start = end;
    }

    merge_passes(ctx, aux, lo, hi, BLOCKLEN_MERGE, |ctx, aux, lo, mid, hi| unsafe {
        buffered_merge(ctx, aux, lo, mid, hi)
    })
}

/// Like `pmergesort`, but delegates each block's presort step to
/// `ctx.wsort` instead of the built-in L1 kernels, so a caller can plug in
/// their own scalar sort for the base case (spec §4.4/§5.3).
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`;
/// `ctx.wsort` must be `Some`.
pub unsafe fn wrapmergesort(ctx: &SortContext, aux: &mut Aux, lo: usize, hi: usize) -> Rc {
    let wsort = ctx.wsort.expect("wrapmergesort requires ctx.wsort to be set");

    let mut start = lo;
    while start < hi {
        let end = (start + BLOCKLEN_MERGE).min(hi);
        wsort(ctx.elem_ptr(start), end - start);
        start = end;
    }

    merge_passes(ctx, aux, lo, hi, BLOCKLEN_MERGE, |ctx, aux, lo, mid, hi| unsafe {
        buffered_merge(ctx, aux, lo, mid, hi)
    })
}

/// Drives the block-doubling merge phase shared by `pmergesort` and
/// `wrapmergesort`: given blocks of uniform size `block_len` already
/// individually sorted, repeatedly merges adjacent pairs with `merge_fn`,
/// doubling the block size, until a single pass covers `[lo, hi)`.
unsafe fn merge_passes(
    ctx: &SortContext,
    aux: &mut Aux,
    lo: usize,
    hi: usize,
    mut block_len: usize,
    merge_fn: impl Fn(&SortContext, &mut Aux, usize, usize, usize) -> Rc,
) -> Rc {
    while block_len < hi - lo {
        let mut start = lo;
        while start < hi {
            let mid = (start + block_len).min(hi);
            if mid >= hi {
                break;
            }
            let end = (start + 2 * block_len).min(hi);
            let rc = merge_fn(ctx, aux, start, mid, end);
            if !rc.is_ok() {
                return rc;
            }
            start = end;
        }
        block_len *= 2;
    }
    Rc::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Comparator;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ctx_for(v: &mut [i32]) -> SortContext<'static> {
        let cmp = |a: *const u8, b: *const u8| unsafe {
            (*(a as *const i32)).cmp(&*(b as *const i32))
        };
        let comparator = Comparator::Plain(Box::leak(Box::new(cmp)));
        SortContext::new(v.as_mut_ptr() as *mut u8, v.len(), 4, comparator, 1, Some(usize::MAX))
    }

    #[test]
    fn test_symmergesort_random_against_std_sort() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let len = rng.gen_range(0..500);
            let max = rng.gen_range(1..50);
            let mut v: Vec<i32> = (0..len).map(|_| rng.gen_range(0..max)).collect();
            let mut expected = v.clone();
            expected.sort();
            let ctx = ctx_for(&mut v);
            let n = ctx.n;
            unsafe {
                symmergesort(&ctx, 0, n);
            }
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn test_pmergesort_random_against_std_sort() {
        let mut rng = StdRng::seed_from_u64(100);
        for _ in 0..100 {
            let len = rng.gen_range(0..500);
            let max = rng.gen_range(1..50);
            let mut v: Vec<i32> = (0..len).map(|_| rng.gen_range(0..max)).collect();
            let mut expected = v.clone();
            expected.sort();
            let ctx = ctx_for(&mut v);
            let n = ctx.n;
            let mut aux = Aux::new();
            let rc = unsafe { pmergesort(&ctx, &mut aux, 0, n) };
            assert!(rc.is_ok());
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn test_wrapmergesort_delegates_presort() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let wsort = |base: *mut u8, n: usize| {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let slice = unsafe { std::slice::from_raw_parts_mut(base as *mut i32, n) };
            slice.sort();
        };

        let mut rng = StdRng::seed_from_u64(101);
        let len = rng.gen_range(1..500usize);
        let mut v: Vec<i32> = (0..len).map(|_| rng.gen_range(0..50)).collect();
        let mut expected = v.clone();
        expected.sort();

        let mut ctx = ctx_for(&mut v);
        ctx.wsort = Some(&wsort);
        let n = ctx.n;
        let mut aux = Aux::new();
        let rc = unsafe { wrapmergesort(&ctx, &mut aux, 0, n) };
        assert!(rc.is_ok());
        assert_eq!(v, expected);
        assert!(calls.load(std::sync::atomic::Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_pmergesort_reports_alloc_failure() {
        crate::aux::clear_alloc_fault();
        // large enough to need more than one merge pass, so the injected
        // failure actually lands inside a buffered_merge call.
        let mut v: Vec<i32> = (0..200).rev().collect();
        let ctx = ctx_for(&mut v);
        let n = ctx.n;
        let mut aux = Aux::new();
        crate::aux::inject_alloc_fault_after(0);
        let rc = unsafe { pmergesort(&ctx, &mut aux, 0, n) };
        assert!(!rc.is_ok());
        crate::aux::clear_alloc_fault();
    }

    #[test]
    fn test_empty_and_singleton() {
        let mut v: Vec<i32> = vec![];
        let ctx = ctx_for(&mut v);
        unsafe {
            symmergesort(&ctx, 0, 0);
        }

        let mut v2 = vec![42];
        let ctx2 = ctx_for(&mut v2);
        unsafe {
            symmergesort(&ctx2, 0, 1);
        }
        assert_eq!(v2, vec![42]);
    }
}
