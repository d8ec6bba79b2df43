// L1: pre-sort kernels. Each turns `[lo, hi)` into one sorted run in place,
// stably, using only O(1) extra state (one scratch element at most). Driven
// once per `B0`-sized block by the L3 drivers; `ctx.presort_kind` picks
// which of the three variants runs.

use crate::context::SortContext;
use crate::merge::inplace_merge;
use crate::primitives::{copy_region, move_region_right};
use crate::rotate::{reverse_region, rotate};
use std::cmp::Ordering;

/// Classical binary-insertion sort: grow the sorted prefix one element at a
/// time, using a binary search for the insertion point and a single shift
/// for the gap.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn binsort(ctx: &SortContext, lo: usize, hi: usize) {
    if hi <= lo + 1 {
        return;
    }

    let sz = ctx.sz;
    let mut hold = vec![0u8; sz];

    for i in (lo + 1)..hi {
        let p_i = ctx.elem_ptr(i);
        let pos = upper_bound(ctx, lo, i, p_i);
        if pos == i {
            continue;
        }

        copy_region(p_i, hold.as_mut_ptr(), sz, ctx.width);
        let p_pos = ctx.elem_ptr(pos);
        move_region_right(p_pos, ctx.elem_ptr(pos + 1), (i - pos) * sz);
        copy_region(hold.as_ptr(), p_pos, sz, ctx.width);
    }
}

/// Finds the first index in `[lo, hi)` whose element compares greater than
/// `*key` — the position `key` must be inserted at to land after every
/// element already equal to it, which is what stability requires of an
/// element that originated later in the array.
unsafe fn upper_bound(ctx: &SortContext, lo: usize, hi: usize, key: *const u8) -> usize {
    let mut l = lo;
    let mut h = hi;
    while l < h {
        let mid = l + (h - l) / 2;
        let p_mid = ctx.elem_ptr(mid);
        if ctx.cmp.compare(key, p_mid) == Ordering::Less {
            h = mid;
        } else {
            l = mid + 1;
        }
    }
    l
}

/// Natural-run-aware binary-insertion sort (spec default). Detects the
/// maximal ascending-or-descending run starting at the current position,
/// reverses it in place if descending, then folds the whole run into the
/// sorted prefix by group rotation (`fold_run_by_rotation`) rather than
/// inserting element by element.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn binsort_run(ctx: &SortContext, lo: usize, hi: usize) {
    if hi <= lo + 1 {
        return;
    }

    let mut i = lo + 1;
    while i < hi {
        let run_end = extend_run(ctx, lo, i, hi);
        fold_run_by_rotation(ctx, lo, i, run_end);
        i = run_end;
    }
}

/// Like `binsort_run`, but folds each detected run into the sorted prefix
/// with the L2 `inplace_merge` kernel rather than `fold_run_by_rotation`.
/// Costs a touch more bookkeeping per run but scales better when the
/// detected run is long.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn binsort_mergerun(ctx: &SortContext, lo: usize, hi: usize) {
    if hi <= lo + 1 {
        return;
    }

    let mut i = lo + 1;
    while i < hi {
        let run_end = extend_run(ctx, lo, i, hi);
        inplace_merge(ctx, lo, i, run_end);
        i = run_end;
    }
}

/// First index in `[lo, hi)` whose element is not less than `*key`.
unsafe fn lower_bound(ctx: &SortContext, lo: usize, hi: usize, key: *const u8) -> usize {
    let mut l = lo;
    let mut h = hi;
    while l < h {
        let mid = l + (h - l) / 2;
        if ctx.cmp.lt(ctx.elem_ptr(mid), key) {
            l = mid + 1;
        } else {
            h = mid;
        }
    }
    l
}

/// Folds the sorted run `[mid, hi)` into the sorted prefix `[lo, mid)` by
/// group rotation: walk the prefix, and at the first out-of-place element,
/// binary-search its destination in the run and rotate that whole matched
/// group of run elements into place ahead of it in one move, rather than
/// shifting the prefix one element at a time the way `binsort` does.
///
/// # Safety
/// `lo <= mid <= hi` and `[lo, hi)` must be valid, writable element indices
/// into `ctx.base`; `[lo, mid)` and `[mid, hi)` must each already be sorted.
unsafe fn fold_run_by_rotation(ctx: &SortContext, lo: usize, mid: usize, hi: usize) {
    let mut lo_cur = lo;
    let mut mid_cur = mid;

    while lo_cur < mid_cur && mid_cur < hi {
        if ctx.cmp.le(ctx.elem_ptr(lo_cur), ctx.elem_ptr(mid_cur)) {
            lo_cur += 1;
            continue;
        }

        let key = ctx.elem_ptr(lo_cur);
        let insert_end = lower_bound(ctx, mid_cur, hi, key);
        rotate(ctx.base, lo_cur, mid_cur, insert_end, ctx.sz, ctx.width);

        let moved = insert_end - mid_cur;
        lo_cur += moved + 1;
        mid_cur = insert_end;
    }
}

/// Extends `[i, i+1)` into the maximal natural run starting at `i`, given
/// that `[lo, i)` is already sorted. Reverses the run in place if it turned
/// out to be strictly descending, so the caller always gets back an
/// ascending `[i, run_end)`.
unsafe fn extend_run(ctx: &SortContext, lo: usize, i: usize, hi: usize) -> usize {
    debug_assert!(i > lo);
    let sz = ctx.sz;
    let mut run_end = i + 1;

    if ctx.cmp.lt(ctx.elem_ptr(i), ctx.elem_ptr(i - 1)) {
        while run_end < hi && ctx.cmp.lt(ctx.elem_ptr(run_end), ctx.elem_ptr(run_end - 1)) {
            run_end += 1;
        }
        reverse_region(ctx.elem_ptr(i), ctx.elem_ptr(run_end), sz, ctx.width);
    } else {
        while run_end < hi && ctx.cmp.le(ctx.elem_ptr(run_end - 1), ctx.elem_ptr(run_end)) {
            run_end += 1;
        }
    }

    run_end
}
