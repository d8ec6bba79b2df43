// L2: merge kernels. Each turns two adjacent sorted runs `[lo, mid)` and
// `[mid, hi)` into one sorted run `[lo, hi)`, stably (equal elements keep
// the left run's element first — "take from left on ties").
//
// Three kernels, increasing in cleverness and decreasing in how much extra
// memory they're willing to spend:
//
//   - `buffered_merge`  — copies whichever side is smaller into the aux
//     buffer, merges the rest in the freed space. O(m+n) time, O(min(m,n))
//     space. The only kernel that can fail (aux growth can fail).
//   - `inplace_symmerge` — SymMerge: find the split point by binary search
//     over an antidiagonal, rotate, recurse on both halves. O((m+n) log
//     min(m,n)) time, O(1) extra space.
//   - `inplace_merge` — the simple fallback SymMerge itself bottoms out to:
//     walk the left run, binary- or linear-search each element's
//     destination in the right run, rotate the matched block into place.

use crate::aux::{Aux, Rc};
use crate::context::SortContext;
use crate::config::{MIN_SUBMERGELEN1, MIN_SUBMERGELEN2};
use crate::primitives::copy_region;
use crate::rotate::rotate;
use std::ptr;

/// Merges `[lo, mid)` and `[mid, hi)` using `aux`'s scratch buffer to hold
/// whichever side is smaller, merging the rest into the vacated space.
///
/// # Safety
/// `lo <= mid <= hi` and `[lo, hi)` must be valid, writable element indices
/// into `ctx.base`; `[lo, mid)` and `[mid, hi)` must each already be sorted.
pub unsafe fn buffered_merge(ctx: &SortContext, aux: &mut Aux, lo: usize, mid: usize, hi: usize) -> Rc {
    let left_len = mid - lo;
    let right_len = hi - mid;
    if left_len == 0 || right_len == 0 {
        return Rc::OK;
    }

    let sz = ctx.sz;

    if left_len <= right_len {
        let buf_ptr = match aux.alloc(left_len * sz) {
            Some(p) => p,
            None => return aux.rc(),
        };
        ptr::copy_nonoverlapping(ctx.elem_ptr(lo), buf_ptr, left_len * sz);

        let mut bi = 0usize;
        let mut ri = mid;
        let mut wi = lo;

        while bi < left_len && ri < hi {
            let l_ptr = buf_ptr.add(bi * sz);
            let r_ptr = ctx.elem_ptr(ri);
            if ctx.cmp.le(l_ptr, r_ptr) {
                copy_region(l_ptr, ctx.elem_ptr(wi), sz, ctx.width);
                bi += 1;
            } else {
                copy_region(r_ptr, ctx.elem_ptr(wi), sz, ctx.width);
                ri += 1;
            }
            wi += 1;
        }
        while bi < left_len {
            copy_region(buf_ptr.add(bi * sz), ctx.elem_ptr(wi), sz, ctx.width);
            bi += 1;
            wi += 1;
        }
        // any leftover [ri, hi) is already sitting exactly where it belongs
    } else {
        let buf_ptr = match aux.alloc(right_len * sz) {
            Some(p) => p,
            None => return aux.rc(),
        };
        ptr::copy_nonoverlapping(ctx.elem_ptr(mid), buf_ptr, right_len * sz);

        let mut li = mid;
        let mut bi = right_len;
        let mut wi = hi;

        while li > lo && bi > 0 {
            let l_ptr = ctx.elem_ptr(li - 1);
            let r_ptr = buf_ptr.add((bi - 1) * sz);
            wi -= 1;
            // ties must resolve to the left element landing first, so when
            // filling from the back we place the right element unless it's
            // strictly less than the left one.
            if ctx.cmp.lt(r_ptr, l_ptr) {
                copy_region(l_ptr, ctx.elem_ptr(wi), sz, ctx.width);
                li -= 1;
            } else {
                copy_region(r_ptr, ctx.elem_ptr(wi), sz, ctx.width);
                bi -= 1;
            }
        }
        while bi > 0 {
            wi -= 1;
            bi -= 1;
            copy_region(buf_ptr.add(bi * sz), ctx.elem_ptr(wi), sz, ctx.width);
        }
        // any leftover [lo, li) is already sitting exactly where it belongs
    }

    Rc::OK
}

/// SymMerge: merges `[lo, split)` and `[split, hi)` in place with no
/// auxiliary buffer, by finding a split point via binary search and
/// rotating, then recursing on the two halves either side of it. Bottoms
/// out to `inplace_merge` once either side is down to `MIN_SUBMERGELEN1`
/// elements or fewer, since the recursion's binary search stops paying for
/// itself below that size.
///
/// # Safety
/// `lo <= split <= hi` and `[lo, hi)` must be valid, writable element
/// indices into `ctx.base`; `[lo, split)` and `[split, hi)` must each
/// already be sorted.
pub unsafe fn inplace_symmerge(ctx: &SortContext, lo: usize, split: usize, hi: usize) {
    if split <= lo || hi <= split {
        return;
    }
    if (split - lo) <= MIN_SUBMERGELEN1 || (hi - split) <= MIN_SUBMERGELEN1 {
        inplace_merge(ctx, lo, split, hi);
        return;
    }

    let midpoint = lo + (hi - lo) / 2;
    let n = midpoint + split;
    let (mut start, mut r) = if split > midpoint {
        (n - hi, midpoint)
    } else {
        (lo, split)
    };
    let p = n - 1;

    while start < r {
        let c = start + (r - start) / 2;
        if !ctx.cmp.lt(ctx.elem_ptr(p - c), ctx.elem_ptr(c)) {
            start = c + 1;
        } else {
            r = c;
        }
    }

    let end = n - start;

    if start < split && split < end {
        rotate(ctx.base, start, split, end, ctx.sz, ctx.width);
    }
    if lo < start && start < midpoint {
        inplace_symmerge(ctx, lo, start, midpoint);
    }
    if midpoint < end && end < hi {
        inplace_symmerge(ctx, midpoint, end, hi);
    }
}

/// Merges `[lo, mid)` and `[mid, hi)` in place by walking the left run and,
/// for each element, finding its destination in the right run (binary
/// search above `MIN_SUBMERGELEN2` remaining right elements, linear search
/// at or below it — binary search isn't worth its own overhead on a
/// handful of candidates) and rotating the matched right-hand block into
/// place ahead of it.
///
/// # Safety
/// `lo <= mid <= hi` and `[lo, hi)` must be valid, writable element indices
/// into `ctx.base`; `[lo, mid)` and `[mid, hi)` must each already be sorted.
pub unsafe fn inplace_merge(ctx: &SortContext, lo: usize, mid: usize, hi: usize) {
    let mut lo_cur = lo;
    let mut mid_cur = mid;

    while lo_cur < mid_cur && mid_cur < hi {
        if ctx.cmp.le(ctx.elem_ptr(lo_cur), ctx.elem_ptr(mid_cur)) {
            lo_cur += 1;
            continue;
        }

        let key = ctx.elem_ptr(lo_cur);
        let insert_end = if (hi - mid_cur) <= MIN_SUBMERGELEN2 {
            linear_first_ge(ctx, mid_cur, hi, key)
        } else {
            binary_first_ge(ctx, mid_cur, hi, key)
        };

        rotate(ctx.base, lo_cur, mid_cur, insert_end, ctx.sz, ctx.width);

        let moved = insert_end - mid_cur;
        lo_cur += moved + 1;
        mid_cur = insert_end;
    }
}

/// First index in `[lo, hi)` whose element is not less than `*key`.
unsafe fn binary_first_ge(ctx: &SortContext, lo: usize, hi: usize, key: *const u8) -> usize {
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

unsafe fn linear_first_ge(ctx: &SortContext, lo: usize, hi: usize, key: *const u8) -> usize {
    let mut i = lo;
    while i < hi && ctx.cmp.lt(ctx.elem_ptr(i), key) {
        i += 1;
    }
    i
}
