// Rotation: the one primitive `inplace_symmerge` and `inplace_merge` share
// to turn "two sorted segments with a known split point" into "one sorted
// segment" without a full-sized auxiliary buffer. Two strategies, picked by
// how small the smaller side is (Design Notes, "Rotation primitive"):
//
//   - below `config::TMP_ROT` elements: stash the smaller side in a small
//     stack buffer, `memmove` the larger side into place, paste the stash
//     back in.
//   - otherwise: the three-reversal trick, `reverse(a,m); reverse(m,b);
//     reverse(a,b)`, which needs no extra memory at all.
//
// Both are length-preserving permutations of `[lo, hi)`; neither looks at
// element contents beyond what `swap_regions`/`copy_region` already require.

use crate::config::TMP_ROT;
use crate::primitives::{elem_ptr, move_region_left, move_region_right, swap_regions, ElemWidth};
use std::ptr;

/// Stack buffer big enough for `TMP_ROT` elements up to 128 bytes each. Sized
/// generously for the common case (small PODs); anything larger silently
/// falls back to the three-reversal trick, which is always correct.
const STACK_ROT_BYTES: usize = TMP_ROT * 128;

/// Rotates `[lo, hi)` so that `[mid, hi)` ends up first, followed by
/// `[lo, mid)`. Equivalent to a left-rotation by `mid - lo` positions.
///
/// # Safety
/// `lo <= mid <= hi` and `[lo, hi)` must be valid, writable element indices
/// into `base`.
pub unsafe fn rotate(base: *mut u8, lo: usize, mid: usize, hi: usize, sz: usize, width: ElemWidth) {
    let left_len = mid - lo;
    let right_len = hi - mid;

    if left_len == 0 || right_len == 0 {
        return;
    }

    let smaller = left_len.min(right_len);
    if smaller <= TMP_ROT && smaller * sz <= STACK_ROT_BYTES {
        rotate_buffered(base, lo, mid, hi, sz);
    } else {
        rotate_by_reversal(base, lo, mid, hi, sz, width);
    }
}

unsafe fn rotate_by_reversal(
    base: *mut u8,
    lo: usize,
    mid: usize,
    hi: usize,
    sz: usize,
    width: ElemWidth,
) {
    let p_lo = elem_ptr(base, lo, sz);
    let p_mid = elem_ptr(base, mid, sz);
    let p_hi = elem_ptr(base, hi, sz);
    reverse_region(p_lo, p_mid, sz, width);
    reverse_region(p_mid, p_hi, sz, width);
    reverse_region(p_lo, p_hi, sz, width);
}

/// Reverses the elements in `[a, b)` (`b` one-past-the-last element).
pub(crate) unsafe fn reverse_region(mut a: *mut u8, mut b: *mut u8, sz: usize, width: ElemWidth) {
    while a < b {
        b = b.sub(sz);
        if a == b {
            break;
        }
        swap_regions(a, b, sz, width);
        a = a.add(sz);
    }
}

unsafe fn rotate_buffered(base: *mut u8, lo: usize, mid: usize, hi: usize, sz: usize) {
    let left_len = mid - lo;
    let right_len = hi - mid;
    let p_lo = elem_ptr(base, lo, sz);
    let p_mid = elem_ptr(base, mid, sz);

    let mut stash = [0u8; STACK_ROT_BYTES];
    let stash_ptr = stash.as_mut_ptr();

    if left_len <= right_len {
        // stash L, shift R left onto L's spot, paste L after the shifted R
        ptr::copy_nonoverlapping(p_lo, stash_ptr, left_len * sz);
        move_region_left(p_mid, p_lo, right_len * sz);
        ptr::copy_nonoverlapping(stash_ptr, p_lo.add(right_len * sz), left_len * sz);
    } else {
        // stash R, shift L right onto R's spot, paste R before the shifted L
        ptr::copy_nonoverlapping(p_mid, stash_ptr, right_len * sz);
        move_region_right(p_lo, p_lo.add(right_len * sz), left_len * sz);
        ptr::copy_nonoverlapping(stash_ptr, p_lo, right_len * sz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn rotate_u32(v: &mut [u32], mid: usize) {
        let base = v.as_mut_ptr() as *mut u8;
        rotate(base, 0, mid, v.len(), 4, ElemWidth::Four);
    }

    #[test]
    fn test_rotate_small_both_sides() {
        let mut v: Vec<u32> = (0..6).collect();
        unsafe {
            rotate_u32(&mut v, 2);
        }
        assert_eq!(v, vec![2, 3, 4, 5, 0, 1]);
    }

    #[test]
    fn test_rotate_large_triggers_reversal_path() {
        let n = 200;
        let mid = 37;
        let mut v: Vec<u32> = (0..n).collect();
        let mut expected: Vec<u32> = (mid..n).chain(0..mid).collect();
        unsafe {
            rotate_u32(&mut v, mid as usize);
        }
        assert_eq!(v, expected);
        expected.clear();
    }

    #[test]
    fn test_rotate_edge_cases() {
        let mut v: Vec<u32> = (0..5).collect();
        unsafe {
            rotate_u32(&mut v, 0);
        }
        assert_eq!(v, vec![0, 1, 2, 3, 4]);

        let mut v2: Vec<u32> = (0..5).collect();
        unsafe {
            rotate_u32(&mut v2, 5);
        }
        assert_eq!(v2, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_rotate_generic_width_non_word_size() {
        // element size 6 bytes: exercises the `Generic` word-dispatch path.
        let sz = 6usize;
        let n = 20usize;
        let mut buf = vec![0u8; n * sz];
        for i in 0..n {
            buf[i * sz] = i as u8;
        }
        let base = buf.as_mut_ptr();
        let mid = 7usize;
        unsafe {
            rotate(base, 0, mid, n, sz, ElemWidth::Generic);
        }
        let tags: Vec<u8> = (0..n).map(|i| buf[i * sz]).collect();
        let expected: Vec<u8> = (mid as u8..n as u8).chain(0..mid as u8).collect();
        assert_eq!(tags, expected);
    }
}
