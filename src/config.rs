// Tunables for the sort engine. Mirrors the single block of `#define _CFG_*`
// constants the algorithm is usually shipped with: one place to retune block
// sizes and fallback thresholds without touching the kernels themselves.

/// Base case size for the recursive `symmergesort` driver.
pub const BLOCKLEN_SYMMERGE: usize = 32;

/// Initial block size `B0` for the block-doubling `pmergesort`/`wrapmergesort` driver.
pub const BLOCKLEN_MERGE: usize = 32;

/// Short-side threshold below which `inplace_symmerge` falls back to `inplace_merge`.
pub const MIN_SUBMERGELEN1: usize = 8;

/// Short-side threshold below which `inplace_merge` falls back from binary to linear
/// search for the destination of an element.
pub const MIN_SUBMERGELEN2: usize = 4;

/// Max element count a rotation keeps in a stack buffer before switching to the
/// three-reversal trick.
pub const TMP_ROT: usize = 8;

/// `k` in `cut_off = isqrt(n) * k`, for a pool-based worker model (the one this
/// crate ships). Larger than the queue-based factor because pool task overhead
/// is higher than a lock-free queue's.
pub const CUTOFF_FACTOR_POOL: usize = 16;

/// `k` in `cut_off = isqrt(n) * k`, for a queue-based worker model. Kept around
/// so a caller supplying their own `WorkerPool` over a work-stealing queue can
/// ask for the smaller, more aggressive cut-off.
pub const CUTOFF_FACTOR_QUEUE: usize = 4;

/// Integer square root via Newton's method, used to derive `cut_off` from `n`.
pub fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }

    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(2), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(1_000_000), 1000);

        for n in 0..2000 {
            let r = isqrt(n);
            assert!(r * r <= n);
            assert!((r + 1) * (r + 1) > n);
        }
    }
}
