//! Stable, in-place, parallel merge sort built around symmetric in-place
//! merging (SymMerge).
//!
//! The crate is organized in the layers the algorithm itself is organized
//! in: [`primitives`] (element addressing and raw region moves), [`presort`]
//! (the three short-run insertion-sort variants), [`merge`] (the buffered
//! and in-place merge kernels, SymMerge among them), [`drivers`] (the serial
//! sort entry points) and [`parallel`] (the same drivers spread over a
//! [`pool::WorkerPool`]). [`context`] and [`aux`] carry the state those
//! layers share. This top-level module is the public surface: a safe,
//! generic `&mut [T]` API for ordinary callers, and [`raw`] for callers who
//! need the byte-oriented ABI the algorithmic core is actually built on.

use std::cmp::Ordering;

pub mod aux;
pub mod config;
pub mod context;
pub mod drivers;
pub mod error;
pub mod merge;
pub mod parallel;
pub mod pool;
pub mod presort;
pub mod primitives;
pub mod raw;
pub mod rotate;

pub use context::PresortKind;
pub use error::SortError;
pub use pool::{ScopedThreadPool, WorkerPool};

use aux::Rc;
use context::{Comparator, SortContext};

/// `cut_off = isqrt(n) * factor`, floored at the driver's own base-case
/// block length so a call never computes a cut-off smaller than the size at
/// which it would've bottomed out into a presort anyway (spec §4.5, §6).
fn cut_off_for(n: usize, factor: usize, floor: usize) -> Option<usize> {
    Some((config::isqrt(n) * factor).max(floor))
}

fn to_result(rc: Rc, n: usize, sz: usize) -> Result<(), SortError> {
    if rc.is_ok() {
        Ok(())
    } else {
        Err(SortError::AuxAllocFailed { requested: n * sz })
    }
}

/// In-place, stable sort of `data` by `cmp`. Never allocates, so it cannot
/// fail (spec §7: `symmergesort` is "declared infallible under a
/// well-formed comparator"). Parallelizes recursion across a pool sized to
/// the machine's logical CPU count; use [`symmergesort_with_pool`] to supply
/// your own.
pub fn symmergesort<T, F>(data: &mut [T], cmp: F)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let pool = ScopedThreadPool::new();
    symmergesort_with_pool(data, cmp, &pool);
}

/// Like [`symmergesort`], but runs over a caller-supplied [`WorkerPool`]
/// instead of the crate's default `crossbeam`-backed one.
pub fn symmergesort_with_pool<T, F>(data: &mut [T], cmp: F, pool: &dyn WorkerPool)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let n = data.len();
    if n < 2 {
        return;
    }
    let sz = std::mem::size_of::<T>();
    debug_assert!(sz != 0, "symmergesort over zero-sized elements is unspecified");

    log::debug!("symmergesort: n={n} sz={sz} workers={}", pool.num_workers());

    let cmp_fn = move |a: *const u8, b: *const u8| unsafe { cmp(&*(a as *const T), &*(b as *const T)) };
    let comparator = Comparator::Plain(&cmp_fn);
    let cut_off = cut_off_for(n, config::CUTOFF_FACTOR_POOL, config::BLOCKLEN_SYMMERGE);
    let ctx = SortContext::new(
        data.as_mut_ptr() as *mut u8,
        n,
        sz,
        comparator,
        pool.num_workers(),
        cut_off,
    );
    unsafe {
        parallel::symmergesort_parallel(&ctx, pool, 0, n);
    }
}

/// Parallel stable sort of `data` by `cmp`: presorts `B0`-sized blocks, then
/// repeatedly merges adjacent blocks with `buffered_merge`, doubling block
/// length each pass (spec §4.4, "pmergesort"). Fails only if the per-worker
/// scratch buffer a merge pass needs can't be grown; the array is left in
/// some valid (if not fully sorted) permutation of the input on failure —
/// memory-safe, never leaked, never out of bounds (spec §7).
pub fn pmergesort<T, F>(data: &mut [T], cmp: F) -> Result<(), SortError>
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let pool = ScopedThreadPool::new();
    pmergesort_with_pool(data, cmp, &pool)
}

/// Like [`pmergesort`], but runs over a caller-supplied [`WorkerPool`].
pub fn pmergesort_with_pool<T, F>(data: &mut [T], cmp: F, pool: &dyn WorkerPool) -> Result<(), SortError>
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let n = data.len();
    if n < 2 {
        return Ok(());
    }
    let sz = std::mem::size_of::<T>();
    debug_assert!(sz != 0, "pmergesort over zero-sized elements is unspecified");

    log::debug!("pmergesort: n={n} sz={sz} workers={}", pool.num_workers());

    let cmp_fn = move |a: *const u8, b: *const u8| unsafe { cmp(&*(a as *const T), &*(b as *const T)) };
    let comparator = Comparator::Plain(&cmp_fn);
    let cut_off = cut_off_for(n, config::CUTOFF_FACTOR_POOL, config::BLOCKLEN_MERGE);
    let ctx = SortContext::new(
        data.as_mut_ptr() as *mut u8,
        n,
        sz,
        comparator,
        pool.num_workers(),
        cut_off,
    );
    let rc = unsafe { parallel::pmergesort_parallel(&ctx, pool, 0, n) };
    if !rc.is_ok() {
        log::warn!("pmergesort: aux allocation failed, n={n} sz={sz}");
    }
    to_result(rc, n, sz)
}

/// Like [`pmergesort`], but presorts each `B0`-sized block with
/// caller-supplied `user_sort` instead of the built-in binary-insertion
/// kernels (spec §4.4, "wrapmergesort"); subsequent merge passes still use
/// the built-in `buffered_merge`. `user_sort` is invoked concurrently from
/// multiple workers on disjoint blocks, hence `Sync`.
pub fn wrapmergesort<T, F, S>(data: &mut [T], cmp: F, user_sort: S) -> Result<(), SortError>
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
    S: Fn(&mut [T]) + Sync,
{
    let pool = ScopedThreadPool::new();
    wrapmergesort_with_pool(data, cmp, user_sort, &pool)
}

/// Like [`wrapmergesort`], but runs over a caller-supplied [`WorkerPool`].
pub fn wrapmergesort_with_pool<T, F, S>(
    data: &mut [T],
    cmp: F,
    user_sort: S,
    pool: &dyn WorkerPool,
) -> Result<(), SortError>
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
    S: Fn(&mut [T]) + Sync,
{
    let n = data.len();
    if n < 2 {
        return Ok(());
    }
    let sz = std::mem::size_of::<T>();
    debug_assert!(sz != 0, "wrapmergesort over zero-sized elements is unspecified");

    log::debug!("wrapmergesort: n={n} sz={sz} workers={}", pool.num_workers());

    let cmp_fn = move |a: *const u8, b: *const u8| unsafe { cmp(&*(a as *const T), &*(b as *const T)) };
    let comparator = Comparator::Plain(&cmp_fn);
    let wsort_fn = move |base: *mut u8, len: usize| {
        let slice = unsafe { std::slice::from_raw_parts_mut(base as *mut T, len) };
        user_sort(slice);
    };
    let cut_off = cut_off_for(n, config::CUTOFF_FACTOR_POOL, config::BLOCKLEN_MERGE);
    let mut ctx = SortContext::new(
        data.as_mut_ptr() as *mut u8,
        n,
        sz,
        comparator,
        pool.num_workers(),
        cut_off,
    );
    ctx.wsort = Some(&wsort_fn);
    let rc = unsafe { parallel::wrapmergesort_parallel(&ctx, pool, 0, n) };
    if !rc.is_ok() {
        log::warn!("wrapmergesort: aux allocation failed, n={n} sz={sz}");
    }
    to_result(rc, n, sz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_empty_and_singleton_are_noops() {
        let mut v: Vec<i32> = vec![];
        symmergesort(&mut v, |a, b| a.cmp(b));
        assert_eq!(v, Vec::<i32>::new());

        let mut v2 = vec![42];
        assert!(pmergesort(&mut v2, |a, b| a.cmp(b)).is_ok());
        assert_eq!(v2, vec![42]);
    }

    #[test]
    fn test_scenario_pmergesort_dup_values() {
        let mut v = vec![5, 1, 4, 2, 8, 5, 7, 1];
        assert!(pmergesort(&mut v, |a, b| a.cmp(b)).is_ok());
        assert_eq!(v, vec![1, 1, 2, 4, 5, 5, 7, 8]);
    }

    #[test]
    fn test_scenario_wrapmergesort_with_binsort_descending() {
        let mut v: Vec<i32> = (0..1024).rev().collect();
        let rc = wrapmergesort(
            &mut v,
            |a, b| a.cmp(b),
            |chunk| chunk.sort(),
        );
        assert!(rc.is_ok());
        assert_eq!(v, (0..1024).collect::<Vec<_>>());
    }

    #[test]
    fn test_scenario_symmergesort_stability_tags() {
        let data: Vec<(i32, char)> = vec![
            (3, 'a'), (1, 'b'), (4, 'c'), (1, 'd'), (5, 'e'),
            (9, 'f'), (2, 'g'), (6, 'h'), (5, 'i'), (3, 'j'), (5, 'k'),
        ];
        let mut v = data.clone();
        symmergesort(&mut v, |a, b| a.0.cmp(&b.0));

        let mut expected = data.clone();
        expected.sort_by_key(|(val, _)| *val);
        assert_eq!(v, expected);

        for val in [1, 3, 5] {
            let got: Vec<char> = v.iter().filter(|(x, _)| *x == val).map(|(_, t)| *t).collect();
            let want: Vec<char> = data.iter().filter(|(x, _)| *x == val).map(|(_, t)| *t).collect();
            assert_eq!(got, want);
        }
    }

    #[test]
    fn test_reversal_property() {
        let mut v: Vec<i32> = (0..2000).rev().collect();
        assert!(pmergesort(&mut v, |a, b| a.cmp(b)).is_ok());
        assert_eq!(v, (0..2000).collect::<Vec<_>>());
    }

    #[test]
    fn test_idempotence() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut v: Vec<i32> = (0..500).map(|_| rng.gen_range(0..1000)).collect();
        assert!(pmergesort(&mut v, |a, b| a.cmp(b)).is_ok());
        let once = v.clone();
        assert!(pmergesort(&mut v, |a, b| a.cmp(b)).is_ok());
        assert_eq!(v, once);
    }

    #[test]
    fn test_random_large_matches_std_sort() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..20 {
            let len = rng.gen_range(0..5000);
            let max = rng.gen_range(1..200);
            let mut v: Vec<i64> = (0..len).map(|_| rng.gen_range(0..max)).collect();
            let mut expected = v.clone();
            expected.sort();
            assert!(pmergesort(&mut v, |a, b| a.cmp(b)).is_ok());
            assert_eq!(v, expected);

            let mut v2 = expected.clone();
            v2.shuffle_like(&expected, &mut rng);
            symmergesort(&mut v2, |a, b| a.cmp(b));
            assert_eq!(v2, expected);
        }
    }

    trait ShuffleLike {
        fn shuffle_like(&mut self, same_as: &[i64], rng: &mut StdRng);
    }

    impl ShuffleLike for Vec<i64> {
        fn shuffle_like(&mut self, same_as: &[i64], rng: &mut StdRng) {
            self.clear();
            self.extend_from_slice(same_as);
            for i in (1..self.len()).rev() {
                let j = rng.gen_range(0..=i);
                self.swap(i, j);
            }
        }
    }

    #[test]
    fn test_alloc_failure_propagates_as_typed_error() {
        aux::clear_alloc_fault();
        let mut v: Vec<i32> = (0..500).rev().collect();
        aux::inject_alloc_fault_after(0);
        let pool = ScopedThreadPool::with_workers(1);
        let err = pmergesort_with_pool(&mut v, |a, b| a.cmp(b), &pool).unwrap_err();
        assert!(matches!(err, SortError::AuxAllocFailed { .. }));
        aux::clear_alloc_fault();
    }

    #[test]
    fn test_16_byte_elements() {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        struct Wide([u8; 16]);

        let mut rng = StdRng::seed_from_u64(16);
        let mut v: Vec<Wide> = (0..300)
            .map(|_| {
                let mut b = [0u8; 16];
                let key: u32 = rng.gen_range(0..100);
                b[..4].copy_from_slice(&key.to_le_bytes());
                Wide(b)
            })
            .collect();
        let key_of = |w: &Wide| u32::from_le_bytes(w.0[..4].try_into().unwrap());
        let mut expected = v.clone();
        expected.sort_by_key(key_of);

        assert!(pmergesort(&mut v, |a, b| key_of(a).cmp(&key_of(b))).is_ok());
        assert_eq!(v, expected);
    }
}
