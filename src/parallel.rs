// L4: parallel driver. Spreads the L3 drivers' same presort/merge passes
// over a `WorkerPool`, one `Aux` per spawned task, aggregating each task's
// `Rc` into a single result the way the original rolls worker aux state up
// into its parent's after a join. Falls back to the serial L3 driver
// outright whenever there isn't enough work to be worth spawning over
// (`n < ctx.cut_off`) or the pool has only one worker.

use crate::aux::{Aux, Rc};
use crate::config::BLOCKLEN_MERGE;
use crate::context::SortContext;
use crate::merge::{buffered_merge, inplace_symmerge};
use crate::pool::WorkerPool;

/// Parallel counterpart to `drivers::symmergesort`: forks the two halves of
/// the recursive split across the pool while there's still headroom (and
/// the remaining range is at least `ctx.cut_off`), joins, then symmerges —
/// serially, since the merge step itself isn't split further.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn symmergesort_parallel(ctx: &SortContext, pool: &dyn WorkerPool, lo: usize, hi: usize) {
    if hi - lo < ctx.effective_cut_off() || pool.num_workers() <= 1 {
        crate::drivers::symmergesort(ctx, lo, hi);
        return;
    }

    let mid = lo + (hi - lo) / 2;

    if pool.try_acquire() {
        let join_result = crossbeam::thread::scope(|s| {
            let handle = s.spawn(move |_| unsafe {
                symmergesort_parallel(ctx, pool, lo, mid);
            });
            symmergesort_parallel(ctx, pool, mid, hi);
            handle.join()
        });
        pool.release();
        join_result
            .expect("symmergesort_parallel scope panicked")
            .expect("symmergesort_parallel worker panicked");
    } else {
        symmergesort_parallel(ctx, pool, lo, mid);
        symmergesort_parallel(ctx, pool, mid, hi);
    }

    inplace_symmerge(ctx, lo, mid, hi);
}

/// Parallel counterpart to `drivers::pmergesort`: presorts every block over
/// the pool, then runs each block-doubling merge pass over the pool too,
/// short-circuiting (and propagating) the first worker failure it sees.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`.
pub unsafe fn pmergesort_parallel(ctx: &SortContext, pool: &dyn WorkerPool, lo: usize, hi: usize) -> Rc {
    if hi <= lo {
        return Rc::OK;
    }
    if hi - lo < ctx.effective_cut_off() || pool.num_workers() <= 1 {
        let mut aux = Aux::new();
        return crate::drivers::pmergesort(ctx, &mut aux, lo, hi);
    }

    parallel_presort_pass(ctx, pool, lo, hi, |ctx, a, b| crate::drivers::presort_block(ctx, a, b));
    run_merge_passes(ctx, pool, lo, hi)
}

/// Parallel counterpart to `drivers::wrapmergesort`: same shape as
/// `pmergesort_parallel`, but each block's presort step calls out to
/// `ctx.wsort` instead of the built-in L1 kernels.
///
/// # Safety
/// `[lo, hi)` must be valid, writable element indices into `ctx.base`;
/// `ctx.wsort` must be `Some`.
pub unsafe fn wrapmergesort_parallel(ctx: &SortContext, pool: &dyn WorkerPool, lo: usize, hi: usize) -> Rc {
    if hi <= lo {
        return Rc::OK;
    }
    if hi - lo < ctx.effective_cut_off() || pool.num_workers() <= 1 {
        let mut aux = Aux::new();
        return crate::drivers::wrapmergesort(ctx, &mut aux, lo, hi);
    }

    let wsort = ctx.wsort.expect("wrapmergesort_parallel requires ctx.wsort to be set");
    parallel_presort_pass(ctx, pool, lo, hi, move |ctx, a, b| {
        wsort(unsafe { ctx.elem_ptr(a) }, b - a)
    });
    run_merge_passes(ctx, pool, lo, hi)
}

unsafe fn run_merge_passes(ctx: &SortContext, pool: &dyn WorkerPool, lo: usize, hi: usize) -> Rc {
    let mut block_len = BLOCKLEN_MERGE;
    while block_len < hi - lo {
        let rc = parallel_merge_pass(ctx, pool, lo, hi, block_len);
        if !rc.is_ok() {
            return rc;
        }
        block_len *= 2;
    }
    Rc::OK
}

/// Splits `[lo, hi)` into roughly `pool.num_workers()` contiguous chunks and
/// runs `presort_one` over each `BLOCKLEN_MERGE`-sized block within a chunk
/// on its own worker.
unsafe fn parallel_presort_pass(
    ctx: &SortContext,
    pool: &dyn WorkerPool,
    lo: usize,
    hi: usize,
    presort_one: impl Fn(&SortContext, usize, usize) + Sync + Copy,
) {
    let workers = pool.num_workers().max(1);
    let total = hi - lo;
    if workers <= 1 || total == 0 {
        let mut start = lo;
        while start < hi {
            let end = (start + BLOCKLEN_MERGE).min(hi);
            presort_one(ctx, start, end);
            start = end;
        }
        return;
    }

    let chunk = ((total + workers - 1) / workers).max(BLOCKLEN_MERGE);

    crossbeam::thread::scope(|s| {
        let mut start = lo;
        let mut handles = Vec::new();
        while start < hi {
            let chunk_end = (start + chunk).min(hi);
            handles.push(s.spawn(move |_| {
                let mut b = start;
                while b < chunk_end {
                    let e = (b + BLOCKLEN_MERGE).min(chunk_end);
                    presort_one(ctx, b, e);
                    b = e;
                }
            }));
            start = chunk_end;
        }
        for h in handles {
            h.join().expect("presort worker panicked");
        }
    })
    .expect("presort pass scope panicked");
}

/// Runs one block-doubling merge pass over the pool: collects every
/// adjacent `(block_len, block_len)` pair in `[lo, hi)`, splits the pair
/// list into roughly `pool.num_workers()` groups, and merges each group on
/// its own worker with its own `Aux`, aggregating the resulting `Rc`s
/// first-failure-wins.
unsafe fn parallel_merge_pass(
    ctx: &SortContext,
    pool: &dyn WorkerPool,
    lo: usize,
    hi: usize,
    block_len: usize,
) -> Rc {
    let mut pairs: Vec<(usize, usize, usize)> = Vec::new();
    let mut start = lo;
    while start < hi {
        let mid = (start + block_len).min(hi);
        if mid >= hi {
            break;
        }
        let end = (start + 2 * block_len).min(hi);
        pairs.push((start, mid, end));
        start = end;
    }

    if pairs.is_empty() {
        return Rc::OK;
    }

    let workers = pool.num_workers().max(1);
    if workers <= 1 || pairs.len() <= 1 {
        return merge_group(ctx, &pairs);
    }

    let chunks = workers.min(pairs.len());
    let per_chunk = (pairs.len() + chunks - 1) / chunks;

    let results = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = pairs
            .chunks(per_chunk)
            .map(|group| {
                let group = group.to_vec();
                s.spawn(move |_| unsafe { merge_group(ctx, &group) })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("merge worker panicked"))
            .collect::<Vec<Rc>>()
    })
    .expect("merge pass scope panicked");

    results.into_iter().fold(Rc::OK, |acc, rc| acc.combine(rc))
}

unsafe fn merge_group(ctx: &SortContext, group: &[(usize, usize, usize)]) -> Rc {
    let mut aux = Aux::new();
    let mut rc = Rc::OK;
    for &(a, m, b) in group {
        rc = rc.combine(buffered_merge(ctx, &mut aux, a, m, b));
        if !rc.is_ok() {
            break;
        }
    }
    rc
}
