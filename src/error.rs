// The only error this crate's public API can produce: the bounded
// auxiliary buffer `buffered_merge` needs couldn't grow far enough. Every
// other precondition a C-style ABI has to check at runtime (null base,
// zero `sz`, `workers == 0`, ...) is ruled out by construction once the
// call is expressed against a typed `&mut [T]` and a real `WorkerPool`
// (the `lib.rs` surface), so there's nothing else for this enum to name.
// The `raw` module's byte-oriented ABI keeps those preconditions as an
// `unsafe fn` contract instead, the same way the rest of this crate's raw
// layer does.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    /// The aux buffer could not grow to cover an in-flight merge. `requested`
    /// is an upper bound on the largest single allocation the call could
    /// have attempted (the full extent being sorted), not the exact failed
    /// size — `buffered_merge` always asks for the smaller of its two
    /// sides, so the true figure is somewhere at or below this.
    #[error("auxiliary buffer allocation failed (upper bound: {requested} bytes)")]
    AuxAllocFailed { requested: usize },
}
