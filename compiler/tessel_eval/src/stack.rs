//! Stack growth for deeply nested expression trees.
//!
//! The compiler recurses once per nesting level. Every recursive step goes
//! through [`ensure_sufficient_stack`], which grows the stack through
//! `stacker` when fewer than [`RED_ZONE`] bytes remain.

/// Remaining stack below which a new segment is allocated.
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if it is nearly exhausted.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}
