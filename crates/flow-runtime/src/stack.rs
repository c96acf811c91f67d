//! Host stack safety for the recursive parser and evaluator
//!
//! Deeply nested source and deep non-tail recursion both recurse on the
//! host stack. Recursive entry points run through [`ensure_sufficient_stack`],
//! which grows the stack on demand, so the call-depth limit and nesting
//! errors are reached before the host thread overflows.

/// Remaining stack below which a new segment is allocated
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first when less than the red zone remains
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
