//! Stack safety for deeply nested resolution.

/// Grow the stack if less than 256KB remain, allocating 2MB segments.
pub fn ensure_sufficient_stack<R, F: FnOnce() -> R>(f: F) -> R {
    stacker::maybe_grow(256 * 1024, 2 * 1024 * 1024, f)
}
