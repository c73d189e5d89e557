//! Crate-wide error type.
//!
//! Every fallible public operation returns `Result<T, LayoutError>`.
//! Programmer errors (sealed-style mutation, out-of-range indices,
//! malformed style coverage) are still returned as typed values instead
//! of panicking, so hosts embedding this engine (editors, renderers,
//! test harnesses) can decide how to react.

use thiserror::Error;

/// The single error type produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A `StyleDescriptor` was mutated after `seal()` was called on it.
    #[error("attempted to mutate a sealed style descriptor")]
    SealedStyleMutation,

    /// An index passed to a query (hit-test, split, caret lookup) was
    /// outside the valid range for the buffer it addresses.
    #[error("index {index} out of range (len = {len})")]
    IndexOutOfRange { index: i64, len: i64 },

    /// The `StyleRunTable` supplied to `layout()` has a gap or overlap
    /// rather than exactly covering `[0, CB.len())`.
    #[error(
        "malformed style coverage: run starting at {found_start} does not continue from \
         expected offset {expected_start}"
    )]
    MalformedStyleCoverage { expected_start: i32, found_start: i32 },

    /// Attempted to split a `FontRun` at a codepoint outside its
    /// `(start, start+length)` open interval.
    #[error("split point {split_at} is not strictly interior to font run [{start}, {end})")]
    InvalidSplitPoint { split_at: i32, start: i32, end: i32 },

    /// Raised by a `Shaper`/`FontMatcher` implementation when it cannot
    /// proceed at all (not the same as "no glyph for this codepoint",
    /// which is handled locally via the replacement-character fallback
    /// in `FontRunBuilder`).
    #[error("shaper or font matcher backend failed: {0}")]
    BackendFailure(String),
}
