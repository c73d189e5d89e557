//! Line (spec §3): an ordered, visually-left-to-right sequence of
//! `FontRun`s produced by the Line Builder, plus vertical metrics.
//!
//! A `Line` never owns its runs: it stores indices into the
//! `TextBlock`'s flat `font_runs` vector, matching the "back-references
//! are relations, not ownership" design note (spec §9): this keeps the
//! Line <-> FontRun relationship acyclic without reference counting.

/// One laid-out line of text.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Indices into the owning `TextBlock::font_runs`, in final visual
    /// (left-to-right) order.
    pub run_indices: Vec<usize>,
    pub y_coord: f32,
    pub height: f32,
    pub baseline: f32,
    /// Sum of visible run widths, excluding any trailing-whitespace run
    /// (spec §4.5 step 5, §3 glossary "Trailing whitespace").
    pub width: f32,
    pub left_overhang: f32,
    pub right_overhang: f32,
}
