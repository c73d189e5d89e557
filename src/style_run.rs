//! Style Run Table (spec §3, §4.2): an ordered list of maximal,
//! disjoint `[start, end)` ranges over the `CodepointBuffer`, each
//! carrying a sealed `StyleDescriptor`.

use std::sync::Arc;

use crate::{error::LayoutError, style::StyleDescriptor};

/// A single `[start, end)` range paired with its (already sealed)
/// style.
#[derive(Debug, Clone)]
pub struct StyleRun {
    pub start: i32,
    pub end: i32,
    pub style: Arc<StyleDescriptor>,
}

impl StyleRun {
    pub fn len(&self) -> i32 {
        self.end - self.start
    }
}

/// Ordered, gap-free, overlap-free table of `StyleRun`s.
#[derive(Debug, Clone, Default)]
pub struct StyleRunTable {
    runs: Vec<StyleRun>,
}

impl StyleRunTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a run. Callers guarantee ordering and coverage; use
    /// `validate_coverage` before `layout()` to catch violations early
    /// rather than silently producing garbage layout.
    pub fn add_run(&mut self, start: i32, length: i32, style: Arc<StyleDescriptor>) {
        self.runs.push(StyleRun {
            start,
            end: start + length,
            style,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleRun> {
        self.runs.iter()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Binary search for the style covering codepoint `index`.
    pub fn style_at(&self, index: i32) -> Result<&Arc<StyleDescriptor>, LayoutError> {
        self.runs
            .binary_search_by(|run| {
                if index < run.start {
                    std::cmp::Ordering::Greater
                } else if index >= run.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .map(|i| &self.runs[i].style)
            .map_err(|_| LayoutError::IndexOutOfRange {
                index: index as i64,
                len: self.runs.last().map(|r| r.end as i64).unwrap_or(0),
            })
    }

    /// Fail-fast invariant check: runs must be sorted, disjoint, and
    /// cover `[0, buffer_len)` exactly (spec §4.2).
    pub fn validate_coverage(&self, buffer_len: i32) -> Result<(), LayoutError> {
        let mut expected_start = 0;
        for run in &self.runs {
            if run.start != expected_start {
                return Err(LayoutError::MalformedStyleCoverage {
                    expected_start,
                    found_start: run.start,
                });
            }
            expected_start = run.end;
        }
        if expected_start != buffer_len {
            return Err(LayoutError::MalformedStyleCoverage {
                expected_start: buffer_len,
                found_start: expected_start,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleDescriptorBuilder;

    fn style() -> Arc<StyleDescriptor> {
        StyleDescriptorBuilder::new("Helvetica", 14.0).seal()
    }

    #[test]
    fn style_at_finds_covering_run() {
        let mut srt = StyleRunTable::new();
        srt.add_run(0, 5, style());
        srt.add_run(5, 3, style());
        assert!(srt.style_at(0).is_ok());
        assert!(srt.style_at(4).is_ok());
        assert!(srt.style_at(7).is_ok());
        assert!(srt.style_at(8).is_err());
    }

    #[test]
    fn validate_coverage_detects_gap() {
        let mut srt = StyleRunTable::new();
        srt.add_run(0, 5, style());
        srt.add_run(6, 3, style()); // gap at [5,6)
        assert!(srt.validate_coverage(9).is_err());
    }

    #[test]
    fn validate_coverage_detects_short_total() {
        let mut srt = StyleRunTable::new();
        srt.add_run(0, 5, style());
        assert!(srt.validate_coverage(9).is_err());
        assert!(srt.validate_coverage(5).is_ok());
    }
}
