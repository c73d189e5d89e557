//! Font Run (spec §3, §4.4): a maximal contiguous codepoint range
//! shaped with a single typeface at a single direction.

use crate::{error::LayoutError, shaping::Direction};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FontRunKind {
    Normal,
    TrailingWhitespace,
    Ellipsis,
}

/// Ascent/descent/leading for the typeface+size a `FontRun` was shaped
/// with, already scaled to that size (not font units).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
}

/// A physical, shaped run of glyphs (spec §3). Generic over the
/// opaque typeface handle type so the engine never depends on a
/// concrete font backend.
#[derive(Debug, Clone)]
pub struct FontRun<T: Clone + PartialEq> {
    pub kind: FontRunKind,
    /// Index into the owning `StyleRunTable` this run was shaped from.
    pub style_run_index: usize,
    /// Half-open UTF-32 codepoint range `[start, start+length)`.
    pub start: i32,
    pub length: i32,
    pub direction: Direction,
    pub typeface: T,
    pub metrics: FontMetrics,
    pub glyphs: Vec<u16>,
    pub positions: Vec<(f32, f32)>,
    /// Codepoint index (absolute, in `CodepointBuffer` space) each
    /// glyph maps to.
    pub clusters: Vec<i32>,
    /// Per-codepoint leading x-coordinate within the run, length
    /// `length + 1`: `relative_cp_x[i]` is the leading edge of
    /// codepoint `start + i`; `relative_cp_x[length] == width` (LTR)
    /// by construction (spec §3, §4.3 step 4).
    pub relative_cp_x: Vec<f32>,
    pub width: f32,
    /// Absolute x position within the owning `Line`, set at line
    /// assignment (spec §4.5 step 7).
    pub x_coord: f32,
    /// Back-reference to the owning `Line`, set at line assignment.
    pub line_index: Option<usize>,
    /// Copied from the owning `StyleDescriptor` at shaping time; scales
    /// this run's contribution to its line's height (spec §4.5 step 8).
    pub line_height_multiplier: f32,
}

impl<T: Clone + PartialEq> FontRun<T> {
    pub fn end(&self) -> i32 {
        self.start + self.length
    }

    /// Checks the structural invariants from spec §3. Intended for use
    /// in tests and debug assertions, not the hot layout path.
    pub fn check_invariants(&self) -> Result<(), LayoutError> {
        if self.glyphs.len() != self.positions.len() || self.glyphs.len() != self.clusters.len() {
            return Err(LayoutError::BackendFailure(
                "glyphs/positions/clusters length mismatch".into(),
            ));
        }
        for &c in &self.clusters {
            if c < self.start || c >= self.end() {
                return Err(LayoutError::BackendFailure(format!(
                    "cluster {c} outside font run range [{}, {})",
                    self.start,
                    self.end()
                )));
            }
        }
        let non_decreasing = self.clusters.windows(2).all(|w| w[0] <= w[1]);
        let non_increasing = self.clusters.windows(2).all(|w| w[0] >= w[1]);
        let ordered = match self.direction {
            Direction::Ltr => non_decreasing,
            Direction::Rtl => non_increasing,
        };
        if !ordered {
            return Err(LayoutError::BackendFailure(
                "clusters are not monotonic in the run's direction".into(),
            ));
        }
        if self.relative_cp_x.len() != self.length as usize + 1 {
            return Err(LayoutError::BackendFailure(
                "relative_cp_x length must be run length + 1".into(),
            ));
        }
        Ok(())
    }

    /// Split this run at codepoint `p`, strictly interior to
    /// `(start, start+length)`. Returns `(left, right)` in *logical*
    /// order; the caller is responsible for re-threading `line_index`
    /// and invalidating any cached paint artifacts (spec §4.4).
    pub fn split(&self, p: i32) -> Result<(FontRun<T>, FontRun<T>), LayoutError> {
        if p <= self.start || p >= self.end() {
            return Err(LayoutError::InvalidSplitPoint {
                split_at: p,
                start: self.start,
                end: self.end(),
            });
        }
        let cp_split = (p - self.start) as usize;

        match self.direction {
            Direction::Ltr => self.split_ltr(p, cp_split),
            Direction::Rtl => self.split_rtl(p, cp_split),
        }
    }

    fn split_ltr(&self, p: i32, cp_split: usize) -> Result<(FontRun<T>, FontRun<T>), LayoutError> {
        // Smallest glyph index whose cluster >= p: whole clusters stay together.
        let glyph_split = self
            .clusters
            .iter()
            .position(|&c| c >= p)
            .unwrap_or(self.glyphs.len());

        let left_width = self.relative_cp_x[cp_split];

        let left = FontRun {
            kind: self.kind,
            style_run_index: self.style_run_index,
            start: self.start,
            length: p - self.start,
            direction: self.direction,
            typeface: self.typeface.clone(),
            metrics: self.metrics,
            glyphs: self.glyphs[..glyph_split].to_vec(),
            positions: self.positions[..glyph_split].to_vec(),
            clusters: self.clusters[..glyph_split].to_vec(),
            relative_cp_x: self.relative_cp_x[..=cp_split].to_vec(),
            width: left_width,
            x_coord: self.x_coord,
            line_index: None,
            line_height_multiplier: self.line_height_multiplier,
        };

        let right = FontRun {
            kind: self.kind,
            style_run_index: self.style_run_index,
            start: p,
            length: self.end() - p,
            direction: self.direction,
            typeface: self.typeface.clone(),
            metrics: self.metrics,
            glyphs: self.glyphs[glyph_split..].to_vec(),
            positions: self.positions[glyph_split..]
                .iter()
                .map(|&(x, y)| (x - left_width, y))
                .collect(),
            clusters: self.clusters[glyph_split..].to_vec(),
            relative_cp_x: self.relative_cp_x[cp_split..]
                .iter()
                .map(|&x| x - left_width)
                .collect(),
            width: self.width - left_width,
            x_coord: self.x_coord + left_width,
            line_index: None,
            line_height_multiplier: self.line_height_multiplier,
        };

        Ok((left, right))
    }

    fn split_rtl(&self, p: i32, cp_split: usize) -> Result<(FontRun<T>, FontRun<T>), LayoutError> {
        // Largest glyph index whose cluster >= p, plus one: whole
        // clusters assigned to the (logically later, visually left)
        // side.
        let glyph_split = self
            .clusters
            .iter()
            .rposition(|&c| c >= p)
            .map(|i| i + 1)
            .unwrap_or(0);

        // In RTL, relative_cp_x[0] == width (right edge) and it
        // decreases toward relative_cp_x[length] == 0 (left edge).
        // The logical-right half `[start, p)` occupies the visually
        // *right* portion, i.e. the high end of relative_cp_x.
        let split_x = self.relative_cp_x[cp_split];
        let right_half_width = self.width - split_x; // logical [start, p)
        let left_half_width = split_x; // logical [p, end)

        let logical_left = FontRun {
            kind: self.kind,
            style_run_index: self.style_run_index,
            start: self.start,
            length: p - self.start,
            direction: self.direction,
            typeface: self.typeface.clone(),
            metrics: self.metrics,
            glyphs: self.glyphs[glyph_split..].to_vec(),
            positions: self.positions[glyph_split..]
                .iter()
                .map(|&(x, y)| (x - left_half_width, y))
                .collect(),
            clusters: self.clusters[glyph_split..].to_vec(),
            relative_cp_x: self.relative_cp_x[..=cp_split]
                .iter()
                .map(|&x| x - left_half_width)
                .collect(),
            width: right_half_width,
            x_coord: self.x_coord + left_half_width,
            line_index: None,
            line_height_multiplier: self.line_height_multiplier,
        };

        let logical_right = FontRun {
            kind: self.kind,
            style_run_index: self.style_run_index,
            start: p,
            length: self.end() - p,
            direction: self.direction,
            typeface: self.typeface.clone(),
            metrics: self.metrics,
            glyphs: self.glyphs[..glyph_split].to_vec(),
            positions: self.positions[..glyph_split].to_vec(),
            clusters: self.clusters[..glyph_split].to_vec(),
            relative_cp_x: self.relative_cp_x[cp_split..].to_vec(),
            width: left_half_width,
            x_coord: self.x_coord,
            line_index: None,
            line_height_multiplier: self.line_height_multiplier,
        };

        Ok((logical_left, logical_right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ltr_run() -> FontRun<&'static str> {
        // 4 codepoints, 1 glyph each, 10px advance each.
        FontRun {
            kind: FontRunKind::Normal,
            style_run_index: 0,
            start: 0,
            length: 4,
            direction: Direction::Ltr,
            typeface: "mock",
            metrics: FontMetrics { ascent: 10.0, descent: 2.0, leading: 0.0 },
            glyphs: vec![1, 2, 3, 4],
            positions: vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)],
            clusters: vec![0, 1, 2, 3],
            relative_cp_x: vec![0.0, 10.0, 20.0, 30.0, 40.0],
            width: 40.0,
            x_coord: 0.0,
            line_index: None,
            line_height_multiplier: 1.0,
        }
    }

    #[test]
    fn ltr_split_preserves_invariant_3() {
        let original = ltr_run();
        let (left, right) = original.split(2).unwrap();
        assert_eq!(left.glyphs, vec![1, 2]);
        assert_eq!(right.glyphs, vec![3, 4]);
        assert_eq!(left.width, 20.0);
        assert_eq!(right.width, 20.0);

        // Concatenation check (property 3): positions re-offset by
        // left.width must reconstruct the original.
        let mut reconstructed_positions = left.positions.clone();
        reconstructed_positions.extend(right.positions.iter().map(|&(x, y)| (x + left.width, y)));
        assert_eq!(reconstructed_positions, original.positions);

        let mut reconstructed_glyphs = left.glyphs.clone();
        reconstructed_glyphs.extend(right.glyphs.iter());
        assert_eq!(reconstructed_glyphs, original.glyphs);

        left.check_invariants().unwrap();
        right.check_invariants().unwrap();
    }

    #[test]
    fn split_rejects_boundary_points() {
        let run = ltr_run();
        assert!(run.split(0).is_err());
        assert!(run.split(4).is_err());
        assert!(run.split(10).is_err());
    }

    fn rtl_run() -> FontRun<&'static str> {
        // Logical codepoints 0,1,2,3; visually reversed (3,2,1,0).
        FontRun {
            kind: FontRunKind::Normal,
            style_run_index: 0,
            start: 0,
            length: 4,
            direction: Direction::Rtl,
            typeface: "mock",
            metrics: FontMetrics { ascent: 10.0, descent: 2.0, leading: 0.0 },
            glyphs: vec![4, 3, 2, 1],
            positions: vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)],
            clusters: vec![3, 2, 1, 0],
            relative_cp_x: vec![40.0, 30.0, 20.0, 10.0, 0.0],
            width: 40.0,
            x_coord: 0.0,
            line_index: None,
            line_height_multiplier: 1.0,
        }
    }

    #[test]
    fn rtl_split_keeps_clusters_monotonic_non_increasing() {
        let original = rtl_run();
        let (logical_left, logical_right) = original.split(2).unwrap();
        logical_left.check_invariants().unwrap();
        logical_right.check_invariants().unwrap();
        // logical_left covers codepoints [0, 2) and sits at the
        // visually-right side in this mirrored layout.
        assert_eq!(logical_left.start, 0);
        assert_eq!(logical_right.start, 2);
    }
}
