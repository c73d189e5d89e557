//! Text Block (spec §4.6): the top-level aggregate owning the
//! Codepoint Buffer, Style Run Table, flat Font Run list, and Lines,
//! plus the public layout-and-query surface.

use std::sync::Arc;

use crate::{
    codepoint_buffer::CodepointBuffer,
    error::LayoutError,
    font_run::{FontRun, FontRunKind},
    font_run_builder::build_font_runs,
    line::Line,
    line_builder::{build_lines, LineBuilderConfig, TextAlignment},
    pool::FontRunPool,
    shaping::{BidiLevel, BidiProvider, FontMatcher, LineBreakProvider, Shaper},
    style::{DirectionalOverride, StyleDescriptor, StyleDescriptorBuilder},
    style_run::{StyleRun, StyleRunTable},
};

/// Paragraph base direction (spec §6 "Layout parameters":
/// `base_direction ∈ {LTR, RTL, auto}`). Reuses `DirectionalOverride`'s
/// shape rather than introducing a second Auto/Ltr/Rtl enum.
pub type BaseDirection = DirectionalOverride;

#[derive(Debug, Clone)]
pub struct LayoutParamsBuilder {
    params: LayoutParams,
}

impl LayoutParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: LayoutParams {
                max_width: None,
                max_height: None,
                max_lines: None,
                text_alignment: TextAlignment::Left,
                base_direction: BaseDirection::Auto,
                ellipsis: false,
                sealed: false,
            },
        }
    }

    pub fn max_width(mut self, w: Option<f32>) -> Self {
        self.params.max_width = w;
        self
    }

    pub fn max_height(mut self, h: Option<f32>) -> Self {
        self.params.max_height = h;
        self
    }

    pub fn max_lines(mut self, n: Option<usize>) -> Self {
        self.params.max_lines = n;
        self
    }

    pub fn text_alignment(mut self, alignment: TextAlignment) -> Self {
        self.params.text_alignment = alignment;
        self
    }

    pub fn base_direction(mut self, dir: BaseDirection) -> Self {
        self.params.base_direction = dir;
        self
    }

    pub fn ellipsis(mut self, enabled: bool) -> Self {
        self.params.ellipsis = enabled;
        self
    }

    pub fn seal(mut self) -> LayoutParams {
        self.params.sealed = true;
        self.params
    }
}

impl Default for LayoutParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sealed layout configuration (spec §2.1 ambient-stack note): built via
/// `LayoutParamsBuilder`, the same builder-then-immutable-value idiom
/// used for `StyleDescriptor`.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    pub max_lines: Option<usize>,
    pub text_alignment: TextAlignment,
    pub base_direction: BaseDirection,
    pub ellipsis: bool,
    sealed: bool,
}

impl LayoutParams {
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// Observability for the recoverable shaper/font-matcher failure path
/// (spec §7 kind 4), kept as plain counters rather than a logging
/// framework dependency (spec §2.1).
#[derive(Debug, Clone, Default)]
pub struct LayoutDiagnostics {
    pub substituted_codepoints: usize,
    pub last_substitution_style_run: Option<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Affinity {
    Leading,
    Trailing,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitTestResult {
    pub line_index: usize,
    pub cp_index: i32,
    pub affinity: Affinity,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CaretInfo {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct MeasuredSize {
    pub width: f32,
    pub height: f32,
    pub measured_width: f32,
    pub measured_height: f32,
}

/// Top-level aggregate (spec §3 "Text Block"). Generic over the opaque
/// typeface handle, same as `FontRun`.
#[derive(Debug, Clone)]
pub struct TextBlock<T: Clone + PartialEq> {
    cb: CodepointBuffer,
    srt: StyleRunTable,
    font_runs: Vec<FontRun<T>>,
    lines: Vec<Line>,
    overflowed: bool,
    diagnostics: LayoutDiagnostics,
    last_max_width: Option<f32>,
    last_max_height: Option<f32>,
}

impl<T: Clone + PartialEq> Default for TextBlock<T> {
    fn default() -> Self {
        Self {
            cb: CodepointBuffer::new(),
            srt: StyleRunTable::new(),
            font_runs: Vec::new(),
            lines: Vec::new(),
            overflowed: false,
            diagnostics: LayoutDiagnostics::default(),
            last_max_width: None,
            last_max_height: None,
        }
    }
}

impl<T: Clone + PartialEq> TextBlock<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends styled text (spec §6 "Styled text append"): extends the
    /// Codepoint Buffer and adds a matching run to the Style Run Table.
    pub fn append_styled_text(&mut self, utf16_text: &[u16], style: Arc<StyleDescriptor>) {
        let start = self.cb.len();
        self.cb.append(utf16_text);
        let length = self.cb.len() - start;
        self.srt.add_run(start, length, style);
    }

    pub fn codepoint_buffer(&self) -> &CodepointBuffer {
        &self.cb
    }

    pub fn style_run_table(&self) -> &StyleRunTable {
        &self.srt
    }

    pub fn diagnostics(&self) -> &LayoutDiagnostics {
        &self.diagnostics
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn font_runs(&self) -> &[FontRun<T>] {
        &self.font_runs
    }

    /// Rebuilds the Font Run and Line tables (spec §4.6 `layout`).
    /// Recycles the previous pass's `FontRun`s through `pool` rather
    /// than dropping them (spec §5, §9).
    pub fn layout<M, S, B, LB>(
        &mut self,
        params: &LayoutParams,
        matcher: &M,
        shaper: &S,
        bidi: &B,
        line_break: &LB,
        pool: &mut FontRunPool<T>,
    ) -> Result<(), LayoutError>
    where
        M: FontMatcher<Typeface = T>,
        S: Shaper<Typeface = T>,
        B: BidiProvider,
        LB: LineBreakProvider,
    {
        self.srt.validate_coverage(self.cb.len())?;

        let previous = std::mem::take(&mut self.font_runs);
        pool.release_all(previous);
        self.lines.clear();
        self.overflowed = false;
        self.diagnostics = LayoutDiagnostics::default();

        let base_direction = match params.base_direction {
            BaseDirection::Rtl => crate::shaping::Direction::Rtl,
            // Per-run `auto` and the block-level `auto` both resolve to
            // plain LTR absent a stronger signal than the bidi
            // algorithm itself would ordinarily supply (spec §9 open
            // question: "auto defers to base direction").
            BaseDirection::Ltr | BaseDirection::Auto => crate::shaping::Direction::Ltr,
        };

        let mut all_runs: Vec<FontRun<T>> = Vec::new();
        let mut break_opportunities = Vec::with_capacity(self.cb.len() as usize);

        for (style_run_index, style_run) in self.srt.iter().enumerate() {
            let slice = self.cb.as_slice(style_run.start, style_run.len())?;
            let run_direction = match style_run.style.directional_override {
                DirectionalOverride::Ltr => crate::shaping::Direction::Ltr,
                DirectionalOverride::Rtl => crate::shaping::Direction::Rtl,
                DirectionalOverride::Auto => base_direction,
            };
            let bidi_levels: Vec<BidiLevel> = bidi.bidi_levels(slice, run_direction);

            let runs = match build_font_runs(style_run_index, style_run, slice, &bidi_levels, matcher, shaper, pool) {
                Ok(runs) => runs,
                Err(_) => {
                    // Kind 4 (spec §7): substitute and retry once with a
                    // replacement character for the whole run, rather
                    // than failing layout outright.
                    self.diagnostics.substituted_codepoints += style_run.len() as usize;
                    self.diagnostics.last_substitution_style_run = Some(style_run_index);
                    let repl = style_run.style.replacement_character.unwrap_or(0xFFFD);
                    let fallback_style = StyleDescriptorBuilder::from_descriptor(&style_run.style)
                        .replacement_character(Some(repl))
                        .seal();
                    let fallback_run = StyleRun {
                        start: style_run.start,
                        end: style_run.end,
                        style: fallback_style,
                    };
                    build_font_runs(style_run_index, &fallback_run, slice, &bidi_levels, matcher, shaper, pool)?
                }
            };

            all_runs.extend(runs);
            break_opportunities.extend(line_break.line_break_classes(slice));
        }

        let ellipsis_run = if params.ellipsis {
            self.shape_ellipsis(matcher, shaper, base_direction, pool)
        } else {
            None
        };

        let lb_config = LineBuilderConfig {
            max_width: params.max_width,
            max_lines: params.max_lines,
            text_alignment: params.text_alignment,
            force_break_long_words: true,
        };

        let (runs, lines, overflowed) =
            build_lines(&self.cb, all_runs, &break_opportunities, &lb_config, ellipsis_run)?;

        self.font_runs = runs;
        self.lines = lines;
        self.overflowed = overflowed;
        self.last_max_width = params.max_width;
        self.last_max_height = params.max_height;
        Ok(())
    }

    fn shape_ellipsis<M, S>(
        &self,
        matcher: &M,
        shaper: &S,
        base_direction: crate::shaping::Direction,
        pool: &mut FontRunPool<T>,
    ) -> Option<FontRun<T>>
    where
        M: FontMatcher<Typeface = T>,
        S: Shaper<Typeface = T>,
    {
        let style = self.srt.iter().last()?.style.clone();
        let codepoints = [0x2026_i32];
        let level = match base_direction {
            crate::shaping::Direction::Ltr => BidiLevel(0),
            crate::shaping::Direction::Rtl => BidiLevel(1),
        };
        let style_run = StyleRun { start: 0, end: 1, style };
        let runs = build_font_runs(usize::MAX, &style_run, &codepoints, &[level], matcher, shaper, pool).ok()?;
        runs.into_iter().next()
    }

    /// Locates the line/codepoint/affinity under a point (spec §4.6
    /// `hit_test`).
    pub fn hit_test(&self, x: f32, y: f32) -> Option<HitTestResult> {
        if self.lines.is_empty() {
            return None;
        }
        let line_index = self
            .lines
            .iter()
            .position(|l| y < l.y_coord + l.height)
            .unwrap_or(self.lines.len() - 1);
        let line = &self.lines[line_index];

        if line.run_indices.is_empty() {
            return Some(HitTestResult { line_index, cp_index: 0, affinity: Affinity::Leading });
        }

        let first = &self.font_runs[line.run_indices[0]];
        if x <= first.x_coord {
            return Some(HitTestResult {
                line_index,
                cp_index: first.start,
                affinity: Affinity::Leading,
            });
        }
        let last = &self.font_runs[*line.run_indices.last().unwrap()];
        if x >= last.x_coord + last.width {
            return Some(HitTestResult {
                line_index,
                cp_index: last.end() - 1,
                affinity: Affinity::Trailing,
            });
        }

        for &idx in &line.run_indices {
            let run = &self.font_runs[idx];
            if x < run.x_coord || x >= run.x_coord + run.width {
                continue;
            }
            for local in 0..run.length {
                let a = run.x_coord + run.relative_cp_x[local as usize];
                let b = run.x_coord + run.relative_cp_x[local as usize + 1];
                // `relative_cp_x` descends for RTL runs (spec §3: the
                // leading edge is the right edge), so `a` and `b` are not
                // already in ascending order in that case.
                let (left, right) = (a.min(b), a.max(b));
                if x >= left && x < right {
                    let midpoint = (left + right) / 2.0;
                    let affinity = if x < midpoint { Affinity::Leading } else { Affinity::Trailing };
                    return Some(HitTestResult {
                        line_index,
                        cp_index: run.start + local,
                        affinity,
                    });
                }
            }
        }
        None
    }

    /// Computes caret geometry for a codepoint boundary (spec §4.6
    /// `caret_info`).
    pub fn caret_info(&self, cp_index: i32) -> Result<CaretInfo, LayoutError> {
        if let Some(run) = self.font_runs.iter().find(|r| r.start == cp_index) {
            return Ok(self.caret_at(run, 0));
        }
        if let Some(run) = self
            .font_runs
            .iter()
            .find(|r| cp_index > r.start && cp_index < r.end())
        {
            return Ok(self.caret_at(run, cp_index - run.start));
        }
        if let Some(run) = self.font_runs.iter().find(|r| r.end() == cp_index) {
            return Ok(self.caret_at(run, run.length));
        }
        Err(LayoutError::IndexOutOfRange { index: cp_index as i64, len: self.cb.len() as i64 })
    }

    fn caret_at(&self, run: &FontRun<T>, local: i32) -> CaretInfo {
        let x = run.x_coord + run.relative_cp_x[local as usize];
        let (top, bottom) = run
            .line_index
            .and_then(|i| self.lines.get(i))
            .map(|l| (l.y_coord, l.y_coord + l.height))
            .unwrap_or((0.0, 0.0));
        CaretInfo { x, top, bottom }
    }

    /// Content and box extents (spec §4.6 `measured_size`).
    pub fn measured_size(&self) -> MeasuredSize {
        let measured_width = self.lines.iter().map(|l| l.width).fold(0.0_f32, f32::max);
        let measured_height = self.lines.iter().map(|l| l.height).sum();
        MeasuredSize {
            width: self.last_max_width.unwrap_or(measured_width),
            height: self.last_max_height.unwrap_or(measured_height),
            measured_width,
            measured_height,
        }
    }

    /// Rectangles covering `[cp_start, cp_end)`, one per intersecting
    /// run segment (spec §4.6 `get_selection_rects`).
    pub fn get_selection_rects(&self, cp_start: i32, cp_end: i32) -> Vec<Rect> {
        let (lo, hi) = (cp_start.min(cp_end), cp_start.max(cp_end));
        let mut rects = Vec::new();
        for run in &self.font_runs {
            if run.kind == FontRunKind::TrailingWhitespace {
                continue;
            }
            let overlap_start = lo.max(run.start);
            let overlap_end = hi.min(run.end());
            if overlap_start >= overlap_end {
                continue;
            }
            let a = run.x_coord + run.relative_cp_x[(overlap_start - run.start) as usize];
            let b = run.x_coord + run.relative_cp_x[(overlap_end - run.start) as usize];
            let (x_min, x_max) = (a.min(b), a.max(b));
            let Some(line) = run.line_index.and_then(|i| self.lines.get(i)) else { continue };
            rects.push(Rect {
                x: x_min,
                y: line.y_coord,
                width: x_max - x_min,
                height: line.height,
            });
        }
        rects
    }

    /// Distinct typefaces used on line `i`, in visual order (spec §4.6
    /// `fonts_for_line`).
    pub fn fonts_for_line(&self, i: usize) -> Vec<T> {
        let Some(line) = self.lines.get(i) else { return Vec::new() };
        let mut out: Vec<T> = Vec::new();
        for &idx in &line.run_indices {
            let tf = &self.font_runs[idx].typeface;
            if out.last() != Some(tf) {
                out.push(tf.clone());
            }
        }
        out
    }

    /// The runs composing line `i`, in visual order (spec §4.6
    /// `runs_for_line`).
    pub fn runs_for_line(&self, i: usize) -> Vec<&FontRun<T>> {
        let Some(line) = self.lines.get(i) else { return Vec::new() };
        line.run_indices.iter().map(|&idx| &self.font_runs[idx]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::testing::{MockBidiProvider, MockFontMatcher, MockLineBreakProvider, MockShaper, MockTypeface};

    fn laid_out(text: &str, params: LayoutParams) -> TextBlock<MockTypeface> {
        let mut block: TextBlock<MockTypeface> = TextBlock::new();
        let style = StyleDescriptorBuilder::new("mock", 10.0).seal();
        block.append_styled_text(&text.encode_utf16().collect::<Vec<u16>>(), style);
        let mut pool = FontRunPool::new();
        block
            .layout(
                &params,
                &MockFontMatcher::new("regular"),
                &MockShaper::new(10.0),
                &MockBidiProvider,
                &MockLineBreakProvider,
                &mut pool,
            )
            .unwrap();
        block
    }

    #[test]
    fn hit_test_leading_edge_returns_first_codepoint() {
        let block = laid_out("hello", LayoutParamsBuilder::new().seal());
        let hit = block.hit_test(-5.0, 0.0).unwrap();
        assert_eq!(hit.cp_index, 0);
        assert_eq!(hit.affinity, Affinity::Leading);
    }

    #[test]
    fn hit_test_trailing_edge_returns_last_codepoint() {
        let block = laid_out("hello", LayoutParamsBuilder::new().seal());
        let hit = block.hit_test(10_000.0, 0.0).unwrap();
        assert_eq!(hit.cp_index, 4);
        assert_eq!(hit.affinity, Affinity::Trailing);
    }

    #[test]
    fn hit_test_midpoint_picks_nearer_codepoint_boundary() {
        // "hello" at 10px/char: codepoint 0 spans [0, 10). x=3 is left
        // of the 5px midpoint, so it should resolve to a Leading hit on
        // codepoint 0.
        let block = laid_out("hello", LayoutParamsBuilder::new().seal());
        let hit = block.hit_test(3.0, 0.0).unwrap();
        assert_eq!(hit.cp_index, 0);
        assert_eq!(hit.affinity, Affinity::Leading);
    }

    #[test]
    fn caret_info_at_run_start_and_end_brackets_the_line() {
        let block = laid_out("hi", LayoutParamsBuilder::new().seal());
        let start = block.caret_info(0).unwrap();
        let end = block.caret_info(2).unwrap();
        assert_eq!(start.x, 0.0);
        assert_eq!(end.x, 20.0);
        assert_eq!(start.top, end.top);
        assert_eq!(start.bottom, end.bottom);
    }

    #[test]
    fn caret_info_out_of_range_is_an_error() {
        let block = laid_out("hi", LayoutParamsBuilder::new().seal());
        assert!(block.caret_info(99).is_err());
    }

    #[test]
    fn measured_size_falls_back_to_constraints_when_set() {
        let block = laid_out("hi", LayoutParamsBuilder::new().max_width(Some(200.0)).seal());
        let size = block.measured_size();
        assert_eq!(size.width, 200.0);
        assert_eq!(size.measured_width, 20.0);
    }

    #[test]
    fn measured_size_uses_measured_extents_without_constraints() {
        let block = laid_out("hi", LayoutParamsBuilder::new().seal());
        let size = block.measured_size();
        assert_eq!(size.width, size.measured_width);
        assert_eq!(size.height, size.measured_height);
    }

    #[test]
    fn selection_rects_cover_exactly_the_requested_range() {
        let block = laid_out("hello world", LayoutParamsBuilder::new().seal());
        let rects = block.get_selection_rects(0, 5); // "hello"
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].x, 0.0);
        assert_eq!(rects[0].width, 50.0);
    }

    #[test]
    fn fonts_for_line_lists_each_distinct_typeface_once() {
        let mut block: TextBlock<MockTypeface> = TextBlock::new();
        let style = StyleDescriptorBuilder::new("mock", 10.0).seal();
        block.append_styled_text(&"abXY".encode_utf16().collect::<Vec<u16>>(), style);
        let params = LayoutParamsBuilder::new().seal();
        let mut pool = FontRunPool::new();
        block
            .layout(
                &params,
                &MockFontMatcher::new("latin").with_override('X' as i32, "symbols").with_override('Y' as i32, "symbols"),
                &MockShaper::new(10.0),
                &MockBidiProvider,
                &MockLineBreakProvider,
                &mut pool,
            )
            .unwrap();
        assert_eq!(block.fonts_for_line(0), vec![MockTypeface("latin"), MockTypeface("symbols")]);
    }

    /// Property 4 (spec §8): codepoints covered by lines, including
    /// trailing whitespace, exactly account for the whole buffer.
    #[test]
    fn line_coverage_accounts_for_every_codepoint() {
        let block = laid_out("hello world foo", LayoutParamsBuilder::new().max_width(Some(120.0)).seal());
        let mut covered = 0i32;
        for line in block.lines() {
            for &idx in &line.run_indices {
                covered += block.font_runs()[idx].length;
            }
        }
        assert_eq!(covered, block.codepoint_buffer().len());
    }

    /// Property 5 (spec §8): FRs within a line have non-decreasing,
    /// non-overlapping `x_coord` ranges in visual order.
    #[test]
    fn runs_within_a_line_do_not_overlap() {
        let block = laid_out("hello world foo", LayoutParamsBuilder::new().max_width(Some(120.0)).seal());
        for i in 0..block.lines().len() {
            let runs = block.runs_for_line(i);
            for pair in runs.windows(2) {
                assert!(pair[0].x_coord + pair[0].width <= pair[1].x_coord + 0.001);
            }
        }
    }
}
