//! Line Builder (spec §4.5): consumes the flat, logical-order sequence
//! of `FontRun`s produced by the Font Run Builder and distributes them
//! across `Line`s: mandatory and permissible line breaks, greedy word
//! wrap with backtracking to the last break opportunity, trailing-
//! whitespace classification, optional max-line-count truncation with
//! an ellipsis, and UAX #9 visual reordering.

use std::collections::VecDeque;

use crate::{
    codepoint_buffer::CodepointBuffer,
    error::LayoutError,
    font_run::{FontRun, FontRunKind},
    line::Line,
    shaping::{BreakOpportunity, Direction},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextAlignment {
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone)]
pub struct LineBuilderConfig {
    pub max_width: Option<f32>,
    pub max_lines: Option<usize>,
    pub text_alignment: TextAlignment,
    /// When a word alone exceeds `max_width` and no earlier break
    /// opportunity exists, split it anyway rather than letting the line
    /// overflow (spec §4.5 step 3, "force" branch).
    pub force_break_long_words: bool,
}

impl Default for LineBuilderConfig {
    fn default() -> Self {
        Self {
            max_width: None,
            max_lines: None,
            text_alignment: TextAlignment::Left,
            force_break_long_words: true,
        }
    }
}

fn is_whitespace_cp(cp: i32) -> bool {
    cp == ' ' as i32 || cp == '\t' as i32
}

/// Width, in reading (logical) order, of the leading `count` codepoints
/// of `run` (0 <= count <= run.length).
fn prefix_width<T: Clone + PartialEq>(run: &FontRun<T>, count: i32) -> f32 {
    match run.direction {
        Direction::Ltr => run.relative_cp_x[count as usize],
        Direction::Rtl => run.width - run.relative_cp_x[count as usize],
    }
}

/// Distributes `runs` (flat, logical order across the whole paragraph)
/// into `Line`s. Returns the final flat run storage (runs may have been
/// split further than the input) alongside the lines, plus whether any
/// content had to be dropped because `max_lines` was reached.
pub fn build_lines<T: Clone + PartialEq>(
    cb: &CodepointBuffer,
    runs: Vec<FontRun<T>>,
    break_opportunities: &[BreakOpportunity],
    config: &LineBuilderConfig,
    ellipsis_run: Option<FontRun<T>>,
) -> Result<(Vec<FontRun<T>>, Vec<Line>, bool), LayoutError> {
    let mut queue: VecDeque<FontRun<T>> = runs.into_iter().collect();
    let mut all_runs: Vec<FontRun<T>> = Vec::new();
    let mut lines: Vec<Line> = Vec::new();
    let mut overflowed = false;

    while let Some(mut run) = queue.pop_front() {
        let mut pending: Vec<FontRun<T>> = Vec::new();
        let mut current_width = 0.0_f32;
        // (index into `pending`, local codepoint index) of the last seen
        // break opportunity: a break is permitted right after that
        // codepoint.
        let mut last_break: Option<(usize, i32)> = None;

        loop {
            let slice = cb.as_slice(run.start, run.length)?;
            let mandatory_local = slice.iter().position(|&cp| cp == 0x0A);

            if let Some(k) = mandatory_local {
                let p = run.start + k as i32 + 1;
                if p < run.end() {
                    let (left, right) = run.split(p)?;
                    pending.push(left);
                    queue.push_front(right);
                } else {
                    pending.push(run);
                }
                break;
            }

            let tentative = current_width + run.width;
            let fits = config.max_width.map_or(true, |w| tentative <= w);

            if fits {
                let start_idx = pending.len();
                pending.push(run);
                let added_start = pending[start_idx].start;
                let added_len = pending[start_idx].length;
                for local in 0..added_len {
                    let abs = added_start + local;
                    if break_opportunities.get(abs as usize) == Some(&BreakOpportunity::Allowed) {
                        last_break = Some((start_idx, local));
                    }
                }
                current_width = tentative;
                match queue.pop_front() {
                    Some(next) => {
                        run = next;
                        continue;
                    }
                    None => break,
                }
            }

            let budget = config.max_width.expect("fits=false implies max_width is Some");
            let base = current_width;
            let mut best_in_run: Option<i32> = None;
            let mut overflow_at: Option<i32> = None;
            for local in 0..run.length {
                let w = prefix_width(&run, local + 1);
                if base + w > budget && overflow_at.is_none() {
                    overflow_at = Some(local);
                }
                let abs = run.start + local;
                if base + w <= budget
                    && break_opportunities.get(abs as usize) == Some(&BreakOpportunity::Allowed)
                {
                    best_in_run = Some(local);
                }
            }

            if let Some(local) = best_in_run {
                let p = run.start + local + 1;
                if p < run.end() {
                    let (left, right) = run.split(p)?;
                    pending.push(left);
                    queue.push_front(right);
                } else {
                    pending.push(run);
                }
                break;
            } else if let Some((idx, local)) = last_break {
                let p = pending[idx].start + local + 1;
                let mut requeue: Vec<FontRun<T>> = Vec::new();
                if p < pending[idx].end() {
                    let (left, right) = pending[idx].split(p)?;
                    pending[idx] = left;
                    requeue.push(right);
                }
                for extra in pending.drain(idx + 1..) {
                    requeue.push(extra);
                }
                requeue.push(run);
                for req in requeue.into_iter().rev() {
                    queue.push_front(req);
                }
                break;
            } else if config.force_break_long_words && run.length > 1 {
                let split_local = overflow_at.unwrap_or(0).max(1);
                let p = run.start + split_local;
                if p > run.start && p < run.end() {
                    let (left, right) = run.split(p)?;
                    pending.push(left);
                    queue.push_front(right);
                } else {
                    pending.push(run);
                }
                break;
            } else {
                // Can't split further (single codepoint, or forcing
                // disabled): accept the overflow and keep going.
                pending.push(run);
                current_width = tentative;
                match queue.pop_front() {
                    Some(next) => {
                        run = next;
                        continue;
                    }
                    None => break,
                }
            }
        }

        if pending.is_empty() {
            continue;
        }

        classify_trailing_whitespace(cb, &mut pending)?;

        if config
            .max_lines
            .map_or(false, |max_lines| lines.len() + 1 == max_lines)
            && !queue.is_empty()
        {
            overflowed = true;
            if let Some(mut ellipsis) = ellipsis_run.clone() {
                ellipsis.kind = FontRunKind::Ellipsis;
                truncate_for_ellipsis(&mut pending, &ellipsis, config.max_width);
                pending.push(ellipsis);
            }
        }

        finalize_line(&mut all_runs, &mut lines, pending, config);

        if config.max_lines.map_or(false, |max_lines| lines.len() >= max_lines) {
            if !queue.is_empty() {
                overflowed = true;
            }
            break;
        }
    }

    Ok((all_runs, lines, overflowed))
}

/// Marks (and, where necessary, splits off) the whitespace-only tail of
/// a logically-ordered run list so it is excluded from line width and
/// alignment (spec §4.5 step 5, §3 glossary "Trailing whitespace").
fn classify_trailing_whitespace<T: Clone + PartialEq>(
    cb: &CodepointBuffer,
    pending: &mut Vec<FontRun<T>>,
) -> Result<(), LayoutError> {
    let mut i = pending.len();
    while i > 0 {
        let r = &pending[i - 1];
        let slice = cb.as_slice(r.start, r.length)?;
        if !slice.is_empty() && slice.iter().all(|&cp| is_whitespace_cp(cp)) {
            pending[i - 1].kind = FontRunKind::TrailingWhitespace;
            i -= 1;
        } else {
            break;
        }
    }
    if i > 0 {
        let r = pending[i - 1].clone();
        let slice = cb.as_slice(r.start, r.length)?;
        match slice.iter().rposition(|&cp| !is_whitespace_cp(cp)) {
            Some(last_non_ws) if last_non_ws + 1 < slice.len() => {
                let split_at = r.start + last_non_ws as i32 + 1;
                let (left, mut right) = r.split(split_at)?;
                right.kind = FontRunKind::TrailingWhitespace;
                pending[i - 1] = left;
                pending.insert(i, right);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Drops whole runs from the logical end of `pending` until the
/// ellipsis run fits within `max_width` alongside what remains (spec
/// §4.5 step 6). Runs at word granularity, not glyph granularity.
fn truncate_for_ellipsis<T: Clone + PartialEq>(
    pending: &mut Vec<FontRun<T>>,
    ellipsis: &FontRun<T>,
    max_width: Option<f32>,
) {
    let Some(budget) = max_width else { return };
    while !pending.is_empty() {
        let current: f32 = pending.iter().map(|r| r.width).sum();
        if current + ellipsis.width <= budget {
            break;
        }
        pending.pop();
    }
}

/// Reorders a line's runs from logical to visual order (simplified UAX
/// #9 rule L2: reverse the run order within each maximal same-direction
/// group), commits them to `all_runs`, and computes the line's vertical
/// metrics, x-positions, and alignment shift.
fn finalize_line<T: Clone + PartialEq>(
    all_runs: &mut Vec<FontRun<T>>,
    lines: &mut Vec<Line>,
    pending: Vec<FontRun<T>>,
    config: &LineBuilderConfig,
) {
    let base_index = all_runs.len();
    let n = pending.len();
    all_runs.extend(pending);
    let logical_indices: Vec<usize> = (base_index..base_index + n).collect();
    let visual_indices = reorder_visual(&logical_indices, all_runs);

    let width: f32 = visual_indices
        .iter()
        .map(|&i| &all_runs[i])
        .filter(|r| r.kind != FontRunKind::TrailingWhitespace)
        .map(|r| r.width)
        .sum();

    // Baseline is the plain max ascent across the line's FRs; height
    // additionally scales by each FR's `line_height_multiplier` (spec
    // §4.5 step 8).
    let mut ascent = 0.0_f32;
    let mut height = 0.0_f32;
    for &i in &visual_indices {
        let run = &all_runs[i];
        ascent = ascent.max(run.metrics.ascent);
        let contribution =
            run.line_height_multiplier * (run.metrics.ascent + run.metrics.descent) + run.metrics.leading;
        height = height.max(contribution);
    }

    let shift = match config.text_alignment {
        TextAlignment::Left | TextAlignment::Justify => 0.0,
        TextAlignment::Center => config.max_width.map_or(0.0, |w| ((w - width) / 2.0).max(0.0)),
        TextAlignment::Right => config.max_width.map_or(0.0, |w| (w - width).max(0.0)),
    };

    let mut x = shift;
    let line_index = lines.len();
    for &i in &visual_indices {
        all_runs[i].x_coord = x;
        all_runs[i].line_index = Some(line_index);
        x += all_runs[i].width;
    }

    let y_coord = lines.last().map(|l| l.y_coord + l.height).unwrap_or(0.0);

    lines.push(Line {
        run_indices: visual_indices,
        y_coord,
        height,
        baseline: ascent,
        width,
        left_overhang: 0.0,
        right_overhang: 0.0,
    });
}

fn reorder_visual<T: Clone + PartialEq>(logical_indices: &[usize], all_runs: &[FontRun<T>]) -> Vec<usize> {
    let mut out = Vec::with_capacity(logical_indices.len());
    let mut i = 0;
    while i < logical_indices.len() {
        let dir = all_runs[logical_indices[i]].direction;
        let mut j = i + 1;
        while j < logical_indices.len() && all_runs[logical_indices[j]].direction == dir {
            j += 1;
        }
        let mut group = logical_indices[i..j].to_vec();
        if dir == Direction::Rtl {
            group.reverse();
        }
        out.extend(group);
        i = j;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_run_builder::build_font_runs;
    use crate::shaping::testing::{MockBidiProvider, MockFontMatcher, MockLineBreakProvider, MockShaper};
    use crate::shaping::{BidiProvider, LineBreakProvider};
    use crate::style::StyleDescriptorBuilder;
    use crate::style_run::StyleRun;

    fn cb_from(text: &str) -> CodepointBuffer {
        let mut cb = CodepointBuffer::new();
        cb.append(&text.encode_utf16().collect::<Vec<u16>>());
        cb
    }

    fn build_one_run(cb: &CodepointBuffer, direction: Direction, advance: f32) -> FontRun<crate::shaping::testing::MockTypeface> {
        let text: Vec<i32> = cb.as_slice(0, cb.len()).unwrap().to_vec();
        let style = StyleDescriptorBuilder::new("mock", 10.0).seal();
        let style_run = StyleRun { start: 0, end: cb.len(), style };
        let bidi = MockBidiProvider.bidi_levels(&text, direction);
        let matcher = MockFontMatcher::new("regular");
        let shaper = MockShaper::new(advance).with_advance('\n' as i32, 0.0);
        let mut pool = crate::pool::FontRunPool::new();
        let runs = build_font_runs(0, &style_run, &text, &bidi, &matcher, &shaper, &mut pool).unwrap();
        assert_eq!(runs.len(), 1);
        runs.into_iter().next().unwrap()
    }

    #[test]
    fn s3_word_wrap_keeps_each_line_within_budget() {
        let cb = cb_from("hello world foo");
        let run = build_one_run(&cb, Direction::Ltr, 10.0);
        let text: Vec<i32> = cb.as_slice(0, cb.len()).unwrap().to_vec();
        let breaks = MockLineBreakProvider.line_break_classes(&text);

        let config = LineBuilderConfig {
            max_width: Some(65.0),
            ..Default::default()
        };
        let (all_runs, lines, overflowed) = build_lines(&cb, vec![run], &breaks, &config, None).unwrap();
        assert!(lines.len() >= 2);
        assert!(!overflowed);
        for line in &lines {
            let visible_width: f32 = line
                .run_indices
                .iter()
                .map(|&i| &all_runs[i])
                .filter(|r| r.kind != FontRunKind::TrailingWhitespace)
                .map(|r| r.width)
                .sum();
            assert!(visible_width <= 65.0 + 0.001);
        }
    }

    #[test]
    fn mandatory_break_on_lf_always_ends_the_line() {
        let cb = cb_from("abc\ndef");
        let run = build_one_run(&cb, Direction::Ltr, 10.0);
        let text: Vec<i32> = cb.as_slice(0, cb.len()).unwrap().to_vec();
        let breaks = MockLineBreakProvider.line_break_classes(&text);

        let config = LineBuilderConfig::default();
        let (_all_runs, lines, overflowed) = build_lines(&cb, vec![run], &breaks, &config, None).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(!overflowed);
    }

    #[test]
    fn trailing_whitespace_is_excluded_from_line_width() {
        let cb = cb_from("hi  ");
        let run = build_one_run(&cb, Direction::Ltr, 10.0);
        let text: Vec<i32> = cb.as_slice(0, cb.len()).unwrap().to_vec();
        let breaks = MockLineBreakProvider.line_break_classes(&text);

        let config = LineBuilderConfig::default();
        let (all_runs, lines, _) = build_lines(&cb, vec![run], &breaks, &config, None).unwrap();
        assert_eq!(lines.len(), 1);
        // "hi" = 20 units wide; the two trailing spaces are excluded.
        assert_eq!(lines[0].width, 20.0);
        assert!(all_runs.iter().any(|r| r.kind == FontRunKind::TrailingWhitespace));
    }

    #[test]
    fn reorder_visual_reverses_only_the_rtl_group() {
        let mk = |dir: Direction| FontRun {
            kind: FontRunKind::Normal,
            style_run_index: 0,
            start: 0,
            length: 1,
            direction: dir,
            typeface: "t",
            metrics: Default::default(),
            glyphs: vec![1],
            positions: vec![(0.0, 0.0)],
            clusters: vec![0],
            relative_cp_x: vec![0.0, 10.0],
            width: 10.0,
            x_coord: 0.0,
            line_index: None,
            line_height_multiplier: 1.0,
        };
        let runs = vec![mk(Direction::Ltr), mk(Direction::Rtl), mk(Direction::Rtl), mk(Direction::Ltr)];
        let visual = reorder_visual(&[0, 1, 2, 3], &runs);
        // The RTL group (logical indices 1,2) reverses to (2,1); the
        // surrounding LTR runs keep their position in the sequence.
        assert_eq!(visual, vec![0, 2, 1, 3]);
    }

    #[test]
    fn max_lines_truncation_sets_overflowed_and_appends_ellipsis() {
        let cb = cb_from("one two three four five");
        let run = build_one_run(&cb, Direction::Ltr, 10.0);
        let text: Vec<i32> = cb.as_slice(0, cb.len()).unwrap().to_vec();
        let breaks = MockLineBreakProvider.line_break_classes(&text);

        let ellipsis_cb = cb_from("\u{2026}");
        let ellipsis_run = build_one_run(&ellipsis_cb, Direction::Ltr, 10.0);

        let config = LineBuilderConfig {
            max_width: Some(45.0),
            max_lines: Some(2),
            ..Default::default()
        };
        let (all_runs, lines, overflowed) =
            build_lines(&cb, vec![run], &breaks, &config, Some(ellipsis_run)).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(overflowed);
        let last_line = lines.last().unwrap();
        let last_run_idx = *last_line.run_indices.last().unwrap();
        assert_eq!(all_runs[last_run_idx].kind, FontRunKind::Ellipsis);
    }
}
