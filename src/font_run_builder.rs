//! Font Run Builder (spec §4.3): turns one `StyleRun` plus its
//! per-codepoint bidi levels into one or more shaped `FontRun`s.

use crate::{
    error::LayoutError,
    font_run::{FontMetrics, FontRun, FontRunKind},
    pool::FontRunPool,
    shaping::{shape_features_from_style, BidiLevel, Direction, FontMatcher, Shaper},
    style::StyleDescriptor,
    style_run::StyleRun,
};

/// "Is a combining mark or ZWJ that must stay attached to the
/// preceding base character" (spec §4.3 step 2): any codepoint with a
/// non-zero canonical combining class (Unicode `Mn`/`Me`-ish marks,
/// per `unicode-normalization`'s own NFD/NFC reordering tables) plus
/// the two zero-width joiner controls, which carry combining class 0
/// but must still attach to their base for shaping purposes.
fn is_combining_or_joiner(cp: i32) -> bool {
    match char::from_u32(cp as u32) {
        Some(c) => {
            unicode_normalization::char::canonical_combining_class(c) != 0
                || matches!(c, '\u{200C}' | '\u{200D}')
        }
        None => false,
    }
}

struct DirectionalSubRun {
    start: i32, // local index within the style run's codepoint slice
    end: i32,
    direction: Direction,
}

fn segment_by_bidi_level(levels: &[BidiLevel]) -> Vec<DirectionalSubRun> {
    let mut out = Vec::new();
    if levels.is_empty() {
        return out;
    }
    let mut seg_start = 0usize;
    for i in 1..levels.len() {
        if levels[i] != levels[seg_start] {
            out.push(DirectionalSubRun {
                start: seg_start as i32,
                end: i as i32,
                direction: levels[seg_start].direction(),
            });
            seg_start = i;
        }
    }
    out.push(DirectionalSubRun {
        start: seg_start as i32,
        end: levels.len() as i32,
        direction: levels[seg_start].direction(),
    });
    out
}

/// Builds font runs for a single style run.
///
/// `cb_slice` is exactly the codepoints of `style_run` (i.e.
/// `cb.as_slice(style_run.start, style_run.len())`); `bidi_levels` has
/// one entry per codepoint in `cb_slice`.
pub fn build_font_runs<M: FontMatcher, S: Shaper<Typeface = M::Typeface>>(
    style_run_index: usize,
    style_run: &StyleRun,
    cb_slice: &[i32],
    bidi_levels: &[BidiLevel],
    matcher: &M,
    shaper: &S,
    pool: &mut FontRunPool<M::Typeface>,
) -> Result<Vec<FontRun<M::Typeface>>, LayoutError> {
    let style = &style_run.style;

    // Replacement-character styles (e.g. password fields) shape every
    // codepoint of the run as one fixed scalar (spec §4.3 edge case).
    let effective_codepoints: Vec<i32> = match style.replacement_character {
        Some(repl) => vec![repl; cb_slice.len()],
        None => cb_slice.to_vec(),
    };

    let mut runs = Vec::new();
    for sub in segment_by_bidi_level(bidi_levels) {
        let sub_slice = &effective_codepoints[sub.start as usize..sub.end as usize];
        let font_segments = segment_by_font_affinity(sub_slice, style, matcher)?;

        for seg in font_segments {
            let local_start = sub.start as usize + seg.start;
            let local_end = sub.start as usize + seg.end;
            let codepoints = &effective_codepoints[local_start..local_end];

            let features = shape_features_from_style(style);
            let size = style.effective_font_size();
            let shaped = shaper.shape(codepoints, &seg.typeface, size, sub.direction, &features)?;

            let run = assemble_font_run(
                pool,
                style_run_index,
                style_run.start + local_start as i32,
                (local_end - local_start) as i32,
                sub.direction,
                seg.typeface,
                size,
                style.line_height_multiplier,
                style.letter_spacing,
                shaped,
            );
            runs.push(run);
        }
    }
    Ok(runs)
}

struct FontSegment<T> {
    start: usize,
    end: usize,
    typeface: T,
}

fn segment_by_font_affinity<M: FontMatcher>(
    codepoints: &[i32],
    style: &StyleDescriptor,
    matcher: &M,
) -> Result<Vec<FontSegment<M::Typeface>>, LayoutError> {
    let mut out: Vec<FontSegment<M::Typeface>> = Vec::new();
    for (i, &cp) in codepoints.iter().enumerate() {
        if is_combining_or_joiner(cp) {
            if let Some(last) = out.last_mut() {
                last.end = i + 1;
                continue;
            }
        }
        let typeface = matcher.match_font(cp, style)?;
        match out.last_mut() {
            Some(last) if last.typeface == typeface => {
                last.end = i + 1;
            }
            _ => out.push(FontSegment {
                start: i,
                end: i + 1,
                typeface,
            }),
        }
    }
    Ok(out)
}

fn assemble_font_run<T: Clone + PartialEq + Default>(
    pool: &mut FontRunPool<T>,
    style_run_index: usize,
    absolute_start: i32,
    length: i32,
    direction: Direction,
    typeface: T,
    size: f32,
    line_height_multiplier: f32,
    letter_spacing: f32,
    shaped: crate::shaping::ShapedGlyphs,
) -> FontRun<T> {
    let n = shaped.len();

    // Letter spacing (spec §4.3 step 5) is inserted once after each
    // cluster boundary in shaped-glyph order, never between the glyphs
    // of a single multi-glyph cluster.
    let mut advances = shaped.advances;
    if letter_spacing != 0.0 {
        for i in 0..n {
            let at_cluster_boundary = i + 1 == n || shaped.clusters[i] != shaped.clusters[i + 1];
            if at_cluster_boundary {
                advances[i] += letter_spacing;
            }
        }
    }

    // Checking out from the pool (spec §2 component 6, §5, §9) reuses
    // whatever capacity a previously released run's vectors still
    // hold, rather than allocating fresh ones on every layout pass.
    let mut run = pool.checkout();
    run.kind = FontRunKind::Normal;
    run.style_run_index = style_run_index;
    run.start = absolute_start;
    run.length = length;
    run.direction = direction;
    run.typeface = typeface;
    run.line_height_multiplier = line_height_multiplier;
    run.x_coord = 0.0;
    run.line_index = None;

    // Build glyph positions by walking the shaped (visual) glyph order.
    run.positions.clear();
    run.positions.reserve(n);
    let mut cursor = 0.0_f32;
    for i in 0..n {
        run.positions
            .push((cursor, shaped.offsets.get(i).copied().unwrap_or((0.0, 0.0)).1));
        cursor += advances[i];
    }
    let width = cursor;

    // Per-codepoint advance, keyed by local (0-based) codepoint index,
    // for computing `relative_cp_x` in *logical* codepoint order
    // (spec §4.3 step 4).
    let mut per_cp_advance = vec![0.0_f32; length as usize];
    for i in 0..n {
        let local_cp = shaped.clusters[i] as usize;
        if local_cp < per_cp_advance.len() {
            per_cp_advance[local_cp] += advances[i];
        }
    }
    run.relative_cp_x.clear();
    run.relative_cp_x.reserve(length as usize + 1);
    run.relative_cp_x.push(match direction {
        Direction::Ltr => 0.0,
        Direction::Rtl => width,
    });
    let mut acc = 0.0_f32;
    for j in 0..length as usize {
        acc += per_cp_advance[j];
        run.relative_cp_x.push(match direction {
            Direction::Ltr => acc,
            Direction::Rtl => width - acc,
        });
    }

    run.clusters.clear();
    run.clusters.extend(shaped.clusters.iter().map(|&c| absolute_start + c));

    run.glyphs.clear();
    run.glyphs.extend(shaped.glyph_ids);

    run.width = width;

    // FontMetrics is typically supplied by the typeface/backend; this
    // module only assembles geometry, so callers of `build_font_runs`
    // that need real ascent/descent should post-process via
    // `FontRun::metrics`, left at a placeholder scaled-by-size value
    // here since the shaping trait boundary (spec §1) doesn't expose
    // a metrics query.
    run.metrics = FontMetrics {
        ascent: size * 0.8,
        descent: size * 0.2,
        leading: 0.0,
    };

    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::testing::{MockBidiProvider, MockFontMatcher, MockShaper};
    use crate::shaping::BidiProvider;
    use crate::style::StyleDescriptorBuilder;
    use std::sync::Arc;

    fn style() -> Arc<StyleDescriptor> {
        StyleDescriptorBuilder::new("mock", 10.0).seal()
    }

    #[test]
    fn single_typeface_run_produces_one_font_run() {
        let text: Vec<i32> = "hello".chars().map(|c| c as i32).collect();
        let style_run = StyleRun { start: 0, end: 5, style: style() };
        let bidi = MockBidiProvider.bidi_levels(&text, Direction::Ltr);
        let matcher = MockFontMatcher::new("regular");
        let shaper = MockShaper::new(8.0);
        let mut pool = FontRunPool::new();

        let runs = build_font_runs(0, &style_run, &text, &bidi, &matcher, &shaper, &mut pool).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].length, 5);
        runs[0].check_invariants().unwrap();
    }

    #[test]
    fn font_affinity_change_splits_into_two_runs() {
        let text: Vec<i32> = "abXY".chars().map(|c| c as i32).collect();
        let style_run = StyleRun { start: 0, end: 4, style: style() };
        let bidi = MockBidiProvider.bidi_levels(&text, Direction::Ltr);
        let matcher = MockFontMatcher::new("latin")
            .with_override('X' as i32, "symbols")
            .with_override('Y' as i32, "symbols");
        let shaper = MockShaper::new(8.0);
        let mut pool = FontRunPool::new();

        let runs = build_font_runs(0, &style_run, &text, &bidi, &matcher, &shaper, &mut pool).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].length, 2);
        assert_eq!(runs[1].length, 2);
    }

    #[test]
    fn rtl_sub_run_has_reversed_relative_cp_x() {
        let text: Vec<i32> = "\u{05e9}\u{05dc}\u{05d5}\u{05dd}".chars().map(|c| c as i32).collect();
        let style_run = StyleRun { start: 0, end: 4, style: style() };
        let bidi = MockBidiProvider.bidi_levels(&text, Direction::Rtl);
        let matcher = MockFontMatcher::new("hebrew");
        let shaper = MockShaper::new(10.0);
        let mut pool = FontRunPool::new();

        let runs = build_font_runs(0, &style_run, &text, &bidi, &matcher, &shaper, &mut pool).unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.direction, Direction::Rtl);
        assert_eq!(*run.relative_cp_x.first().unwrap(), run.width);
        assert_eq!(*run.relative_cp_x.last().unwrap(), 0.0);
    }

    #[test]
    fn replacement_character_shapes_every_codepoint_as_one_scalar() {
        let text: Vec<i32> = "secret".chars().map(|c| c as i32).collect();
        let style = StyleDescriptorBuilder::new("mock", 10.0)
            .replacement_character(Some('*' as i32))
            .seal();
        let style_run = StyleRun { start: 0, end: text.len() as i32, style };
        let bidi = MockBidiProvider.bidi_levels(&text, Direction::Ltr);
        let matcher = MockFontMatcher::new("regular");
        let shaper = MockShaper::new(8.0).with_advance('*' as i32, 6.0);
        let mut pool = FontRunPool::new();

        let runs = build_font_runs(0, &style_run, &text, &bidi, &matcher, &shaper, &mut pool).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].width, 6.0 * text.len() as f32);
    }
}
