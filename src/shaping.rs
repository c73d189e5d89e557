//! Delegated collaborators (spec §1, §6): the shaping engine, the
//! font-matching/fallback registry, the bidi algorithm, and the UAX #14
//! line-break classifier are all treated as pure functions supplied by
//! the host application. This module only defines the trait boundary
//! and the small plain-old-data types that cross it. No concrete
//! shaper lives in the core engine (see `crate::native` behind the
//! `native_shaping` feature for one concrete backend).

use crate::{error::LayoutError, style::StyleDescriptor};

/// Paragraph/run direction, spec glossary "Bidi level": even = LTR,
/// odd = RTL.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

/// UAX #9 embedding level for a single codepoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BidiLevel(pub u8);

impl BidiLevel {
    pub fn direction(self) -> Direction {
        if self.0 % 2 == 0 {
            Direction::Ltr
        } else {
            Direction::Rtl
        }
    }
}

/// UAX #14 line-break class for a single codepoint, reduced to the
/// subset the Line Builder actually branches on (spec §4.5): whether a
/// break is permissible immediately after this codepoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BreakOpportunity {
    Prohibited,
    Allowed,
}

/// Shaping features derived from a `StyleDescriptor` (spec §4.3 step 3:
/// "features derived from style"). Kept minimal; a native backend is
/// free to map these onto OpenType feature tags.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapeFeatures {
    pub kerning: bool,
    pub ligatures: bool,
}

pub fn shape_features_from_style(_style: &StyleDescriptor) -> ShapeFeatures {
    ShapeFeatures {
        kerning: true,
        ligatures: true,
    }
}

/// Output of one `Shaper::shape` call: glyphs, their codepoint cluster
/// mapping, and per-glyph advances/offsets, all in shaper (post-GSUB)
/// order.
#[derive(Debug, Clone, Default)]
pub struct ShapedGlyphs {
    pub glyph_ids: Vec<u16>,
    /// Index (local to the shaped slice, 0-based) of the codepoint each
    /// glyph belongs to. Non-decreasing for LTR input, non-increasing
    /// for RTL input, per spec §3 Font Run invariants.
    pub clusters: Vec<i32>,
    pub advances: Vec<f32>,
    pub offsets: Vec<(f32, f32)>,
}

impl ShapedGlyphs {
    pub fn len(&self) -> usize {
        self.glyph_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_ids.is_empty()
    }
}

/// The font-matching/fallback registry (spec: "Out of scope").
pub trait FontMatcher {
    type Typeface: Clone + PartialEq + Default;

    /// Resolve a typeface for a single codepoint under `style`. Called
    /// once per codepoint by the Font Run Builder while segmenting a
    /// directional sub-run by font affinity (spec §4.3 step 2).
    fn match_font(
        &self,
        codepoint: i32,
        style: &StyleDescriptor,
    ) -> Result<Self::Typeface, LayoutError>;
}

/// The shaping engine (spec: "Out of scope", treated as a pure
/// function).
pub trait Shaper {
    type Typeface: Clone + PartialEq + Default;

    fn shape(
        &self,
        codepoints: &[i32],
        typeface: &Self::Typeface,
        size: f32,
        direction: Direction,
        features: &ShapeFeatures,
    ) -> Result<ShapedGlyphs, LayoutError>;
}

/// The bidi algorithm (spec: "Out of scope").
pub trait BidiProvider {
    fn bidi_levels(&self, codepoints: &[i32], base_direction: Direction) -> Vec<BidiLevel>;
}

/// The UAX #14 line-break analyzer (spec: "Out of scope").
pub trait LineBreakProvider {
    fn line_break_classes(&self, codepoints: &[i32]) -> Vec<BreakOpportunity>;
}

/// Reusable mock collaborators for tests, both this crate's and a
/// host application's. Grounded in the teacher's own `MockFont` /
/// `MockFontManager` test harness: a fixed per-codepoint advance table
/// stands in for real shaping so line-breaking/splitting/bidi logic
/// can be tested without bundling an actual font.
pub mod testing {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct MockTypeface(pub &'static str);

    /// Matches every codepoint to a single fixed typeface, unless an
    /// explicit per-codepoint override is registered, enough to
    /// exercise the Font Run Builder's "new FR when typeface changes"
    /// split logic (spec §4.3 step 2).
    #[derive(Debug, Clone)]
    pub struct MockFontMatcher {
        pub default_typeface: MockTypeface,
        pub overrides: HashMap<i32, MockTypeface>,
    }

    impl MockFontMatcher {
        pub fn new(default_typeface: &'static str) -> Self {
            Self {
                default_typeface: MockTypeface(default_typeface),
                overrides: HashMap::new(),
            }
        }

        pub fn with_override(mut self, codepoint: i32, typeface: &'static str) -> Self {
            self.overrides.insert(codepoint, MockTypeface(typeface));
            self
        }
    }

    impl FontMatcher for MockFontMatcher {
        type Typeface = MockTypeface;

        fn match_font(
            &self,
            codepoint: i32,
            _style: &StyleDescriptor,
        ) -> Result<Self::Typeface, LayoutError> {
            Ok(self
                .overrides
                .get(&codepoint)
                .cloned()
                .unwrap_or_else(|| self.default_typeface.clone()))
        }
    }

    /// Shapes one glyph per codepoint with a fixed advance, except for
    /// registered ligature sequences (mirrors the teacher's "fi"
    /// ligature test fixture).
    #[derive(Debug, Clone)]
    pub struct MockShaper {
        pub default_advance: f32,
        pub advances: HashMap<i32, f32>,
        pub ligatures: HashMap<Vec<i32>, f32>,
    }

    impl MockShaper {
        pub fn new(default_advance: f32) -> Self {
            Self {
                default_advance,
                advances: HashMap::new(),
                ligatures: HashMap::new(),
            }
        }

        pub fn with_advance(mut self, codepoint: i32, advance: f32) -> Self {
            self.advances.insert(codepoint, advance);
            self
        }

        pub fn with_ligature(mut self, sequence: Vec<i32>, advance: f32) -> Self {
            self.ligatures.insert(sequence, advance);
            self
        }
    }

    impl Shaper for MockShaper {
        type Typeface = MockTypeface;

        fn shape(
            &self,
            codepoints: &[i32],
            _typeface: &Self::Typeface,
            size: f32,
            direction: Direction,
            _features: &ShapeFeatures,
        ) -> Result<ShapedGlyphs, LayoutError> {
            let scale = size / 10.0; // advances are authored for a 10px mock font
            let mut out = ShapedGlyphs::default();
            let mut i = 0usize;
            while i < codepoints.len() {
                let mut matched_ligature = None;
                for (seq, advance) in &self.ligatures {
                    if codepoints[i..].starts_with(seq.as_slice()) {
                        matched_ligature = Some((seq.len(), *advance));
                        break;
                    }
                }
                if let Some((len, advance)) = matched_ligature {
                    out.glyph_ids.push(0xFFFF);
                    out.clusters.push(i as i32);
                    out.advances.push(advance * scale);
                    out.offsets.push((0.0, 0.0));
                    i += len;
                    continue;
                }
                let advance = self
                    .advances
                    .get(&codepoints[i])
                    .copied()
                    .unwrap_or(self.default_advance);
                out.glyph_ids.push((codepoints[i] & 0xFFFF) as u16);
                out.clusters.push(i as i32);
                out.advances.push(advance * scale);
                out.offsets.push((0.0, 0.0));
                i += 1;
            }
            if direction == Direction::Rtl {
                out.glyph_ids.reverse();
                out.clusters.reverse();
                out.advances.reverse();
                out.offsets.reverse();
            }
            Ok(out)
        }
    }

    pub struct MockBidiProvider;

    impl BidiProvider for MockBidiProvider {
        fn bidi_levels(&self, codepoints: &[i32], base_direction: Direction) -> Vec<BidiLevel> {
            let base_level = if base_direction == Direction::Rtl { 1 } else { 0 };
            codepoints.iter().map(|_| BidiLevel(base_level)).collect()
        }
    }

    /// Treats any whitespace codepoint as a permissible break, nothing
    /// else, enough to drive word-wrap tests.
    pub struct MockLineBreakProvider;

    impl LineBreakProvider for MockLineBreakProvider {
        fn line_break_classes(&self, codepoints: &[i32]) -> Vec<BreakOpportunity> {
            codepoints
                .iter()
                .map(|&cp| {
                    if cp == ' ' as i32 || cp == '\t' as i32 {
                        BreakOpportunity::Allowed
                    } else {
                        BreakOpportunity::Prohibited
                    }
                })
                .collect()
        }
    }
}
