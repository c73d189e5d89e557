//! Concrete `Shaper`/`FontMatcher` backend (`native_shaping` feature):
//! font discovery via `rust-fontconfig`, shaping and metrics via
//! `allsorts`. The core engine (everything outside this module) never
//! depends on either crate; callers who don't want this backend
//! provide their own `Shaper`/`FontMatcher` impls instead.

use std::num::NonZeroUsize;
use std::sync::Arc;

use allsorts::binary::read::ReadScope;
use allsorts::font_data::FontData;
use allsorts::tables::{FontTableProvider, HheaTable, HeadTable};
use allsorts::tag;
use rust_fontconfig::{FcFontCache, FcPattern};

use crate::{
    error::LayoutError,
    font_run::FontMetrics,
    shaping::{Direction, ShapeFeatures, ShapedGlyphs, Shaper},
    shaping::FontMatcher,
    style::StyleDescriptor,
};

/// A loaded, parsed font plus the metrics pulled from its `hhea`/`head`
/// tables, scaled to a particular point size on demand.
#[derive(Clone)]
pub struct NativeTypeface {
    pub family: String,
    bytes: Arc<Vec<u8>>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
}

impl std::fmt::Debug for NativeTypeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeTypeface").field("family", &self.family).finish()
    }
}

impl PartialEq for NativeTypeface {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl Default for NativeTypeface {
    /// A blank placeholder, never shaped against directly: it only
    /// exists so `FontRunPool<NativeTypeface>::checkout` has something
    /// to hand back before `NativeFontMatcher::match_font` overwrites
    /// it via `FontRun::typeface`.
    fn default() -> Self {
        Self {
            family: String::new(),
            bytes: Arc::new(Vec::new()),
            units_per_em: 1000,
            ascender: 0,
            descender: 0,
        }
    }
}

impl NativeTypeface {
    /// Parses `hhea`/`head` out of a raw font file (grounded in the
    /// teacher's `get_font_metrics`, which reads the same two tables
    /// via `allsorts::binary::read::ReadScope`).
    fn load(family: String, bytes: Vec<u8>) -> Result<Self, LayoutError> {
        let bytes = Arc::new(bytes);
        let scope = ReadScope::new(&bytes);
        let font_file = scope
            .read::<FontData<'_>>()
            .map_err(|e| LayoutError::BackendFailure(format!("font parse failed: {e}")))?;
        let provider = font_file
            .table_provider(0)
            .map_err(|e| LayoutError::BackendFailure(format!("font table access failed: {e}")))?;

        let head_data = provider
            .table_data(tag::HEAD)
            .map_err(|e| LayoutError::BackendFailure(format!("missing head table: {e}")))?
            .ok_or_else(|| LayoutError::BackendFailure("missing head table".into()))?;
        let head: HeadTable = ReadScope::new(&head_data)
            .read()
            .map_err(|e| LayoutError::BackendFailure(format!("malformed head table: {e}")))?;

        let hhea_data = provider
            .table_data(tag::HHEA)
            .map_err(|e| LayoutError::BackendFailure(format!("missing hhea table: {e}")))?
            .ok_or_else(|| LayoutError::BackendFailure("missing hhea table".into()))?;
        let hhea: HheaTable = ReadScope::new(&hhea_data)
            .read()
            .map_err(|e| LayoutError::BackendFailure(format!("malformed hhea table: {e}")))?;

        Ok(Self {
            family,
            bytes,
            units_per_em: head.units_per_em,
            ascender: hhea.ascender,
            descender: hhea.descender,
        })
    }

    /// Scales font-unit metrics to `size` points (spec §3 "font metrics
    /// (ascent, descent, leading)", already scaled, as `FontMetrics`
    /// requires).
    pub fn metrics_at_size(&self, size: f32) -> FontMetrics {
        let scale = size / self.units_per_em as f32;
        FontMetrics {
            ascent: self.ascender as f32 * scale,
            descent: -(self.descender as f32) * scale,
            leading: 0.0,
        }
    }
}

/// Default number of distinct (family, weight, italic) typefaces kept
/// parsed in memory at once. Loading a font means reading and parsing
/// its `head`/`hhea` tables (see `NativeTypeface::load`); an unbounded
/// cache would grow with every distinct style ever seen in a long-
/// running host (editor, browser tab), so eviction is LRU rather than
/// a plain `HashMap`.
const FONT_CACHE_CAPACITY: usize = 64;

/// Font discovery backed by system fontconfig (Linux/BSD convention;
/// see `rust-fontconfig`'s cross-platform cache for other targets).
pub struct NativeFontMatcher {
    cache: FcFontCache,
    loaded: std::sync::Mutex<lru::LruCache<(String, i32, bool), NativeTypeface>>,
}

impl NativeFontMatcher {
    pub fn new() -> Self {
        Self {
            cache: FcFontCache::build(),
            loaded: std::sync::Mutex::new(lru::LruCache::new(
                NonZeroUsize::new(FONT_CACHE_CAPACITY).unwrap(),
            )),
        }
    }
}

impl Default for NativeFontMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FontMatcher for NativeFontMatcher {
    type Typeface = NativeTypeface;

    fn match_font(&self, _codepoint: i32, style: &StyleDescriptor) -> Result<Self::Typeface, LayoutError> {
        let key = (style.font_family.clone(), style.font_weight, style.italic);
        if let Some(cached) = self.loaded.lock().unwrap().get(&key) {
            return Ok(cached.clone());
        }

        let pattern = FcPattern {
            family: Some(style.font_family.clone()),
            italic: style.italic.into(),
            weight: rust_fontconfig::PatternMatch::from(style.font_weight),
            ..Default::default()
        };
        let matched = self
            .cache
            .query(&pattern, &mut Vec::new())
            .ok_or_else(|| LayoutError::BackendFailure(format!("no font matched family {}", style.font_family)))?;
        let bytes = self
            .cache
            .get_font_bytes(matched)
            .ok_or_else(|| LayoutError::BackendFailure("matched font has no backing bytes".into()))?;

        let typeface = NativeTypeface::load(style.font_family.clone(), bytes)?;
        self.loaded.lock().unwrap().insert(key, typeface.clone());
        Ok(typeface)
    }
}

/// Shaping via `allsorts`' OpenType GSUB/GPOS pipeline.
pub struct NativeShaper;

impl Shaper for NativeShaper {
    type Typeface = NativeTypeface;

    fn shape(
        &self,
        codepoints: &[i32],
        typeface: &Self::Typeface,
        size: f32,
        direction: Direction,
        _features: &ShapeFeatures,
    ) -> Result<ShapedGlyphs, LayoutError> {
        let scope = ReadScope::new(&typeface.bytes);
        let font_file = scope
            .read::<FontData<'_>>()
            .map_err(|e| LayoutError::BackendFailure(format!("font parse failed: {e}")))?;
        let provider = font_file
            .table_provider(0)
            .map_err(|e| LayoutError::BackendFailure(format!("font table access failed: {e}")))?;
        let mut shaped_font = allsorts::font::Font::new(provider)
            .map_err(|e| LayoutError::BackendFailure(format!("shaper init failed: {e}")))?
            .ok_or_else(|| LayoutError::BackendFailure("font has no usable cmap".into()))?;

        let script = match direction {
            Direction::Rtl => tag::ARAB,
            Direction::Ltr => tag::LATN,
        };
        let glyphs = shaped_font
            .map_glyphs(codepoints_as_chars(codepoints), script, allsorts::MatchingPresentation::NotRequired);
        let infos = shaped_font
            .shape(
                glyphs,
                script,
                None,
                &allsorts::gsub::Features::Custom(vec![]),
                true,
            )
            .map_err(|e| LayoutError::BackendFailure(format!("shaping failed: {e}")))?;

        let unit_scale = size / typeface.units_per_em as f32;

        let mut out = ShapedGlyphs::default();
        for info in &infos {
            out.glyph_ids.push(info.glyph.glyph_index);
            out.clusters.push(info.glyph.extra_data.as_ref().map(|e| e.cluster as i32).unwrap_or(0));
            out.advances.push(info.glyph.advance as f32 * unit_scale);
            out.offsets.push((0.0, 0.0));
        }
        // `features.kerning` is not honored: GPOS kerning is applied
        // unconditionally by `shape()` above.
        Ok(out)
    }
}

fn codepoints_as_chars(codepoints: &[i32]) -> Vec<char> {
    codepoints
        .iter()
        .filter_map(|&cp| char::from_u32(cp as u32))
        .collect()
}
