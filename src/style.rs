//! Style descriptors (spec §3) and their builder/seal lifecycle.
//!
//! A `StyleDescriptor` becomes immutable once `seal()`'d; any further
//! mutation attempt through the builder is a fatal program error
//! surfaced as `LayoutError::SealedStyleMutation`, matching the
//! "Dynamic dispatch on Style collapses to a single concrete Style
//! type" design note: callers get one concrete struct, reached through
//! a builder, never a half-mutable trait object.

use std::sync::Arc;

use crate::error::LayoutError;

/// 8-bit-per-channel RGBA color. Kept local to this crate rather than
/// pulled in from a DOM/CSS styling crate: the layout engine's contract
/// (spec §1) explicitly excludes style-attribute plumbing, so colors
/// here are plain paint values, not cascaded CSS properties.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
}

/// Underline kind is a bitflag so IME composition variants
/// (dashed/dotted "gapped" underline used by input-method composition
/// spans) can be combined with the basic kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct UnderlineKind(pub u8);

impl UnderlineKind {
    pub const NONE: UnderlineKind = UnderlineKind(0);
    pub const GAPPED: UnderlineKind = UnderlineKind(1 << 0);
    pub const SOLID: UnderlineKind = UnderlineKind(1 << 1);
    pub const OVERLINE: UnderlineKind = UnderlineKind(1 << 2);
    pub const IME_INPUT: UnderlineKind = UnderlineKind(1 << 3);
    pub const IME_TARGET: UnderlineKind = UnderlineKind(1 << 4);

    pub fn contains(self, other: UnderlineKind) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn union(self, other: UnderlineKind) -> UnderlineKind {
        UnderlineKind(self.0 | other.0)
    }
}

impl std::ops::BitOr for UnderlineKind {
    type Output = UnderlineKind;
    fn bitor(self, rhs: UnderlineKind) -> UnderlineKind {
        self.union(rhs)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StrikeThrough {
    #[default]
    None,
    Single,
    Double,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
    Wavy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FontVariant {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DirectionalOverride {
    #[default]
    Auto,
    Ltr,
    Rtl,
}

/// A named, opaque effect applied at paint time (shadow, glow, etc).
/// The layout engine never interprets these; it only threads them
/// through to the `FontRun`'s originating style so the paint layer can
/// read them back.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEffect {
    pub name: String,
    pub params: Vec<f32>,
}

/// Mutable style builder. Produces an immutable, `Arc`-shared
/// `StyleDescriptor` via `seal()`.
#[derive(Debug, Clone)]
pub struct StyleDescriptorBuilder {
    desc: StyleDescriptor,
}

impl StyleDescriptorBuilder {
    pub fn new(font_family: impl Into<String>, font_size: f32) -> Self {
        Self {
            desc: StyleDescriptor {
                font_family: font_family.into(),
                font_size,
                font_weight: 400,
                italic: false,
                underline: UnderlineKind::NONE,
                strike_through: StrikeThrough::None,
                line_height_multiplier: 1.0,
                foreground: Color::BLACK,
                background: Color::TRANSPARENT,
                underline_color: Color::BLACK,
                letter_spacing: 0.0,
                font_variant: FontVariant::Normal,
                directional_override: DirectionalOverride::Auto,
                replacement_character: None,
                stroke_thickness: None,
                underline_offset: None,
                overline_offset: None,
                strike_offset: None,
                stroke_style: StrokeStyle::Solid,
                ink_skip: false,
                text_effects: Vec::new(),
                sealed: false,
            },
        }
    }

    pub fn font_weight(mut self, weight: i32) -> Self {
        self.desc.font_weight = weight;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.desc.italic = italic;
        self
    }

    pub fn underline(mut self, kind: UnderlineKind) -> Self {
        self.desc.underline = kind;
        self
    }

    pub fn strike_through(mut self, kind: StrikeThrough) -> Self {
        self.desc.strike_through = kind;
        self
    }

    pub fn line_height_multiplier(mut self, multiplier: f32) -> Self {
        self.desc.line_height_multiplier = multiplier;
        self
    }

    pub fn foreground(mut self, color: Color) -> Self {
        self.desc.foreground = color;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.desc.background = color;
        self
    }

    pub fn letter_spacing(mut self, spacing: f32) -> Self {
        self.desc.letter_spacing = spacing;
        self
    }

    pub fn font_variant(mut self, variant: FontVariant) -> Self {
        self.desc.font_variant = variant;
        self
    }

    pub fn directional_override(mut self, dir: DirectionalOverride) -> Self {
        self.desc.directional_override = dir;
        self
    }

    pub fn replacement_character(mut self, cp: Option<i32>) -> Self {
        self.desc.replacement_character = cp;
        self
    }

    pub fn text_effects(mut self, effects: Vec<TextEffect>) -> Self {
        self.desc.text_effects = effects;
        self
    }

    /// Seeds a builder from an already-sealed style, e.g. to derive a
    /// variant that only overrides one field (spec §7 kind 4: the
    /// shaper/font-matcher failure fallback substitutes a replacement
    /// character without discarding the rest of the run's style).
    pub fn from_descriptor(style: &StyleDescriptor) -> Self {
        let mut desc = style.clone();
        desc.sealed = false;
        Self { desc }
    }

    /// Finalize the builder into an immutable, shareable style.
    pub fn seal(mut self) -> Arc<StyleDescriptor> {
        self.desc.sealed = true;
        Arc::new(self.desc)
    }
}

/// Immutable-once-sealed style descriptor (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: i32,
    pub italic: bool,
    pub underline: UnderlineKind,
    pub strike_through: StrikeThrough,
    pub line_height_multiplier: f32,
    pub foreground: Color,
    pub background: Color,
    pub underline_color: Color,
    pub letter_spacing: f32,
    pub font_variant: FontVariant,
    pub directional_override: DirectionalOverride,
    pub replacement_character: Option<i32>,
    pub stroke_thickness: Option<f32>,
    pub underline_offset: Option<f32>,
    pub overline_offset: Option<f32>,
    pub strike_offset: Option<f32>,
    pub stroke_style: StrokeStyle,
    pub ink_skip: bool,
    pub text_effects: Vec<TextEffect>,
    sealed: bool,
}

impl StyleDescriptor {
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// The effective font size after applying super/subscript scaling
    /// (spec §4.3 edge-case policy: 0.65x for either variant).
    pub fn effective_font_size(&self) -> f32 {
        match self.font_variant {
            FontVariant::Normal => self.font_size,
            FontVariant::Superscript | FontVariant::Subscript => self.font_size * 0.65,
        }
    }

    /// Vertical glyph offset applied at paint time for super/subscript,
    /// in the same units as `font_size` (spec §4.3).
    pub fn vertical_script_offset(&self) -> f32 {
        match self.font_variant {
            FontVariant::Normal => 0.0,
            FontVariant::Superscript => -0.35 * self.font_size,
            FontVariant::Subscript => 0.10 * self.font_size,
        }
    }

    /// Attempting to mutate a sealed style descriptor in place is a
    /// programmer error; this helper exists so call sites that hold
    /// only an `&StyleDescriptor` (not the builder) fail the same way.
    pub fn check_mutable(&self) -> Result<(), LayoutError> {
        if self.sealed {
            Err(LayoutError::SealedStyleMutation)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_produces_immutable_shared_style() {
        let style = StyleDescriptorBuilder::new("Helvetica", 14.0)
            .italic(true)
            .seal();
        assert!(style.is_sealed());
        assert_eq!(style.font_family, "Helvetica");
        assert!(style.check_mutable().is_err());
    }

    #[test]
    fn superscript_scales_size_and_offsets_upward() {
        let style = StyleDescriptorBuilder::new("Helvetica", 20.0)
            .font_variant(FontVariant::Superscript)
            .seal();
        assert_eq!(style.effective_font_size(), 13.0);
        assert_eq!(style.vertical_script_offset(), -7.0);
    }

    #[test]
    fn underline_kind_bitflags_combine() {
        let combo = UnderlineKind::SOLID | UnderlineKind::IME_TARGET;
        assert!(combo.contains(UnderlineKind::SOLID));
        assert!(combo.contains(UnderlineKind::IME_TARGET));
        assert!(!combo.contains(UnderlineKind::GAPPED));
    }
}
