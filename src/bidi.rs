//! Default `BidiProvider` backed by the real `unicode-bidi` crate
//! (UAX #9). The core engine treats bidi level resolution as a
//! delegated collaborator (spec §1, §6) purely through the
//! [`crate::shaping::BidiProvider`] trait; this module supplies the one
//! concrete implementation most callers want instead of hand-rolling
//! the algorithm, grounded directly on the teacher's own
//! `layout/tests/tests_arabic.rs`, which drives `unicode_bidi::BidiInfo`
//! and reads `level.number()` off each paragraph the same way this
//! provider does per codepoint.

use unicode_bidi::{BidiInfo, Level as UBidiLevel};

use crate::shaping::{BidiLevel, BidiProvider, Direction};

/// `BidiProvider` implementation that runs the actual Unicode
/// Bidirectional Algorithm over the supplied codepoints.
///
/// Codepoints are re-assembled into a `String` (lone surrogates and
/// other values with no `char` representation are mapped to
/// `U+FFFD`, matching the replacement-character fallback used
/// elsewhere in this crate for out-of-band input) because
/// `unicode-bidi`'s public API operates on UTF-8 text; the resulting
/// byte-indexed levels are then resampled back to one level per input
/// codepoint via `char_indices`.
pub struct UnicodeBidiProvider;

impl BidiProvider for UnicodeBidiProvider {
    fn bidi_levels(&self, codepoints: &[i32], base_direction: Direction) -> Vec<BidiLevel> {
        if codepoints.is_empty() {
            return Vec::new();
        }

        let text: String = codepoints
            .iter()
            .map(|&cp| char::from_u32(cp as u32).unwrap_or('\u{FFFD}'))
            .collect();

        let base_level = match base_direction {
            Direction::Ltr => UBidiLevel::ltr(),
            Direction::Rtl => UBidiLevel::rtl(),
        };
        let bidi_info = BidiInfo::new(&text, Some(base_level));

        let mut out = Vec::with_capacity(codepoints.len());
        for (byte_idx, _ch) in text.char_indices() {
            let level = bidi_info
                .levels
                .get(byte_idx)
                .copied()
                .unwrap_or(base_level);
            out.push(BidiLevel(level.number()));
        }
        out
    }
}
