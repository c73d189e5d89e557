//! Append-only UTF-32 codepoint buffer with bidirectional UTF-16<->UTF-32
//! offset maps (spec §3, §4.1).
//!
//! Shaping, styling, and hit-testing all operate in UTF-32 codepoint
//! space internally; callers address the original text in UTF-16 code
//! units. The two dense maps below let either side translate an offset
//! in O(1).

use crate::error::LayoutError;

const HIGH_SURROGATE_START: u32 = 0xD800;
const HIGH_SURROGATE_END: u32 = 0xDBFF;
const LOW_SURROGATE_START: u32 = 0xDC00;
const LOW_SURROGATE_END: u32 = 0xDFFF;

/// Append-only buffer of Unicode scalar values, with UTF-16<->UTF-32
/// offset maps tied to the lifetime of the owning `TextBlock`.
#[derive(Debug, Clone, Default)]
pub struct CodepointBuffer {
    scalars: Vec<i32>,
    /// Indexed by UTF-16 code unit index (as it appeared in the
    /// original, not-yet-decoded input).
    utf16_to_utf32: Vec<i32>,
    /// Indexed by UTF-32 codepoint index; points at the first UTF-16
    /// unit of that scalar in the original input.
    utf32_to_utf16: Vec<i16>,
}

impl CodepointBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of codepoints currently buffered.
    pub fn len(&self) -> i32 {
        self.scalars.len() as i32
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    /// Decode `utf16_text` into scalars, normalize CRLF -> LF (the CR is
    /// dropped), and extend both offset maps.
    ///
    /// Lone `\r` not followed by `\n` is preserved as-is (this spec's
    /// resolution of the open question in the original design: an
    /// implementer may instead normalize it to LF, but must do so
    /// consistently in both maps).
    pub fn append(&mut self, utf16_text: &[u16]) {
        let mut i = 0usize;
        while i < utf16_text.len() {
            let unit = utf16_text[i];
            let unit_u32 = unit as u32;

            // CRLF collapse: both the \r and the \n map to one LF scalar.
            if unit == 0x0D && i + 1 < utf16_text.len() && utf16_text[i + 1] == 0x0A {
                let cp_index = self.scalars.len() as i32;
                self.scalars.push(0x0A);
                self.utf32_to_utf16.push(self.utf16_to_utf32.len() as i16);
                self.utf16_to_utf32.push(cp_index); // \r
                self.utf16_to_utf32.push(cp_index); // \n
                i += 2;
                continue;
            }

            // Surrogate pair decode.
            if (HIGH_SURROGATE_START..=HIGH_SURROGATE_END).contains(&unit_u32)
                && i + 1 < utf16_text.len()
            {
                let low = utf16_text[i + 1] as u32;
                if (LOW_SURROGATE_START..=LOW_SURROGATE_END).contains(&low) {
                    let scalar =
                        0x10000 + ((unit_u32 - HIGH_SURROGATE_START) << 10) + (low - LOW_SURROGATE_START);
                    let cp_index = self.scalars.len() as i32;
                    self.scalars.push(scalar as i32);
                    self.utf32_to_utf16.push(self.utf16_to_utf32.len() as i16);
                    self.utf16_to_utf32.push(cp_index); // high surrogate unit
                    self.utf16_to_utf32.push(cp_index); // low surrogate unit
                    i += 2;
                    continue;
                }
            }

            // Lone surrogate or ordinary BMP unit (including a lone \r):
            // preserved as a single scalar.
            let cp_index = self.scalars.len() as i32;
            self.scalars.push(unit_u32 as i32);
            self.utf32_to_utf16.push(self.utf16_to_utf32.len() as i16);
            self.utf16_to_utf32.push(cp_index);
            i += 1;
        }
    }

    /// The scalar value at UTF-32 index `index`.
    pub fn at(&self, index: i32) -> Result<i32, LayoutError> {
        self.scalars
            .get(index as usize)
            .copied()
            .ok_or(LayoutError::IndexOutOfRange {
                index: index as i64,
                len: self.len() as i64,
            })
    }

    /// UTF-32 codepoint index containing UTF-16 unit `index`.
    pub fn utf16_to_utf32(&self, index: i16) -> Result<i32, LayoutError> {
        self.utf16_to_utf32
            .get(index as usize)
            .copied()
            .ok_or(LayoutError::IndexOutOfRange {
                index: index as i64,
                len: self.utf16_to_utf32.len() as i64,
            })
    }

    /// First UTF-16 unit of the scalar at UTF-32 index `index`.
    pub fn utf32_to_utf16(&self, index: i32) -> Result<i16, LayoutError> {
        self.utf32_to_utf16
            .get(index as usize)
            .copied()
            .ok_or(LayoutError::IndexOutOfRange {
                index: index as i64,
                len: self.utf32_to_utf16.len() as i64,
            })
    }

    /// Slice of `length` scalars starting at UTF-32 index `start`.
    pub fn as_slice(&self, start: i32, length: i32) -> Result<&[i32], LayoutError> {
        let start = start as usize;
        let end = start + length as usize;
        self.scalars
            .get(start..end)
            .ok_or(LayoutError::IndexOutOfRange {
                index: end as i64,
                len: self.len() as i64,
            })
    }

    /// Total number of UTF-16 code units represented (original-input
    /// length, including both units of every surrogate pair and both
    /// units of every CRLF pair).
    pub fn utf16_len(&self) -> i32 {
        self.utf16_to_utf32.len() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn s2_surrogate_collapse() {
        // "A🌐B", UTF-16 length 4 -> CB length 3.
        let mut cb = CodepointBuffer::new();
        cb.append(&utf16("A\u{1F310}B"));
        assert_eq!(cb.len(), 3);
        assert_eq!(cb.utf32_to_utf16(0).unwrap(), 0);
        assert_eq!(cb.utf32_to_utf16(1).unwrap(), 1);
        assert_eq!(cb.utf32_to_utf16(2).unwrap(), 3);
        assert_eq!(cb.utf16_to_utf32(0).unwrap(), 0);
        assert_eq!(cb.utf16_to_utf32(1).unwrap(), 1);
        assert_eq!(cb.utf16_to_utf32(2).unwrap(), 1);
        assert_eq!(cb.utf16_to_utf32(3).unwrap(), 2);
    }

    #[test]
    fn crlf_collapses_to_single_lf() {
        let mut cb = CodepointBuffer::new();
        cb.append(&utf16("a\r\nb"));
        assert_eq!(cb.len(), 3);
        assert_eq!(cb.at(0).unwrap(), 'a' as i32);
        assert_eq!(cb.at(1).unwrap(), '\n' as i32);
        assert_eq!(cb.at(2).unwrap(), 'b' as i32);
        // Both \r (utf16 idx 1) and \n (utf16 idx 2) map to the LF scalar.
        assert_eq!(cb.utf16_to_utf32(1).unwrap(), 1);
        assert_eq!(cb.utf16_to_utf32(2).unwrap(), 1);
    }

    #[test]
    fn lone_cr_is_preserved() {
        let mut cb = CodepointBuffer::new();
        cb.append(&utf16("a\rb"));
        assert_eq!(cb.len(), 3);
        assert_eq!(cb.at(1).unwrap(), '\r' as i32);
    }

    #[test]
    fn round_trip_property_holds_for_every_utf32_index() {
        let mut cb = CodepointBuffer::new();
        cb.append(&utf16("This\r\na\r\nstring\n🌐 🍪 🍕 🚀\n"));
        for j in 0..cb.len() {
            let u16_idx = cb.utf32_to_utf16(j).unwrap();
            assert_eq!(cb.utf16_to_utf32(u16_idx).unwrap(), j);
        }
    }

    #[test]
    fn lone_surrogate_is_preserved() {
        let mut cb = CodepointBuffer::new();
        // A lone low surrogate with no preceding high surrogate.
        cb.append(&[0x0041, 0xDC00, 0x0042]);
        assert_eq!(cb.len(), 3);
        assert_eq!(cb.at(1).unwrap(), 0xDC00);
    }
}
