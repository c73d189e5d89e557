//! Optional hyphenation-aware `LineBreakProvider` decorator
//! (`hyphenation` feature). Wraps any other `LineBreakProvider` and
//! adds extra break opportunities inside long words from a loaded
//! hyphenation dictionary, so the Line Builder's word-overflow branch
//! (spec §4.5 step 3: "if no permissible break... if `force` is set,
//! split at the last codepoint whose leading width < W") gets a
//! linguistically real hyphenation point instead of an arbitrary
//! mid-word split when one is available.
//!
//! Grounded on the teacher's own hyphenation fixtures
//! (`layout/src/text3/tests/one.rs::test_hyphenation_break`), which
//! load `hyphenation::Standard::from_embedded(Language::EnglishUS)` and
//! read break points off it the same way this wrapper does.

use hyphenation::{Hyphenator, Standard};

use crate::shaping::{BreakOpportunity, LineBreakProvider};

/// Decorates `inner` with extra break opportunities at every
/// dictionary-approved hyphenation point inside each whitespace-
/// delimited word.
pub struct HyphenatingLineBreakProvider<P> {
    inner: P,
    hyphenator: Standard,
}

impl<P: LineBreakProvider> HyphenatingLineBreakProvider<P> {
    pub fn new(inner: P, hyphenator: Standard) -> Self {
        Self { inner, hyphenator }
    }
}

impl<P: LineBreakProvider> LineBreakProvider for HyphenatingLineBreakProvider<P> {
    fn line_break_classes(&self, codepoints: &[i32]) -> Vec<BreakOpportunity> {
        let mut out = self.inner.line_break_classes(codepoints);
        if out.is_empty() {
            return out;
        }

        let chars: Vec<char> = codepoints
            .iter()
            .map(|&cp| char::from_u32(cp as u32).unwrap_or('\u{FFFD}'))
            .collect();

        let mut word_start = 0usize;
        for i in 0..=chars.len() {
            let at_boundary = i == chars.len() || chars[i].is_whitespace();
            if !at_boundary {
                continue;
            }
            if i > word_start + 1 {
                let word: String = chars[word_start..i].iter().collect();
                let hyphenated = self.hyphenator.hyphenate(&word);
                for &byte_break in &hyphenated.breaks {
                    let cp_break = word[..byte_break].chars().count();
                    if cp_break >= 1 && cp_break < (i - word_start) {
                        out[word_start + cp_break - 1] = BreakOpportunity::Allowed;
                    }
                }
            }
            word_start = i + 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::testing::MockLineBreakProvider;
    use hyphenation::{Language, Load};

    #[test]
    fn hyphenation_adds_a_break_opportunity_inside_a_long_word() {
        let hyphenator = Standard::from_embedded(Language::EnglishUS).unwrap();
        let provider = HyphenatingLineBreakProvider::new(MockLineBreakProvider, hyphenator);
        let text = "hyphenation";
        let codepoints: Vec<i32> = text.chars().map(|c| c as i32).collect();
        let breaks = provider.line_break_classes(&codepoints);
        assert!(breaks.iter().any(|b| *b == BreakOpportunity::Allowed));
    }
}
