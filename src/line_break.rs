//! Default `LineBreakProvider` backed by `unicode-segmentation`'s word
//! boundary iterator (an approximation of UAX #14, sufficient for the
//! "permissible break positions... after whitespace" rule in spec
//! §4.5). The core engine treats line-break classification as a
//! delegated collaborator (spec §1, §6); this module supplies one
//! concrete default so callers don't have to hand-roll whitespace
//! scanning themselves.

use unicode_segmentation::UnicodeSegmentation;

use crate::shaping::{BreakOpportunity, LineBreakProvider};

/// Marks a break as permissible immediately after any word-boundary
/// span that is entirely whitespace (a run of spaces, tabs, or other
/// Unicode whitespace), not inside a word.
pub struct UaxLineBreakProvider;

impl LineBreakProvider for UaxLineBreakProvider {
    fn line_break_classes(&self, codepoints: &[i32]) -> Vec<BreakOpportunity> {
        if codepoints.is_empty() {
            return Vec::new();
        }

        let text: String = codepoints
            .iter()
            .map(|&cp| char::from_u32(cp as u32).unwrap_or('\u{FFFD}'))
            .collect();

        let mut out = vec![BreakOpportunity::Prohibited; codepoints.len()];
        let mut cp_idx = 0usize;
        for word in text.split_word_bounds() {
            let len = word.chars().count();
            if word.chars().all(char::is_whitespace) {
                let boundary = cp_idx + len;
                if boundary >= 1 && boundary <= out.len() {
                    out[boundary - 1] = BreakOpportunity::Allowed;
                }
            }
            cp_idx += len;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaks_for(text: &str) -> Vec<BreakOpportunity> {
        let codepoints: Vec<i32> = text.chars().map(|c| c as i32).collect();
        UaxLineBreakProvider.line_break_classes(&codepoints)
    }

    #[test]
    fn break_allowed_right_after_a_space() {
        let breaks = breaks_for("hello world");
        // "hello" occupies [0, 5), the space is index 5.
        assert_eq!(breaks[5], BreakOpportunity::Allowed);
        assert_eq!(breaks[0], BreakOpportunity::Prohibited);
        assert_eq!(breaks[4], BreakOpportunity::Prohibited);
    }

    #[test]
    fn no_breaks_in_a_single_word() {
        let breaks = breaks_for("hello");
        assert!(breaks.iter().all(|b| *b == BreakOpportunity::Prohibited));
    }

    #[test]
    fn multiple_spaces_mark_a_break_after_the_run() {
        let breaks = breaks_for("hi   there");
        // "hi" = [0,2), spaces = [2,5): break opportunity sits at index 4.
        assert_eq!(breaks[4], BreakOpportunity::Allowed);
    }
}
