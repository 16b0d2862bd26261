// ABOUTME: Word counting shared by segment statistics and the narrative length budget.
// ABOUTME: Provides word_count and check_length with the default 15,000 word limit.

use serde::Serialize;

/// Default number of words a tagged bill may hold before analysis is flagged as partial.
pub const DEFAULT_WORD_LIMIT: usize = 15_000;

/// Counts whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Outcome of comparing tagged text against a word budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthCheck {
    pub word_count: usize,
    pub limit: usize,
    pub too_long: bool,
}

/// Flags text whose word count is strictly greater than `limit`.
pub fn check_length(text: &str, limit: usize) -> LengthCheck {
    let word_count = word_count(text);
    LengthCheck {
        word_count,
        limit,
        too_long: word_count > limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_splits_on_any_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count(" one\ttwo\n\nthree "), 3);
    }

    #[test]
    fn test_check_length_boundary() {
        let text = "a b c";
        assert!(!check_length(text, 3).too_long);
        let over = check_length(text, 2);
        assert!(over.too_long);
        assert_eq!(over.word_count, 3);
        assert_eq!(over.limit, 2);
    }

    #[test]
    fn test_markers_count_as_words() {
        assert_eq!(word_count("[NEW] added [/NEW]"), 3);
    }
}
