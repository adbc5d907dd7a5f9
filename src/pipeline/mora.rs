//! Mora counting by Unicode block.
//!
//! Hiragana and Katakana count 1, CJK Unified Ideographs count 2 (a fixed
//! approximation of a kanji reading), everything else counts 0. Every place
//! that needs a mora count goes through [`count_mora`].

/// Mora contributed by a single code point.
pub fn char_mora(c: char) -> usize {
    match c {
        '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => 1,
        '\u{4E00}'..='\u{9FFF}' => 2,
        _ => 0,
    }
}

/// Total mora of `text`.
pub fn count_mora(text: &str) -> usize {
    text.chars().map(char_mora).sum()
}
