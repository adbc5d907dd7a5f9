//! Extractor — pulls measurements and activity mentions out of free text.
//!
//! Pure pattern matching, no dictionaries beyond the food/exercise keyword
//! lists. Runs first in the pipeline:
//! - length check (the only failure)
//! - weight and body-fat via compiled regexes (keyword form wins over unit-only)
//! - one context snippet for the first food keyword and the first exercise keyword

use std::sync::{Arc, LazyLock};

use chrono::{Local, Utc};
use regex::{Captures, Regex};
use tracing::debug;

use crate::config::DEFAULT_MAX_MESSAGE_LENGTH;
use crate::error::ExtractError;
use crate::lexicon::Lexicon;
use crate::pipeline::types::HealthRecord;

/// Characters kept before a keyword match.
const SNIPPET_LEAD: usize = 10;

/// Characters kept after the end of a keyword match.
const SNIPPET_TRAIL: usize = 20;

// Alternative 1 needs a keyword, alternative 2 needs a unit. Leftmost-first
// alternation gives the keyword form precedence at the same position.
static WEIGHT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:体重|weight)\s*[:：]?\s*([0-9]+(?:\.[0-9]+)?)\s*(?:kg|キログラム|キロ|ｋｇ)?|([0-9]+(?:\.[0-9]+)?)\s*(?:kg|キログラム|キロ|ｋｇ)",
    )
    .expect("weight pattern compiles")
});

static BODY_FAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:体脂肪率|体脂肪|body\s*fat)\s*[:：]?\s*([0-9]+(?:\.[0-9]+)?)\s*(?:%|％|パーセント|percent)?|([0-9]+(?:\.[0-9]+)?)\s*(?:%|％|パーセント)",
    )
    .expect("body fat pattern compiles")
});

/// Message length as the surrounding system counts it (UTF-16 code units).
pub fn message_length(message: &str) -> usize {
    message.encode_utf16().count()
}

/// First weight value in `message`, in kilograms.
pub fn extract_weight(message: &str) -> Option<f64> {
    first_number(&WEIGHT_PATTERN, message)
}

/// First body-fat percentage in `message`.
pub fn extract_body_fat(message: &str) -> Option<f64> {
    first_number(&BODY_FAT_PATTERN, message)
}

fn first_number(pattern: &Regex, message: &str) -> Option<f64> {
    let caps = pattern.captures(message)?;
    parse_number(&caps)
}

fn parse_number(caps: &Captures<'_>) -> Option<f64> {
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Builds [`HealthRecord`]s from raw messages.
pub struct Extractor {
    lexicon: Arc<Lexicon>,
    max_message_length: usize,
}

impl Extractor {
    /// Create an extractor with the default 140-character limit.
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self::with_limit(lexicon, DEFAULT_MAX_MESSAGE_LENGTH)
    }

    pub fn with_limit(lexicon: Arc<Lexicon>, max_message_length: usize) -> Self {
        Self {
            lexicon,
            max_message_length,
        }
    }

    /// Whether `message` fits within the length limit.
    pub fn validate_length(&self, message: &str) -> bool {
        message_length(message) <= self.max_message_length
    }

    /// Parse one message into a record.
    ///
    /// The length check runs before any extraction. Nothing else fails:
    /// missing facts come back as `None` or empty lists.
    pub fn extract(&self, owner_id: &str, message: &str) -> Result<HealthRecord, ExtractError> {
        let length = message_length(message);
        if length > self.max_message_length {
            return Err(ExtractError::MessageTooLong {
                length,
                max: self.max_message_length,
            });
        }

        let record = HealthRecord {
            owner_id: owner_id.to_string(),
            date: Some(Local::now().date_naive()),
            captured_at: Utc::now(),
            weight: extract_weight(message),
            body_fat_percentage: extract_body_fat(message),
            food_items: self.extract_food_items(message),
            exercises: self.extract_exercises(message),
            free_comment: message.to_string(),
        };

        debug!(
            owner = %owner_id,
            weight = ?record.weight,
            body_fat = ?record.body_fat_percentage,
            food_items = record.food_items.len(),
            exercises = record.exercises.len(),
            "Extracted health record"
        );

        Ok(record)
    }

    /// Snippet around the first food keyword found, if any.
    pub fn extract_food_items(&self, message: &str) -> Vec<String> {
        keyword_snippet(message, &self.lexicon.food_keywords)
    }

    /// Snippet around the first exercise keyword found, if any.
    pub fn extract_exercises(&self, message: &str) -> Vec<String> {
        keyword_snippet(message, &self.lexicon.exercise_keywords)
    }
}

/// Walk `keywords` in order and cut a window around the first one present.
///
/// Only one keyword per list is ever used, even if several occur. Matching is
/// case-insensitive over a per-character lowercase copy so the indices line up
/// with the message text.
fn keyword_snippet(message: &str, keywords: &[String]) -> Vec<String> {
    let chars: Vec<char> = message.chars().collect();
    let lowered: Vec<char> = chars.iter().map(|c| lower_char(*c)).collect();

    for keyword in keywords {
        let needle: Vec<char> = keyword.chars().map(lower_char).collect();
        let Some(index) = find_chars(&lowered, &needle) else {
            continue;
        };

        let start = index.saturating_sub(SNIPPET_LEAD);
        let end = (index + needle.len() + SNIPPET_TRAIL).min(chars.len());
        let snippet: String = chars[start..end].iter().collect();
        let snippet = snippet.trim();

        debug!(keyword = %keyword, snippet = %snippet, "Keyword matched");

        if snippet.is_empty() {
            return Vec::new();
        }
        return vec![snippet.to_string()];
    }

    Vec::new()
}

fn lower_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
