//! Static reference tables: keyword dictionaries, template pools, canned phrases.
//!
//! Loaded once at startup (embedded copy or a JSON file) and shared behind an
//! `Arc` for the lifetime of the process. Nothing mutates a loaded table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::pipeline::mora::count_mora;
use crate::pipeline::types::Tone;

const EMBEDDED_LEXICON: &str = include_str!("../data/lexicon.json");

/// Two canned phrases per tone, offered to the poem generator as events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodPhrases {
    pub positive: [String; 2],
    pub discouraged: [String; 2],
    pub neutral: [String; 2],
}

/// Words used to turn extracted facts into event phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPhrasing {
    pub weight_prefix: String,
    pub weight_unit: String,
    pub body_fat_prefix: String,
    pub body_fat_unit: String,
    pub food_suffix: String,
    pub exercise_suffix: String,
}

/// All keyword and phrase tables the pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub food_keywords: Vec<String>,
    pub exercise_keywords: Vec<String>,
    pub positive: Vec<String>,
    pub discouraged: Vec<String>,
    pub high_motivation: Vec<String>,
    pub low_motivation: Vec<String>,
    pub templates_5: Vec<String>,
    pub templates_7: Vec<String>,
    pub mood_phrases: MoodPhrases,
    /// Suffixes for a deficit of 1, 2 and 3 mora, in that order.
    pub padding: [String; 3],
    pub generic_5: String,
    pub generic_7: String,
    pub phrasing: EventPhrasing,
}

impl Lexicon {
    /// The tables compiled into the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(EMBEDDED_LEXICON)
    }

    /// Read tables from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        info!(path = %path.display(), "Loading lexicon from file");
        Self::from_json(&raw)
    }

    /// Load from `path` when given, otherwise the embedded copy.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    /// Parse and check the tables.
    ///
    /// Templates whose mora count differs from their pool key are dropped, so
    /// every surviving entry satisfies its key. Padding suffixes and generic
    /// phrases must count exactly; a mismatch there is a configuration error.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut lexicon: Lexicon =
            serde_json::from_str(raw).map_err(|source| ConfigError::Json {
                table: "lexicon".into(),
                source,
            })?;

        lexicon.templates_5 = retain_exact("templates_5", lexicon.templates_5, 5);
        lexicon.templates_7 = retain_exact("templates_7", lexicon.templates_7, 7);

        for (index, suffix) in lexicon.padding.iter().enumerate() {
            let mora = count_mora(suffix);
            if mora != index + 1 {
                return Err(ConfigError::InvalidValue {
                    key: format!("padding[{index}]"),
                    message: format!("'{suffix}' counts {mora} mora, expected {}", index + 1),
                });
            }
        }

        for (key, phrase, target) in [
            ("generic_5", &lexicon.generic_5, 5),
            ("generic_7", &lexicon.generic_7, 7),
        ] {
            let mora = count_mora(phrase);
            if mora != target {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("'{phrase}' counts {mora} mora, expected {target}"),
                });
            }
        }

        debug!(
            templates_5 = lexicon.templates_5.len(),
            templates_7 = lexicon.templates_7.len(),
            food_keywords = lexicon.food_keywords.len(),
            exercise_keywords = lexicon.exercise_keywords.len(),
            "Lexicon loaded"
        );

        Ok(lexicon)
    }

    /// Template pool for a target mora count. Empty for unsupported targets.
    pub fn templates_for(&self, target: usize) -> &[String] {
        match target {
            5 => self.templates_5.as_slice(),
            7 => self.templates_7.as_slice(),
            _ => &[],
        }
    }

    /// Fixed fallback phrase for a target mora count.
    pub fn generic_for(&self, target: usize) -> Option<&str> {
        match target {
            5 => Some(self.generic_5.as_str()),
            7 => Some(self.generic_7.as_str()),
            _ => None,
        }
    }

    /// Suffix whose own mora count equals `deficit`, for deficits 1 to 3.
    pub fn padding_for(&self, deficit: usize) -> Option<&str> {
        match deficit {
            1..=3 => Some(self.padding[deficit - 1].as_str()),
            _ => None,
        }
    }

    pub fn mood_phrases_for(&self, tone: Tone) -> &[String; 2] {
        match tone {
            Tone::Positive => &self.mood_phrases.positive,
            Tone::Discouraged => &self.mood_phrases.discouraged,
            Tone::Neutral => &self.mood_phrases.neutral,
        }
    }
}

fn retain_exact(pool: &str, templates: Vec<String>, target: usize) -> Vec<String> {
    templates
        .into_iter()
        .filter(|template| {
            let mora = count_mora(template);
            if mora != target {
                warn!(pool, template = %template, mora, target_mora = target, "Dropping template with wrong mora count");
            }
            mora == target
        })
        .collect()
}
