//! Shared types for the message pipeline.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::nutrition::{DailyNutrition, NutritionInfo};
use crate::pipeline::mora::count_mora;

/// Target mora count of each tanka line, in order.
pub const TANKA_PATTERN: [usize; 5] = [5, 7, 5, 7, 7];

// ── Health record ───────────────────────────────────────────────────

/// Structured facts extracted from one message.
///
/// Built once by the extractor and handed to the caller, who decides whether
/// to persist it. `weight` and `body_fat_percentage` are finite when present;
/// the snippet lists never hold the same string twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Owner of the diary entry.
    pub owner_id: String,
    /// Calendar date the entry belongs to.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// When the message was captured.
    pub captured_at: DateTime<Utc>,
    /// Body weight in kilograms.
    pub weight: Option<f64>,
    /// Body-fat percentage.
    pub body_fat_percentage: Option<f64>,
    /// Text around the first food keyword, if any.
    #[serde(default)]
    pub food_items: Vec<String>,
    /// Text around the first exercise keyword, if any.
    #[serde(default)]
    pub exercises: Vec<String>,
    /// The message, verbatim.
    pub free_comment: String,
}

impl HealthRecord {
    /// The record's date, falling back to the local date of capture.
    pub fn day(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| self.captured_at.with_timezone(&Local).date_naive())
    }
}

// ── Mood ────────────────────────────────────────────────────────────

/// Emotional tone of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Discouraged,
    Neutral,
}

impl Tone {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Discouraged => "discouraged",
            Self::Neutral => "neutral",
        }
    }
}

/// Tone plus a motivation score in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAssessment {
    pub tone: Tone,
    motivation: f64,
    /// `category:keyword` tags for every dictionary hit in the message.
    pub indicators: Vec<String>,
}

impl MoodAssessment {
    /// Build an assessment, clamping motivation into `[0.0, 1.0]`.
    pub fn new(tone: Tone, motivation: f64, indicators: Vec<String>) -> Self {
        let motivation = if motivation.is_nan() {
            0.5
        } else {
            motivation.clamp(0.0, 1.0)
        };
        Self {
            tone,
            motivation,
            indicators,
        }
    }

    /// The assessment for a message with nothing to go on.
    pub fn neutral() -> Self {
        Self::new(Tone::Neutral, 0.5, Vec::new())
    }

    pub fn motivation(&self) -> f64 {
        self.motivation
    }
}

// ── Tanka ───────────────────────────────────────────────────────────

/// A five-line poem for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankaPoem {
    pub lines: [String; 5],
    pub date: NaiveDate,
}

impl TankaPoem {
    pub fn new(lines: [String; 5], date: NaiveDate) -> Self {
        Self { lines, date }
    }

    /// Mora count of each line.
    pub fn line_mora(&self) -> [usize; 5] {
        std::array::from_fn(|i| count_mora(&self.lines[i]))
    }

    /// Whether every line hits its target in [`TANKA_PATTERN`].
    pub fn is_well_formed(&self) -> bool {
        self.line_mora() == TANKA_PATTERN
    }
}

impl std::fmt::Display for TankaPoem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

// ── Pipeline output ─────────────────────────────────────────────────

/// Everything produced for one inbound message.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub record: HealthRecord,
    pub mood: MoodAssessment,
    pub poem: TankaPoem,
    /// Estimate for this message's food mentions.
    pub nutrition: NutritionInfo,
    /// Running total for the record's day, this message included.
    pub daily: DailyNutrition,
}
