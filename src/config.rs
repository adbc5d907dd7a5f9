//! Configuration types.

use std::path::PathBuf;

/// Default message length limit, in UTF-16 code units.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 140;

/// Default look-back window for mood history.
pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 7;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Messages longer than this are rejected before extraction.
    pub max_message_length: usize,
    /// How many days of prior comments feed the mood scorer.
    pub history_window_days: i64,
    /// Override for the keyword/template tables (defaults to the embedded copy).
    pub lexicon_path: Option<PathBuf>,
    /// Override for the food reference table (defaults to the embedded copy).
    pub food_table_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
            lexicon_path: None,
            food_table_path: None,
        }
    }
}

impl PipelineConfig {
    /// Build a config from `TANKA_*` environment variables.
    ///
    /// Unparsable numbers fall back to the defaults.
    pub fn from_env() -> Self {
        let max_message_length: usize = std::env::var("TANKA_MAX_MESSAGE_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_MESSAGE_LENGTH);

        let history_window_days: i64 = std::env::var("TANKA_HISTORY_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|days: &i64| *days >= 0)
            .unwrap_or(DEFAULT_HISTORY_WINDOW_DAYS);

        let lexicon_path = std::env::var("TANKA_LEXICON_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let food_table_path = std::env::var("TANKA_FOOD_TABLE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            max_message_length,
            history_window_days,
            lexicon_path,
            food_table_path,
        }
    }
}
