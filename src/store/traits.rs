//! Store traits — the contract between the pipeline and whatever persists its output.
//!
//! The pipeline only ever reads prior comments (for the mood history) and
//! hands finished records, moods and poems back for saving.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::error::StoreError;
use crate::pipeline::types::{HealthRecord, MoodAssessment, TankaPoem};

/// First day of a `days`-long look-back ending at `end`.
///
/// Saturates at [`NaiveDate::MIN`] instead of overflowing.
pub fn window_start(end: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|span| end.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// Source of prior free-text comments for the mood scorer.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Verbatim comments for `owner_id` dated within `[start, end]`, oldest first.
    ///
    /// No data is an empty list, not an error.
    async fn recent_comments(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, StoreError>;
}

/// Backend-agnostic persistence for pipeline output.
#[async_trait]
pub trait HealthStore: HistoryProvider {
    // ── Records ─────────────────────────────────────────────────────

    /// Save a record. Returns the generated entry id.
    async fn save_record(&self, record: &HealthRecord) -> Result<Uuid, StoreError>;

    /// Records for `owner_id` dated within `[start, end]`, oldest first.
    async fn records_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HealthRecord>, StoreError>;

    // ── Moods ───────────────────────────────────────────────────────

    /// Save the assessment for a day, replacing any earlier one.
    async fn save_mood(
        &self,
        owner_id: &str,
        date: NaiveDate,
        mood: &MoodAssessment,
    ) -> Result<(), StoreError>;

    /// The latest assessment saved for a day.
    async fn mood_on(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<MoodAssessment>, StoreError>;

    /// Saved assessments dated within `[start, end]`, by date.
    async fn moods_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, MoodAssessment)>, StoreError>;

    // ── Poems ───────────────────────────────────────────────────────

    /// Append a poem to the owner's history.
    async fn save_poem(&self, owner_id: &str, poem: &TankaPoem) -> Result<(), StoreError>;

    /// All poems for `owner_id`, oldest first.
    async fn poems_for(&self, owner_id: &str) -> Result<Vec<TankaPoem>, StoreError>;

    /// Poems dated within `[start, end]`, in save order.
    async fn poems_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TankaPoem>, StoreError>;
}
