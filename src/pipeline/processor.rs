//! Message processor — runs one message through the whole pipeline.
//!
//! Flow:
//! 1. Owner check, then extraction (`MessageTooLong` surfaces unchanged)
//! 2. History fetch for the configured window, then mood scoring
//! 3. Poem generation and nutrition estimate
//! 4. Persist record, mood and poem; compute the day's running total
//!
//! History is read before the new record is saved, so a message never counts
//! as its own history.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::lexicon::Lexicon;
use crate::nutrition::{FoodTable, NutritionEstimator};
use crate::pipeline::extractor::Extractor;
use crate::pipeline::mood::MoodScorer;
use crate::pipeline::tanka::PoemGenerator;
use crate::pipeline::types::{HealthRecord, PipelineOutput};
use crate::store::{HealthStore, window_start};
use crate::validation;

/// Wires the three pipeline components to a store.
pub struct HealthChatProcessor {
    extractor: Extractor,
    scorer: MoodScorer,
    generator: PoemGenerator,
    estimator: NutritionEstimator,
    store: Arc<dyn HealthStore>,
    history_window_days: i64,
}

impl HealthChatProcessor {
    /// Create a processor sharing the given static tables.
    pub fn new(
        config: &PipelineConfig,
        lexicon: Arc<Lexicon>,
        foods: Arc<FoodTable>,
        store: Arc<dyn HealthStore>,
    ) -> Self {
        Self {
            extractor: Extractor::with_limit(lexicon.clone(), config.max_message_length),
            scorer: MoodScorer::new(lexicon.clone()),
            generator: PoemGenerator::new(lexicon),
            estimator: NutritionEstimator::new(foods),
            store,
            history_window_days: config.history_window_days,
        }
    }

    /// Replace the poem generator (e.g. one built `without_templates`).
    pub fn with_generator(mut self, generator: PoemGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Process a single message for `owner_id`.
    pub async fn process(
        &self,
        owner_id: &str,
        message: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let owner_check = validation::validate_owner_id(owner_id);
        if !owner_check.is_valid {
            return Err(PipelineError::Validation {
                reason: owner_check.error_message(),
            });
        }

        let record = self.extractor.extract(owner_id, message)?;
        flag_implausible(&record);

        let day = record.day();
        let start = window_start(day, self.history_window_days);
        let history = self.store.recent_comments(owner_id, start, day).await?;
        debug!(owner = %owner_id, entries = history.len(), %start, end = %day, "History loaded");

        let mood = self.scorer.analyze(message, &history);
        let poem = self.generator.generate(&record, &mood);
        let nutrition = self.estimator.estimate(&record.food_items);

        self.store.save_record(&record).await?;
        self.store.save_mood(owner_id, day, &mood).await?;
        self.store.save_poem(owner_id, &poem).await?;

        let todays_records = self.store.records_between(owner_id, day, day).await?;
        let daily = self.estimator.daily_total(&todays_records);

        info!(
            owner = %owner_id,
            weight = ?record.weight,
            body_fat = ?record.body_fat_percentage,
            tone = mood.tone.label(),
            motivation = mood.motivation(),
            well_formed = poem.is_well_formed(),
            daily_calories = daily.total_calories,
            "Message processed"
        );

        Ok(PipelineOutput {
            record,
            mood,
            poem,
            nutrition,
            daily,
        })
    }
}

fn flag_implausible(record: &HealthRecord) {
    for check in [
        validation::validate_weight(record.weight),
        validation::validate_body_fat(record.body_fat_percentage),
    ] {
        if !check.is_valid {
            warn!(
                owner = %record.owner_id,
                reason = %check.error_message(),
                "Implausible measurement kept as written"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, StoreError};
    use crate::pipeline::types::Tone;
    use crate::store::InMemoryStore;

    fn processor(store: Arc<InMemoryStore>) -> HealthChatProcessor {
        HealthChatProcessor::new(
            &PipelineConfig::default(),
            Arc::new(Lexicon::embedded().unwrap()),
            Arc::new(FoodTable::embedded().unwrap()),
            store,
        )
    }

    #[tokio::test]
    async fn blank_owner_is_rejected() {
        let proc = processor(Arc::new(InMemoryStore::new()));
        let err = proc.process("  ", "体重65kg").await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[tokio::test]
    async fn too_long_is_surfaced_and_nothing_saved() {
        let store = Arc::new(InMemoryStore::new());
        let proc = processor(store.clone());
        let err = proc.process("alice", &"あ".repeat(141)).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extract(ExtractError::MessageTooLong { length: 141, max: 140 })
        ));
        assert_eq!(store.record_count("alice").await, 0);
    }

    #[tokio::test]
    async fn saves_record_mood_and_poem() {
        let store = Arc::new(InMemoryStore::new());
        let proc = processor(store.clone());
        let out = proc.process("alice", "朝食にご飯を食べた。嬉しい").await.unwrap();

        assert_eq!(store.record_count("alice").await, 1);
        let day = out.record.day();
        assert_eq!(store.mood_on("alice", day).await.unwrap(), Some(out.mood.clone()));
        assert_eq!(store.poems_for("alice").await.unwrap(), vec![out.poem.clone()]);
        assert_eq!(out.mood.tone, Tone::Positive);
        assert!(out.nutrition.calories > 0.0);
        assert_eq!(out.daily.total_calories, out.nutrition.calories);
    }

    #[tokio::test]
    async fn message_is_not_its_own_history() {
        let store = Arc::new(InMemoryStore::new());
        let proc = processor(store.clone());
        // a silent message with no prior history stays neutral
        let out = proc.process("alice", "散歩した").await.unwrap();
        assert_eq!(out.mood.tone, Tone::Neutral);
    }

    #[tokio::test]
    async fn earlier_messages_feed_history() {
        let store = Arc::new(InMemoryStore::new());
        let proc = processor(store.clone());
        proc.process("alice", "辛い").await.unwrap();
        proc.process("alice", "悲しい").await.unwrap();
        let out = proc.process("alice", "散歩した").await.unwrap();
        assert_eq!(out.mood.tone, Tone::Discouraged);

        // another owner's history is separate
        let other = proc.process("bob", "散歩した").await.unwrap();
        assert_eq!(other.mood.tone, Tone::Neutral);
    }

    #[tokio::test]
    async fn huge_history_window_does_not_overflow() {
        let store = Arc::new(InMemoryStore::new());
        let config = PipelineConfig {
            history_window_days: 100_000_000,
            ..PipelineConfig::default()
        };
        let proc = HealthChatProcessor::new(
            &config,
            Arc::new(Lexicon::embedded().unwrap()),
            Arc::new(FoodTable::embedded().unwrap()),
            store.clone(),
        );
        proc.process("alice", "嬉しい").await.unwrap();
        let out = proc.process("alice", "体重65kg").await.unwrap();
        assert_eq!(out.record.weight, Some(65.0));
        // the whole history is still in the window
        assert_eq!(out.mood.tone, Tone::Positive);
        assert_eq!(store.record_count("alice").await, 2);
    }

    #[tokio::test]
    async fn history_failure_propagates() {
        use async_trait::async_trait;
        use chrono::NaiveDate;
        use uuid::Uuid;

        use crate::pipeline::types::{HealthRecord, MoodAssessment, TankaPoem};
        use crate::store::HistoryProvider;

        struct BrokenStore;

        #[async_trait]
        impl HistoryProvider for BrokenStore {
            async fn recent_comments(
                &self,
                _owner_id: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<String>, StoreError> {
                Err(StoreError::Backend("connection refused".into()))
            }
        }

        #[async_trait]
        impl HealthStore for BrokenStore {
            async fn save_record(&self, _record: &HealthRecord) -> Result<Uuid, StoreError> {
                unreachable!("history fails first")
            }
            async fn records_between(
                &self,
                _owner_id: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<HealthRecord>, StoreError> {
                unreachable!("history fails first")
            }
            async fn save_mood(
                &self,
                _owner_id: &str,
                _date: NaiveDate,
                _mood: &MoodAssessment,
            ) -> Result<(), StoreError> {
                unreachable!("history fails first")
            }
            async fn mood_on(
                &self,
                _owner_id: &str,
                _date: NaiveDate,
            ) -> Result<Option<MoodAssessment>, StoreError> {
                unreachable!("history fails first")
            }
            async fn save_poem(&self, _owner_id: &str, _poem: &TankaPoem) -> Result<(), StoreError> {
                unreachable!("history fails first")
            }
            async fn moods_between(
                &self,
                _owner_id: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<(NaiveDate, MoodAssessment)>, StoreError> {
                unreachable!("history fails first")
            }
            async fn poems_for(&self, _owner_id: &str) -> Result<Vec<TankaPoem>, StoreError> {
                unreachable!("history fails first")
            }
            async fn poems_between(
                &self,
                _owner_id: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<TankaPoem>, StoreError> {
                unreachable!("history fails first")
            }
        }

        let proc = HealthChatProcessor::new(
            &PipelineConfig::default(),
            Arc::new(Lexicon::embedded().unwrap()),
            Arc::new(FoodTable::embedded().unwrap()),
            Arc::new(BrokenStore),
        );
        let err = proc.process("alice", "体重65kg").await.unwrap_err();
        assert!(matches!(err, PipelineError::Store(StoreError::Backend(_))));
    }
}
