//! In-memory store — process-local maps behind async read/write locks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::pipeline::types::{HealthRecord, MoodAssessment, TankaPoem};

use super::traits::{HealthStore, HistoryProvider};

/// A saved record with its entry id.
#[derive(Debug, Clone)]
struct StoredRecord {
    id: Uuid,
    record: HealthRecord,
}

/// Keeps everything in memory; lost on exit.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, Vec<StoredRecord>>>,
    moods: RwLock<HashMap<(String, NaiveDate), MoodAssessment>>,
    poems: RwLock<HashMap<String, Vec<TankaPoem>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records saved for `owner_id`.
    pub async fn record_count(&self, owner_id: &str) -> usize {
        self.records
            .read()
            .await
            .get(owner_id)
            .map_or(0, |records| records.len())
    }

    /// Look up a saved record by entry id.
    pub async fn get_record(&self, id: Uuid) -> Option<HealthRecord> {
        self.records
            .read()
            .await
            .values()
            .flatten()
            .find(|stored| stored.id == id)
            .map(|stored| stored.record.clone())
    }

    async fn in_range(&self, owner_id: &str, start: NaiveDate, end: NaiveDate) -> Vec<HealthRecord> {
        let records = self.records.read().await;
        let mut matching: Vec<HealthRecord> = records
            .get(owner_id)
            .into_iter()
            .flatten()
            .filter(|stored| (start..=end).contains(&stored.record.day()))
            .map(|stored| stored.record.clone())
            .collect();
        matching.sort_by_key(|record| record.captured_at);
        matching
    }
}

#[async_trait]
impl HistoryProvider for InMemoryStore {
    async fn recent_comments(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .in_range(owner_id, start, end)
            .await
            .into_iter()
            .map(|record| record.free_comment)
            .filter(|comment| !comment.is_empty())
            .collect())
    }
}

#[async_trait]
impl HealthStore for InMemoryStore {
    async fn save_record(&self, record: &HealthRecord) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        debug!(id = %id, owner = %record.owner_id, day = %record.day(), "Saving health record");
        self.records
            .write()
            .await
            .entry(record.owner_id.clone())
            .or_default()
            .push(StoredRecord {
                id,
                record: record.clone(),
            });
        Ok(id)
    }

    async fn records_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HealthRecord>, StoreError> {
        Ok(self.in_range(owner_id, start, end).await)
    }

    async fn save_mood(
        &self,
        owner_id: &str,
        date: NaiveDate,
        mood: &MoodAssessment,
    ) -> Result<(), StoreError> {
        self.moods
            .write()
            .await
            .insert((owner_id.to_string(), date), mood.clone());
        Ok(())
    }

    async fn mood_on(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<MoodAssessment>, StoreError> {
        Ok(self
            .moods
            .read()
            .await
            .get(&(owner_id.to_string(), date))
            .cloned())
    }

    async fn moods_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, MoodAssessment)>, StoreError> {
        let moods = self.moods.read().await;
        let mut matching: Vec<(NaiveDate, MoodAssessment)> = moods
            .iter()
            .filter(|((owner, date), _)| owner == owner_id && (start..=end).contains(date))
            .map(|((_, date), mood)| (*date, mood.clone()))
            .collect();
        matching.sort_by_key(|(date, _)| *date);
        Ok(matching)
    }

    async fn save_poem(&self, owner_id: &str, poem: &TankaPoem) -> Result<(), StoreError> {
        self.poems
            .write()
            .await
            .entry(owner_id.to_string())
            .or_default()
            .push(poem.clone());
        Ok(())
    }

    async fn poems_for(&self, owner_id: &str) -> Result<Vec<TankaPoem>, StoreError> {
        Ok(self
            .poems
            .read()
            .await
            .get(owner_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn poems_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TankaPoem>, StoreError> {
        Ok(self
            .poems
            .read()
            .await
            .get(owner_id)
            .map(|poems| {
                poems
                    .iter()
                    .filter(|poem| (start..=end).contains(&poem.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
