//! Period summaries over stored moods, records and poems.
//!
//! Pure aggregation lives in `MentalSummary::from_moods`, `body_trend` and
//! `average_nutrition`; `build_report` pulls one period out of a store.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::nutrition::{NutritionEstimator, NutritionInfo};
use crate::pipeline::types::{HealthRecord, MoodAssessment, TankaPoem, Tone};
use crate::store::{HealthStore, window_start};

/// Look-back period for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeRange {
    #[default]
    OneMonth,
    ThreeMonths,
    SixMonths,
}

impl TimeRange {
    pub fn days(self) -> i64 {
        match self {
            TimeRange::OneMonth => 30,
            TimeRange::ThreeMonths => 90,
            TimeRange::SixMonths => 180,
        }
    }

    /// First day of the period ending at `end`.
    pub fn start_date(self, end: NaiveDate) -> NaiveDate {
        window_start(end, self.days())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    /// Accepts `ONE_MONTH`/`1m`, `THREE_MONTHS`/`3m`, `SIX_MONTHS`/`6m`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONE_MONTH" | "1M" => Ok(TimeRange::OneMonth),
            "THREE_MONTHS" | "3M" => Ok(TimeRange::ThreeMonths),
            "SIX_MONTHS" | "6M" => Ok(TimeRange::SixMonths),
            other => Err(format!("Unknown time range: {other}")),
        }
    }
}

/// Tone counts and mean motivation over a set of daily assessments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MentalSummary {
    pub positive: usize,
    pub neutral: usize,
    pub discouraged: usize,
    /// Zero when there are no assessments.
    pub average_motivation: f64,
}

impl MentalSummary {
    pub fn from_moods(moods: &[(NaiveDate, MoodAssessment)]) -> Self {
        let mut summary = Self::default();
        if moods.is_empty() {
            return summary;
        }

        let mut motivation_sum = 0.0;
        for (_, mood) in moods {
            match mood.tone {
                Tone::Positive => summary.positive += 1,
                Tone::Neutral => summary.neutral += 1,
                Tone::Discouraged => summary.discouraged += 1,
            }
            motivation_sum += mood.motivation();
        }
        summary.average_motivation = motivation_sum / moods.len() as f64;
        summary
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.discouraged
    }
}

/// One point of the weight / body-fat series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub body_fat_percentage: Option<f64>,
}

/// Date-sorted measurement series, one point per record.
///
/// Records without measurements stay in as gaps (both values `None`).
/// Records on the same day keep capture order.
pub fn body_trend(records: &[HealthRecord]) -> Vec<TrendPoint> {
    let mut sorted: Vec<&HealthRecord> = records.iter().collect();
    sorted.sort_by_key(|record| (record.day(), record.captured_at));
    sorted
        .into_iter()
        .map(|record| TrendPoint {
            date: record.day(),
            weight: record.weight,
            body_fat_percentage: record.body_fat_percentage,
        })
        .collect()
}

/// Mean per-entry nutrition over records that mention food.
pub fn average_nutrition(estimator: &NutritionEstimator, records: &[HealthRecord]) -> NutritionInfo {
    let estimates: Vec<NutritionInfo> = records
        .iter()
        .filter(|record| !record.food_items.is_empty())
        .map(|record| estimator.estimate(&record.food_items))
        .collect();

    if estimates.is_empty() {
        return NutritionInfo::default();
    }

    let n = estimates.len() as f64;
    NutritionInfo {
        calories: estimates.iter().map(|e| e.calories).sum::<f64>() / n,
        protein: estimates.iter().map(|e| e.protein).sum::<f64>() / n,
        fat: estimates.iter().map(|e| e.fat).sum::<f64>() / n,
        carbohydrate: estimates.iter().map(|e| e.carbohydrate).sum::<f64>() / n,
    }
}

/// Everything shown for one owner over one period.
#[derive(Debug, Clone)]
pub struct TrendReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub record_count: usize,
    pub mental: MentalSummary,
    pub body: Vec<TrendPoint>,
    pub nutrition: NutritionInfo,
    pub poems: Vec<TankaPoem>,
}

/// Collect a report for `[range.start_date(end), end]`.
pub async fn build_report(
    store: &dyn HealthStore,
    estimator: &NutritionEstimator,
    owner_id: &str,
    range: TimeRange,
    end: NaiveDate,
) -> Result<TrendReport, StoreError> {
    let start = range.start_date(end);
    let records = store.records_between(owner_id, start, end).await?;
    let moods = store.moods_between(owner_id, start, end).await?;
    let poems = store.poems_between(owner_id, start, end).await?;

    debug!(
        owner = %owner_id,
        %start,
        %end,
        records = records.len(),
        moods = moods.len(),
        poems = poems.len(),
        "Building trend report"
    );

    Ok(TrendReport {
        start,
        end,
        record_count: records.len(),
        mental: MentalSummary::from_moods(&moods),
        body: body_trend(&records),
        nutrition: average_nutrition(estimator, &records),
        poems,
    })
}
