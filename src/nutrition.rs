//! Food reference table and calorie/PFC estimation.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::pipeline::types::HealthRecord;

const EMBEDDED_FOOD_TABLE: &str = include_str!("../data/food-database.json");

/// Energy per gram of each macronutrient.
const PROTEIN_KCAL_PER_G: f64 = 4.0;
const FAT_KCAL_PER_G: f64 = 9.0;
const CARBOHYDRATE_KCAL_PER_G: f64 = 4.0;

/// Estimate added for a food snippet with no table match.
const UNKNOWN_FOOD: NutritionInfo = NutritionInfo {
    calories: 100.0,
    protein: 3.0,
    fat: 3.0,
    carbohydrate: 15.0,
};

/// One row of the food reference table (values per typical serving).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrate: f64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Read-only food reference table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodTable {
    pub foods: Vec<FoodItem>,
}

impl FoodTable {
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(EMBEDDED_FOOD_TABLE)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let table: FoodTable = serde_json::from_str(raw).map_err(|source| ConfigError::Json {
            table: "food table".into(),
            source,
        })?;
        debug!(foods = table.foods.len(), "Food table loaded");
        Ok(table)
    }

    /// Load from `path` when given, otherwise the embedded copy.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                info!(path = %path.display(), "Loading food table from file");
                Self::from_json(&std::fs::read_to_string(path)?)
            }
            None => Self::embedded(),
        }
    }

    /// Best match for free text: exact name, then alias contained in the
    /// text, then name contained in the text (or the text in the name).
    pub fn find(&self, text: &str) -> Option<&FoodItem> {
        let input = text.trim().to_lowercase();
        if input.is_empty() {
            return None;
        }

        self.foods
            .iter()
            .find(|food| food.name.to_lowercase() == input)
            .or_else(|| {
                self.foods.iter().find(|food| {
                    food.aliases
                        .iter()
                        .any(|alias| input.contains(&alias.to_lowercase()))
                })
            })
            .or_else(|| {
                self.foods.iter().find(|food| {
                    let name = food.name.to_lowercase();
                    input.contains(&name) || name.contains(&input)
                })
            })
    }
}

/// Calories (kcal) and macronutrients (g).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrate: f64,
}

impl NutritionInfo {
    fn add(&mut self, other: NutritionInfo) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.fat += other.fat;
        self.carbohydrate += other.carbohydrate;
    }
}

impl From<&FoodItem> for NutritionInfo {
    fn from(food: &FoodItem) -> Self {
        Self {
            calories: food.calories,
            protein: food.protein,
            fat: food.fat,
            carbohydrate: food.carbohydrate,
        }
    }
}

/// Share of energy from protein, fat and carbohydrate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PfcBalance {
    pub protein_ratio: f64,
    pub fat_ratio: f64,
    pub carbohydrate_ratio: f64,
}

impl PfcBalance {
    /// Ratios from grams. All zero when there is no energy at all.
    pub fn from_grams(protein: f64, fat: f64, carbohydrate: f64) -> Self {
        let protein_kcal = protein * PROTEIN_KCAL_PER_G;
        let fat_kcal = fat * FAT_KCAL_PER_G;
        let carbohydrate_kcal = carbohydrate * CARBOHYDRATE_KCAL_PER_G;
        let total = protein_kcal + fat_kcal + carbohydrate_kcal;

        if total == 0.0 {
            return Self::default();
        }

        Self {
            protein_ratio: protein_kcal / total,
            fat_ratio: fat_kcal / total,
            carbohydrate_ratio: carbohydrate_kcal / total,
        }
    }
}

/// A day's total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyNutrition {
    pub total_calories: f64,
    pub pfc: PfcBalance,
}

/// Estimates nutrition for food snippets against the reference table.
pub struct NutritionEstimator {
    table: Arc<FoodTable>,
}

impl NutritionEstimator {
    pub fn new(table: Arc<FoodTable>) -> Self {
        Self { table }
    }

    /// Sum over snippets; snippets with no match get a default estimate.
    pub fn estimate(&self, food_items: &[String]) -> NutritionInfo {
        let mut total = NutritionInfo::default();
        for text in food_items {
            match self.table.find(text) {
                Some(food) => {
                    debug!(food = %food.name, input = %text, "Matched food");
                    total.add(NutritionInfo::from(food));
                }
                None => {
                    debug!(input = %text, "No nutrition data, using default estimate");
                    total.add(UNKNOWN_FOOD);
                }
            }
        }
        total
    }

    /// Total calories and PFC balance over every record's food mentions.
    pub fn daily_total(&self, records: &[HealthRecord]) -> DailyNutrition {
        let mut total = NutritionInfo::default();
        for record in records.iter().filter(|r| !r.food_items.is_empty()) {
            total.add(self.estimate(&record.food_items));
        }

        DailyNutrition {
            total_calories: total.calories,
            pfc: PfcBalance::from_grams(total.protein, total.fat, total.carbohydrate),
        }
    }
}
