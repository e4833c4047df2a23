use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::aggregate;
use crate::models::{FoodHistory, MealEntry, WeightEntry, WeightUpsert};

pub const MEALS_KEY: &str = "meals";
pub const FOOD_HISTORY_KEY: &str = "foodHistory";
pub const WEIGHT_ENTRIES_KEY: &str = "weightEntries";

/// String-keyed persistent storage the entry store is saved to.
///
/// Implementations only move strings around; (de)serialization is the
/// caller's concern.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stored data that could not be read back. Never fatal: the affected
/// collection starts out empty.
#[derive(Debug, Error)]
pub enum LoadWarning {
    #[error("stored `{key}` is malformed, starting with an empty collection: {source}")]
    Malformed {
        key: &'static str,
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadWarning {
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            LoadWarning::Malformed { key, .. } => *key,
        }
    }
}

#[derive(Debug)]
pub struct LoadReport {
    pub entries: EntryStore,
    pub warnings: Vec<LoadWarning>,
}

/// The three persisted collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryStore {
    pub meals: Vec<MealEntry>,
    pub food_history: FoodHistory,
    pub weight_entries: Vec<WeightEntry>,
}

impl EntryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a meal and remember its nutrients under its trimmed name unless
    /// that name is already known. Returns whether a history entry was created.
    pub fn add_meal(&mut self, meal: MealEntry) -> bool {
        let key = meal.food_name.trim();
        let recorded = !key.is_empty()
            && self
                .food_history
                .insert_if_absent(key.to_string(), meal.nutrients());
        tracing::debug!(
            date = %meal.date,
            food = %meal.food_name,
            history_recorded = recorded,
            "meal added"
        );
        self.meals.push(meal);
        recorded
    }

    /// Insert or replace the weight for `entry.date`. A replaced entry keeps
    /// its position in the collection. Non-finite weights are rejected.
    pub fn add_weight_entry(&mut self, entry: WeightEntry) -> Result<WeightUpsert> {
        if !entry.weight.is_finite() {
            bail!("Weight for {} must be a finite number", entry.date);
        }
        let outcome = if let Some(existing) = self
            .weight_entries
            .iter_mut()
            .find(|e| e.date == entry.date)
        {
            *existing = entry;
            WeightUpsert::Replaced
        } else {
            self.weight_entries.push(entry);
            WeightUpsert::Inserted
        };
        tracing::debug!(?outcome, "weight entry stored");
        Ok(outcome)
    }

    #[must_use]
    pub fn weight_for(&self, date: NaiveDate) -> Option<&WeightEntry> {
        self.weight_entries.iter().find(|e| e.date == date)
    }

    #[must_use]
    pub fn recent_weights(&self, limit: usize) -> Vec<WeightEntry> {
        aggregate::recent_weights(&self.weight_entries, limit)
    }

    /// Read all three collections. Absent keys give empty collections;
    /// malformed ones give empty collections plus a [`LoadWarning`]. Only a
    /// failing store is an error.
    pub fn load(store: &impl KeyValueStore) -> Result<LoadReport> {
        let mut warnings = Vec::new();
        let meals = load_collection(store, MEALS_KEY, &mut warnings)?;
        let food_history = load_collection(store, FOOD_HISTORY_KEY, &mut warnings)?;
        let weight_entries = load_collection(store, WEIGHT_ENTRIES_KEY, &mut warnings)?;
        Ok(LoadReport {
            entries: EntryStore {
                meals,
                food_history,
                weight_entries,
            },
            warnings,
        })
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<()> {
        self.save_meals(store)?;
        self.save_food_history(store)?;
        self.save_weight_entries(store)
    }

    pub fn save_meals(&self, store: &mut impl KeyValueStore) -> Result<()> {
        save_collection(store, MEALS_KEY, &self.meals)
    }

    pub fn save_food_history(&self, store: &mut impl KeyValueStore) -> Result<()> {
        save_collection(store, FOOD_HISTORY_KEY, &self.food_history)
    }

    pub fn save_weight_entries(&self, store: &mut impl KeyValueStore) -> Result<()> {
        save_collection(store, WEIGHT_ENTRIES_KEY, &self.weight_entries)
    }
}

fn load_collection<T: DeserializeOwned + Default>(
    store: &impl KeyValueStore,
    key: &'static str,
    warnings: &mut Vec<LoadWarning>,
) -> Result<T> {
    let Some(raw) = store
        .get(key)
        .with_context(|| format!("Failed to read `{key}` from storage"))?
    else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(source) => {
            tracing::warn!(key, error = %source, "stored collection is malformed, using an empty one");
            warnings.push(LoadWarning::Malformed { key, raw, source });
            Ok(T::default())
        }
    }
}

fn save_collection<T: Serialize + ?Sized>(
    store: &mut impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize `{key}`"))?;
    store
        .set(key, &json)
        .with_context(|| format!("Failed to write `{key}` to storage"))?;
    tracing::debug!(key, bytes = json.len(), "collection saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealType, NutrientValue, Nutrients};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn meal(name: &str, calories: f64) -> MealEntry {
        MealEntry::new(
            date("2024-01-01"),
            MealType::Snack,
            name,
            Nutrients {
                calories: NutrientValue::Number(calories),
                protein: NutrientValue::from("1"),
                fats: NutrientValue::Empty,
                carbs: NutrientValue::from("abc"),
            },
        )
    }

    fn weight(day: &str, kg: f64) -> WeightEntry {
        WeightEntry {
            date: date(day),
            weight: kg,
        }
    }

    #[test]
    fn test_add_meal_first_write_wins() {
        let mut entries = EntryStore::new();
        assert!(entries.add_meal(meal("Apple", 50.0)));
        assert!(!entries.add_meal(meal("Apple", 90.0)));

        assert_eq!(entries.meals.len(), 2);
        assert_eq!(entries.food_history.len(), 1);
        assert_eq!(
            entries.food_history.get("Apple").unwrap().calories,
            NutrientValue::Number(50.0)
        );
    }

    #[test]
    fn test_add_meal_history_key_is_trimmed() {
        let mut entries = EntryStore::new();
        entries.add_meal(meal("  Apple ", 50.0));
        assert!(entries.food_history.contains("Apple"));
        assert!(!entries.add_meal(meal("Apple", 70.0)));
        assert_eq!(entries.meals[0].food_name, "  Apple ");
    }

    #[test]
    fn test_add_meal_blank_name_skips_history() {
        let mut entries = EntryStore::new();
        assert!(!entries.add_meal(meal("   ", 50.0)));
        assert_eq!(entries.meals.len(), 1);
        assert!(entries.food_history.is_empty());
    }

    #[test]
    fn test_add_meal_history_is_case_sensitive() {
        let mut entries = EntryStore::new();
        entries.add_meal(meal("apple", 50.0));
        assert!(entries.add_meal(meal("Apple", 60.0)));
        assert_eq!(entries.food_history.len(), 2);
    }

    #[test]
    fn test_weight_upsert_replaces_in_place() {
        let mut entries = EntryStore::new();
        assert_eq!(
            entries.add_weight_entry(weight("2024-01-01", 70.0)).unwrap(),
            WeightUpsert::Inserted
        );
        assert_eq!(
            entries.add_weight_entry(weight("2024-01-01", 71.0)).unwrap(),
            WeightUpsert::Replaced
        );
        assert_eq!(entries.weight_entries, vec![weight("2024-01-01", 71.0)]);

        assert_eq!(
            entries.add_weight_entry(weight("2024-01-02", 71.0)).unwrap(),
            WeightUpsert::Inserted
        );
        assert_eq!(entries.weight_entries.len(), 2);
    }

    #[test]
    fn test_weight_upsert_keeps_position() {
        let mut entries = EntryStore::new();
        entries.add_weight_entry(weight("2024-01-03", 70.0)).unwrap();
        entries.add_weight_entry(weight("2024-01-01", 71.0)).unwrap();
        entries.add_weight_entry(weight("2024-01-02", 72.0)).unwrap();
        entries.add_weight_entry(weight("2024-01-01", 69.5)).unwrap();

        let dates: Vec<NaiveDate> = entries.weight_entries.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date("2024-01-03"), date("2024-01-01"), date("2024-01-02")]
        );
        assert!((entries.weight_entries[1].weight - 69.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weight_upsert_rejects_non_finite() {
        let mut entries = EntryStore::new();
        entries.add_weight_entry(weight("2024-01-01", 70.0)).unwrap();
        assert!(entries.add_weight_entry(weight("2024-01-02", f64::NAN)).is_err());
        assert!(
            entries
                .add_weight_entry(weight("2024-01-01", f64::INFINITY))
                .is_err()
        );
        assert_eq!(entries.weight_entries, vec![weight("2024-01-01", 70.0)]);

        let mut store = MemoryStore::new();
        entries.save(&mut store).unwrap();
        let report = EntryStore::load(&store).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.entries.weight_entries.len(), 1);
    }

    #[test]
    fn test_weight_for() {
        let mut entries = EntryStore::new();
        entries.add_weight_entry(weight("2024-01-03", 70.0)).unwrap();
        assert!(entries.weight_for(date("2024-01-03")).is_some());
        assert!(entries.weight_for(date("2024-01-04")).is_none());
    }

    #[test]
    fn test_load_missing_keys_gives_empty() {
        let store = MemoryStore::new();
        let report = EntryStore::load(&store).unwrap();
        assert_eq!(report.entries, EntryStore::new());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut entries = EntryStore::new();
        entries.add_meal(meal("Zucchini", 30.0));
        entries.add_meal(meal("Apple", 50.0));
        entries.add_meal(meal("Zucchini", 35.0));
        entries.add_weight_entry(weight("2024-01-02", 70.2)).unwrap();
        entries.add_weight_entry(weight("2024-01-01", 70.9)).unwrap();

        let mut store = MemoryStore::new();
        entries.save(&mut store).unwrap();
        let report = EntryStore::load(&store).unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(report.entries, entries);
        assert_eq!(
            report.entries.food_history.names().collect::<Vec<_>>(),
            vec!["Zucchini", "Apple"]
        );
    }

    #[test]
    fn test_load_malformed_collection_falls_back() {
        let mut store = MemoryStore::new();
        store.set(MEALS_KEY, "{not json").unwrap();
        store
            .set(WEIGHT_ENTRIES_KEY, r#"[{"date":"2024-01-01","weight":70.5}]"#)
            .unwrap();

        let report = EntryStore::load(&store).unwrap();
        assert!(report.entries.meals.is_empty());
        assert_eq!(report.entries.weight_entries.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].key(), MEALS_KEY);
        let LoadWarning::Malformed { raw, .. } = &report.warnings[0];
        assert_eq!(raw, "{not json");
    }

    #[test]
    fn test_load_wrong_shape_is_malformed() {
        let mut store = MemoryStore::new();
        store.set(FOOD_HISTORY_KEY, "[]").unwrap();
        store.set(WEIGHT_ENTRIES_KEY, r#"[{"date":"yesterday","weight":70}]"#).unwrap();

        let report = EntryStore::load(&store).unwrap();
        assert_eq!(report.warnings.len(), 2);
        assert!(report.entries.food_history.is_empty());
        assert!(report.entries.weight_entries.is_empty());
    }

    #[test]
    fn test_load_reads_browser_shaped_data() {
        let mut store = MemoryStore::new();
        store
            .set(
                MEALS_KEY,
                r#"[{"date":"2024-01-01","mealType":"Завтрак","foodName":"Каша","calories":"250","protein":"8","fats":"","carbs":"40"}]"#,
            )
            .unwrap();
        store
            .set(
                FOOD_HISTORY_KEY,
                r#"{"Каша":{"calories":"250","protein":"8","fats":"","carbs":"40"}}"#,
            )
            .unwrap();

        let report = EntryStore::load(&store).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.entries.meals[0].meal_type, MealType::Breakfast);
        assert_eq!(report.entries.meals[0].calories.as_int(), 250);
        assert!(report.entries.food_history.contains("Каша"));
    }
}
