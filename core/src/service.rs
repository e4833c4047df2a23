use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};

use crate::aggregate;
use crate::autocomplete;
use crate::db::Database;
use crate::models::{
    DailyNutrients, DayLog, EXPORT_VERSION, ExportData, ImportSummary, MealEntry, Nutrients,
    PopularFood, RangeSpec, WeightEntry, WeightUpsert,
};
use crate::store::{EntryStore, KeyValueStore, LoadWarning, MemoryStore};

/// Owns the storage handle and the logged collections.
///
/// State is read once on construction and every mutation writes the
/// collections it touched back to the store. All views are derived from the
/// current collections on each call.
pub struct TrackerService<S: KeyValueStore> {
    store: S,
    entries: EntryStore,
    warnings: Vec<LoadWarning>,
}

impl TrackerService<Database> {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Self::with_store(db)
    }
}

impl TrackerService<MemoryStore> {
    pub fn new_in_memory() -> Result<Self> {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: KeyValueStore> TrackerService<S> {
    /// Load state from `store`. Collections that fail to parse start empty;
    /// their raw text is copied to `<key>.malformed` before anything can
    /// overwrite it, and the warnings stay available via [`Self::load_warnings`].
    pub fn with_store(mut store: S) -> Result<Self> {
        let report = EntryStore::load(&store)?;
        for warning in &report.warnings {
            let LoadWarning::Malformed { key, raw, .. } = warning;
            let backup_key = format!("{key}.malformed");
            store
                .set(&backup_key, raw)
                .with_context(|| format!("Failed to preserve malformed `{key}`"))?;
        }
        Ok(Self {
            store,
            entries: report.entries,
            warnings: report.warnings,
        })
    }

    #[must_use]
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    #[must_use]
    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Mutations ---

    pub fn add_meal(&mut self, meal: MealEntry) -> Result<()> {
        let recorded = self.entries.add_meal(meal);
        self.entries.save_meals(&mut self.store)?;
        if recorded {
            self.entries.save_food_history(&mut self.store)?;
        }
        Ok(())
    }

    pub fn add_weight_entry(&mut self, entry: WeightEntry) -> Result<WeightUpsert> {
        let outcome = self.entries.add_weight_entry(entry)?;
        self.entries.save_weight_entries(&mut self.store)?;
        Ok(outcome)
    }

    // --- Daily log ---

    #[must_use]
    pub fn daily_log(&self) -> Vec<DayLog> {
        aggregate::daily_log(&self.entries.meals)
    }

    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<DayLog> {
        self.daily_log().into_iter().find(|d| d.date == date)
    }

    // --- Trends ---

    #[must_use]
    pub fn nutrient_series(&self, range: RangeSpec, today: NaiveDate) -> Vec<DailyNutrients> {
        let series = aggregate::daily_nutrient_series(&self.entries.meals);
        aggregate::filter_by_range(&series, range, today)
    }

    #[must_use]
    pub fn weight_series(&self, range: RangeSpec, today: NaiveDate) -> Vec<WeightEntry> {
        aggregate::filter_by_range(&self.entries.weight_entries, range, today)
    }

    #[must_use]
    pub fn nutrient_series_to_date(&self, range: RangeSpec) -> Vec<DailyNutrients> {
        self.nutrient_series(range, Local::now().date_naive())
    }

    #[must_use]
    pub fn weight_series_to_date(&self, range: RangeSpec) -> Vec<WeightEntry> {
        self.weight_series(range, Local::now().date_naive())
    }

    #[must_use]
    pub fn popular_foods(&self, limit: usize) -> Vec<PopularFood> {
        aggregate::popular_foods(&self.entries.meals, limit)
    }

    // --- Weight ---

    #[must_use]
    pub fn weight_for(&self, date: NaiveDate) -> Option<&WeightEntry> {
        self.entries.weight_for(date)
    }

    #[must_use]
    pub fn recent_weights(&self, limit: usize) -> Vec<WeightEntry> {
        self.entries.recent_weights(limit)
    }

    // --- Autocomplete ---

    #[must_use]
    pub fn suggest(&self, query: &str) -> Vec<String> {
        autocomplete::suggest(query, &self.entries.food_history)
    }

    #[must_use]
    pub fn prefill(&self, name: &str) -> Option<Nutrients> {
        autocomplete::prefill(name, &self.entries.food_history)
    }

    // --- Export / Import ---

    #[must_use]
    pub fn export_all(&self) -> ExportData {
        ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            meals: self.entries.meals.clone(),
            food_history: self.entries.food_history.clone(),
            weight_entries: self.entries.weight_entries.clone(),
        }
    }

    /// Merge an export into the current state. Meals are appended through
    /// the normal add path, so names already in the history keep their
    /// values; weights are upserted by date.
    pub fn import_all(&mut self, data: ExportData) -> Result<ImportSummary> {
        if let Some(bad) = data.weight_entries.iter().find(|e| !e.weight.is_finite()) {
            bail!("Import rejected: weight for {} is not a finite number", bad.date);
        }
        let mut summary = ImportSummary::default();

        for (name, nutrients) in data.food_history.iter() {
            let name = name.trim();
            if !name.is_empty()
                && self
                    .entries
                    .food_history
                    .insert_if_absent(name, nutrients.clone())
            {
                summary.history_entries_added += 1;
            }
        }

        for meal in data.meals {
            if self.entries.add_meal(meal) {
                summary.history_entries_added += 1;
            }
            summary.meals_imported += 1;
        }

        for entry in data.weight_entries {
            match self.entries.add_weight_entry(entry)? {
                WeightUpsert::Inserted => summary.weight_entries_inserted += 1,
                WeightUpsert::Replaced => summary.weight_entries_replaced += 1,
            }
        }

        self.entries.save(&mut self.store)?;
        tracing::debug!(?summary, "import applied");
        Ok(summary)
    }
}
