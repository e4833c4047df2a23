//! Derived views over the logged meals and weights.
//!
//! Everything here is a pure function of its inputs. Views are recomputed on
//! every call; nothing is cached between calls.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};

use crate::models::{
    DailyNutrients, DailyTotals, DayLog, MealEntry, PopularFood, RangeSpec, UNNAMED_FOOD,
    WeightEntry,
};

/// Anything that belongs to a single calendar date and can be range-filtered.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for MealEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for DailyNutrients {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for WeightEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Partition meals by date. Within a date, meals keep their logged order.
#[must_use]
pub fn group_meals_by_date(meals: &[MealEntry]) -> BTreeMap<NaiveDate, Vec<&MealEntry>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<&MealEntry>> = BTreeMap::new();
    for meal in meals {
        grouped.entry(meal.date).or_default().push(meal);
    }
    grouped
}

/// Sum of every nutrient field, each coerced with [`crate::models::NutrientValue::as_int`].
pub fn daily_totals<'a>(day_meals: impl IntoIterator<Item = &'a MealEntry>) -> DailyTotals {
    let mut totals = DailyTotals::default();
    for meal in day_meals {
        totals.add_meal(meal);
    }
    totals
}

/// Newest date first.
#[must_use]
pub fn sorted_dates_descending<T>(grouped: &BTreeMap<NaiveDate, T>) -> Vec<NaiveDate> {
    grouped.keys().rev().copied().collect()
}

/// The daily log view: one group per date, newest first, with that day's totals.
#[must_use]
pub fn daily_log(meals: &[MealEntry]) -> Vec<DayLog> {
    let grouped = group_meals_by_date(meals);
    sorted_dates_descending(&grouped)
        .into_iter()
        .map(|date| {
            let day_meals = &grouped[&date];
            DayLog {
                date,
                totals: daily_totals(day_meals.iter().copied()),
                meals: day_meals.iter().map(|m| (*m).clone()).collect(),
            }
        })
        .collect()
}

/// One aggregated point per distinct date, in the order each date first
/// appears in `meals`. Callers that need chronological order run the result
/// through [`filter_by_range`].
#[must_use]
pub fn daily_nutrient_series(meals: &[MealEntry]) -> Vec<DailyNutrients> {
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut totals: Vec<(NaiveDate, DailyTotals)> = Vec::new();

    for meal in meals {
        let slot = *index.entry(meal.date).or_insert_with(|| {
            totals.push((meal.date, DailyTotals::default()));
            totals.len() - 1
        });
        totals[slot].1.add_meal(meal);
    }

    totals
        .into_iter()
        .map(|(date, t)| DailyNutrients {
            date,
            calories: t.calories,
            protein: t.protein,
            fats: t.fats,
            carbs: t.carbs,
        })
        .collect()
}

/// Keep the items that fall inside `range`, relative to `today`.
///
/// `Today` keeps exact-date matches in their input order. `All` and
/// `Days(n)` return ascending dates; the sort is stable, so items sharing a
/// date keep their input order. `Days(n)` keeps every item dated on or after
/// `today - n`, which includes today itself.
#[must_use]
pub fn filter_by_range<T: Dated + Clone>(items: &[T], range: RangeSpec, today: NaiveDate) -> Vec<T> {
    let mut kept: Vec<T> = match range {
        RangeSpec::Today => {
            return items
                .iter()
                .filter(|item| item.date() == today)
                .cloned()
                .collect();
        }
        RangeSpec::All => items.to_vec(),
        RangeSpec::Days(n) => {
            let cutoff = today
                .checked_sub_days(Days::new(u64::from(n)))
                .unwrap_or(NaiveDate::MIN);
            items
                .iter()
                .filter(|item| item.date() >= cutoff)
                .cloned()
                .collect()
        }
    };
    kept.sort_by_key(Dated::date);
    kept
}

/// Most frequently logged food names, highest count first, at most `limit`.
///
/// Names are trimmed; blank names are counted under [`UNNAMED_FOOD`]. Equal
/// counts keep the order in which the names were first logged.
#[must_use]
pub fn popular_foods(meals: &[MealEntry], limit: usize) -> Vec<PopularFood> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<PopularFood> = Vec::new();

    for meal in meals {
        let trimmed = meal.food_name.trim();
        let name = if trimmed.is_empty() {
            UNNAMED_FOOD
        } else {
            trimmed
        };
        match index.get(name) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(name, counts.len());
                counts.push(PopularFood {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Weight entries newest first, at most `limit`.
#[must_use]
pub fn recent_weights(entries: &[WeightEntry], limit: usize) -> Vec<WeightEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}
