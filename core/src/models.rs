use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder name used when ranking meals that were logged without a name.
pub const UNNAMED_FOOD: &str = "Unnamed";

pub const DEFAULT_POPULAR_LIMIT: usize = 10;

pub const MAX_SUGGESTIONS: usize = 5;

pub const EXPORT_VERSION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    #[serde(alias = "breakfast", alias = "Завтрак")]
    Breakfast,
    #[serde(alias = "lunch", alias = "Обед")]
    Lunch,
    #[serde(alias = "dinner", alias = "Ужин")]
    Dinner,
    #[serde(alias = "snack", alias = "Закуска")]
    Snack,
}

pub const MEAL_TYPES: &[MealType] = &[
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
];

impl MealType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "breakfast" | "завтрак" => Ok(MealType::Breakfast),
            "lunch" | "обед" => Ok(MealType::Lunch),
            "dinner" | "ужин" => Ok(MealType::Dinner),
            "snack" | "закуска" => Ok(MealType::Snack),
            _ => bail!(
                "Invalid meal type '{s}'. Must be one of: {}",
                MEAL_TYPES
                    .iter()
                    .map(|m| m.as_str().to_lowercase())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

pub fn validate_meal_type(meal: &str) -> Result<MealType> {
    meal.parse()
}

/// A nutrient field exactly as it was entered.
///
/// Form input arrives as text, older records may hold plain numbers, and
/// optional fields may be missing entirely. The value is kept in its original
/// shape so that persisting it is lossless; arithmetic goes through
/// [`NutrientValue::as_int`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl NutrientValue {
    /// Integer value used for all sums. Never fails: anything that does not
    /// start with an integer counts as 0.
    ///
    /// Numbers truncate toward zero. Text is read as an integer prefix:
    /// leading whitespace is skipped, an optional sign is honoured, and
    /// parsing stops at the first non-digit, so `"12.7"` and `"12g"` are 12.
    #[must_use]
    pub fn as_int(&self) -> i64 {
        match self {
            NutrientValue::Number(n) if n.is_finite() => n.trunc() as i64,
            NutrientValue::Number(_) | NutrientValue::Empty => 0,
            NutrientValue::Text(s) => parse_int_prefix(s),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            NutrientValue::Empty => true,
            NutrientValue::Text(s) => s.trim().is_empty(),
            NutrientValue::Number(_) => false,
        }
    }
}

fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
    if negative { -value } else { value }
}

impl fmt::Display for NutrientValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NutrientValue::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            NutrientValue::Number(n) => write!(f, "{n}"),
            NutrientValue::Text(s) => f.write_str(s),
            NutrientValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for NutrientValue {
    fn from(s: &str) -> Self {
        NutrientValue::Text(s.to_string())
    }
}

impl From<String> for NutrientValue {
    fn from(s: String) -> Self {
        NutrientValue::Text(s)
    }
}

impl From<Option<String>> for NutrientValue {
    fn from(s: Option<String>) -> Self {
        s.map_or(NutrientValue::Empty, NutrientValue::Text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default)]
    pub calories: NutrientValue,
    #[serde(default)]
    pub protein: NutrientValue,
    #[serde(default)]
    pub fats: NutrientValue,
    #[serde(default)]
    pub carbs: NutrientValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntry {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub food_name: String,
    #[serde(default)]
    pub calories: NutrientValue,
    #[serde(default)]
    pub protein: NutrientValue,
    #[serde(default)]
    pub fats: NutrientValue,
    #[serde(default)]
    pub carbs: NutrientValue,
}

impl MealEntry {
    #[must_use]
    pub fn new(
        date: NaiveDate,
        meal_type: MealType,
        food_name: impl Into<String>,
        nutrients: Nutrients,
    ) -> Self {
        Self {
            date,
            meal_type,
            food_name: food_name.into(),
            calories: nutrients.calories,
            protein: nutrients.protein,
            fats: nutrients.fats,
            carbs: nutrients.carbs,
        }
    }

    /// Snapshot of the four nutrient fields, as stored in the food history.
    #[must_use]
    pub fn nutrients(&self) -> Nutrients {
        Nutrients {
            calories: self.calories.clone(),
            protein: self.protein.clone(),
            fats: self.fats.clone(),
            carbs: self.carbs.clone(),
        }
    }
}

/// First-seen nutrient values per food name, in the order names were first
/// logged.
///
/// Serialized as a JSON object whose keys keep that order. A name is written
/// once; later meals with the same name never overwrite it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodHistory {
    entries: Vec<(String, Nutrients)>,
}

impl FoodHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Nutrients> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, nutrients)| nutrients)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns `false` and leaves the existing entry untouched when `name` is
    /// already present.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, nutrients: Nutrients) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, nutrients));
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Nutrients)> {
        self.entries
            .iter()
            .map(|(name, nutrients)| (name.as_str(), nutrients))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FoodHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, nutrients) in &self.entries {
            map.serialize_entry(name, nutrients)?;
        }
        map.end()
    }
}

struct FoodHistoryVisitor;

impl<'de> Visitor<'de> for FoodHistoryVisitor {
    type Value = FoodHistory;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of food names to nutrient values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<FoodHistory, A::Error> {
        let mut history = FoodHistory::new();
        while let Some((name, nutrients)) = access.next_entry::<String, Nutrients>()? {
            let name = name.trim();
            if !name.is_empty() {
                history.insert_if_absent(name, nutrients);
            }
        }
        Ok(history)
    }
}

impl<'de> Deserialize<'de> for FoodHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(FoodHistoryVisitor)
    }
}

// --- Weight tracking types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUpsert {
    Inserted,
    Replaced,
}

// --- Derived views ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub calories: i64,
    pub protein: i64,
    pub fats: i64,
    pub carbs: i64,
}

impl DailyTotals {
    pub fn add_meal(&mut self, meal: &MealEntry) {
        self.calories = self.calories.saturating_add(meal.calories.as_int());
        self.protein = self.protein.saturating_add(meal.protein.as_int());
        self.fats = self.fats.saturating_add(meal.fats.as_int());
        self.carbs = self.carbs.saturating_add(meal.carbs.as_int());
    }
}

/// One aggregated point of the per-day nutrient series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyNutrients {
    pub date: NaiveDate,
    pub calories: i64,
    pub protein: i64,
    pub fats: i64,
    pub carbs: i64,
}

impl DailyNutrients {
    #[must_use]
    pub fn totals(&self) -> DailyTotals {
        DailyTotals {
            calories: self.calories,
            protein: self.protein,
            fats: self.fats,
            carbs: self.carbs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLog {
    pub date: NaiveDate,
    pub meals: Vec<MealEntry>,
    pub totals: DailyTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularFood {
    pub name: String,
    pub count: usize,
}

/// Time window for trend views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// Only the current calendar date.
    Today,
    /// Everything, oldest first.
    All,
    /// The last N days up to and including today, oldest first.
    Days(u32),
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::Days(7)
    }
}

impl FromStr for RangeSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "today" => Ok(RangeSpec::Today),
            "all" => Ok(RangeSpec::All),
            other => match other.parse::<u32>() {
                Ok(days) => Ok(RangeSpec::Days(days)),
                Err(_) => bail!("Invalid range '{s}'. Use 'today', 'all', or a number of days"),
            },
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::Today => f.write_str("today"),
            RangeSpec::All => f.write_str("all"),
            RangeSpec::Days(n) => write!(f, "{n}"),
        }
    }
}

// --- Export / Import types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
    #[serde(default)]
    pub food_history: FoodHistory,
    #[serde(default)]
    pub weight_entries: Vec<WeightEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_field_names)]
pub struct ImportSummary {
    pub meals_imported: usize,
    pub history_entries_added: usize,
    pub weight_entries_inserted: usize,
    pub weight_entries_replaced: usize,
}
