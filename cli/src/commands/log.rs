use anyhow::{Result, bail};
use std::process;

use mealtrack_core::models::{MealEntry, NutrientValue, Nutrients, validate_meal_type};

use super::Tracker;
use super::helpers::{format_meal_line, parse_date};

/// Fill the nutrient fields of a new entry. Flags given on the command line
/// win; omitted ones come from the food's saved values, if any.
pub(crate) fn resolve_nutrients(
    saved: Option<Nutrients>,
    calories: Option<String>,
    protein: Option<String>,
    fats: Option<String>,
    carbs: Option<String>,
) -> Nutrients {
    let saved = saved.unwrap_or_default();
    let pick = |given: Option<String>, fallback: NutrientValue| match given {
        Some(value) => NutrientValue::Text(value),
        None => fallback,
    };
    Nutrients {
        calories: pick(calories, saved.calories),
        protein: pick(protein, saved.protein),
        fats: pick(fats, saved.fats),
        carbs: pick(carbs, saved.carbs),
    }
}

/// A food seen for the first time has nothing to pre-fill from, so its
/// calories must be given.
pub(crate) fn require_calories_for_new_food(
    food_name: &str,
    known: bool,
    calories_given: bool,
) -> Result<()> {
    if !known && !calories_given {
        bail!("'{food_name}' has not been logged before; pass --calories");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_log(
    tracker: &mut Tracker,
    food: &str,
    meal: &str,
    calories: Option<String>,
    protein: Option<String>,
    fats: Option<String>,
    carbs: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let food_name = food.trim();
    if food_name.is_empty() {
        bail!("Food name must not be empty");
    }
    let meal_type = validate_meal_type(meal)?;
    let date = parse_date(date)?;

    let saved = tracker.prefill(food_name);
    let used_saved = saved.is_some();
    require_calories_for_new_food(food_name, used_saved, calories.is_some())?;

    let nutrients = resolve_nutrients(saved, calories, protein, fats, carbs);
    let entry = MealEntry::new(date, meal_type, food_name, nutrients);
    tracker.add_meal(entry.clone())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        if used_saved {
            eprintln!("Using saved values for '{food_name}' where not given");
        }
        println!("Logged on {}: {}", entry.date, format_meal_line(&entry));
    }

    Ok(())
}

pub(crate) fn cmd_suggest(tracker: &Tracker, query: &str, json: bool) -> Result<()> {
    let suggestions = tracker.suggest(query);

    if suggestions.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No saved foods match '{query}'");
        }
        process::exit(2);
    }

    if json {
        let detailed: Vec<serde_json::Value> = suggestions
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "nutrients": tracker.prefill(name),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&detailed)?);
    } else {
        for name in &suggestions {
            match tracker.prefill(name) {
                Some(n) => println!("{name} ({} kcal)", n.calories.as_int()),
                None => println!("{name}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved() -> Nutrients {
        Nutrients {
            calories: NutrientValue::from("52"),
            protein: NutrientValue::from("0"),
            fats: NutrientValue::Empty,
            carbs: NutrientValue::from("14"),
        }
    }

    #[test]
    fn test_new_food_without_calories_is_an_error() {
        let err = require_calories_for_new_food("Borscht", false, false).unwrap_err();
        assert!(err.to_string().contains("--calories"));
        assert!(require_calories_for_new_food("Borscht", false, true).is_ok());
        assert!(require_calories_for_new_food("Borscht", true, false).is_ok());
    }

    #[test]
    fn test_resolve_nutrients_uses_saved_values() {
        let n = resolve_nutrients(Some(saved()), None, None, None, None);
        assert_eq!(n, saved());
    }

    #[test]
    fn test_resolve_nutrients_flags_override_saved() {
        let n = resolve_nutrients(
            Some(saved()),
            Some("80".to_string()),
            None,
            Some("1".to_string()),
            None,
        );
        assert_eq!(n.calories, NutrientValue::from("80"));
        assert_eq!(n.protein, NutrientValue::from("0"));
        assert_eq!(n.fats, NutrientValue::from("1"));
        assert_eq!(n.carbs, NutrientValue::from("14"));
    }

    #[test]
    fn test_resolve_nutrients_new_food() {
        let n = resolve_nutrients(None, Some("300".to_string()), None, None, None);
        assert_eq!(n.calories.as_int(), 300);
        assert_eq!(n.protein, NutrientValue::Empty);
        assert_eq!(n.carbs, NutrientValue::Empty);
    }
}
