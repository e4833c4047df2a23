use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use mealtrack_core::models::{DailyTotals, MealEntry, RangeSpec};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn parse_range(s: &str) -> Result<RangeSpec> {
    s.parse()
}

/// Human label for a range, used in "nothing found" messages.
pub(crate) fn describe_range(range: RangeSpec) -> String {
    match range {
        RangeSpec::Today => "today".to_string(),
        RangeSpec::All => "any date".to_string(),
        RangeSpec::Days(1) => "the last day".to_string(),
        RangeSpec::Days(n) => format!("the last {n} days"),
    }
}

/// One meal as a single line: name, calories, and whichever macros were filled in.
pub(crate) fn format_meal_line(meal: &MealEntry) -> String {
    let mut line = format!(
        "[{}] {} — {} kcal",
        meal.meal_type,
        meal.food_name,
        meal.calories.as_int()
    );
    let macros: Vec<String> = [
        ("P", &meal.protein),
        ("F", &meal.fats),
        ("C", &meal.carbs),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_blank())
    .map(|(label, value)| format!("{label}:{value}g"))
    .collect();
    if !macros.is_empty() {
        line.push_str(" | ");
        line.push_str(&macros.join(" "));
    }
    line
}

pub(crate) fn format_totals(totals: &DailyTotals) -> String {
    let DailyTotals {
        calories,
        protein,
        fats,
        carbs,
    } = totals;
    format!("{calories} kcal | P:{protein}g F:{fats}g C:{carbs}g")
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealtrack_core::models::{MealType, NutrientValue, Nutrients};

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("today").unwrap(), RangeSpec::Today);
        assert_eq!(parse_range("all").unwrap(), RangeSpec::All);
        assert_eq!(parse_range("90").unwrap(), RangeSpec::Days(90));
        assert!(parse_range("fortnight").is_err());
    }

    #[test]
    fn test_describe_range() {
        assert_eq!(describe_range(RangeSpec::Days(7)), "the last 7 days");
        assert_eq!(describe_range(RangeSpec::Days(1)), "the last day");
        assert_eq!(describe_range(RangeSpec::Today), "today");
    }

    #[test]
    fn test_format_meal_line_skips_blank_macros() {
        let meal = MealEntry::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            MealType::Lunch,
            "Soup",
            Nutrients {
                calories: NutrientValue::from("150.5"),
                protein: NutrientValue::from("8"),
                fats: NutrientValue::Empty,
                carbs: NutrientValue::from(" "),
            },
        );
        assert_eq!(format_meal_line(&meal), "[Lunch] Soup — 150 kcal | P:8g");
    }

    #[test]
    fn test_format_meal_line_no_macros() {
        let meal = MealEntry::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            MealType::Snack,
            "Apple",
            Nutrients {
                calories: NutrientValue::Number(52.0),
                ..Nutrients::default()
            },
        );
        assert_eq!(format_meal_line(&meal), "[Snack] Apple — 52 kcal");
    }

    #[test]
    fn test_format_totals() {
        let totals = DailyTotals {
            calories: 1800,
            protein: 90,
            fats: 60,
            carbs: 200,
        };
        assert_eq!(format_totals(&totals), "1800 kcal | P:90g F:60g C:200g");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Гречневая каша", 8), "Гречн...");
    }
}
