use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealtrack_core::models::{DailyNutrients, DailyTotals};

use super::Tracker;
use super::helpers::{describe_range, format_totals, parse_range, truncate};

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Calories")]
    calories: i64,
    #[tabled(rename = "Protein")]
    protein: String,
    #[tabled(rename = "Fats")]
    fats: String,
    #[tabled(rename = "Carbs")]
    carbs: String,
}

/// Per-day average over the series, rounded down.
fn series_average(series: &[DailyNutrients]) -> DailyTotals {
    let mut sum = DailyTotals::default();
    for point in series {
        let t = point.totals();
        sum.calories = sum.calories.saturating_add(t.calories);
        sum.protein = sum.protein.saturating_add(t.protein);
        sum.fats = sum.fats.saturating_add(t.fats);
        sum.carbs = sum.carbs.saturating_add(t.carbs);
    }
    let days = i64::try_from(series.len()).unwrap_or(i64::MAX).max(1);
    DailyTotals {
        calories: sum.calories / days,
        protein: sum.protein / days,
        fats: sum.fats / days,
        carbs: sum.carbs / days,
    }
}

pub(crate) fn cmd_trends(tracker: &Tracker, range: &str, json: bool) -> Result<()> {
    let range = parse_range(range)?;
    let series = tracker.nutrient_series_to_date(range);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    if series.is_empty() {
        eprintln!("No entries for {}", describe_range(range));
        process::exit(2);
    }

    let rows: Vec<TrendRow> = series
        .iter()
        .map(|p| TrendRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            calories: p.calories,
            protein: format!("{}g", p.protein),
            fats: format!("{}g", p.fats),
            carbs: format!("{}g", p.carbs),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    if series.len() > 1 {
        println!("AVERAGE: {}", format_totals(&series_average(&series)));
    }

    Ok(())
}

pub(crate) fn cmd_popular(tracker: &Tracker, limit: usize, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PopularRow {
        #[tabled(rename = "#")]
        rank: usize,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Times logged")]
        count: usize,
    }

    let foods = tracker.popular_foods(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        eprintln!("No meals logged yet. Use `mealtrack log` to add your first meal.");
        process::exit(2);
    }

    let rows: Vec<PopularRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| PopularRow {
            rank: i + 1,
            name: truncate(&f.name, 40),
            count: f.count,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
