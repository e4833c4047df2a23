use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use super::Tracker;
use super::helpers::{format_meal_line, format_totals, json_error, parse_date};

pub(crate) fn cmd_summary(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let weight = tracker.weight_for(date);

    let Some(day) = tracker.day(date) else {
        if json {
            println!("{}", json_error(&format!("No entries for {date}")));
        } else {
            eprintln!("No entries for {date}");
            if let Some(w) = weight {
                eprintln!("  Weight: {:.1} kg", w.weight);
            }
        }
        process::exit(2);
    };

    if json {
        let payload = serde_json::json!({
            "date": day.date,
            "meals": day.meals,
            "totals": day.totals,
            "weight": weight,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("=== {} ===\n", day.date);
    for meal in &day.meals {
        println!("  {}", format_meal_line(meal));
    }
    println!();
    println!("  TOTAL: {}", format_totals(&day.totals));
    if let Some(w) = weight {
        println!("  WEIGHT: {:.1} kg", w.weight);
    }

    Ok(())
}

pub(crate) fn cmd_history(tracker: &Tracker, days: Option<usize>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Meals")]
        meals: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fats")]
        fats: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
    }

    let mut log = tracker.daily_log();
    if let Some(n) = days {
        log.truncate(n);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }

    if log.is_empty() {
        eprintln!("No meals logged yet. Use `mealtrack log` to add your first meal.");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = log
        .iter()
        .map(|day| HistoryRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            meals: day.meals.len(),
            calories: day.totals.calories.to_string(),
            protein: format!("{}g", day.totals.protein),
            fats: format!("{}g", day.totals.fats),
            carbs: format!("{}g", day.totals.carbs),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
