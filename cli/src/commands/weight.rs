use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealtrack_core::models::{WeightEntry, WeightUpsert};

use super::Tracker;
use super::helpers::{describe_range, json_error, parse_date, parse_range};

#[derive(Tabled)]
struct WeightRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Weight (kg)")]
    kg: String,
}

fn weight_table(entries: &[WeightEntry]) -> String {
    let rows: Vec<WeightRow> = entries
        .iter()
        .map(|e| WeightRow {
            date: e.date.format("%Y-%m-%d").to_string(),
            kg: format!("{:.1}", e.weight),
        })
        .collect();

    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

pub(crate) fn cmd_weight_log(
    tracker: &mut Tracker,
    value: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("Weight must be greater than 0");
    }

    let date = parse_date(date)?;
    let entry = WeightEntry {
        date,
        weight: value,
    };
    let outcome = tracker.add_weight_entry(entry.clone())?;

    if json {
        let payload = serde_json::json!({ "entry": entry, "outcome": outcome });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let verb = match outcome {
            WeightUpsert::Inserted => "Logged",
            WeightUpsert::Replaced => "Updated",
        };
        println!("{verb} {:.1} kg for {}", entry.weight, entry.date);
    }

    Ok(())
}

pub(crate) fn cmd_weight_show(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;

    let Some(entry) = tracker.weight_for(date) else {
        let message = format!("No weight entry for {date}");
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else {
        println!("{}: {:.1} kg", entry.date, entry.weight);
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(tracker: &Tracker, range: &str, json: bool) -> Result<()> {
    let range = parse_range(range)?;
    let entries = tracker.weight_series_to_date(range);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!(
            "No weight entries for {}. Use `mealtrack weight log` to record your weight.",
            describe_range(range)
        );
        process::exit(2);
    }

    println!("{}", weight_table(&entries));
    if let [first, .., last] = entries.as_slice() {
        println!("Change: {:+.1} kg", last.weight - first.weight);
    }

    Ok(())
}

pub(crate) fn cmd_weight_recent(tracker: &Tracker, limit: usize, json: bool) -> Result<()> {
    let entries = tracker.recent_weights(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No weight entries found. Use `mealtrack weight log` to record your weight.");
        process::exit(2);
    }

    println!("{}", weight_table(&entries));
    Ok(())
}
