mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    Tracker, cmd_export, cmd_history, cmd_import, cmd_log, cmd_popular, cmd_suggest, cmd_summary,
    cmd_trends, cmd_weight_history, cmd_weight_log, cmd_weight_recent, cmd_weight_show,
};
use crate::config::Config;
use mealtrack_core::models::DEFAULT_POPULAR_LIMIT;

#[derive(Parser)]
#[command(
    name = "mealtrack",
    version,
    about = "A simple, local-first meal and weight log",
    long_about = "Log what you eat and what you weigh, then look at the trends.\n\
                  All data stays in a local SQLite file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a meal
    Log {
        /// Food name
        food: String,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "breakfast")]
        meal: String,
        /// Calories (kcal). Required the first time a food is logged
        #[arg(long)]
        calories: Option<String>,
        /// Protein in grams
        #[arg(long)]
        protein: Option<String>,
        /// Fats in grams
        #[arg(long)]
        fats: Option<String>,
        /// Carbs in grams
        #[arg(long)]
        carbs: Option<String>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest previously logged food names matching a query
    Suggest {
        /// Part of a food name (case-insensitive)
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one day's meals and totals
    Summary {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily totals, newest day first
    History {
        /// Only show the most recent N logged days
        #[arg(short, long)]
        days: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-day nutrient totals over a time range
    Trends {
        /// Range: today, all, or a number of days
        #[arg(short, long, default_value = "7")]
        range: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most frequently logged foods
    Popular {
        /// Number of foods to show
        #[arg(short, long, default_value_t = DEFAULT_POPULAR_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Export all data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Merge a JSON export into the local data
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry (replaces an existing entry for the same date)
    Log {
        /// Weight in kg
        value: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight for a specific date (default: today)
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight entries over a time range, oldest first
    History {
        /// Range: today, all, or a number of days
        #[arg(short, long, default_value = "all")]
        range: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent weight entries, newest first
    Recent {
        /// Number of entries to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MEALTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        db = %config.db_path.display(),
        "opening data store"
    );
    let mut tracker = Tracker::new(&config.db_path)?;
    for warning in tracker.load_warnings() {
        eprintln!(
            "Warning: {warning} (raw data kept under `{}.malformed`)",
            warning.key()
        );
    }

    match cli.command {
        Commands::Log {
            food,
            meal,
            calories,
            protein,
            fats,
            carbs,
            date,
            json,
        } => cmd_log(
            &mut tracker,
            &food,
            &meal,
            calories,
            protein,
            fats,
            carbs,
            date,
            json,
        ),
        Commands::Suggest { query, json } => cmd_suggest(&tracker, &query, json),
        Commands::Summary { date, json } => cmd_summary(&tracker, date, json),
        Commands::History { days, json } => cmd_history(&tracker, days, json),
        Commands::Trends { range, json } => cmd_trends(&tracker, &range, json),
        Commands::Popular { limit, json } => cmd_popular(&tracker, limit, json),
        Commands::Weight { command } => match command {
            WeightCommands::Log { value, date, json } => {
                cmd_weight_log(&mut tracker, value, date, json)
            }
            WeightCommands::Show { date, json } => cmd_weight_show(&tracker, date, json),
            WeightCommands::History { range, json } => cmd_weight_history(&tracker, &range, json),
            WeightCommands::Recent { limit, json } => cmd_weight_recent(&tracker, limit, json),
        },
        Commands::Export { output } => cmd_export(&tracker, output.as_deref()),
        Commands::Import { file, json } => cmd_import(&mut tracker, &file, json),
    }
}
