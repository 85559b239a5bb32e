use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crop_advisor::{Dataset, EnvInputs, ModelStore, Predictor, Recommendation};

#[derive(Parser, Debug)]
#[command(
    name = "crop_advisor",
    about = "Recommends a crop to plant from historical crop/environment records",
    version
)]
struct Args {
    /// Path to the historical crop/environment CSV
    #[arg(long, default_value = "crop_data.csv")]
    data: PathBuf,

    /// Path of the persisted model artifact
    #[arg(long, default_value = "model.bin")]
    model: PathBuf,

    /// Dump the loaded dataset as JSON lines before prompting
    #[arg(long)]
    show_data: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let dataset = Dataset::load(&args.data).context(
        "could not load the dataset; check that the file exists and is encoded as one of \
         utf-8, gbk, utf-16, utf-8-sig",
    )?;
    println!("Loaded {} records from {}", dataset.len(), args.data.display());

    if args.show_data {
        show_data(&dataset)?;
    }

    let predictor = Predictor::new(dataset, ModelStore::new(args.model))
        .context("the dataset is missing a required column")?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    println!("Enter environment parameters (blank line or \"q\" to quit).");
    loop {
        let Some(month) = prompt_i64(&mut lines, "Planting month (1-12)", 1, 12)? else {
            break;
        };
        let Some(temperature) = prompt_i64(&mut lines, "Average temperature in C (0-40)", 0, 40)?
        else {
            break;
        };
        let Some(rainfall) = prompt_i64(&mut lines, "Rainfall in mm (0-2000)", 0, 2000)? else {
            break;
        };
        let Some(ph) = prompt_f64(&mut lines, "Soil pH (3.0-9.0)", 3.0, 9.0)? else {
            break;
        };

        let inputs = EnvInputs {
            month,
            temperature,
            rainfall,
            ph,
        };
        // Request-level failures are reported once; the session continues.
        match predictor.recommend(&inputs) {
            Ok(rec) => print_recommendation(&rec),
            Err(e) => println!("Recommendation failed: {e}"),
        }
    }

    Ok(())
}

fn show_data(dataset: &Dataset) -> Result<()> {
    for row in 0..dataset.len() {
        let mut record = serde_json::Map::new();
        for column in dataset.columns() {
            if let Some(cell) = dataset.value(row, column) {
                record.insert(column.clone(), serde_json::to_value(cell)?);
            }
        }
        println!("{}", serde_json::Value::Object(record));
    }
    Ok(())
}

/// Reads one trimmed line; `None` on EOF, a blank line, or "q".
fn read_line<I>(lines: &mut I, label: &str) -> Result<Option<String>>
where
    I: Iterator<Item = io::Result<String>>,
{
    print!("{label}: ");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => {
            let trimmed = line?.trim().to_string();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("q") {
                Ok(None)
            } else {
                Ok(Some(trimmed))
            }
        }
        None => Ok(None),
    }
}

fn prompt_i64<I>(lines: &mut I, label: &str, min: i64, max: i64) -> Result<Option<i64>>
where
    I: Iterator<Item = io::Result<String>>,
{
    loop {
        let Some(text) = read_line(lines, label)? else {
            return Ok(None);
        };
        match text.parse::<i64>() {
            Ok(v) if (min..=max).contains(&v) => return Ok(Some(v)),
            _ => println!("Please enter an integer between {min} and {max}."),
        }
    }
}

fn prompt_f64<I>(lines: &mut I, label: &str, min: f64, max: f64) -> Result<Option<f64>>
where
    I: Iterator<Item = io::Result<String>>,
{
    loop {
        let Some(text) = read_line(lines, label)? else {
            return Ok(None);
        };
        match text.parse::<f64>() {
            Ok(v) if (min..=max).contains(&v) => return Ok(Some(v)),
            _ => println!("Please enter a number between {min} and {max}."),
        }
    }
}

fn print_recommendation(rec: &Recommendation) {
    println!();
    println!("Recommended crop: {}", rec.crop);
    println!("  Suitable temperature: {} C", rec.suitable_temperature);
    println!("  Water need:           {} mm", rec.water_need);
    println!("  Best soil pH:         {}", rec.best_ph);
    if let Some(issues) = &rec.common_issues {
        println!("  Common issues:        {issues}");
    }
    if let Some(grade) = &rec.yield_grade {
        println!("  Expected yield:       {grade}");
    }
    println!("Recommendations are based on historical data; check local conditions before planting.");
    println!();
}
