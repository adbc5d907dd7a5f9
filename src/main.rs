use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader};

use tanka_diary::analysis::{self, TimeRange, TrendReport};
use tanka_diary::config::PipelineConfig;
use tanka_diary::lexicon::Lexicon;
use tanka_diary::nutrition::{FoodTable, NutritionEstimator};
use tanka_diary::pipeline::processor::HealthChatProcessor;
use tanka_diary::pipeline::types::PipelineOutput;
use tanka_diary::store::{HealthStore, InMemoryStore};
use tanka_diary::validation;

/// One REPL input line.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Poems,
    Mood,
    Day(&'a str),
    Trend(&'a str),
    Message(&'a str),
}

impl<'a> Command<'a> {
    /// Slash commands match on the whole first word; anything else is a diary message.
    fn parse(line: &'a str) -> Self {
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match word {
            "/quit" => Command::Quit,
            "/poems" => Command::Poems,
            "/mood" => Command::Mood,
            "/day" => Command::Day(rest.trim()),
            "/trend" => Command::Trend(rest.trim()),
            _ => Command::Message(line),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::from_env();
    let owner = std::env::var("TANKA_OWNER")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "local-user".to_string());

    let lexicon = Arc::new(
        Lexicon::load(config.lexicon_path.as_deref()).context("Failed to load lexicon")?,
    );
    let foods = Arc::new(
        FoodTable::load(config.food_table_path.as_deref()).context("Failed to load food table")?,
    );
    let store = Arc::new(InMemoryStore::new());
    let processor = HealthChatProcessor::new(&config, lexicon, foods.clone(), store.clone());
    let estimator = NutritionEstimator::new(foods);

    eprintln!("📓 Tanka diary v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Owner: {}", owner);
    eprintln!("   Max message length: {}", config.max_message_length);
    eprintln!("   History window: {} days", config.history_window_days);
    eprintln!("   Commands: /poems  /mood  /day YYYY-MM-DD  /trend [1m|3m|6m]  /quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        match Command::parse(line) {
            Command::Quit => break,
            Command::Poems => match store.poems_for(&owner).await {
                Ok(poems) if poems.is_empty() => println!("(no poems yet)"),
                Ok(poems) => {
                    for poem in poems {
                        println!("[{}]\n{}\n", poem.date, poem);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            Command::Mood => {
                let today = chrono::Local::now().date_naive();
                match store.mood_on(&owner, today).await {
                    Ok(Some(mood)) => println!(
                        "{}: {} (motivation {:.2})",
                        today,
                        mood.tone.label(),
                        mood.motivation()
                    ),
                    Ok(None) => println!("(no mood recorded for {})", today),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Command::Day(arg) => {
                let check = validation::validate_date_string(arg);
                if !check.is_valid {
                    eprintln!("Error: {}", check.error_message());
                } else if let Ok(day) = NaiveDate::parse_from_str(arg, "%Y-%m-%d") {
                    match store.records_between(&owner, day, day).await {
                        Ok(records) => {
                            let daily = estimator.daily_total(&records);
                            println!(
                                "{}: {} entries, {:.0} kcal (P {:.0}% / F {:.0}% / C {:.0}%)",
                                day,
                                records.len(),
                                daily.total_calories,
                                daily.pfc.protein_ratio * 100.0,
                                daily.pfc.fat_ratio * 100.0,
                                daily.pfc.carbohydrate_ratio * 100.0
                            );
                        }
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
            }
            Command::Trend(arg) => {
                let range = if arg.is_empty() {
                    Ok(TimeRange::default())
                } else {
                    arg.parse::<TimeRange>()
                };
                match range {
                    Ok(range) => {
                        let today = chrono::Local::now().date_naive();
                        match analysis::build_report(&*store, &estimator, &owner, range, today)
                            .await
                        {
                            Ok(report) => print_report(&report),
                            Err(e) => eprintln!("Error: {}", e),
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Command::Message(message) => {
                let check = validation::validate_message(message, config.max_message_length);
                if !check.is_valid {
                    eprintln!("Error: {}", check.error_message());
                } else {
                    match processor.process(&owner, message).await {
                        Ok(output) => print_output(&output),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
            }
        }

        eprint!("> ");
    }

    Ok(())
}

fn print_output(output: &PipelineOutput) {
    let record = &output.record;
    if let Some(weight) = record.weight {
        println!("体重: {}kg", weight);
    }
    if let Some(body_fat) = record.body_fat_percentage {
        println!("体脂肪率: {}%", body_fat);
    }
    if !record.food_items.is_empty() {
        println!("食事: {}", record.food_items.join(" / "));
    }
    if !record.exercises.is_empty() {
        println!("運動: {}", record.exercises.join(" / "));
    }
    println!(
        "気分: {} (motivation {:.2})",
        output.mood.tone.label(),
        output.mood.motivation()
    );
    println!(
        "今回: {:.0} kcal / 本日合計: {:.0} kcal",
        output.nutrition.calories, output.daily.total_calories
    );
    println!("\n{}\n", output.poem);
}

fn print_report(report: &TrendReport) {
    println!(
        "{} 〜 {}: {} entries",
        report.start, report.end, report.record_count
    );
    let mental = &report.mental;
    println!(
        "気分: positive {} / neutral {} / discouraged {} (motivation {:.2})",
        mental.positive, mental.neutral, mental.discouraged, mental.average_motivation
    );
    for point in report.body.iter().filter(|p| p.weight.is_some() || p.body_fat_percentage.is_some()) {
        let weight = point.weight.map_or("-".to_string(), |w| format!("{w}kg"));
        let body_fat = point
            .body_fat_percentage
            .map_or("-".to_string(), |b| format!("{b}%"));
        println!("  {} 体重 {} 体脂肪率 {}", point.date, weight, body_fat);
    }
    println!(
        "平均: {:.1} kcal (P {:.1}g / F {:.1}g / C {:.1}g)",
        report.nutrition.calories,
        report.nutrition.protein,
        report.nutrition.fat,
        report.nutrition.carbohydrate
    );
    println!("短歌: {}", report.poems.len());
}
