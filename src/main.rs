// src/main.rs - CLI driver for payee batch classification
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use payee_lib::config::ClassifierConfig;
use payee_lib::{BatchPhase, PayeeClassifier, ProgressCallback, ProgressUpdate};

#[derive(Parser, Debug)]
#[command(
    name = "classify",
    about = "Classify payee names as Business or Individual"
)]
struct Cli {
    /// File with one payee name per line; stdin when omitted.
    input: Option<PathBuf>,

    /// Disable the AI-assisted tier.
    #[arg(long)]
    offline: bool,

    /// Disable fuzzy matching for dedup and the fuzzy tier.
    #[arg(long)]
    no_fuzzy: bool,

    /// Combined-similarity threshold for fuzzy duplicates.
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Maximum concurrently processed chunks.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Comma-separated exclusion keywords.
    #[arg(long)]
    exclude: Option<String>,

    /// Print the stats summary as JSON on stderr.
    #[arg(long)]
    stats_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ClassifierConfig::from_env();
    if cli.offline {
        config.offline_mode = true;
    }
    if cli.no_fuzzy {
        config.use_fuzzy_matching = false;
    }
    if let Some(threshold) = cli.similarity_threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrency = concurrency.max(1);
    }
    if let Some(exclude) = &cli.exclude {
        config.exclusion_keywords = exclude
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    let names = read_names(cli.input.as_deref())?;
    info!("Classifying {} payee names", names.len());

    let progress_bar = ProgressBar::new(names.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    let bar_for_callback = progress_bar.clone();
    let callback: ProgressCallback = Arc::new(move |update: ProgressUpdate| {
        bar_for_callback.set_position(update.processed as u64);
        bar_for_callback.set_message(update.phase.as_str().to_string());
        if update.phase == BatchPhase::Complete {
            bar_for_callback.finish_with_message("complete");
        }
    });

    let classifier = PayeeClassifier::new(config);
    let batch = classifier
        .process_batch(&names, None, Some(callback))
        .await
        .context("batch classification failed")?;

    for item in &batch.results {
        println!("{}", serde_json::to_string(item)?);
    }

    if cli.stats_json {
        eprintln!("{}", serde_json::to_string_pretty(&batch.stats)?);
    } else {
        info!(
            "Run {}: {} classified ({} unique, {} exact dup, {} fuzzy dup, {} retried) in {}ms",
            batch.stats.run_id,
            batch.stats.total,
            batch.stats.unique_processed,
            batch.stats.exact_duplicates,
            batch.stats.fuzzy_duplicates,
            batch.stats.retried_items,
            batch.stats.elapsed_ms
        );
    }

    Ok(())
}

fn read_names(input: Option<&std::path::Path>) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    let mut names = Vec::new();
    for line in reader.lines() {
        names.push(line.context("failed to read input line")?);
    }
    Ok(names)
}
