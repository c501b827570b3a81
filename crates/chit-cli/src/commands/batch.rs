//! Batch command - extract many receipts into the CSV ledger.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use chit_core::{LedgerSink, OrderCategory, ReceiptPipeline, SubmissionMeta};

use crate::services::{CsvLedger, HttpOcrClient, HttpVisionClient};

use super::process::CategoryArg;
use super::{load_config, read_image};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of image files ("receipts/*.jpg")
    #[arg(required = true)]
    pattern: String,

    /// Order category for every file in the batch
    #[arg(short = 'k', long, value_enum, default_value = "single-amount")]
    category: CategoryArg,

    /// CSV ledger the results are appended to
    #[arg(short, long, default_value = "chit-ledger.csv")]
    ledger: PathBuf,

    /// Submitter recorded in the ledger
    #[arg(long, default_value = "batch")]
    submitted_by: String,

    /// Outlet recorded in the ledger
    #[arg(long)]
    outlet: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob::glob(&args.pattern)?
        .filter_map(|entry| entry.ok())
        .collect();
    if files.is_empty() {
        anyhow::bail!("No files match pattern: {}", args.pattern);
    }

    let category: OrderCategory = args.category.into();
    let pipeline = ReceiptPipeline::new(
        Arc::new(HttpOcrClient::new(&config.services)),
        Arc::new(HttpVisionClient::new(&config.services)),
        config.clone(),
    );
    let ledger = CsvLedger::new(&args.ledger);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut recorded = 0usize;
    let mut failed = 0usize;

    for file in &files {
        pb.set_message(file.display().to_string());
        let outcome = async {
            let image = read_image(file, &config)?;
            let result = pipeline.extract(&image, category).await?;
            let meta = SubmissionMeta {
                submitted_by: args.submitted_by.clone(),
                submitted_at: Utc::now(),
                outlet: args.outlet.clone(),
                category,
            };
            ledger.record(&result, &meta).await?;
            anyhow::Ok(())
        }
        .await;

        match outcome {
            Ok(()) => recorded += 1,
            Err(e) => {
                warn!("{}: {e}", file.display());
                failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    println!(
        "{} {} receipt(s) recorded to {}",
        style("✓").green(),
        recorded,
        args.ledger.display()
    );
    if failed > 0 {
        println!(
            "{} {} file(s) failed; rerun with -v for details",
            style("!").yellow(),
            failed
        );
    }

    Ok(())
}
