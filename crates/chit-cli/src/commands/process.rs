//! Process command - extract a single receipt image.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use console::style;
use tracing::info;

use chit_core::{
    ChitError, ExtractionError, ExtractionResult, LedgerSink, OrderCategory, ReceiptPipeline,
    SubmissionMeta,
};

use crate::services::{CsvLedger, HttpOcrClient, HttpVisionClient};

use super::{load_config, read_image};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image file
    #[arg(required = true)]
    input: PathBuf,

    /// Order category of the receipt
    #[arg(short = 'k', long, value_enum, default_value = "single-amount")]
    category: CategoryArg,

    /// Force cross-validation even for trusted categories
    #[arg(long)]
    validate: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Append the result to this CSV ledger
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Submitter recorded in the ledger
    #[arg(long, default_value = "cli")]
    submitted_by: String,

    /// Outlet recorded in the ledger
    #[arg(long)]
    outlet: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum CategoryArg {
    /// Grocery-style order with line items
    Itemized,
    /// Single payment amount
    SingleAmount,
}

impl From<CategoryArg> for OrderCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Itemized => OrderCategory::Itemized,
            CategoryArg::SingleAmount => OrderCategory::SingleAmount,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let image = read_image(&args.input, &config)?;
    let category: OrderCategory = args.category.into();

    let pipeline = ReceiptPipeline::new(
        Arc::new(HttpOcrClient::new(&config.services)),
        Arc::new(HttpVisionClient::new(&config.services)),
        config.clone(),
    );

    info!("Processing receipt: {}", args.input.display());

    let result = if args.validate {
        pipeline.extract_with_policy(&image, category, false).await
    } else {
        pipeline.extract(&image, category).await
    };

    let result = match result {
        Ok(result) => result,
        Err(ChitError::Extraction(ExtractionError::NoAmountDeterminable)) => {
            anyhow::bail!(
                "Could not extract an amount from this receipt. \
                 Please retake the photo with better lighting and framing."
            );
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = &args.ledger {
        let meta = SubmissionMeta {
            submitted_by: args.submitted_by.clone(),
            submitted_at: Utc::now(),
            outlet: args.outlet.clone(),
            category,
        };
        CsvLedger::new(path).record(&result, &meta).await?;
    }

    let output = format_result(&result, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if result.amount_corrected {
        if let Some(original) = result.original_amount {
            eprintln!(
                "{} Amount corrected from {} to {} after the OCR cross-check",
                style("!").yellow(),
                original,
                result.total_amount
            );
        }
    }

    Ok(())
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "total_amount",
        "confidence",
        "amount_corrected",
        "original_amount",
        "items",
    ])?;
    wtr.write_record([
        result.total_amount.to_string(),
        result.confidence.to_string(),
        result.amount_corrected.to_string(),
        result
            .original_amount
            .map(|a| a.to_string())
            .unwrap_or_default(),
        result.items.len().to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Amount: ₹{}\n", result.total_amount));
    output.push_str(&format!("Confidence: {}\n", result.confidence));
    if let Some(original) = result.original_amount {
        output.push_str(&format!("Corrected from: ₹{}\n", original));
    }

    if !result.items.is_empty() {
        output.push_str("\nItems:\n");
        for item in &result.items {
            output.push_str(&format!(
                "  {} ({}) ₹{}\n",
                item.name, item.quantity, item.price
            ));
        }
    }

    for warning in &result.warnings {
        output.push_str(&format!("\nWarning: {warning}"));
    }

    output
}
