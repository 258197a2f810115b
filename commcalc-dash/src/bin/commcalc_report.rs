//! Batch report utility
//!
//! Runs the commission pipeline once over an export file and writes
//! `summary.csv` and `scorecard.csv`.
//!
//! **Usage:**
//! ```bash
//! commcalc-report <input> [--config <file>] [--variant full|compact]
//!     [--format csv|xlsx] [--employees "A B,C D"] [--output-dir <dir>]
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use commcalc_common::config::load_or_default;
use commcalc_common::ingest::{read_table, InputFormat};
use commcalc_common::report::employee::Selection;
use commcalc_common::report::export::{
    render_scorecard, scorecard_csv, summary_csv, Presentation, RenderedTable,
};
use commcalc_common::report::format::format_currency;
use commcalc_common::report::run;
use commcalc_common::report::schema::ReportVariant;
use tracing::info;

/// Commission report batch utility
#[derive(Parser, Debug)]
#[clap(name = "commcalc-report")]
#[clap(about = "Score a sales export and write summary and scorecard CSVs")]
struct Args {
    /// Export file (CSV or workbook)
    input: PathBuf,

    /// Configuration file (TOML); falls back to COMMCALC_CONFIG
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Report variant (full or compact); overrides the configured one
    #[clap(long)]
    variant: Option<String>,

    /// Input format (csv or a workbook extension); detected when omitted
    #[clap(long)]
    format: Option<String>,

    /// Comma-separated employee names to restrict the run to
    #[clap(long)]
    employees: Option<String>,

    /// Directory for summary.csv and scorecard.csv
    #[clap(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_or_default(args.config.as_deref());

    let mut pipeline = config.pipeline;
    if let Some(name) = &args.variant {
        pipeline.variant =
            ReportVariant::from_name(name).ok_or_else(|| anyhow!("Unknown report variant: {}", name))?;
    }

    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let format = match &args.format {
        Some(name) => {
            InputFormat::from_name(name).ok_or_else(|| anyhow!("Unsupported file format: {}", name))?
        }
        None => InputFormat::from_path(&args.input).unwrap_or_else(|| InputFormat::sniff(&bytes)),
    };

    let table = read_table(bytes, format, pipeline.spreadsheet_header_row)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    let selection = Selection::from_list(args.employees.as_deref());
    let output = run(&table, &pipeline, &selection)?;

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let summary_path = args.output_dir.join("summary.csv");
    let scorecard_path = args.output_dir.join("scorecard.csv");
    fs::write(&summary_path, summary_csv(&output.display)?)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    fs::write(&scorecard_path, scorecard_csv(&output.scorecard)?)
        .with_context(|| format!("Failed to write {}", scorecard_path.display()))?;
    info!("Wrote {} and {}", summary_path.display(), scorecard_path.display());

    print_table(&render_scorecard(&output.scorecard, Presentation::Formatted));

    let gp = output.gp_summary();
    println!();
    println!("Total GP:        {}", format_currency(gp.display_gp));
    println!("Commission GP:   {}", format_currency(gp.commission_gp));
    println!("Commission owed: {}", format_currency(gp.commission_earned));

    Ok(())
}

/// Print a rendered table with aligned columns
fn print_table(table: &RenderedTable) {
    let widths: Vec<usize> = (0..table.columns.len())
        .map(|i| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .chain(std::iter::once(&table.columns[i]))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if i == 0 {
                    format!("{:<width$}", cell, width = width)
                } else {
                    format!("{:>width$}", cell, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(&table.columns));
    for row in &table.rows {
        println!("{}", line(row));
    }
}
