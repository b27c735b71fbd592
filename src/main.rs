// report-pdf: Render a tabular municipal report to a paginated PDF

use chrono::{Local, NaiveDate};
use clap::Parser;
use report_pdf::fonts::{FontResolver, SourceTransport};
use report_pdf::{format_report_date, render_report, Document, LayoutConfig, ReportError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Render a tabular report document to a paginated PDF")]
struct Args {
    /// Report document (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Output filename (defaults to report-{date}-{input}.pdf)
    #[arg(short, long)]
    output: Option<String>,

    /// Report date (YYYY-MM-DD format, defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    /// Layout configuration (JSON, partial files allowed)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Regular font source, URL or file path (repeatable, tried in order)
    #[arg(long = "regular-font")]
    regular_fonts: Vec<String>,

    /// Bold font source, URL or file path (repeatable, tried in order)
    #[arg(long = "bold-font")]
    bold_fonts: Vec<String>,

    /// Label over the merged column group
    #[arg(long)]
    group_label: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), ReportError> {
    let date = parse_date(&args.date)?;

    let mut config = match &args.config {
        Some(path) => LayoutConfig::from_json_file(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(label) = args.group_label {
        config.header_group.label = label;
    }
    if !args.regular_fonts.is_empty() {
        config.fonts.regular = args.regular_fonts;
    }
    if !args.bold_fonts.is_empty() {
        config.fonts.bold = args.bold_fonts;
    }

    let document = Document::from_json_file(&args.input)?;
    // fail on a bad document before any font is fetched
    document.validate(&config)?;

    let resolver = FontResolver::new(SourceTransport::new());
    let fonts = resolver.resolve_all(&config.fonts)?;

    let bytes = render_report(&document, &config, &fonts, date)?;

    let output_file = args
        .output
        .unwrap_or_else(|| default_output_name(&args.input, &date));
    let file = File::create(&output_file)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;

    println!("✓ Generated: {}", output_file);
    println!("  Rows: {}", document.rows.len());
    println!("  Date: {}", format_report_date(&date));

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, ReportError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ReportError::DateError(s.clone())),
        None => Ok(Local::now().date_naive()),
    }
}

fn default_output_name(input: &Path, date: &NaiveDate) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>();
    if stem.is_empty() {
        format!("report-{}.pdf", date.format("%Y-%m-%d"))
    } else {
        format!("report-{}-{}.pdf", date.format("%Y-%m-%d"), stem)
    }
}
