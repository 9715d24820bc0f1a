#![forbid(unsafe_code)]
//! # cooccur_trends CLI
//!
//! Command-line front end for the `cooccur_trends` crate. Reads one CSV file
//! (or every CSV below a directory), splits the records into periods of a few
//! months, and prints per-period problem sets plus the pairs worth following.
//! The tables behind the summary are exported as CSV, TSV or JSON.
//!
//! ## Example
//! ```bash
//! cargo run --release -- data/consultations.csv --lexicon ipadic.tsv --period-months 2
//! ```
//!
//! See `--help` for all available options.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, info};

use cooccur_trends::{
    AnalysisError, AnalysisOptions, CategoryClassifier, ExportFormat, LexiconTokenizer, Result,
    TextNormalizer, Tokenizer, WhitespaceTokenizer, analyze_corpus, collect_files, export_report,
    load_stopwords, partition_by_months, read_records,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// CSV file or directory of CSV files to analyze
    path: String,

    /// Optional stopword file (one word per line)
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Tab-separated lexicon (surface, part of speech, base form); without it
    /// text is split on whitespace and punctuation
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// JSON object mapping category labels to their terms
    #[arg(long)]
    categories: Option<PathBuf>,

    /// JSON file with analysis options; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Co-occurrence window in tokens
    #[arg(long, conflicts_with = "document_level")]
    window: Option<usize>,

    /// Count co-occurrences over whole records instead of a window
    #[arg(long, default_value_t = false)]
    document_level: bool,

    /// Minimum pair count for a graph edge
    #[arg(long)]
    min_freq: Option<u32>,

    /// Length of one period in months
    #[arg(long)]
    period_months: Option<u32>,

    /// Problem sets kept per category
    #[arg(long)]
    top_k: Option<usize>,

    /// Pairs taken from each period's leaders for the timeseries
    #[arg(long)]
    per_period_keep: Option<usize>,

    /// Extra timeseries pairs taken from the overall counts
    #[arg(long)]
    fill_from_overall: Option<usize>,

    /// Keep raw counts in the timeseries
    #[arg(long, default_value_t = false)]
    no_normalize: bool,

    /// Output format for export (csv, tsv, json)
    #[arg(long, default_value = "csv")]
    export_format: ExportFormat,

    /// Directory for exported tables (default: current directory)
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Date column: header name or zero-based index
    #[arg(long, default_value = "date")]
    date_column: String,

    /// Text column: header name or zero-based index
    #[arg(long, default_value = "text")]
    text_column: String,
}

impl Cli {
    fn options(&self) -> Result<AnalysisOptions> {
        let mut options = match &self.config {
            Some(path) => AnalysisOptions::from_json_file(path)?,
            None => AnalysisOptions::default(),
        };
        if self.document_level {
            options.window = None;
        } else if let Some(w) = self.window {
            options.window = if w == 0 { None } else { Some(w) };
        }
        if let Some(v) = self.min_freq {
            options.min_edge_freq = v;
        }
        if let Some(v) = self.period_months {
            options.period_months = v;
        }
        if let Some(v) = self.top_k {
            options.top_k = v;
        }
        if let Some(v) = self.per_period_keep {
            options.per_period_keep = v;
        }
        if let Some(v) = self.fill_from_overall {
            options.fill_from_overall = v;
        }
        if self.no_normalize {
            options.normalize = false;
        }
        options.validate()?;
        Ok(options)
    }
}

fn export_stem(path: &Path, files: &[PathBuf]) -> String {
    match files {
        [single] if path.is_file() => single
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "combined".to_string()),
        _ => "combined".to_string(),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let path = Path::new(&cli.path);
    if !path.exists() {
        return Err(AnalysisError::Input(format!("{} does not exist", cli.path)));
    }
    let options = cli.options()?;

    let tokenizer: Box<dyn Tokenizer> = match &cli.lexicon {
        Some(lexicon) => Box::new(LexiconTokenizer::from_tsv(lexicon)?),
        None => Box::new(WhitespaceTokenizer),
    };
    let stopwords = match &cli.stopwords {
        Some(p) => load_stopwords(p)?,
        None => Default::default(),
    };
    let normalizer = TextNormalizer::new(tokenizer, stopwords)?;
    let classifier = match &cli.categories {
        Some(p) => CategoryClassifier::from_json_file(p)?,
        None => CategoryClassifier::default_channels(),
    };

    let files = collect_files(path);
    if files.is_empty() {
        return Err(AnalysisError::Input(format!("no CSV files found in {}", cli.path)));
    }
    let mut records = Vec::new();
    for file in &files {
        records.extend(read_records(file, &cli.date_column, &cli.text_column)?);
    }
    info!("Read {} records from {} files", records.len(), files.len());

    let periods = partition_by_months(&records, options.period_months)?;
    if periods.is_empty() {
        return Err(AnalysisError::NoPeriods);
    }
    let report = analyze_corpus(&periods, &normalizer, &classifier, &options)?;
    println!("{}", report.summary());

    let written = export_report(
        &report,
        &export_stem(path, &files),
        &cli.out_dir,
        cli.export_format,
    )?;
    for p in written {
        println!("Saved {}", p.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("Error: {}", e);
        process::exit(1);
    }
}
