//! Table exports (CSV, TSV, JSON) of a [`CorpusReport`].
//!
//! Every run writes five tables next to each other:
//! `<stem>_<YYYYMMDD_HHMMSS>_<table>.<ext>` with `table` one of
//! `toppairs`, `problemsets`, `persistence`, `timeseries`, `network`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};

use crate::CorpusReport;
use crate::error::Result;
use crate::problem_sets::BucketKind;
use crate::report::Persistence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// Neutralizes cells a spreadsheet would read as a formula by prefixing a
/// single quote. Cells already starting with a quote are left alone.
pub fn csv_safe_cell(cell: String) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{}", cell),
        _ => cell,
    }
}

#[derive(Debug, Serialize)]
struct TopPairRow<'a> {
    period: &'a str,
    rank: usize,
    term_a: &'a str,
    term_b: &'a str,
    count: u32,
}

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    period: &'a str,
    rank: usize,
    term_a: &'a str,
    term_b: &'a str,
    weight: u32,
}

#[derive(Debug, Serialize)]
struct ProblemSetRow<'a> {
    period: &'a str,
    category: &'a str,
    kind: BucketKind,
    rank: usize,
    terms: String,
    score: u32,
}

#[derive(Debug, Serialize)]
struct PersistenceRow<'a> {
    term_a: &'a str,
    term_b: &'a str,
    kind: Persistence,
    periods: String,
}

fn kind_name(kind: BucketKind) -> &'static str {
    match kind {
        BucketKind::Category => "category",
        BucketKind::Other => "other",
    }
}

fn persistence_name(kind: Persistence) -> &'static str {
    match kind {
        Persistence::Distinctive => "distinctive",
        Persistence::Persistent => "persistent",
    }
}

fn write_delimited(
    path: &Path,
    format: ExportFormat,
    header: &[String],
    rows: Vec<Vec<String>>,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_path(path)?;
    wtr.write_record(header.iter().cloned().map(csv_safe_cell))?;
    for row in rows {
        wtr.write_record(row.into_iter().map(csv_safe_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    Ok(())
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn export_top_pairs(report: &CorpusReport, path: &Path, format: ExportFormat) -> Result<()> {
    let table = &report.top_pairs;
    let rows: Vec<TopPairRow> = table
        .periods
        .iter()
        .zip(&table.columns)
        .flat_map(|(period, column)| {
            column.iter().enumerate().map(move |(i, ranked)| TopPairRow {
                period,
                rank: i + 1,
                term_a: ranked.pair.first(),
                term_b: ranked.pair.second(),
                count: ranked.count,
            })
        })
        .collect();
    match format {
        ExportFormat::Json => write_json(path, &rows),
        _ => write_delimited(
            path,
            format,
            &header(&["period", "rank", "term_a", "term_b", "count"]),
            rows.iter()
                .map(|r| {
                    vec![
                        r.period.to_string(),
                        r.rank.to_string(),
                        r.term_a.to_string(),
                        r.term_b.to_string(),
                        r.count.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

fn export_problem_sets(report: &CorpusReport, path: &Path, format: ExportFormat) -> Result<()> {
    let mut rows: Vec<ProblemSetRow> = Vec::new();
    for period in &report.periods {
        for summary in &period.summaries {
            for (i, set) in summary.sets.iter().enumerate() {
                rows.push(ProblemSetRow {
                    period: &period.label,
                    category: &summary.label,
                    kind: summary.kind,
                    rank: i + 1,
                    terms: set.terms.join("-"),
                    score: set.score,
                });
            }
        }
    }
    match format {
        ExportFormat::Json => write_json(path, &rows),
        _ => write_delimited(
            path,
            format,
            &header(&["period", "category", "kind", "rank", "terms", "score"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        r.period.to_string(),
                        r.category.to_string(),
                        kind_name(r.kind).to_string(),
                        r.rank.to_string(),
                        r.terms,
                        r.score.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

fn export_persistence(report: &CorpusReport, path: &Path, format: ExportFormat) -> Result<()> {
    let rows: Vec<PersistenceRow> = report
        .persistence
        .iter()
        .map(|p| PersistenceRow {
            term_a: p.pair.first(),
            term_b: p.pair.second(),
            kind: p.kind,
            periods: p.periods.join(";"),
        })
        .collect();
    match format {
        ExportFormat::Json => write_json(path, &rows),
        _ => write_delimited(
            path,
            format,
            &header(&["term_a", "term_b", "kind", "periods"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        r.term_a.to_string(),
                        r.term_b.to_string(),
                        persistence_name(r.kind).to_string(),
                        r.periods,
                    ]
                })
                .collect(),
        ),
    }
}

/// Heaviest graph edges of every period.
fn export_network(report: &CorpusReport, path: &Path, format: ExportFormat) -> Result<()> {
    let rows: Vec<EdgeRow> = report
        .periods
        .iter()
        .flat_map(|period| {
            period
                .network
                .iter()
                .enumerate()
                .map(move |(i, (pair, weight))| EdgeRow {
                    period: &period.label,
                    rank: i + 1,
                    term_a: pair.first(),
                    term_b: pair.second(),
                    weight: *weight,
                })
        })
        .collect();
    match format {
        ExportFormat::Json => write_json(path, &rows),
        _ => write_delimited(
            path,
            format,
            &header(&["period", "rank", "term_a", "term_b", "weight"]),
            rows.iter()
                .map(|r| {
                    vec![
                        r.period.to_string(),
                        r.rank.to_string(),
                        r.term_a.to_string(),
                        r.term_b.to_string(),
                        r.weight.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

/// Wide layout: one row per period, one column per pair.
fn export_timeseries(report: &CorpusReport, path: &Path, format: ExportFormat) -> Result<()> {
    let ts = &report.timeseries;
    match format {
        ExportFormat::Json => write_json(path, ts),
        _ => {
            let mut head = vec!["period".to_string()];
            head.extend(ts.columns.iter().cloned());
            let rows = ts
                .periods
                .iter()
                .zip(&ts.values)
                .map(|(period, values)| {
                    let mut row = vec![period.clone()];
                    row.extend(values.iter().map(|v| v.to_string()));
                    row
                })
                .collect();
            write_delimited(path, format, &head, rows)
        }
    }
}

///Writes all tables of `report` into `out_dir` (created if missing) and
///returns the written paths in table order.
pub fn export_report(
    report: &CorpusReport,
    stem: &str,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let local: DateTime<Local> = Local::now();
    let stamp = local.format("%Y%m%d_%H%M%S").to_string();
    let ext = format.extension();
    let target = |table: &str| out_dir.join(format!("{}_{}_{}.{}", stem, stamp, table, ext));

    type Writer = fn(&CorpusReport, &Path, ExportFormat) -> Result<()>;
    let tables: [(&str, Writer); 5] = [
        ("toppairs", export_top_pairs),
        ("problemsets", export_problem_sets),
        ("persistence", export_persistence),
        ("timeseries", export_timeseries),
        ("network", export_network),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, write) in tables {
        let path = target(name);
        write(report, &path, format)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
