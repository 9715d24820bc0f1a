use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{AnalysisError, Result};
use crate::periods::{Record, parse_date};

/// Collects the CSV files under `path`: the file itself, or every `.csv`
/// below a directory, sorted by path.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .map(|x| x.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Column selector: a header name, or a zero-based index when the value is
/// numeric.
fn resolve_column(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    if let Ok(idx) = column.parse::<usize>() {
        return Ok(idx);
    }
    headers
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| AnalysisError::Input(format!("column {:?} not found in header", column)))
}

///Reads `(date, text)` records from a CSV file with a header row.
///
///Rows whose date cannot be parsed are skipped; an empty text cell becomes
///`None`.
pub fn read_records(path: &Path, date_column: &str, text_column: &str) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let date_idx = resolve_column(&headers, date_column)?;
    let text_idx = resolve_column(&headers, text_column)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.records() {
        let row = row?;
        let Some(date) = row.get(date_idx).and_then(parse_date) else {
            skipped += 1;
            continue;
        };
        let text = row
            .get(text_idx)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        records.push(Record { date, text });
    }
    if skipped > 0 {
        warn!("{}: skipped {} rows without a parseable date", path.display(), skipped);
    }
    debug!("{}: read {} records", path.display(), records.len());
    Ok(records)
}
