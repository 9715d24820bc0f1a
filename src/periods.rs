use chrono::{Datelike, Months, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// One timestamped consultation record. `text` is `None` when the record
/// had no usable free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub date: NaiveDate,
    pub text: Option<String>,
}

/// The records of one contiguous date range, ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInput {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub documents: Vec<Option<String>>,
    /// Number of records in range, including those without text.
    pub document_count: usize,
}

impl PeriodInput {
    /// A period built from raw texts, without a date range.
    pub fn from_texts(label: &str, texts: Vec<Option<String>>) -> Self {
        PeriodInput {
            label: label.to_string(),
            start: NaiveDate::MIN,
            end: NaiveDate::MIN,
            document_count: texts.len(),
            documents: texts,
        }
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y年%m月%d日", "%Y-%m-%d", "%Y/%m/%d"];

/// Parses the date formats found in consultation exports.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| AnalysisError::Input(format!("no first day of month for {}", date)))
}

fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| AnalysisError::Input(format!("date overflow adding {} months to {}", months, date)))
}

///Splits `records` into consecutive windows of `months` calendar months,
///starting on the first day of the earliest record's month and ending with the
///window that contains the latest record. Windows without records are kept.
///
///Labels read `YYYY-MM~MM` (first and last month of the window).
pub fn partition_by_months(records: &[Record], months: u32) -> Result<Vec<PeriodInput>> {
    if months == 0 {
        return Err(AnalysisError::InvalidOption(
            "period length must be at least one month".to_string(),
        ));
    }
    let (Some(min), Some(max)) = (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) else {
        return Ok(Vec::new());
    };

    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let mut periods = Vec::new();
    let mut current = first_of_month(min)?;
    let mut idx = 0;
    while current <= max {
        let next = add_months(current, months)?;
        let last_day = next.pred_opt().unwrap_or(current);
        let end = last_day.min(max);
        let last_month = add_months(current, months - 1)?;

        let mut documents = Vec::new();
        while idx < sorted.len() && sorted[idx].date <= end {
            documents.push(sorted[idx].text.clone());
            idx += 1;
        }
        let label = format!("{}~{}", current.format("%Y-%m"), last_month.format("%m"));
        debug!("Period {} ({} to {}): {} records", label, current, end, documents.len());
        periods.push(PeriodInput {
            label,
            start: current,
            end,
            document_count: documents.len(),
            documents,
        });
        current = next;
    }
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(date: &str, text: Option<&str>) -> Record {
        Record {
            date: parse_date(date).unwrap(),
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn parses_supported_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
        assert_eq!(parse_date("2023年4月1日"), Some(expected));
        assert_eq!(parse_date("2023-04-01"), Some(expected));
        assert_eq!(parse_date(" 2023/04/01 "), Some(expected));
        assert_eq!(parse_date("April 1st"), None);
    }

    #[test]
    fn two_month_windows() {
        let records = vec![
            rec("2023-04-15", Some("a")),
            rec("2023-05-31", None),
            rec("2023-06-01", Some("b")),
            rec("2023-09-02", Some("c")),
        ];
        let periods = partition_by_months(&records, 2).unwrap();
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-04~05", "2023-06~07", "2023-08~09"]);
        assert_eq!(periods[0].document_count, 2);
        assert_eq!(periods[0].documents, vec![Some("a".to_string()), None]);
        assert_eq!(periods[1].document_count, 1);
        assert_eq!(periods[2].end, NaiveDate::from_ymd_opt(2023, 9, 2).unwrap());
    }

    #[test]
    fn year_boundary_label() {
        let records = vec![rec("2023-12-10", Some("x")), rec("2024-01-05", Some("y"))];
        let periods = partition_by_months(&records, 2).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].label, "2023-12~01");
        assert_eq!(periods[0].document_count, 2);
    }

    #[test]
    fn empty_windows_are_kept() {
        let records = vec![rec("2023-01-10", Some("x")), rec("2023-05-05", Some("y"))];
        let periods = partition_by_months(&records, 1).unwrap();
        assert_eq!(periods.len(), 5);
        assert_eq!(periods[2].document_count, 0);
    }

    #[test]
    fn no_records_no_periods() {
        assert!(partition_by_months(&[], 2).unwrap().is_empty());
        assert!(partition_by_months(&[], 0).is_err());
    }
}
