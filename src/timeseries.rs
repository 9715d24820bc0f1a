use log::warn;
use serde::{Deserialize, Serialize};

use crate::cooccurrence::{CooccurrenceCounter, Pair};

/// What each row of a [`Timeseries`] was divided by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denominator {
    /// Raw pair counts.
    Raw,
    /// Share of the period's records that mention the pair.
    DocumentCount,
    /// Share of the period's co-occurrence mass. Used only when document
    /// counts are unavailable; the values are not comparable to
    /// `DocumentCount` shares.
    CooccurrenceMass,
}

/// Period × pair matrix of (possibly normalized) co-occurrence counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    pub periods: Vec<String>,
    /// Column keys, `a|b`.
    pub columns: Vec<String>,
    /// `values[period][column]`.
    pub values: Vec<Vec<f64>>,
    pub denominator: Denominator,
}

///Builds the period × pair matrix for `pairs`.
///
///With `normalize`, each period row is divided by that period's document
///count. If `doc_counts` is missing or does not have one entry per period,
///rows are divided by the period's total co-occurrence count instead and a
///warning is logged. A zero denominator gives 0. Labels and counters are
///paired up by position; surplus entries on either side are dropped with a
///warning.
/// # Example
/// ```
/// use cooccur_trends::{build_timeseries, CooccurrenceCounter, Denominator, Pair};
/// let pair = Pair::new("解約", "返金").unwrap();
/// let counter: CooccurrenceCounter = vec![(pair.clone(), 3)].into_iter().collect();
/// let ts = build_timeseries(&["2023-04~05".to_string()], &[counter], &[pair], Some(&[5][..]), true);
/// assert_eq!(ts.values[0][0], 0.6);
/// assert_eq!(ts.denominator, Denominator::DocumentCount);
/// ```
pub fn build_timeseries(
    labels: &[String],
    counters: &[CooccurrenceCounter],
    pairs: &[Pair],
    doc_counts: Option<&[usize]>,
    normalize: bool,
) -> Timeseries {
    let n = labels.len().min(counters.len());
    if labels.len() != counters.len() {
        warn!(
            "{} period labels but {} counters; using the first {} periods",
            labels.len(),
            counters.len(),
            n
        );
    }
    let (labels, counters) = (&labels[..n], &counters[..n]);

    let (denominator, totals): (Denominator, Vec<f64>) = match (normalize, doc_counts) {
        (false, _) => (Denominator::Raw, vec![1.0; counters.len()]),
        (true, Some(docs)) if docs.len() == counters.len() => (
            Denominator::DocumentCount,
            docs.iter().map(|&d| d as f64).collect(),
        ),
        (true, _) => {
            warn!(
                "Document counts unavailable for {} periods; normalizing by co-occurrence mass instead. \
                 Values are shares of co-occurrences, not shares of records.",
                counters.len()
            );
            (
                Denominator::CooccurrenceMass,
                counters.iter().map(|c| c.total() as f64).collect(),
            )
        }
    };

    let values: Vec<Vec<f64>> = counters
        .iter()
        .zip(&totals)
        .map(|(counter, &total)| {
            pairs
                .iter()
                .map(|pair| {
                    let count = f64::from(counter.get(pair));
                    match denominator {
                        Denominator::Raw => count,
                        _ if total > 0.0 => count / total,
                        _ => 0.0,
                    }
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    Timeseries {
        periods: labels.to_vec(),
        columns: pairs.iter().map(Pair::to_string).collect(),
        values,
        denominator,
    }
}

impl Timeseries {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.values.is_empty()
    }

    /// One column's values across all periods.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not below `columns.len()`.
    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[idx]).collect()
    }

    /// Sum of one column across all periods. Panics like [`Timeseries::column`].
    pub fn column_total(&self, idx: usize) -> f64 {
        self.values.iter().map(|row| row[idx]).sum()
    }

    fn retain_columns(&self, keep: &[usize]) -> Timeseries {
        Timeseries {
            periods: self.periods.clone(),
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            values: self
                .values
                .iter()
                .map(|row| keep.iter().map(|&i| row[i]).collect::<Vec<f64>>())
                .collect(),
            denominator: self.denominator,
        }
    }

    ///Drops flat series. A column is kept when its range (`max - min`) is at
    ///least `min_abs`, or, with `rel_or_abs`, when the range relative to its
    ///maximum is at least `min_rel`.
    pub fn filter_by_change(&self, min_abs: f64, min_rel: f64, rel_or_abs: bool) -> Timeseries {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| {
                let col = self.column(i);
                if col.is_empty() {
                    return false;
                }
                let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min = col.iter().copied().fold(f64::INFINITY, f64::min);
                let diff = max - min;
                let rel = if max > 0.0 { diff / max } else { 0.0 };
                diff >= min_abs || (rel_or_abs && rel >= min_rel)
            })
            .collect();
        self.retain_columns(&keep)
    }

    /// The `limit` columns with the largest totals, largest first; equal
    /// totals keep column order.
    pub fn top_columns(&self, limit: usize) -> Timeseries {
        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        order.sort_by(|&a, &b| {
            self.column_total(b)
                .partial_cmp(&self.column_total(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(limit);
        self.retain_columns(&order)
    }
}
