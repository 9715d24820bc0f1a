//! Per-period leader tables and the distinctive/persistent split of the
//! pairs that lead them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cooccurrence::{CooccurrenceCounter, Pair};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPair {
    pub pair: Pair,
    pub count: u32,
}

/// The `top_n` strongest pairs of every period, one column per period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPairTable {
    pub periods: Vec<String>,
    pub top_n: usize,
    /// `columns[period]`, strongest first; shorter than `top_n` when the
    /// period had fewer pairs.
    pub columns: Vec<Vec<RankedPair>>,
}

impl TopPairTable {
    pub fn cell(&self, rank: usize, period: usize) -> Option<&RankedPair> {
        self.columns.get(period).and_then(|c| c.get(rank))
    }
}

pub fn top_pair_table(labels: &[String], counters: &[CooccurrenceCounter], top_n: usize) -> TopPairTable {
    let columns: Vec<Vec<RankedPair>> = counters
        .iter()
        .map(|c| {
            c.most_common()
                .into_iter()
                .take(top_n)
                .map(|(pair, count)| RankedPair {
                    pair: pair.clone(),
                    count,
                })
                .collect::<Vec<_>>()
        })
        .collect();
    TopPairTable {
        periods: labels.to_vec(),
        top_n,
        columns,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// Leads exactly one period.
    Distinctive,
    /// Leads two or more periods.
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPersistence {
    pub pair: Pair,
    /// Labels of the periods whose table contains the pair.
    pub periods: Vec<String>,
    pub kind: Persistence,
}

///Splits every pair of `table` into distinctive (in one period's leaders
///only) and persistent (in several). Pairs are listed in order of first
///appearance, walking periods left to right and ranks top to bottom.
pub fn classify_pair_persistence(table: &TopPairTable) -> Vec<PairPersistence> {
    let mut order: Vec<Pair> = Vec::new();
    let mut seen_in: HashMap<Pair, Vec<String>> = HashMap::new();
    for (label, column) in table.periods.iter().zip(&table.columns) {
        for ranked in column {
            let periods = seen_in.entry(ranked.pair.clone()).or_insert_with(|| {
                order.push(ranked.pair.clone());
                Vec::new()
            });
            if periods.last() != Some(label) {
                periods.push(label.clone());
            }
        }
    }
    order
        .into_iter()
        .map(|pair| {
            let periods = seen_in.remove(&pair).unwrap_or_default();
            let kind = if periods.len() == 1 {
                Persistence::Distinctive
            } else {
                Persistence::Persistent
            };
            PairPersistence { pair, periods, kind }
        })
        .collect()
}
