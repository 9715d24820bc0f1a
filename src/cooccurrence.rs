use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unordered pair of two distinct terms, stored sorted so that `(a, b)` and
/// `(b, a)` are the same key.
///
/// Deserializing goes through [`Pair::new`]: terms are reordered and equal
/// terms are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPair")]
pub struct Pair {
    first: String,
    second: String,
}

#[derive(Deserialize)]
struct RawPair {
    first: String,
    second: String,
}

impl TryFrom<RawPair> for Pair {
    type Error = String;

    fn try_from(raw: RawPair) -> Result<Self, Self::Error> {
        Pair::new(&raw.first, &raw.second)
            .ok_or_else(|| format!("pair of identical terms {:?}", raw.first))
    }
}

impl Pair {
    /// Returns `None` when both terms are equal.
    pub fn new(a: &str, b: &str) -> Option<Pair> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Pair {
                first: a.to_string(),
                second: b.to_string(),
            }),
            std::cmp::Ordering::Greater => Some(Pair {
                first: b.to_string(),
                second: a.to_string(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, term: &str) -> bool {
        self.first == term || self.second == term
    }

    /// `true` if either term satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&str) -> bool) -> bool {
        pred(&self.first) || pred(&self.second)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.first, self.second)
    }
}

/// Pair → count, accumulated over the documents of one period (or summed
/// over all periods).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooccurrenceCounter {
    counts: BTreeMap<Pair, u32>,
}

impl CooccurrenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pair: Pair, n: u32) {
        *self.counts.entry(pair).or_insert(0) += n;
    }

    pub fn get(&self, pair: &Pair) -> u32 {
        self.counts.get(pair).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pair, u32)> {
        self.counts.iter().map(|(p, &c)| (p, c))
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &CooccurrenceCounter) {
        for (pair, count) in other.iter() {
            self.add(pair.clone(), count);
        }
    }

    /// All pairs sorted by count descending, ties by pair ascending.
    pub fn most_common(&self) -> Vec<(&Pair, u32)> {
        let mut sorted: Vec<(&Pair, u32)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }
}

impl FromIterator<(Pair, u32)> for CooccurrenceCounter {
    fn from_iter<I: IntoIterator<Item = (Pair, u32)>>(iter: I) -> Self {
        let mut counter = CooccurrenceCounter::new();
        for (pair, n) in iter {
            counter.add(pair, n);
        }
        counter
    }
}

///Counts pair co-occurrences over `docs`.
///
///With `Some(window)`, every two positions `i < j <= i + window` holding
///different terms add one to their pair, so terms that repeat close to each
///other are counted once per instance. With `None` (or a zero window) each
///document adds at most one to every pair of distinct terms it contains.
///Empty documents add nothing.
/// # Example
/// ```
/// use cooccur_trends::{count_cooccurrences, Pair};
/// let docs = vec![vec!["a".to_string(), "b".to_string(), "a".to_string()]];
/// let windowed = count_cooccurrences(&docs, Some(2));
/// assert_eq!(windowed.get(&Pair::new("a", "b").unwrap()), 2);
/// let whole = count_cooccurrences(&docs, None);
/// assert_eq!(whole.get(&Pair::new("a", "b").unwrap()), 1);
/// ```
pub fn count_cooccurrences(docs: &[Vec<String>], window: Option<usize>) -> CooccurrenceCounter {
    let mut counter = CooccurrenceCounter::new();
    for tokens in docs.iter().filter(|d| !d.is_empty()) {
        match window.filter(|&w| w > 0) {
            Some(w) => {
                for i in 0..tokens.len() {
                    let end = (i + w + 1).min(tokens.len());
                    for j in (i + 1)..end {
                        if let Some(pair) = Pair::new(&tokens[i], &tokens[j]) {
                            counter.add(pair, 1);
                        }
                    }
                }
            }
            None => {
                let unique: Vec<&String> = tokens.iter().collect::<BTreeSet<_>>().into_iter().collect();
                for (idx, a) in unique.iter().enumerate() {
                    for b in &unique[idx + 1..] {
                        if let Some(pair) = Pair::new(a, b) {
                            counter.add(pair, 1);
                        }
                    }
                }
            }
        }
    }
    counter
}
