use std::collections::HashSet;

use log::debug;

use crate::classifier::CategoryClassifier;
use crate::cooccurrence::{CooccurrenceCounter, Pair};

///Chooses the pairs to follow across periods.
///
///Each period first contributes its `per_period_keep` strongest pairs not yet
///chosen; the counts summed over all periods then fill the list up to
///`per_period_keep * periods + fill_from_overall`. Pairs containing a category
///term are never chosen. The result keeps selection order.
/// # Example
/// ```
/// use cooccur_trends::{select_candidate_pairs, CategoryClassifier, CooccurrenceCounter, Pair};
/// let p = |a: &str, b: &str| Pair::new(a, b).unwrap();
/// let c1: CooccurrenceCounter = vec![(p("電話", "詐欺"), 9), (p("詐欺", "請求"), 4)].into_iter().collect();
/// let c2: CooccurrenceCounter = vec![(p("解約", "返金"), 3)].into_iter().collect();
/// let picked = select_candidate_pairs(&[c1, c2], &CategoryClassifier::default_channels(), 1, 0);
/// assert_eq!(picked, vec![p("詐欺", "請求"), p("解約", "返金")]);
/// ```
pub fn select_candidate_pairs(
    counters: &[CooccurrenceCounter],
    classifier: &CategoryClassifier,
    per_period_keep: usize,
    fill_from_overall: usize,
) -> Vec<Pair> {
    let is_category = |t: &str| classifier.is_category(t);
    let mut selected: Vec<Pair> = Vec::new();
    let mut seen: HashSet<Pair> = HashSet::new();

    for counter in counters {
        let mut kept = 0;
        for (pair, _) in counter.most_common() {
            if kept >= per_period_keep {
                break;
            }
            if pair.any(is_category) || seen.contains(pair) {
                continue;
            }
            seen.insert(pair.clone());
            selected.push(pair.clone());
            kept += 1;
        }
    }

    let limit = per_period_keep * counters.len() + fill_from_overall;
    let mut overall = CooccurrenceCounter::new();
    for counter in counters {
        overall.merge(counter);
    }
    for (pair, _) in overall.most_common() {
        if selected.len() >= limit {
            break;
        }
        if pair.any(is_category) || seen.contains(pair) {
            continue;
        }
        seen.insert(pair.clone());
        selected.push(pair.clone());
    }
    debug!(
        "Selected {} candidate pairs (limit {}) from {} periods",
        selected.len(),
        limit,
        counters.len()
    );
    selected
}
