//! Category-anchored "problem sets": groups of problem terms that co-occur
//! with each other and, for channel categories, with the channel term too.
//!
//! A set is only as strong as its weakest supporting edge, so its score is
//! the minimum weight over every edge it requires. A set missing any required
//! edge scores 0 and is dropped.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::classifier::CategoryClassifier;
use crate::graph::CooccurrenceGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSet {
    /// Problem terms in ascending order; never includes the anchor.
    pub terms: Vec<String>,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    Category,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub label: String,
    pub kind: BucketKind,
    pub sets: Vec<ProblemSet>,
}

/// Limits applied by [`summarize`].
#[derive(Debug, Clone, Copy)]
pub struct SummaryParams<'a> {
    pub top_k: usize,
    pub max_neighbors: usize,
    pub other_label: &'a str,
}

///Scores `terms`, optionally anchored on a category node.
///
///Required edges are anchor–term for every term (when anchored) and every
///term–term pair. Any missing edge gives 0, otherwise the score is the
///smallest required weight. A single unanchored term has no required edge
///and scores its strongest edge in the graph instead.
/// # Example
/// ```
/// use cooccur_trends::{count_cooccurrences, score_set, CooccurrenceGraph};
/// let docs = vec![vec!["電話".to_string(), "詐欺".to_string(), "請求".to_string()]; 4];
/// let g = CooccurrenceGraph::from_counter(&count_cooccurrences(&docs, Some(5)), 1);
/// assert_eq!(score_set(&g, Some("電話"), &["詐欺", "請求"]), 4);
/// assert_eq!(score_set(&g, Some("電話"), &["詐欺", "返金"]), 0);
/// ```
pub fn score_set(graph: &CooccurrenceGraph, anchor: Option<&str>, terms: &[&str]) -> u32 {
    let mut weights = Vec::new();
    if let Some(anchor) = anchor {
        for term in terms {
            match graph.weight(anchor, term) {
                Some(w) => weights.push(w),
                None => return 0,
            }
        }
    }
    for (i, a) in terms.iter().enumerate() {
        for b in &terms[i + 1..] {
            match graph.weight(a, b) {
                Some(w) => weights.push(w),
                None => return 0,
            }
        }
    }
    match weights.iter().min() {
        Some(&min) => min,
        None if anchor.is_none() && terms.len() == 1 => graph.max_neighbor_weight(terms[0]),
        None => 0,
    }
}

/// Score descending, then terms ascending.
fn rank(sets: &mut [ProblemSet]) {
    sets.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.terms.cmp(&b.terms)));
}

fn sorted_terms(terms: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
    out.sort();
    out
}

///Finds every anchor + two problem terms set supported by the graph.
///
///Only the `max_neighbors` strongest non-category neighbours of `anchor` are
///combined. Result is ranked by score descending, ties by terms ascending.
pub fn extract_pairs_for_category(
    graph: &CooccurrenceGraph,
    anchor: &str,
    classifier: &CategoryClassifier,
    max_neighbors: usize,
) -> Vec<ProblemSet> {
    if !graph.contains(anchor) {
        return Vec::new();
    }
    let mut neighbors: Vec<(&str, u32)> = graph
        .neighbors(anchor)
        .filter(|(n, _)| !classifier.is_category(n))
        .collect();
    // neighbours arrive in name order, so a stable sort keeps name as the tie-break
    neighbors.sort_by(|a, b| b.1.cmp(&a.1));
    neighbors.truncate(max_neighbors);

    let mut sets = Vec::new();
    for (i, (p1, _)) in neighbors.iter().enumerate() {
        for (p2, _) in &neighbors[i + 1..] {
            let terms = sorted_terms(&[*p1, *p2]);
            let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
            let score = score_set(graph, Some(anchor), &refs);
            if score > 0 {
                sets.push(ProblemSet { terms, score });
            }
        }
    }
    rank(&mut sets);
    sets
}

///Per-category top problem sets, plus an "other" bucket of problem-term
///triplets that no category claimed.
///
///Category buckets appear in label order and are present for every category
///node of the graph, even when empty. The "other" bucket comes last and only
///when it found something.
pub fn summarize(
    graph: &CooccurrenceGraph,
    classifier: &CategoryClassifier,
    params: SummaryParams<'_>,
) -> Vec<CategorySummary> {
    let mut by_label: BTreeMap<String, Vec<ProblemSet>> = BTreeMap::new();
    for node in graph.nodes().filter(|n| classifier.is_category(n)) {
        let label = classifier.label_of(node).unwrap_or(node).to_string();
        let found = extract_pairs_for_category(graph, node, classifier, params.max_neighbors);
        let bucket = by_label.entry(label).or_default();
        for set in found {
            // two anchors under one label: keep the stronger score per term set
            if let Some(existing) = bucket.iter_mut().find(|s| s.terms == set.terms) {
                existing.score = existing.score.max(set.score);
            } else {
                bucket.push(set);
            }
        }
        rank(bucket);
        bucket.truncate(params.top_k);
    }

    let used: HashSet<&str> = by_label
        .values()
        .flatten()
        .flat_map(|s| s.terms.iter().map(String::as_str))
        .collect();

    let mut others: Vec<&str> = graph
        .nodes()
        .filter(|n| !classifier.is_category(n) && !used.contains(n))
        .collect();
    others.sort_by(|a, b| graph.strength(b).cmp(&graph.strength(a)).then_with(|| a.cmp(b)));
    others.truncate(params.max_neighbors);

    let mut other_sets = Vec::new();
    for i in 0..others.len() {
        for j in (i + 1)..others.len() {
            for k in (j + 1)..others.len() {
                let terms = sorted_terms(&[others[i], others[j], others[k]]);
                let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
                let score = score_set(graph, None, &refs);
                if score > 0 {
                    other_sets.push(ProblemSet { terms, score });
                }
            }
        }
    }
    rank(&mut other_sets);
    other_sets.truncate(params.top_k);

    let mut summaries: Vec<CategorySummary> = by_label
        .into_iter()
        .map(|(label, sets)| CategorySummary {
            label,
            kind: BucketKind::Category,
            sets,
        })
        .collect();
    if !other_sets.is_empty() {
        summaries.push(CategorySummary {
            label: params.other_label.to_string(),
            kind: BucketKind::Other,
            sets: other_sets,
        });
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooccurrence::{CooccurrenceCounter, Pair};

    fn graph(edges: &[(&str, &str, u32)]) -> CooccurrenceGraph {
        let counter: CooccurrenceCounter = edges
            .iter()
            .map(|(a, b, w)| (Pair::new(a, b).unwrap(), *w))
            .collect();
        CooccurrenceGraph::from_counter(&counter, 1)
    }

    fn params() -> SummaryParams<'static> {
        SummaryParams {
            top_k: 5,
            max_neighbors: 20,
            other_label: "その他",
        }
    }

    #[test]
    fn anchored_score_is_weakest_edge() {
        let g = graph(&[("電話", "詐欺", 9), ("電話", "請求", 4), ("詐欺", "請求", 6)]);
        let s = score_set(&g, Some("電話"), &["詐欺", "請求"]);
        assert_eq!(s, 4);
        for w in [9, 4, 6] {
            assert!(s <= w);
        }
    }

    #[test]
    fn missing_edge_fails_closed() {
        let g = graph(&[("電話", "詐欺", 9), ("詐欺", "請求", 6)]);
        assert_eq!(score_set(&g, Some("電話"), &["詐欺", "請求"]), 0);
        let g = graph(&[("電話", "詐欺", 9), ("電話", "請求", 6)]);
        assert_eq!(score_set(&g, Some("電話"), &["詐欺", "請求"]), 0);
    }

    #[test]
    fn single_term_falls_back_to_strongest_edge() {
        let g = graph(&[("a", "b", 3), ("a", "c", 8)]);
        assert_eq!(score_set(&g, None, &["a"]), 8);
        assert_eq!(score_set(&g, None, &["zzz"]), 0);
        // anchored single term still needs its anchor edge
        assert_eq!(score_set(&g, Some("b"), &["c"]), 0);
        assert_eq!(score_set(&g, Some("b"), &["a"]), 3);
    }

    #[test]
    fn triplet_without_anchor() {
        let g = graph(&[("a", "b", 3), ("a", "c", 8), ("b", "c", 5)]);
        assert_eq!(score_set(&g, None, &["a", "b", "c"]), 3);
        assert_eq!(score_set(&g, None, &["a", "b", "d"]), 0);
    }

    #[test]
    fn category_pairs_skip_other_categories() {
        let classifier = CategoryClassifier::default_channels();
        let g = graph(&[
            ("電話", "詐欺", 9),
            ("電話", "請求", 7),
            ("電話", "ネット", 20),
            ("詐欺", "請求", 5),
            ("詐欺", "ネット", 8),
        ]);
        let sets = extract_pairs_for_category(&g, "電話", &classifier, 20);
        assert_eq!(
            sets,
            vec![ProblemSet {
                terms: vec!["詐欺".to_string(), "請求".to_string()],
                score: 5
            }]
        );
    }

    #[test]
    fn neighbor_cap_limits_candidates() {
        let classifier = CategoryClassifier::default_channels();
        let g = graph(&[
            ("電話", "a", 9),
            ("電話", "b", 8),
            ("電話", "c", 2),
            ("a", "b", 4),
            ("a", "c", 4),
        ]);
        let sets = extract_pairs_for_category(&g, "電話", &classifier, 2);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].terms, vec!["a", "b"]);
        assert!(extract_pairs_for_category(&g, "訪問", &classifier, 2).is_empty());
    }

    #[test]
    fn ties_break_on_terms() {
        let classifier = CategoryClassifier::default_channels();
        let g = graph(&[
            ("メール", "x", 5),
            ("メール", "y", 5),
            ("メール", "z", 5),
            ("x", "y", 3),
            ("x", "z", 3),
            ("y", "z", 3),
        ]);
        let sets = extract_pairs_for_category(&g, "メール", &classifier, 20);
        let order: Vec<Vec<String>> = sets.into_iter().map(|s| s.terms).collect();
        assert_eq!(
            order,
            vec![
                vec!["x".to_string(), "y".to_string()],
                vec!["x".to_string(), "z".to_string()],
                vec!["y".to_string(), "z".to_string()],
            ]
        );
    }

    #[test]
    fn summary_has_categories_then_other() {
        let classifier = CategoryClassifier::default_channels();
        let g = graph(&[
            ("電話", "詐欺", 9),
            ("電話", "請求", 7),
            ("詐欺", "請求", 5),
            ("訪問", "工事", 3),
            ("契約", "解約", 6),
            ("契約", "返金", 4),
            ("解約", "返金", 5),
        ]);
        let summaries = summarize(&g, &classifier, params());
        let labels: Vec<&str> = summaries.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["訪問", "電話", "その他"]);
        // 訪問 has a single neighbour, so no pair can form
        assert!(summaries[0].sets.is_empty());
        assert_eq!(summaries[1].sets[0].score, 5);
        let other = &summaries[2];
        assert_eq!(other.kind, BucketKind::Other);
        assert_eq!(
            other.sets,
            vec![ProblemSet {
                terms: vec!["契約".to_string(), "解約".to_string(), "返金".to_string()],
                score: 4
            }]
        );
    }

    #[test]
    fn used_terms_are_not_reused_in_other_bucket() {
        let classifier = CategoryClassifier::default_channels();
        let g = graph(&[
            ("電話", "a", 5),
            ("電話", "b", 5),
            ("a", "b", 5),
            ("a", "c", 5),
            ("b", "c", 5),
        ]);
        let summaries = summarize(&g, &classifier, params());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].label, "電話");
    }

    #[test]
    fn anchors_sharing_a_label_are_merged() {
        // 携帯 and 電話 both map to the 電話 label
        let classifier = CategoryClassifier::default_channels();
        let g = graph(&[
            ("電話", "x", 9),
            ("電話", "y", 9),
            ("携帯", "x", 2),
            ("携帯", "y", 2),
            ("携帯", "z", 7),
            ("携帯", "w", 7),
            ("x", "y", 8),
            ("w", "z", 6),
            ("x", "z", 1),
        ]);
        let mut p = params();
        p.top_k = 2;
        let summaries = summarize(&g, &classifier, p);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].label, "電話");
        assert_eq!(
            summaries[0].sets,
            vec![
                ProblemSet {
                    terms: vec!["x".to_string(), "y".to_string()],
                    score: 8
                },
                ProblemSet {
                    terms: vec!["w".to_string(), "z".to_string()],
                    score: 6
                },
            ]
        );
    }

    #[test]
    fn other_nodes_ranked_by_strength_then_name() {
        let classifier = CategoryClassifier::default_channels();
        let mut p = params();
        p.max_neighbors = 3;

        // every node has strength 10: a, b, c win on name and form no triplet
        let tied = graph(&[("a", "b", 10), ("c", "d", 5), ("c", "e", 5), ("d", "e", 5)]);
        assert!(summarize(&tied, &classifier, p).is_empty());
        p.max_neighbors = 5;
        let all = summarize(&tied, &classifier, p);
        assert_eq!(all[0].sets[0].terms, vec!["c", "d", "e"]);

        // a stronger triangle is kept ahead of the named-first nodes
        p.max_neighbors = 3;
        let strong = graph(&[("a", "b", 10), ("c", "d", 6), ("c", "e", 6), ("d", "e", 6)]);
        let summaries = summarize(&strong, &classifier, p);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].kind, BucketKind::Other);
        assert_eq!(
            summaries[0].sets,
            vec![ProblemSet {
                terms: vec!["c".to_string(), "d".to_string(), "e".to_string()],
                score: 6
            }]
        );
    }

    #[test]
    fn top_k_is_respected() {
        let classifier = CategoryClassifier::default_channels();
        let mut edges = Vec::new();
        let terms = ["a", "b", "c", "d", "e"];
        for t in terms {
            edges.push(("電話", t, 10));
        }
        for (i, a) in terms.iter().enumerate() {
            for b in &terms[i + 1..] {
                edges.push((*a, *b, 2));
            }
        }
        let g = graph(&edges);
        let mut p = params();
        p.top_k = 3;
        let summaries = summarize(&g, &classifier, p);
        assert_eq!(summaries[0].sets.len(), 3);
    }

    #[test]
    fn empty_graph_gives_no_summaries() {
        let classifier = CategoryClassifier::default_channels();
        let g = CooccurrenceGraph::default();
        assert!(summarize(&g, &classifier, params()).is_empty());
    }
}
