#![forbid(unsafe_code)]
//! # cooccur_trends
//!
//! Co-occurrence analytics for short, timestamped free-text records such as
//! consumer consultation logs. For every period the crate counts which terms
//! appear close to each other, builds a weighted co-occurrence graph, and
//! extracts channel-anchored "problem sets". Across periods it picks the pairs
//! worth following and turns their counts into a normalized timeseries.
//!
//! ## Pipeline
//! 1. [`TextNormalizer`] strips URLs and dates, segments text with a pluggable
//!    [`Tokenizer`] and keeps content nouns.
//! 2. [`filter_vocabulary`] drops terms outside a corpus frequency band.
//! 3. [`count_cooccurrences`] counts term pairs within a window.
//! 4. [`CooccurrenceGraph`] keeps the pairs above a threshold.
//! 5. [`summarize`] scores problem sets per [`CategoryClassifier`] label.
//! 6. [`select_candidate_pairs`] and [`build_timeseries`] follow pairs over time.
//!
//! [`analyze_corpus`] runs all of it for a list of periods.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod cooccurrence;
pub mod error;
pub mod export;
pub mod graph;
pub mod input;
pub mod normalize;
pub mod periods;
pub mod problem_sets;
pub mod report;
pub mod selector;
pub mod timeseries;
pub mod vocabulary;

pub use classifier::CategoryClassifier;
pub use cooccurrence::{CooccurrenceCounter, Pair, count_cooccurrences};
pub use error::{AnalysisError, Result};
pub use export::{ExportFormat, csv_safe_cell, export_report};
pub use graph::CooccurrenceGraph;
pub use input::{collect_files, read_records};
pub use normalize::{
    LexiconTokenizer, Morpheme, TextNormalizer, Tokenizer, WhitespaceTokenizer, load_stopwords,
};
pub use periods::{PeriodInput, Record, parse_date, partition_by_months};
pub use problem_sets::{
    BucketKind, CategorySummary, ProblemSet, SummaryParams, extract_pairs_for_category,
    score_set, summarize,
};
pub use report::{
    PairPersistence, Persistence, RankedPair, TopPairTable, classify_pair_persistence,
    top_pair_table,
};
pub use selector::select_candidate_pairs;
pub use timeseries::{Denominator, Timeseries, build_timeseries};
pub use vocabulary::{VocabularyBand, filter_vocabulary};

/// Every tunable of the pipeline. Passed explicitly to each entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Co-occurrence window in tokens; `None` counts whole documents.
    pub window: Option<usize>,
    /// Minimum pair count for a graph edge.
    pub min_edge_freq: u32,
    pub vocabulary: VocabularyBand,
    /// Neighbour cap when combining terms into problem sets.
    pub max_neighbors: usize,
    /// Problem sets kept per category.
    pub top_k: usize,
    /// Rows of the per-period leader table.
    pub top_pairs_per_period: usize,
    pub per_period_keep: usize,
    pub fill_from_overall: usize,
    /// Divide timeseries rows by the period's record count.
    pub normalize: bool,
    pub other_label: String,
    pub period_months: u32,
    /// Display filter: minimum range of a series.
    pub min_abs_change: f64,
    /// Display filter: minimum range relative to the series maximum.
    pub min_rel_change: f64,
    /// Accept a series on either criterion instead of the absolute one only.
    pub rel_or_abs: bool,
    /// Display filter: number of series kept.
    pub max_series: usize,
    /// Heaviest graph edges kept per period for the network table.
    pub network_edges: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            window: Some(5),
            min_edge_freq: 5,
            vocabulary: VocabularyBand::default(),
            max_neighbors: 20,
            top_k: 5,
            top_pairs_per_period: 10,
            per_period_keep: 1,
            fill_from_overall: 4,
            normalize: true,
            other_label: "その他".to_string(),
            period_months: 2,
            min_abs_change: 2.0,
            min_rel_change: 0.20,
            rel_or_abs: true,
            max_series: 10,
            network_edges: 40,
        }
    }
}

impl AnalysisOptions {
    /// Loads options from a JSON object; missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let options: AnalysisOptions = serde_json::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.min > self.vocabulary.max {
            return Err(AnalysisError::InvalidOption(format!(
                "vocabulary band is empty: min {} > max {}",
                self.vocabulary.min, self.vocabulary.max
            )));
        }
        if self.period_months == 0 {
            return Err(AnalysisError::InvalidOption(
                "period_months must be at least 1".to_string(),
            ));
        }
        if self.min_edge_freq == 0 {
            return Err(AnalysisError::InvalidOption(
                "min_edge_freq must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn summary_params(&self) -> SummaryParams<'_> {
        SummaryParams {
            top_k: self.top_k,
            max_neighbors: self.max_neighbors,
            other_label: &self.other_label,
        }
    }
}

/// Everything computed for one period.
#[derive(Debug, Clone)]
pub struct PeriodAnalysis {
    pub label: String,
    pub document_count: usize,
    /// Terms per document after vocabulary filtering.
    pub documents: Vec<Vec<String>>,
    /// Term frequency before vocabulary filtering.
    pub token_frequency: BTreeMap<String, u32>,
    pub counter: CooccurrenceCounter,
    pub graph: CooccurrenceGraph,
    /// The `network_edges` heaviest edges of `graph`.
    pub network: Vec<(Pair, u32)>,
    pub summaries: Vec<CategorySummary>,
}

///Runs normalization, vocabulary filtering, counting, graph building and
///problem-set scoring for one period.
pub fn analyze_period(
    input: &PeriodInput,
    normalizer: &TextNormalizer,
    classifier: &CategoryClassifier,
    options: &AnalysisOptions,
) -> PeriodAnalysis {
    let normalized = normalizer.normalize_documents(&input.documents);
    let (documents, token_frequency) = filter_vocabulary(&normalized, options.vocabulary);
    let counter = count_cooccurrences(&documents, options.window);
    let graph = CooccurrenceGraph::from_counter(&counter, options.min_edge_freq);
    let summaries = summarize(&graph, classifier, options.summary_params());
    let network = graph.top_edges(options.network_edges);
    debug!(
        "{}: {} records, {} terms, {} pairs, graph {} nodes / {} edges",
        input.label,
        input.document_count,
        token_frequency.len(),
        counter.len(),
        graph.node_count(),
        graph.edge_count()
    );
    PeriodAnalysis {
        label: input.label.clone(),
        document_count: input.document_count,
        documents,
        token_frequency,
        counter,
        graph,
        network,
        summaries,
    }
}

/// Results for a whole corpus.
#[derive(Debug, Clone)]
pub struct CorpusReport {
    pub periods: Vec<PeriodAnalysis>,
    /// Pair counts summed over all periods.
    pub overall: CooccurrenceCounter,
    pub top_pairs: TopPairTable,
    pub persistence: Vec<PairPersistence>,
    pub candidates: Vec<Pair>,
    /// All candidate pairs, one column each.
    pub timeseries: Timeseries,
    /// `timeseries` after the change filter and the series cap.
    pub display_series: Timeseries,
}

///Analyzes each period (in parallel), then compares them: leader tables,
///distinctive pairs, candidate selection and the candidate timeseries.
pub fn analyze_corpus(
    periods: &[PeriodInput],
    normalizer: &TextNormalizer,
    classifier: &CategoryClassifier,
    options: &AnalysisOptions,
) -> Result<CorpusReport> {
    options.validate()?;
    let analyses: Vec<PeriodAnalysis> = periods
        .par_iter()
        .map(|p| analyze_period(p, normalizer, classifier, options))
        .collect();

    let labels: Vec<String> = analyses.iter().map(|a| a.label.clone()).collect();
    let counters: Vec<CooccurrenceCounter> = analyses.iter().map(|a| a.counter.clone()).collect();
    let doc_counts: Vec<usize> = analyses.iter().map(|a| a.document_count).collect();

    let mut overall = CooccurrenceCounter::new();
    for c in &counters {
        overall.merge(c);
    }

    let top_pairs = top_pair_table(&labels, &counters, options.top_pairs_per_period);
    let persistence = classify_pair_persistence(&top_pairs);
    let candidates = select_candidate_pairs(
        &counters,
        classifier,
        options.per_period_keep,
        options.fill_from_overall,
    );
    let timeseries = build_timeseries(
        &labels,
        &counters,
        &candidates,
        Some(doc_counts.as_slice()),
        options.normalize,
    );
    let display_series = timeseries
        .filter_by_change(options.min_abs_change, options.min_rel_change, options.rel_or_abs)
        .top_columns(options.max_series);

    info!(
        "Analyzed {} periods: {} distinct pairs overall, {} candidate pairs",
        analyses.len(),
        overall.len(),
        candidates.len()
    );

    Ok(CorpusReport {
        periods: analyses,
        overall,
        top_pairs,
        persistence,
        candidates,
        timeseries,
        display_series,
    })
}

impl CorpusReport {
    /// Human-readable overview, the same text the CLI prints.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let total: usize = self.periods.iter().map(|p| p.document_count).sum();
        let _ = writeln!(out, "Periods ({} records):", total);
        for p in &self.periods {
            let _ = writeln!(
                out,
                "  {}\t{} records\t{} pairs\t{} edges",
                p.label,
                p.document_count,
                p.counter.len(),
                p.graph.edge_count()
            );
        }
        for p in &self.periods {
            if p.summaries.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\nProblem sets {}:", p.label);
            for s in &p.summaries {
                let _ = writeln!(out, "  {}:", s.label);
                for set in &s.sets {
                    let _ = writeln!(out, "    {}\t{}", set.terms.join("-"), set.score);
                }
            }
        }
        let _ = writeln!(out, "\nCandidate pairs:");
        for pair in &self.candidates {
            let _ = writeln!(out, "  {}\t{}", pair, self.overall.get(pair));
        }
        if !self.display_series.columns.is_empty() {
            let _ = writeln!(out, "\nChanging series:");
            for (i, col) in self.display_series.columns.iter().enumerate() {
                let values: Vec<String> = self
                    .display_series
                    .column(i)
                    .iter()
                    .map(|v| format!("{:.3}", v))
                    .collect();
                let _ = writeln!(out, "  {}\t{}", col, values.join(" "));
            }
        }
        let distinctive: Vec<&PairPersistence> = self
            .persistence
            .iter()
            .filter(|p| p.kind == Persistence::Distinctive)
            .collect();
        let _ = writeln!(out, "\nDistinctive pairs:");
        for p in distinctive {
            let _ = writeln!(out, "  {}\t{}", p.pair, p.periods.join(","));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(Box::new(WhitespaceTokenizer), HashSet::new()).unwrap()
    }

    fn options() -> AnalysisOptions {
        AnalysisOptions {
            min_edge_freq: 2,
            vocabulary: VocabularyBand { min: 1, max: 500 },
            ..AnalysisOptions::default()
        }
    }

    fn texts(list: &[&str]) -> Vec<Option<String>> {
        list.iter().map(|t| Some(t.to_string())).collect()
    }

    #[test]
    fn defaults_match_reference_settings() {
        let o = AnalysisOptions::default();
        assert_eq!(o.window, Some(5));
        assert_eq!(o.min_edge_freq, 5);
        assert_eq!(o.vocabulary, VocabularyBand { min: 3, max: 500 });
        assert_eq!((o.per_period_keep, o.fill_from_overall), (1, 4));
        assert!(o.validate().is_ok());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut o = AnalysisOptions::default();
        o.vocabulary = VocabularyBand { min: 10, max: 2 };
        assert!(matches!(o.validate(), Err(AnalysisError::InvalidOption(_))));
        let mut o = AnalysisOptions::default();
        o.period_months = 0;
        assert!(o.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opts.json");
        fs::write(&path, r#"{"window": null, "top_k": 3}"#).unwrap();
        let o = AnalysisOptions::from_json_file(&path).unwrap();
        assert_eq!(o.window, None);
        assert_eq!(o.top_k, 3);
        assert_eq!(o.min_edge_freq, 5);
    }

    #[test]
    fn period_pipeline() {
        let input = PeriodInput::from_texts(
            "p",
            texts(&["電話 詐欺 請求", "電話 詐欺 請求", "訪問 工事", "電話 詐欺 請求"]),
        );
        let classifier = CategoryClassifier::default_channels();
        let a = analyze_period(&input, &normalizer(), &classifier, &options());
        assert_eq!(a.document_count, 4);
        assert_eq!(a.counter.get(&Pair::new("詐欺", "請求").unwrap()), 3);
        assert!(!a.graph.contains("工事"));
        assert_eq!(a.network.len(), 3);
        assert!(a.network.iter().all(|(_, w)| *w == 3));
        assert_eq!(a.summaries.len(), 1);
        assert_eq!(a.summaries[0].label, "電話");
        assert_eq!(a.summaries[0].sets[0].score, 3);
    }

    #[test]
    fn corpus_pipeline() {
        let periods = vec![
            PeriodInput::from_texts("p1", texts(&["解約 返金 電話", "解約 返金", "商品 通販"])),
            PeriodInput::from_texts("p2", texts(&["商品 通販", "商品 通販", "解約 返金"])),
        ];
        let classifier = CategoryClassifier::default_channels();
        let report = analyze_corpus(&periods, &normalizer(), &classifier, &options()).unwrap();
        assert_eq!(report.periods.len(), 2);
        assert_eq!(report.overall.get(&Pair::new("解約", "返金").unwrap()), 3);
        assert_eq!(report.timeseries.denominator, Denominator::DocumentCount);
        assert_eq!(report.timeseries.periods, vec!["p1", "p2"]);
        assert!(report.candidates.iter().all(|p| !p.contains("電話")));
        let text = report.summary();
        assert!(text.contains("Candidate pairs:"));
        assert!(text.contains("解約|返金"));
    }

    #[test]
    fn empty_corpus_is_not_an_error() {
        let classifier = CategoryClassifier::default_channels();
        let report = analyze_corpus(&[], &normalizer(), &classifier, &options()).unwrap();
        assert!(report.periods.is_empty());
        assert!(report.candidates.is_empty());
        assert!(report.timeseries.is_empty());
    }
}
