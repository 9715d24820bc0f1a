use std::collections::BTreeMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::cooccurrence::{CooccurrenceCounter, Pair};

/// Undirected weighted co-occurrence graph of one period.
///
/// Only pairs whose count reached the threshold become edges, so every node
/// has at least one edge. Node lookups go through an ordered name index, and
/// every listing (nodes, neighbours, edges) is sorted by name.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    graph: UnGraph<String, u32>,
    index: BTreeMap<String, NodeIndex>,
}

impl CooccurrenceGraph {
    /// # Example
    /// ```
    /// use cooccur_trends::{count_cooccurrences, CooccurrenceGraph};
    /// let docs = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]; 3];
    /// let counter = count_cooccurrences(&docs, Some(1));
    /// let g = CooccurrenceGraph::from_counter(&counter, 3);
    /// assert_eq!(g.weight("a", "b"), Some(3));
    /// assert_eq!(g.weight("a", "c"), None);
    /// ```
    pub fn from_counter(counter: &CooccurrenceCounter, min_freq: u32) -> Self {
        let mut graph = CooccurrenceGraph::default();
        for (pair, count) in counter.iter().filter(|(_, c)| *c >= min_freq) {
            let a = graph.node(pair.first());
            let b = graph.node(pair.second());
            graph.graph.update_edge(a, b, count);
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, node: &str) -> bool {
        self.index.contains_key(node)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        let (&ia, &ib) = (self.index.get(a)?, self.index.get(b)?);
        self.graph.find_edge(ia, ib).map(|e| self.graph[e])
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.weight(a, b).is_some()
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Neighbours of `node` with the connecting edge weight, ascending by name.
    pub fn neighbors<'a>(&'a self, node: &str) -> impl Iterator<Item = (&'a str, u32)> + use<'a> {
        let mut out: Vec<(&'a str, u32)> = match self.index.get(node) {
            Some(&idx) => self
                .graph
                .edges(idx)
                .map(|e| {
                    let other = if e.source() == idx { e.target() } else { e.source() };
                    (self.graph[other].as_str(), *e.weight())
                })
                .collect(),
            None => Vec::new(),
        };
        out.sort_by(|a, b| a.0.cmp(b.0));
        out.into_iter()
    }

    /// Sum of the weights of all edges touching `node`.
    pub fn strength(&self, node: &str) -> u64 {
        self.neighbors(node).map(|(_, w)| u64::from(w)).sum()
    }

    /// Weight of the heaviest edge touching `node`, 0 when absent.
    pub fn max_neighbor_weight(&self, node: &str) -> u32 {
        self.neighbors(node).map(|(_, w)| w).max().unwrap_or(0)
    }

    /// Each edge once, as a canonical pair, in pair order.
    pub fn edges(&self) -> Vec<(Pair, u32)> {
        let mut out: Vec<(Pair, u32)> = self
            .graph
            .edge_references()
            .filter_map(|e| {
                Pair::new(&self.graph[e.source()], &self.graph[e.target()])
                    .map(|p| (p, *e.weight()))
            })
            .collect();
        out.sort();
        out
    }

    /// The `n` heaviest edges, weight descending then pair ascending.
    pub fn top_edges(&self, n: usize) -> Vec<(Pair, u32)> {
        let mut edges = self.edges();
        edges.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        edges.truncate(n);
        edges
    }
}
