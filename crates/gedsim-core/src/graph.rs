//! Labeled graphs for GED similarity learning.
//!
//! Graphs here are small, fully materialized, and immutable once built:
//! every node carries a categorical label id and every edge carries a
//! categorical label id. The edge order fixed at construction is the
//! canonical row order for edge feature matrices downstream.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// A directed graph with categorical node and edge labels.
///
/// Backed by petgraph's directed graph; serialized as a flat record of
/// node labels and `(src, dst, label)` edge triples.
///
/// # Example
///
/// ```rust
/// use gedsim_core::LabeledGraph;
///
/// let g = LabeledGraph::new(vec![0, 1, 0], vec![(0, 1, 0), (1, 2, 1)]);
/// assert_eq!(g.node_count(), 3);
/// assert_eq!(g.edge_count(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GraphRecord", into = "GraphRecord")]
pub struct LabeledGraph {
    graph: DiGraph<usize, usize>,
}

/// Flat on-disk representation of a [`LabeledGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Node label ids, indexed by node.
    pub node_labels: Vec<usize>,
    /// Edges as `(src, dst, label)` triples.
    pub edges: Vec<(usize, usize, usize)>,
}

impl From<GraphRecord> for LabeledGraph {
    fn from(record: GraphRecord) -> Self {
        LabeledGraph::new(record.node_labels, record.edges)
    }
}

impl From<LabeledGraph> for GraphRecord {
    fn from(g: LabeledGraph) -> Self {
        GraphRecord {
            node_labels: g.node_labels(),
            edges: g.edge_list(),
        }
    }
}

impl LabeledGraph {
    /// Build a graph from node labels and `(src, dst, label)` edge triples.
    ///
    /// Edge endpoints must be valid node indices; violating that is a
    /// caller contract violation and panics in petgraph.
    pub fn new(node_labels: Vec<usize>, edges: Vec<(usize, usize, usize)>) -> Self {
        let mut graph = DiGraph::with_capacity(node_labels.len(), edges.len());
        for label in node_labels {
            graph.add_node(label);
        }
        for (src, dst, label) in edges {
            graph.add_edge(NodeIndex::new(src), NodeIndex::new(dst), label);
        }
        Self { graph }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node label ids in node order.
    pub fn node_labels(&self) -> Vec<usize> {
        self.graph.node_weights().copied().collect()
    }

    /// Edges as `(src, dst, label)` triples in canonical edge order.
    pub fn edge_list(&self) -> Vec<(usize, usize, usize)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect()
    }

    /// Largest node label id, if any node exists.
    pub fn max_node_label(&self) -> Option<usize> {
        self.graph.node_weights().copied().max()
    }

    /// Largest edge label id, if any edge exists.
    pub fn max_edge_label(&self) -> Option<usize> {
        self.graph.edge_weights().copied().max()
    }
}
