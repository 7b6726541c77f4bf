//! Undirected weighted graph over an arena of vertices
//!
//! Vertices are addressed by small integer indices, the domain value of a
//! vertex lives in a side table, so vertex types need neither `Hash` nor
//! `Eq`.

pub mod dijkstra;
pub mod mst;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

pub use petgraph::graph::{EdgeIndex, NodeIndex};

pub use dijkstra::{ShortestPaths, shortest_paths};
pub use mst::minimum_spanning_forest;

use crate::Error;

/// Undirected graph with finite, non-negative edge weights
#[derive(Debug, Clone)]
pub struct WeightedGraph<V> {
    graph: UnGraph<V, f64>,
}

impl<V> Default for WeightedGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> WeightedGraph<V> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(vertices, edges),
        }
    }

    pub fn add_vertex(&mut self, vertex: V) -> NodeIndex {
        self.graph.add_node(vertex)
    }

    /// Adds an undirected edge, parallel edges are allowed
    ///
    /// # Errors
    ///
    /// Fails if an endpoint is unknown or the weight is negative or not finite.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, weight: f64) -> Result<EdgeIndex, Error> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight(weight));
        }
        for v in [a, b] {
            if !self.contains(v) {
                return Err(Error::UnknownVertex(v.index()));
            }
        }
        Ok(self.graph.add_edge(a, b, weight))
    }

    pub fn contains(&self, vertex: NodeIndex) -> bool {
        vertex.index() < self.graph.node_count()
    }

    pub fn vertex(&self, index: NodeIndex) -> Option<&V> {
        self.graph.node_weight(index)
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Endpoints and weight of an edge
    pub fn edge(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex, f64)> {
        let (a, b) = self.graph.edge_endpoints(index)?;
        Some((a, b, self.graph[index]))
    }

    pub fn vertices(&self) -> impl Iterator<Item = (NodeIndex, &V)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// All edges as `(a, b, weight)` in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, f64)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
    }

    /// Edges incident to `vertex` as `(edge, neighbour, weight)`
    pub fn neighbours(
        &self,
        vertex: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, f64)> + '_ {
        self.graph
            .edges(vertex)
            .map(|e| (e.id(), e.target(), *e.weight()))
    }

    pub fn degree(&self, vertex: NodeIndex) -> usize {
        self.graph.edges(vertex).count()
    }

    /// Sum of all edge weights, `0.0` without edges
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().fold(0.0, |acc, w| acc + w)
    }

    /// Number of connected components, isolated vertices included
    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }

    pub fn is_forest(&self) -> bool {
        !petgraph::algo::is_cyclic_undirected(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_weights_and_vertices() {
        let mut g = WeightedGraph::new();
        let a = g.add_vertex("a");
        let b = g.add_vertex("b");
        assert!(g.add_edge(a, b, 1.5).is_ok());
        assert_eq!(g.add_edge(a, b, -1.0), Err(Error::InvalidWeight(-1.0)));
        assert!(matches!(g.add_edge(a, b, f64::NAN), Err(Error::InvalidWeight(_))));
        assert_eq!(
            g.add_edge(a, NodeIndex::new(5), 1.0),
            Err(Error::UnknownVertex(5))
        );
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn neighbours_see_both_directions() {
        let mut g = WeightedGraph::new();
        let a = g.add_vertex(());
        let b = g.add_vertex(());
        let c = g.add_vertex(());
        g.add_edge(a, b, 1.0).unwrap();
        g.add_edge(c, b, 2.0).unwrap();

        let mut around_b: Vec<_> = g.neighbours(b).map(|(_, n, w)| (n, w)).collect();
        around_b.sort_by_key(|(n, _)| n.index());
        assert_eq!(around_b, vec![(a, 1.0), (c, 2.0)]);
        assert_eq!(g.degree(b), 2);
        assert_eq!(g.total_weight(), 3.0);
        assert_eq!(g.component_count(), 1);
        assert!(g.is_forest());
    }

    #[test]
    fn edgeless_graph_has_positive_zero_weight() {
        let mut g = WeightedGraph::new();
        g.add_vertex(());
        assert_eq!(g.total_weight().to_bits(), 0.0_f64.to_bits());
        assert_eq!(format!("{:.2}", g.total_weight()), "0.00");
    }
}
