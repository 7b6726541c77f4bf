//! Steiner tree approximation (metric closure + minimum spanning tree)
//!
//! 1. Dijkstra from every terminal gives the metric closure over the
//!    terminal set.
//! 2. A minimum spanning tree of the closure picks the terminal pairs to
//!    connect.
//! 3. Every closure edge of that tree is expanded back into the original
//!    edges of its shortest path.
//! 4. The expanded subgraph is reduced to a spanning tree again and
//!    non-terminal leaves are pruned.
//!
//! The result weighs at most twice an optimal Steiner tree. Terminals in
//! different components of the input graph produce a forest.

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use log::{debug, info};
use rayon::prelude::*;

use crate::{
    Error,
    graph::{
        EdgeIndex, NodeIndex, ShortestPaths, WeightedGraph, minimum_spanning_forest,
        shortest_paths,
    },
};

/// Approximated Steiner tree, a subgraph of the graph it was computed on
#[derive(Debug, Clone)]
pub struct SteinerTree<V> {
    graph: WeightedGraph<V>,
    /// Index in the source graph for every vertex of `graph`
    origin: Vec<NodeIndex>,
    /// Selected edges of the source graph
    source_edges: Vec<EdgeIndex>,
    terminal_count: usize,
}

impl<V> SteinerTree<V> {
    pub fn graph(&self) -> &WeightedGraph<V> {
        &self.graph
    }

    pub fn total_weight(&self) -> f64 {
        self.graph.total_weight()
    }

    /// Index in the source graph of the given tree vertex
    pub fn source_vertex(&self, vertex: NodeIndex) -> Option<NodeIndex> {
        self.origin.get(vertex.index()).copied()
    }

    /// Source graph indices of all tree vertices, terminals first
    pub fn source_vertices(&self) -> &[NodeIndex] {
        &self.origin
    }

    /// Source graph edges the tree consists of, in ascending order
    pub fn source_edges(&self) -> &[EdgeIndex] {
        &self.source_edges
    }

    /// Tree vertices that are terminals
    pub fn terminals(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.terminal_count).map(NodeIndex::new)
    }

    /// Tree vertices that are not terminals
    pub fn steiner_points(&self) -> impl Iterator<Item = NodeIndex> {
        (self.terminal_count..self.origin.len()).map(NodeIndex::new)
    }
}

/// Approximates a Steiner tree connecting `terminals` in `graph`
///
/// Duplicate terminals are ignored.
///
/// # Errors
///
/// Returns [`Error::NoTerminals`] for an empty terminal list and
/// [`Error::UnknownTerminal`] if a terminal is not a vertex of `graph`.
pub fn approximate<V>(
    graph: &WeightedGraph<V>,
    terminals: &[NodeIndex],
) -> Result<SteinerTree<V>, Error>
where
    V: Clone + Sync,
{
    if terminals.is_empty() {
        return Err(Error::NoTerminals);
    }
    if let Some(unknown) = terminals.iter().find(|t| !graph.contains(**t)) {
        return Err(Error::UnknownTerminal(unknown.index()));
    }

    let mut is_terminal = FixedBitSet::with_capacity(graph.vertex_count());
    let terminals: Vec<NodeIndex> = terminals
        .iter()
        .copied()
        .filter(|t| !is_terminal.put(t.index()))
        .collect();

    if terminals.len() == 1 {
        return build_tree(graph, &terminals, &is_terminal, &[]);
    }

    info!(
        "Approximating Steiner tree for {} terminals on {} vertices and {} edges",
        terminals.len(),
        graph.vertex_count(),
        graph.edge_count()
    );

    let paths = metric_closure(graph, &terminals);
    let mst = closure_tree(&terminals, &paths);
    let expanded = expand(graph, &terminals, &paths, &mst);
    let edges = prune(graph, &is_terminal, expanded);

    let tree = build_tree(graph, &terminals, &is_terminal, &edges)?;
    debug!(
        "Steiner tree with {} vertices ({} Steiner points), {} edges, weight {:.3}",
        tree.graph.vertex_count(),
        tree.steiner_points().count(),
        tree.graph.edge_count(),
        tree.total_weight()
    );
    Ok(tree)
}

/// One shortest path tree per terminal, computed in parallel
fn metric_closure<V: Sync>(graph: &WeightedGraph<V>, terminals: &[NodeIndex]) -> Vec<ShortestPaths> {
    terminals
        .par_iter()
        .map(|&terminal| shortest_paths(graph, terminal))
        .collect()
}

/// Minimum spanning forest of the closure graph as `(i, j)` terminal positions
fn closure_tree(terminals: &[NodeIndex], paths: &[ShortestPaths]) -> Vec<(usize, usize)> {
    let mut closure_edges = Vec::new();
    for i in 0..terminals.len() {
        for j in (i + 1)..terminals.len() {
            // pairs without a path stay unconnected
            if let Some(distance) = paths[i].distance_to(terminals[j]) {
                closure_edges.push((i, j, distance, (i, j)));
            }
        }
    }
    debug!("Metric closure with {} edges", closure_edges.len());
    minimum_spanning_forest(terminals.len(), closure_edges)
}

/// Replaces every closure edge by the original edges of its shortest path
fn expand<V>(
    graph: &WeightedGraph<V>,
    terminals: &[NodeIndex],
    paths: &[ShortestPaths],
    closure_tree: &[(usize, usize)],
) -> Vec<EdgeIndex> {
    let mut used = FixedBitSet::with_capacity(graph.edge_count());
    for &(i, j) in closure_tree {
        if let Some(path) = paths[i].path_to(terminals[j]) {
            for edge in path {
                used.insert(edge.index());
            }
        }
    }
    used.ones().map(EdgeIndex::new).collect()
}

/// Spanning forest of the expanded subgraph without non-terminal leaves
fn prune<V>(
    graph: &WeightedGraph<V>,
    is_terminal: &FixedBitSet,
    expanded: Vec<EdgeIndex>,
) -> Vec<EdgeIndex> {
    // shortest paths of different terminals may close cycles
    let candidates = expanded.into_iter().filter_map(|edge| {
        graph
            .edge(edge)
            .map(|(a, b, weight)| (a.index(), b.index(), weight, edge))
    });
    let mut edges = minimum_spanning_forest(graph.vertex_count(), candidates);
    edges.sort_unstable();

    let mut degree: HashMap<NodeIndex, usize> = HashMap::new();
    let endpoints: Vec<(NodeIndex, NodeIndex)> = edges
        .iter()
        .filter_map(|&e| graph.edge(e).map(|(a, b, _)| (a, b)))
        .collect();
    for &(a, b) in &endpoints {
        *degree.entry(a).or_default() += 1;
        *degree.entry(b).or_default() += 1;
    }

    let mut removed = FixedBitSet::with_capacity(edges.len());
    loop {
        let mut changed = false;
        for (pos, &(a, b)) in endpoints.iter().enumerate() {
            if removed.contains(pos) {
                continue;
            }
            let dangling = [a, b]
                .into_iter()
                .any(|v| degree[&v] == 1 && !is_terminal.contains(v.index()));
            if dangling {
                removed.insert(pos);
                *degree.entry(a).or_default() -= 1;
                *degree.entry(b).or_default() -= 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    edges
        .into_iter()
        .enumerate()
        .filter(|(pos, _)| !removed.contains(*pos))
        .map(|(_, edge)| edge)
        .collect()
}

fn build_tree<V: Clone>(
    graph: &WeightedGraph<V>,
    terminals: &[NodeIndex],
    is_terminal: &FixedBitSet,
    edges: &[EdgeIndex],
) -> Result<SteinerTree<V>, Error> {
    let mut steiner_points: Vec<NodeIndex> = edges
        .iter()
        .filter_map(|&e| graph.edge(e))
        .flat_map(|(a, b, _)| [a, b])
        .filter(|v| !is_terminal.contains(v.index()))
        .collect();
    steiner_points.sort_unstable();
    steiner_points.dedup();

    let origin: Vec<NodeIndex> = terminals.iter().chain(&steiner_points).copied().collect();
    let mut tree = WeightedGraph::with_capacity(origin.len(), edges.len());
    let mut local: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(origin.len());
    for &source in &origin {
        if let Some(vertex) = graph.vertex(source) {
            local.insert(source, tree.add_vertex(vertex.clone()));
        }
    }
    for &edge in edges {
        if let Some((a, b, weight)) = graph.edge(edge) {
            let from = *local.get(&a).ok_or(Error::UnknownVertex(a.index()))?;
            let to = *local.get(&b).ok_or(Error::UnknownVertex(b.index()))?;
            tree.add_edge(from, to, weight)?;
        }
    }

    Ok(SteinerTree {
        graph: tree,
        origin,
        source_edges: edges.to_vec(),
        terminal_count: terminals.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn path_graph() -> (WeightedGraph<char>, Vec<NodeIndex>) {
        let mut g = WeightedGraph::new();
        let v: Vec<_> = ['A', 'B', 'C', 'D'].into_iter().map(|c| g.add_vertex(c)).collect();
        for w in v.windows(2) {
            g.add_edge(w[0], w[1], 1.0).unwrap();
        }
        (g, v)
    }

    #[test]
    fn path_graph_is_kept_whole() {
        let (g, v) = path_graph();
        let tree = approximate(&g, &[v[0], v[3]]).unwrap();
        assert_abs_diff_eq!(tree.total_weight(), 3.0);
        assert_eq!(tree.graph().vertex_count(), 4);
        assert_eq!(tree.graph().edge_count(), 3);
        assert_eq!(tree.steiner_points().count(), 2);

        let mut labels: Vec<char> = tree.graph().vertices().map(|(_, c)| *c).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec!['A', 'B', 'C', 'D']);
    }

    #[test]
    fn single_terminal() {
        let (g, v) = path_graph();
        let tree = approximate(&g, &[v[2]]).unwrap();
        assert_eq!(tree.graph().vertex_count(), 1);
        assert_eq!(tree.graph().edge_count(), 0);
        assert_eq!(tree.graph().vertex(NodeIndex::new(0)), Some(&'C'));
        assert_eq!(tree.source_vertex(NodeIndex::new(0)), Some(v[2]));
        assert!(tree.total_weight().is_sign_positive());
    }

    #[test]
    fn zero_weight_edges_are_kept() {
        let mut g = WeightedGraph::new();
        let a = g.add_vertex('A');
        let b = g.add_vertex('B');
        let c = g.add_vertex('C');
        g.add_edge(a, b, 0.0).unwrap();
        g.add_edge(b, c, 1.0).unwrap();

        let tree = approximate(&g, &[a, c]).unwrap();
        assert_eq!(tree.graph().edge_count(), 2);
        assert_eq!(tree.steiner_points().count(), 1);
        assert_abs_diff_eq!(tree.total_weight(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn duplicate_terminals_collapse() {
        let (g, v) = path_graph();
        let tree = approximate(&g, &[v[1], v[1]]).unwrap();
        assert_eq!(tree.graph().vertex_count(), 1);
        assert_eq!(tree.terminals().count(), 1);
    }

    #[test]
    fn rejects_empty_and_unknown_terminals() {
        let (g, _) = path_graph();
        assert_eq!(approximate(&g, &[]).unwrap_err(), Error::NoTerminals);
        assert_eq!(
            approximate(&g, &[NodeIndex::new(0), NodeIndex::new(9)]).unwrap_err(),
            Error::UnknownTerminal(9)
        );
    }

    #[test]
    fn star_uses_the_hub() {
        // three terminals around a hub, direct links are more expensive
        let mut g = WeightedGraph::new();
        let hub = g.add_vertex("hub");
        let t: Vec<_> = ["a", "b", "c"].into_iter().map(|n| g.add_vertex(n)).collect();
        for &ti in &t {
            g.add_edge(hub, ti, 1.0).unwrap();
        }
        g.add_edge(t[0], t[1], 2.5).unwrap();
        g.add_edge(t[1], t[2], 2.5).unwrap();

        let tree = approximate(&g, &t).unwrap();
        assert_abs_diff_eq!(tree.total_weight(), 3.0);
        assert!(tree.graph().is_forest());
        assert_eq!(tree.steiner_points().count(), 1);
    }

    #[test]
    fn disconnected_terminals_give_a_forest() {
        let mut g = WeightedGraph::new();
        let a = g.add_vertex(0);
        let b = g.add_vertex(1);
        let c = g.add_vertex(2);
        let d = g.add_vertex(3);
        g.add_edge(a, b, 2.0).unwrap();
        g.add_edge(c, d, 4.0).unwrap();

        let tree = approximate(&g, &[a, b, c, d]).unwrap();
        assert_eq!(tree.graph().edge_count(), 2);
        assert_eq!(tree.graph().component_count(), 2);
        assert_abs_diff_eq!(tree.total_weight(), 6.0);

        // a lone unreachable terminal still appears as a vertex
        let e = g.add_vertex(4);
        let tree = approximate(&g, &[a, b, e]).unwrap();
        assert_eq!(tree.graph().vertex_count(), 3);
        assert_eq!(tree.graph().edge_count(), 1);
    }

    #[test]
    fn unused_branches_stay_out() {
        // A - B - C with a dead end B - X that no path needs
        let mut g = WeightedGraph::new();
        let a = g.add_vertex('A');
        let b = g.add_vertex('B');
        let c = g.add_vertex('C');
        let x = g.add_vertex('X');
        let ab = g.add_edge(a, b, 1.0).unwrap();
        let bc = g.add_edge(b, c, 1.0).unwrap();
        g.add_edge(b, x, 0.1).unwrap();

        let tree = approximate(&g, &[a, c]).unwrap();
        assert_eq!(tree.source_edges(), &[ab, bc]);
        assert!(!tree.source_vertices().contains(&x));
    }

    fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize, u32)>, Vec<usize>)> {
        (2usize..12).prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0..n, 0..n, 0u32..20), 0..30),
                prop::collection::vec(0..n, 1..6),
            )
        })
    }

    proptest! {
        #[test]
        fn result_is_a_forest_spanning_the_terminals((n, edges, terminals) in arb_graph()) {
            let mut g = WeightedGraph::new();
            let v: Vec<_> = (0..n).map(|i| g.add_vertex(i)).collect();
            for (a, b, w) in &edges {
                g.add_edge(v[*a], v[*b], f64::from(*w)).unwrap();
            }
            let terminals: Vec<_> = terminals.iter().map(|&t| v[t]).collect();

            let tree = approximate(&g, &terminals).unwrap();
            prop_assert!(tree.graph().is_forest());
            for t in &terminals {
                prop_assert!(tree.source_vertices().contains(t));
            }

            // leaves must be terminals
            for p in tree.steiner_points() {
                prop_assert!(tree.graph().degree(p) >= 2);
            }

            // the tree never weighs more than the closure MST it came from
            let closure_distances: Vec<f64> = {
                let mut seen = FixedBitSet::with_capacity(n);
                let unique: Vec<_> = terminals.iter().copied().filter(|t| !seen.put(t.index())).collect();
                let paths = metric_closure(&g, &unique);
                closure_tree(&unique, &paths)
                    .into_iter()
                    .map(|(i, j)| paths[i].distance_to(unique[j]).unwrap())
                    .collect()
            };
            let closure_weight: f64 = closure_distances.iter().sum();
            prop_assert!(tree.total_weight() <= closure_weight + 1e-9);
        }
    }
}
