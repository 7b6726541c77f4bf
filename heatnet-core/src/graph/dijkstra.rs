use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;

use super::{EdgeIndex, NodeIndex, WeightedGraph};

#[derive(Copy, Clone)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path tree rooted at a single source vertex
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: NodeIndex,
    distances: HashMap<NodeIndex, f64>,
    /// Vertex reached through `(previous vertex, edge)`
    predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
}

impl ShortestPaths {
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    /// Distance from the source, `None` if `target` is unreachable
    pub fn distance_to(&self, target: NodeIndex) -> Option<f64> {
        self.distances.get(&target).copied()
    }

    /// Edges of the shortest path from the source to `target`
    ///
    /// The exact edge is recorded, so parallel edges of different weight
    /// resolve to the one that was used.
    pub fn path_to(&self, target: NodeIndex) -> Option<Vec<EdgeIndex>> {
        if !self.distances.contains_key(&target) {
            return None;
        }
        let mut edges = Vec::new();
        let mut current = target;
        while current != self.source {
            let &(prev, edge) = self.predecessors.get(&current)?;
            edges.push(edge);
            current = prev;
        }
        edges.reverse(); // Now path is from source to target
        Some(edges)
    }

    pub fn reached(&self) -> usize {
        self.distances.len()
    }
}

/// Dijkstra's algorithm from `start` over the whole graph
/// Returns distances and predecessor edges of every reachable vertex
pub fn shortest_paths<V>(graph: &WeightedGraph<V>, start: NodeIndex) -> ShortestPaths {
    let estimated_nodes = graph.vertex_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> =
        HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    if !graph.contains(start) {
        return ShortestPaths {
            source: start,
            distances,
            predecessors,
        };
    }

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for (edge, next, weight) in graph.neighbours(node) {
            let next_cost = cost + weight;

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, (node, edge));
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, (node, edge));
                    }
                }
            }
        }
    }

    ShortestPaths {
        source: start,
        distances,
        predecessors,
    }
}
