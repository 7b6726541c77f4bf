use petgraph::unionfind::UnionFind;

/// Kruskal's algorithm over `vertex_count` vertices labelled `0..vertex_count`
///
/// Takes `(a, b, weight, payload)` candidates and returns the payloads of
/// the accepted edges. Disconnected input yields a spanning forest. Equal
/// weights keep their input order.
pub fn minimum_spanning_forest<E>(
    vertex_count: usize,
    edges: impl IntoIterator<Item = (usize, usize, f64, E)>,
) -> Vec<E> {
    let mut candidates: Vec<(usize, usize, f64, E)> = edges.into_iter().collect();
    // stable sort, ties keep their order
    candidates.sort_by(|x, y| x.2.total_cmp(&y.2));

    let mut uf = UnionFind::<usize>::new(vertex_count);
    let mut accepted = Vec::with_capacity(vertex_count.saturating_sub(1));

    for (a, b, _, payload) in candidates {
        if uf.union(a, b) {
            accepted.push(payload);
            if accepted.len() + 1 == vertex_count {
                break; // spanning tree complete
            }
        }
    }

    accepted
}
