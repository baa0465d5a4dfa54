//! Fill-reducing orderings on the adjacency graph.
//!
//! All orderings are deterministic: ties go to the lowest index.

use std::collections::{BTreeSet, HashMap};

use matdecomp_math::CsrMatrix;
use matdecomp_types::DecompResult;

use crate::graph::AdjacencyGraph;
use crate::method::PermutationMethod;
use crate::permutation::Permutation;
use crate::symbolic::fill_count;

/// Parts at or below this size are not bisected further.
const DISSECTION_LEAF_SIZE: usize = 16;

/// Greedy minimum degree on the elimination graph.
pub fn minimum_degree(graph: &AdjacencyGraph) -> DecompResult<Permutation> {
    let nodes: Vec<usize> = (0..graph.len()).collect();
    Permutation::from_vec(minimum_degree_on(graph, &nodes))
}

/// Minimum degree ordering of the subgraph induced by `nodes`.
///
/// Eliminating a node joins its remaining neighbors into a clique; the next
/// node is the one of smallest current degree.
pub fn minimum_degree_on(graph: &AdjacencyGraph, nodes: &[usize]) -> Vec<usize> {
    let local: HashMap<usize, usize> = nodes.iter().enumerate().map(|(k, &v)| (v, k)).collect();
    let mut adjacency: Vec<BTreeSet<usize>> = nodes
        .iter()
        .map(|&v| {
            graph
                .neighbors(v)
                .iter()
                .filter_map(|nb| local.get(nb).copied())
                .collect()
        })
        .collect();

    // Keyed by (degree, original index) so ties resolve to the lowest index.
    let mut queue: BTreeSet<(usize, usize, usize)> = adjacency
        .iter()
        .enumerate()
        .map(|(k, adj)| (adj.len(), nodes[k], k))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some((_, original, k)) = queue.pop_first() {
        order.push(original);
        let clique: Vec<usize> = std::mem::take(&mut adjacency[k]).into_iter().collect();
        for &u in &clique {
            queue.remove(&(adjacency[u].len(), nodes[u], u));
            adjacency[u].remove(&k);
            for &w in &clique {
                if w != u {
                    adjacency[u].insert(w);
                }
            }
            queue.insert((adjacency[u].len(), nodes[u], u));
        }
    }
    order
}

/// Reverse Cuthill–McKee: breadth-first from a pseudo-peripheral node of
/// each component, neighbors by increasing degree, whole sequence reversed.
pub fn reverse_cuthill_mckee(graph: &AdjacencyGraph) -> DecompResult<Permutation> {
    let n = graph.len();
    let all: Vec<usize> = (0..n).collect();
    let in_subset = vec![true; n];

    let mut order = Vec::with_capacity(n);
    for component in graph.components(&all) {
        let Some(&start) = component.iter().min_by_key(|&&v| (graph.degree(v), v)) else {
            continue;
        };
        let root = graph.pseudo_peripheral_node(start, &in_subset);
        for level in graph.level_structure(root, &in_subset) {
            order.extend(level);
        }
    }
    order.reverse();
    Permutation::from_vec(order)
}

/// Nested dissection by level-structure bisection.
///
/// Each component is split at the middle level of a rooted level structure;
/// both halves are ordered recursively and the separator last. Small or
/// shallow parts fall back to minimum degree.
pub fn nested_dissection(graph: &AdjacencyGraph) -> DecompResult<Permutation> {
    let all: Vec<usize> = (0..graph.len()).collect();
    let mut order = Vec::with_capacity(graph.len());
    dissect(graph, &all, &mut order);
    Permutation::from_vec(order)
}

fn dissect(graph: &AdjacencyGraph, nodes: &[usize], order: &mut Vec<usize>) {
    for component in graph.components(nodes) {
        if component.len() <= DISSECTION_LEAF_SIZE {
            order.extend(minimum_degree_on(graph, &component));
            continue;
        }

        let mut in_subset = vec![false; graph.len()];
        for &v in &component {
            in_subset[v] = true;
        }
        let start = component
            .iter()
            .copied()
            .min_by_key(|&v| (graph.degree(v), v))
            .unwrap_or(component[0]);
        let root = graph.pseudo_peripheral_node(start, &in_subset);
        let levels = graph.level_structure(root, &in_subset);
        if levels.len() < 3 {
            order.extend(minimum_degree_on(graph, &component));
            continue;
        }

        let mid = levels.len() / 2;
        let first: Vec<usize> = levels[..mid].concat();
        let second: Vec<usize> = levels[mid + 1..].concat();
        dissect(graph, &first, order);
        dissect(graph, &second, order);
        order.extend(levels[mid].iter().copied());
    }
}

/// Runs every fill-reducing ordering and keeps the one with the fewest
/// non-zeros in `L`; ties keep the first computed.
pub fn best(matrix: &CsrMatrix, graph: &AdjacencyGraph) -> DecompResult<Permutation> {
    let mut chosen: Option<(usize, PermutationMethod, Permutation)> = None;
    for method in PermutationMethod::FILL_REDUCING {
        let perm = match method {
            PermutationMethod::MinimumDegree => minimum_degree(graph)?,
            PermutationMethod::ReverseCuthillMckee => reverse_cuthill_mckee(graph)?,
            _ => nested_dissection(graph)?,
        };
        let fill = fill_count(matrix, &perm)?;
        tracing::debug!(method = %method, fill, "candidate ordering scored");
        if chosen.as_ref().map_or(true, |(best_fill, _, _)| fill < *best_fill) {
            chosen = Some((fill, method, perm));
        }
    }
    match chosen {
        Some((fill, method, perm)) => {
            tracing::debug!(method = %method, fill, "best ordering selected");
            Ok(perm)
        }
        None => Ok(Permutation::identity(matrix.rows)),
    }
}
