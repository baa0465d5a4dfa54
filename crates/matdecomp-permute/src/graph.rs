//! Undirected adjacency graph of a symmetric sparsity pattern.

use std::collections::VecDeque;

use matdecomp_math::CsrMatrix;

/// Adjacency lists (sorted, no self loops) of the pattern of `A + Aᵗ`.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    adjacency: Vec<Vec<usize>>,
}

impl AdjacencyGraph {
    /// Builds the graph from the stored entries of `matrix`.
    ///
    /// Stored zeros count as edges; the pattern is what matters for fill.
    pub fn from_pattern(matrix: &CsrMatrix) -> Self {
        let n = matrix.rows;
        let mut adjacency = vec![Vec::new(); n];
        for i in 0..n {
            for &j in matrix.row_indices(i) {
                if i != j && j < n {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }
        Self { adjacency }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Breadth-first level structure rooted at `root`, restricted to nodes
    /// with `in_subset[node]`. Neighbors are visited in increasing
    /// (degree, index) order.
    pub fn level_structure(&self, root: usize, in_subset: &[bool]) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.len()];
        let mut levels: Vec<Vec<usize>> = vec![vec![root]];
        visited[root] = true;
        loop {
            let mut next = Vec::new();
            let current = levels.last().map(Vec::as_slice).unwrap_or(&[]);
            for &node in current {
                let mut fresh: Vec<usize> = self
                    .neighbors(node)
                    .iter()
                    .copied()
                    .filter(|&nb| in_subset[nb] && !visited[nb])
                    .collect();
                fresh.sort_by_key(|&nb| (self.degree(nb), nb));
                for nb in fresh {
                    visited[nb] = true;
                    next.push(nb);
                }
            }
            if next.is_empty() {
                return levels;
            }
            levels.push(next);
        }
    }

    /// Finds a pseudo-peripheral node of the component containing `start`
    /// (George–Liu): restart from a minimum-degree node of the last level
    /// while the eccentricity grows.
    pub fn pseudo_peripheral_node(&self, start: usize, in_subset: &[bool]) -> usize {
        let mut root = start;
        let mut levels = self.level_structure(root, in_subset);
        loop {
            let last = levels.last().map(Vec::as_slice).unwrap_or(&[]);
            let Some(&candidate) = last.iter().min_by_key(|&&nb| (self.degree(nb), nb)) else {
                return root;
            };
            let candidate_levels = self.level_structure(candidate, in_subset);
            if candidate_levels.len() <= levels.len() {
                return root;
            }
            root = candidate;
            levels = candidate_levels;
        }
    }

    /// Connected components of the subset, each listed in BFS order from
    /// its lowest index.
    pub fn components(&self, nodes: &[usize]) -> Vec<Vec<usize>> {
        let mut in_subset = vec![false; self.len()];
        for &node in nodes {
            in_subset[node] = true;
        }
        let mut sorted = nodes.to_vec();
        sorted.sort_unstable();

        let mut seen = vec![false; self.len()];
        let mut components = Vec::new();
        let mut queue = VecDeque::new();
        for &start in &sorted {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            queue.push_back(start);
            let mut component = Vec::new();
            while let Some(node) = queue.pop_front() {
                component.push(node);
                for &nb in self.neighbors(node) {
                    if in_subset[nb] && !seen[nb] {
                        seen[nb] = true;
                        queue.push_back(nb);
                    }
                }
            }
            components.push(component);
        }
        components
    }
}
