use std::fmt::Debug;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

/// A directed graph over arbitrary hashable, cloneable vertices.
///
/// Used both for local-stemma acyclicity checking (vertices are reading
/// labels, edges point parent -> child) and for the textual-flow diagram
/// (vertices are witnesses, edges point ancestor -> descendant).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiGraph<T>
where
    T: Hash + Eq + Clone + Debug,
{
    pub adj_map: HashMap<T, HashSet<T>>,
}

impl<T> Default for DiGraph<T>
where
    T: Hash + Eq + Clone + Debug,
{
    fn default() -> Self {
        Self {
            adj_map: HashMap::default(),
        }
    }
}

impl<T> DiGraph<T>
where
    T: Hash + Eq + Clone + Debug,
{
    pub fn add_edge(&mut self, source: T, target: T) {
        self.adj_map
            .entry(source)
            .or_default()
            .insert(target.clone());
        self.adj_map.entry(target).or_default();
    }

    pub fn add_vertex(&mut self, source: T) {
        self.adj_map.entry(source).or_default();
    }

    /// Detects if the graph contains a cycle using Kahn's algorithm.
    /// Time complexity: O(V+E)
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_none()
    }

    /// Returns a valid topological ordering of vertices if the graph is
    /// acyclic, or `None` if the graph contains a cycle. A local stemma
    /// failing this check is an invariant violation, not a recoverable one.
    #[must_use]
    pub fn topological_sort(&self) -> Option<Vec<T>> {
        let mut in_degree: HashMap<T, usize> = HashMap::new();

        for vertex in self.adj_map.keys() {
            in_degree.entry(vertex.clone()).or_insert(0);
        }

        for neighbors in self.adj_map.values() {
            for neighbor in neighbors {
                *in_degree.entry(neighbor.clone()).or_insert(0) += 1;
            }
        }

        let mut queue: Vec<T> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(vertex, _)| vertex.clone())
            .collect();

        let mut result = Vec::new();

        while let Some(vertex) = queue.pop() {
            result.push(vertex.clone());

            if let Some(neighbors) = self.adj_map.get(&vertex) {
                for neighbor in neighbors {
                    if let Some(degree) = in_degree.get_mut(neighbor) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push(neighbor.clone());
                        }
                    }
                }
            }
        }

        if result.len() == self.adj_map.len() {
            Some(result)
        } else {
            None
        }
    }

    /// Returns an edge `(a, b)` that participates in a cycle, or `None` if
    /// acyclic, for pinpointing which reading in a malformed local stemma is
    /// at fault.
    #[must_use]
    pub fn find_cycle_edge(&self) -> Option<(T, T)> {
        let mut in_degree: HashMap<T, usize> = HashMap::new();

        for vertex in self.adj_map.keys() {
            in_degree.entry(vertex.clone()).or_insert(0);
        }
        for neighbors in self.adj_map.values() {
            for neighbor in neighbors {
                *in_degree.entry(neighbor.clone()).or_insert(0) += 1;
            }
        }

        let mut queue: Vec<T> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(v, _)| v.clone())
            .collect();

        let mut removed: HashSet<T> = HashSet::new();

        while let Some(vertex) = queue.pop() {
            removed.insert(vertex.clone());
            if let Some(neighbors) = self.adj_map.get(&vertex) {
                for neighbor in neighbors {
                    if let Some(deg) = in_degree.get_mut(neighbor) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push(neighbor.clone());
                        }
                    }
                }
            }
        }

        for (src, neighbors) in &self.adj_map {
            if removed.contains(src) {
                continue;
            }
            for dst in neighbors {
                if !removed.contains(dst) {
                    return Some((src.clone(), dst.clone()));
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acyclic_local_stemma_has_a_topological_order() {
        let mut graph: DiGraph<&str> = DiGraph::default();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("a", "c");

        assert!(!graph.has_cycle());
        let order = graph.topological_sort().unwrap();
        let pos = |v| order.iter().position(|&x| x == v).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn self_referential_reading_is_a_cycle() {
        let mut graph: DiGraph<&str> = DiGraph::default();
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");

        assert!(graph.has_cycle());
        assert!(graph.find_cycle_edge().is_some());
    }

    #[test]
    fn empty_graph_is_trivially_acyclic() {
        let graph: DiGraph<&str> = DiGraph::default();
        assert_eq!(graph.topological_sort(), Some(Vec::new()));
    }
}
