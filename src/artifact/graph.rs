//! Dependency graph over the manifest's `[[dependencies]]` entries.
//!
//! Nodes are dependency names, edges point from a dependency to the entries it
//! `requires`. The graph is only used to compute which artifacts are reachable
//! from the project's direct dependencies and to reject cycles.

use anyhow::{Result, anyhow};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of artifact names.
#[derive(Debug, Default)]
pub struct ArtifactGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ArtifactGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact node if it is not present yet.
    pub fn add_artifact(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), index);
        index
    }

    /// Record that `from` requires `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.add_artifact(from);
        let to_idx = self.add_artifact(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Returns an error naming the cycle path if one exists.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|idx| (idx, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Err(anyhow!("Circular dependency detected: {}", cycle.join(" → ")));
            }
        }
        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|idx| *idx == neighbor).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|idx| self.graph[*idx].clone()).collect();
                    cycle.push(self.graph[neighbor].clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Every artifact reachable from `roots`, the roots included.
    ///
    /// Unknown root names are ignored.
    #[must_use]
    pub fn reachable_from<'a>(&self, roots: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        for root in roots {
            if let Some(&idx) = self.node_map.get(root)
                && seen.insert(self.graph[idx].clone())
            {
                queue.push_back(idx);
            }
        }

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors(current) {
                if seen.insert(self.graph[neighbor].clone()) {
                    queue.push_back(neighbor);
                }
            }
        }

        seen
    }

    /// Number of artifacts in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of `requires` edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachable_follows_chain() {
        let mut graph = ArtifactGraph::new();

        // a -> b -> c, d isolated
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_artifact("d");

        let reachable = graph.reachable_from(["a"]);
        assert_eq!(reachable.len(), 3);
        assert!(reachable.contains("c"));
        assert!(!reachable.contains("d"));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = ArtifactGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "b");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let mut graph = ArtifactGraph::new();

        // a -> b -> c -> a
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");

        let error_msg = graph.detect_cycles().unwrap_err().to_string();
        assert!(error_msg.contains("Circular dependency"));
        assert!(error_msg.contains("a → b → c → a"));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut graph = ArtifactGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "c");
        graph.add_dependency("b", "d");
        graph.add_dependency("c", "d");

        assert!(graph.detect_cycles().is_ok());
        assert_eq!(graph.reachable_from(["b", "c"]).len(), 3);
    }
}
