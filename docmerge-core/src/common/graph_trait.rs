//! Shared graph traversal abstraction.
//!
//! Used by the type hierarchy to walk ancestors breadth-first. Traversal is
//! cycle-safe: malformed facts can declare `A : B` and `B : A`, and each
//! node is still visited once.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Trait for graph traversal operations.
///
/// # Example
/// ```ignore
/// impl GraphTraversal for Hierarchy {
///     type Node = String;
///
///     fn neighbors(&self, node: &String) -> Vec<String> {
///         self.bases.get(node).cloned().unwrap_or_default()
///     }
///
///     fn contains_node(&self, node: &String) -> bool {
///         self.types.contains_key(node)
///     }
/// }
///
/// let ancestors = hierarchy.traversal_order(["Acme.Derived".to_string()]);
/// ```
pub trait GraphTraversal {
    /// The type used to identify nodes in the graph.
    type Node: Clone + Eq + Hash;

    /// Returns all neighbors (outgoing edges) of a node, in edge order.
    fn neighbors(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Checks if the graph contains a node.
    fn contains_node(&self, node: &Self::Node) -> bool;

    /// Breadth-first visiting order from the given roots.
    ///
    /// Roots come first, then nodes by increasing distance; within one
    /// distance, edge order is preserved. Roots absent from the graph are
    /// skipped.
    fn traversal_order<I>(&self, roots: I) -> Vec<Self::Node>
    where
        I: IntoIterator<Item = Self::Node>,
    {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        for root in roots {
            if self.contains_node(&root) && visited.insert(root.clone()) {
                queue.push_back(root);
            }
        }

        while let Some(node) = queue.pop_front() {
            for neighbor in self.neighbors(&node) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor);
                }
            }
            order.push(node);
        }

        order
    }

    /// Set of all nodes reachable from any root.
    fn reachable_from<I>(&self, roots: I) -> HashSet<Self::Node>
    where
        I: IntoIterator<Item = Self::Node>,
    {
        self.traversal_order(roots).into_iter().collect()
    }
}
