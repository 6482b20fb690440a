//! Type hierarchy as a directed graph (derived -> base, derived -> interface).
//!
//! Uses `DiGraphMap<&str, ()>` over keys borrowed from the [`FactIndex`], so
//! building the graph allocates no strings. Outgoing edges keep insertion
//! order: the base type first, then interfaces in declaration order. A
//! breadth-first walk therefore yields ancestors nearest first.

use petgraph::graphmap::DiGraphMap;

use super::fact_index::FactIndex;
use crate::common::GraphTraversal;
use crate::model::TypeKind;

/// Inheritance edges of every indexed type.
#[derive(Debug, Clone)]
pub struct HierarchyGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> HierarchyGraph<'a> {
    /// Build the hierarchy.
    ///
    /// When `universal_base` is set, classes and structs that name no base
    /// type get an implicit edge to it.
    pub fn build(index: &'a FactIndex<'a>, universal_base: Option<&'a str>) -> Self {
        let mut graph = DiGraphMap::new();

        // 1. Nodes
        for ty in index.all_types() {
            graph.add_node(ty.key.as_str());
        }
        if let Some(root) = universal_base {
            graph.add_node(root);
        }

        // 2. Edges, declaration order
        for ty in index.all_types() {
            for base in &ty.bases {
                graph.add_edge(ty.key.as_str(), base.as_str(), ());
            }
            let implicit = ty.fact.base_type.is_none()
                && matches!(ty.fact.kind.type_kind(), Some(TypeKind::Class | TypeKind::Struct));
            if let Some(root) = universal_base.filter(|r| implicit && *r != ty.key) {
                graph.add_edge(ty.key.as_str(), root, ());
            }
        }

        Self { graph }
    }

    /// Ancestors of `key`, nearest first, each listed once.
    pub fn ancestors(&self, key: &'a str) -> Vec<&'a str> {
        let mut order = self.traversal_order(std::iter::once(key));
        if !order.is_empty() {
            order.remove(0);
        }
        order
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl<'a> GraphTraversal for HierarchyGraph<'a> {
    type Node = &'a str;

    fn neighbors(&self, node: &&'a str) -> Vec<&'a str> {
        self.graph.neighbors(*node).collect()
    }

    fn contains_node(&self, node: &&'a str) -> bool {
        self.graph.contains_node(*node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Visibility;
    use crate::facts::{FactKind, ModuleFacts, SymbolFact, TypeRef};

    fn class(name: &str, base: Option<&str>, interfaces: &[&str]) -> SymbolFact {
        let mut fact = SymbolFact::new(FactKind::Class, "Acme", name, Visibility::Public);
        fact.base_type = base.map(|b| TypeRef::new("Acme", b));
        fact.interfaces = interfaces.iter().map(|i| TypeRef::new("Acme", *i)).collect();
        fact
    }

    fn interface(name: &str, bases: &[&str]) -> SymbolFact {
        let mut fact = SymbolFact::new(FactKind::Interface, "Acme", name, Visibility::Public);
        fact.interfaces = bases.iter().map(|i| TypeRef::new("Acme", *i)).collect();
        fact
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let facts = ModuleFacts::new("Core")
            .with(class("Base", None, &[]))
            .with(class("Middle", Some("Base"), &["IShape"]))
            .with(class("Leaf", Some("Middle"), &[]))
            .with(interface("IShape", &[]));
        let index = FactIndex::build(&facts).unwrap();
        let hierarchy = HierarchyGraph::build(&index, None);

        assert_eq!(
            hierarchy.ancestors("Acme.Leaf"),
            vec!["Acme.Middle", "Acme.Base", "Acme.IShape"]
        );
    }

    #[test]
    fn test_universal_base_is_implicit_root() {
        let facts = ModuleFacts::new("Core")
            .with(class("Base", None, &[]))
            .with(class("Leaf", Some("Base"), &[]))
            .with(interface("IShape", &[]));
        let index = FactIndex::build(&facts).unwrap();
        let hierarchy = HierarchyGraph::build(&index, Some("System.Object"));

        assert_eq!(hierarchy.ancestors("Acme.Leaf"), vec!["Acme.Base", "System.Object"]);
        assert!(hierarchy.ancestors("Acme.IShape").is_empty());
    }

    #[test]
    fn test_diamond_interfaces_visited_once() {
        let facts = ModuleFacts::new("Core")
            .with(interface("IRoot", &[]))
            .with(interface("ILeft", &["IRoot"]))
            .with(interface("IRight", &["IRoot"]))
            .with(class("Impl", None, &["ILeft", "IRight"]));
        let index = FactIndex::build(&facts).unwrap();
        let hierarchy = HierarchyGraph::build(&index, None);

        let ancestors = hierarchy.ancestors("Acme.Impl");
        assert_eq!(ancestors, vec!["Acme.ILeft", "Acme.IRight", "Acme.IRoot"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let facts = ModuleFacts::new("Core")
            .with(class("A", Some("B"), &[]))
            .with(class("B", Some("A"), &[]));
        let index = FactIndex::build(&facts).unwrap();
        let hierarchy = HierarchyGraph::build(&index, None);

        assert_eq!(hierarchy.ancestors("Acme.A"), vec!["Acme.B"]);
    }

    #[test]
    fn test_unknown_type_has_no_ancestors() {
        let facts = ModuleFacts::new("Core");
        let index = FactIndex::build(&facts).unwrap();
        let hierarchy = HierarchyGraph::build(&index, None);
        assert!(hierarchy.ancestors("Acme.Missing").is_empty());
        assert_eq!(hierarchy.node_count(), 0);
    }
}
