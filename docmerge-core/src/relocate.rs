//! Extension Relocator: moves receiver-based extension functions from their
//! static holder type onto the type they extend.
//!
//! Moves are planned from a snapshot of the graph and applied afterwards,
//! so the pass never sees its own output. A relocated member lives on a
//! non-holder type (or on a holder only when it extends that holder), which
//! makes a second pass a no-op.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Outcome};
use crate::graph::EntityGraph;
use crate::model::TypeEntity;

/// Relocation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocateOptions {
    /// Synthesize placeholders for extension targets outside the graph
    pub synthesize_placeholders: bool,
}

impl Default for RelocateOptions {
    fn default() -> Self {
        Self {
            synthesize_placeholders: true,
        }
    }
}

/// Counts from one relocation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationStats {
    pub moved: usize,
    pub placeholders_created: usize,
    pub containers_removed: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone)]
struct PlannedMove {
    member_key: String,
    from: String,
    from_namespace: String,
    target: String,
    target_namespace: String,
}

/// Relocate every extension member of every static holder type.
pub fn relocate(graph: EntityGraph, options: &RelocateOptions) -> Outcome<EntityGraph> {
    relocate_with_stats(graph, options).map(|(graph, _)| graph)
}

/// Like [`relocate`], also returning what the pass did.
pub fn relocate_with_stats(
    mut graph: EntityGraph,
    options: &RelocateOptions,
) -> Outcome<(EntityGraph, RelocationStats)> {
    let plan = plan_moves(&graph);
    let module = graph.units().first().map(|u| u.name.clone());
    let mut diagnostics = Diagnostics::new();
    let mut stats = RelocationStats::default();
    let mut drained: HashSet<String> = HashSet::new();

    for mv in plan {
        if !graph.contains_type(&mv.target) {
            if !options.synthesize_placeholders {
                stats.unresolved += 1;
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::UnresolvedExtension,
                    format!("extended type '{}' is not in the graph", mv.target),
                )
                .with_key(&mv.member_key);
                if let Some(module) = &module {
                    diagnostic = diagnostic.with_module(module);
                }
                diagnostics.push(diagnostic);
                continue;
            }
            // The graph's key index is the placeholder registry: one per key.
            graph.insert_type(TypeEntity::placeholder(&mv.target, &mv.target_namespace));
            graph.contribute_namespace(&mv.from_namespace, &mv.target_namespace);
            stats.placeholders_created += 1;
            debug!(key = %mv.target, namespace = %mv.target_namespace, "synthesized placeholder");
        }

        let Some(mut member) = graph.remove_member(&mv.member_key) else {
            continue;
        };
        member.declaring_type_key = mv.target.clone();

        if let Some(existing) = graph.type_mut(&mv.target).and_then(|t| t.member_mut(&member.key)) {
            existing.docs.merge_from(&member.docs);
        } else {
            graph.push_member(&mv.target, member);
        }
        drained.insert(mv.from);
        stats.moved += 1;
    }

    let removed = graph.retain_types(|t| !(drained.contains(&t.key) && t.members.is_empty()));
    stats.containers_removed = removed.len();

    if stats != RelocationStats::default() {
        info!(
            moved = stats.moved,
            placeholders = stats.placeholders_created,
            containers_removed = stats.containers_removed,
            unresolved = stats.unresolved,
            "relocated extension members"
        );
    }

    Outcome::new((graph, stats), diagnostics)
}

/// Snapshot of every move the current graph calls for.
fn plan_moves(graph: &EntityGraph) -> Vec<PlannedMove> {
    let mut plan = Vec::new();
    for ty in graph.types().filter(|t| t.is_extension_holder()) {
        for member in ty.members.iter().filter(|m| m.is_extension) {
            let Some(target) = &member.extended_type_key else {
                continue;
            };
            if *target == ty.key {
                continue;
            }
            let target_namespace = member
                .extended_type_namespace
                .clone()
                .unwrap_or_else(|| namespace_from_key(target).to_string());
            plan.push(PlannedMove {
                member_key: member.key.clone(),
                from: ty.key.clone(),
                from_namespace: ty.namespace.clone(),
                target: target.clone(),
                target_namespace,
            });
        }
    }
    plan
}

/// Best-effort namespace of a bare type key: everything before the last dot.
fn namespace_from_key(key: &str) -> &str {
    key.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Visibility;
    use crate::docs::DocFragments;
    use crate::model::{Member, MemberKind, TypeKind, Unit};

    fn holder(ns: &str, name: &str) -> TypeEntity {
        let key = if ns.is_empty() { name.to_string() } else { format!("{}.{}", ns, name) };
        TypeEntity {
            key: key.clone(),
            name: name.to_string(),
            full_name: key,
            namespace: ns.to_string(),
            kind: TypeKind::Class,
            visibility: Visibility::Public,
            base_type: None,
            interfaces: Vec::new(),
            type_parameters: Vec::new(),
            is_static: true,
            is_external_placeholder: false,
            signature: format!("public static class {}", name),
            docs: DocFragments::default(),
            members: Vec::new(),
        }
    }

    fn regular(ns: &str, name: &str) -> TypeEntity {
        TypeEntity {
            is_static: false,
            ..holder(ns, name)
        }
    }

    fn extension(owner: &str, name: &str, target: &str, target_ns: Option<&str>) -> Member {
        Member {
            key: format!("{}.{}({})", owner, name, target),
            name: name.to_string(),
            kind: MemberKind::Method,
            visibility: Visibility::Public,
            signature: format!("public static void {}", name),
            return_type: None,
            parameters: Vec::new(),
            type_parameters: Vec::new(),
            is_static: true,
            is_inherited: false,
            is_override: false,
            is_virtual: false,
            is_abstract: false,
            declaring_type_key: owner.to_string(),
            overridden_member_key: None,
            is_extension: true,
            extended_type_key: Some(target.to_string()),
            extended_type_namespace: target_ns.map(str::to_string),
            docs: DocFragments::summary(format!("{} docs", name)),
        }
    }

    fn graph_with(types: Vec<TypeEntity>) -> EntityGraph {
        let mut graph = EntityGraph::new();
        let mut unit = Unit::new("Core", None);
        for ty in types {
            unit.contribute(&ty.namespace);
            graph.insert_type(ty);
        }
        graph.add_unit(unit);
        graph
    }

    #[test]
    fn test_unknown_target_gets_placeholder_and_holder_removed() {
        let mut h = holder("Acme", "Helpers");
        h.members.push(extension("Acme.Helpers", "Helper", "ExternalType", Some("")));
        let graph = graph_with(vec![h]);

        let outcome = relocate(graph, &RelocateOptions::default());
        assert!(outcome.diagnostics.is_empty());
        let graph = outcome.value;

        let placeholder = graph.type_by_key("ExternalType").unwrap();
        assert!(placeholder.is_external_placeholder);
        assert_eq!(placeholder.members.len(), 1);
        let helper = &placeholder.members[0];
        assert!(helper.is_extension);
        assert_eq!(helper.declaring_type_key, "ExternalType");
        assert_eq!(helper.docs.summary.as_deref(), Some("Helper docs"));
        assert!(!graph.contains_type("Acme.Helpers"));
        assert!(graph.unit("Core").unwrap().namespaces.contains(&String::new()));
    }

    #[test]
    fn test_existing_target_receives_member() {
        let mut h = holder("Acme", "WidgetExtensions");
        h.members.push(extension("Acme.WidgetExtensions", "Shine", "Acme.Widget", Some("Acme")));
        let graph = graph_with(vec![regular("Acme", "Widget"), h]);

        let graph = relocate(graph, &RelocateOptions::default()).value;
        let widget = graph.type_by_key("Acme.Widget").unwrap();
        assert_eq!(widget.members.len(), 1);
        assert!(!widget.is_external_placeholder);
        assert_eq!(graph.placeholders().count(), 0);
        assert_eq!(
            graph.owner_of_member("Acme.WidgetExtensions.Shine(Acme.Widget)"),
            Some("Acme.Widget")
        );
    }

    #[test]
    fn test_one_placeholder_per_key() {
        let mut a = holder("Acme", "A");
        a.members.push(extension("Acme.A", "One", "Vendor.Node", Some("Vendor")));
        let mut b = holder("Acme", "B");
        b.members.push(extension("Acme.B", "Two", "Vendor.Node", Some("Vendor")));
        let graph = graph_with(vec![a, b]);

        let outcome = relocate_with_stats(graph, &RelocateOptions::default());
        let (graph, stats) = outcome.value;
        assert_eq!(stats.placeholders_created, 1);
        assert_eq!(stats.containers_removed, 2);
        assert_eq!(graph.placeholders().count(), 1);
        assert_eq!(graph.type_by_key("Vendor.Node").unwrap().members.len(), 2);
        assert_eq!(graph.type_by_key("Vendor.Node").unwrap().namespace, "Vendor");
    }

    #[test]
    fn test_relocation_is_idempotent() {
        let mut h = holder("Acme", "Helpers");
        h.members.push(extension("Acme.Helpers", "Helper", "ExternalType", None));
        h.members.push(extension("Acme.Helpers", "Own", "Acme.Helpers", Some("Acme")));
        let graph = graph_with(vec![h]);

        let once = relocate(graph, &RelocateOptions::default()).value;
        let (twice, stats) = relocate_with_stats(once.clone(), &RelocateOptions::default()).value;
        assert_eq!(stats, RelocationStats::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_self_extension_stays() {
        let mut h = holder("Acme", "Helpers");
        h.members.push(extension("Acme.Helpers", "Own", "Acme.Helpers", Some("Acme")));
        let graph = graph_with(vec![h]);

        let graph = relocate(graph, &RelocateOptions::default()).value;
        assert_eq!(graph.type_by_key("Acme.Helpers").unwrap().members.len(), 1);
    }

    #[test]
    fn test_partially_drained_holder_kept() {
        let mut h = holder("Acme", "Helpers");
        h.members.push(extension("Acme.Helpers", "Helper", "Vendor.Node", Some("Vendor")));
        let mut plain = extension("Acme.Helpers", "Util", "unused", None);
        plain.is_extension = false;
        plain.extended_type_key = None;
        h.members.push(plain);
        let graph = graph_with(vec![h]);

        let graph = relocate(graph, &RelocateOptions::default()).value;
        let remaining = graph.type_by_key("Acme.Helpers").unwrap();
        assert_eq!(remaining.members.len(), 1);
        assert_eq!(remaining.members[0].name, "Util");
    }

    #[test]
    fn test_without_synthesis_member_stays_with_diagnostic() {
        let mut h = holder("Acme", "Helpers");
        h.members.push(extension("Acme.Helpers", "Helper", "ExternalType", None));
        let graph = graph_with(vec![h]);

        let options = RelocateOptions {
            synthesize_placeholders: false,
        };
        let outcome = relocate(graph, &options);
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::UnresolvedExtension), 1);
        let unresolved = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(unresolved.module.as_deref(), Some("Core"));
        assert_eq!(
            unresolved.key.as_deref(),
            Some("Acme.Helpers.Helper(ExternalType)")
        );
        assert!(outcome.value.contains_type("Acme.Helpers"));
        assert!(!outcome.value.contains_type("ExternalType"));
    }

    #[test]
    fn test_non_static_types_left_alone() {
        let mut ty = regular("Acme", "Widget");
        ty.members.push(extension("Acme.Widget", "Odd", "Vendor.Node", Some("Vendor")));
        let graph = graph_with(vec![ty]);

        let graph = relocate(graph, &RelocateOptions::default()).value;
        assert_eq!(graph.type_by_key("Acme.Widget").unwrap().members.len(), 1);
        assert_eq!(graph.placeholders().count(), 0);
    }

    #[test]
    fn test_namespace_from_key() {
        assert_eq!(namespace_from_key("Vendor.Json.Node"), "Vendor.Json");
        assert_eq!(namespace_from_key("Node"), "");
    }
}
