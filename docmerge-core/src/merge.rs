//! Graph Merger: folds per-module graphs into one documentation set.
//!
//! Graphs are folded in input order. An entity whose key is new is inserted
//! with its whole subtree; an entity whose key exists has its documentation
//! merged field by field (first writer wins) and its members merged by the
//! same rule. Disagreements on non-mergeable properties are recorded as
//! `MergeConflict` diagnostics and the first value is kept.

use std::fmt;
use std::ops::Deref;

use serde::Serialize;
use tracing::info;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Outcome};
use crate::graph::EntityGraph;
use crate::model::{Member, TypeEntity, Unit};

/// A graph that has been through the merger.
///
/// The overlay stage only accepts this type, so it can never run on a
/// per-module graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedGraph(EntityGraph);

impl MergedGraph {
    pub fn graph(&self) -> &EntityGraph {
        &self.0
    }

    pub fn into_inner(self) -> EntityGraph {
        self.0
    }

    pub(crate) fn graph_mut(&mut self) -> &mut EntityGraph {
        &mut self.0
    }
}

impl Deref for MergedGraph {
    type Target = EntityGraph;

    fn deref(&self) -> &EntityGraph {
        &self.0
    }
}

/// Accumulating merge state. Single writer: graphs are added one at a time.
#[derive(Debug, Default)]
pub struct GraphMerger {
    result: EntityGraph,
    diagnostics: Diagnostics,
    sources: usize,
}

impl GraphMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one graph into the result.
    pub fn add(&mut self, graph: EntityGraph) {
        self.sources += 1;
        let source = graph.units().first().map(|u| u.name.clone());
        let (units, namespaces) = graph.into_parts();

        for unit in units {
            self.merge_unit(unit);
        }

        for ns in namespaces {
            self.result.ensure_namespace(&ns.name).docs.merge_from(&ns.docs);
            for ty in ns.types {
                if self.result.contains_type(&ty.key) {
                    self.merge_type(ty, source.as_deref());
                } else {
                    self.result.insert_type(ty);
                }
            }
        }
    }

    /// Number of graphs folded so far.
    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn finish(self) -> Outcome<MergedGraph> {
        let stats = self.result.stats();
        info!(
            sources = self.sources,
            types = stats.types,
            members = stats.members,
            placeholders = stats.placeholders,
            conflicts = self.diagnostics.count(DiagnosticKind::MergeConflict),
            "merged entity graphs"
        );
        Outcome::new(MergedGraph(self.result), self.diagnostics)
    }

    fn merge_unit(&mut self, unit: Unit) {
        match self.result.unit_mut(&unit.name) {
            Some(existing) => {
                if existing.version.is_none() {
                    existing.version = unit.version;
                }
                for ns in &unit.namespaces {
                    existing.contribute(ns);
                }
            }
            None => self.result.add_unit(unit),
        }
    }

    fn merge_type(&mut self, incoming: TypeEntity, source: Option<&str>) {
        let key = incoming.key.clone();
        let mut conflicts = Vec::new();
        let Some(existing) = self.result.type_mut(&key) else {
            return;
        };

        if existing.is_external_placeholder && !incoming.is_external_placeholder {
            // A real declaration replaces the placeholder's minimal identity.
            if existing.namespace != incoming.namespace {
                conflicts.push(conflict(&key, "namespace", &existing.namespace, &incoming.namespace));
            }
            existing.name = incoming.name;
            existing.full_name = incoming.full_name;
            existing.kind = incoming.kind;
            existing.visibility = incoming.visibility;
            existing.base_type = incoming.base_type;
            existing.interfaces = incoming.interfaces;
            existing.type_parameters = incoming.type_parameters;
            existing.is_static = incoming.is_static;
            existing.signature = incoming.signature;
            existing.is_external_placeholder = false;
        } else if !existing.is_external_placeholder && !incoming.is_external_placeholder {
            if existing.kind != incoming.kind {
                conflicts.push(conflict(&key, "kind", existing.kind.as_str(), incoming.kind.as_str()));
            }
            if existing.visibility != incoming.visibility {
                conflicts.push(conflict(&key, "visibility", existing.visibility, incoming.visibility));
            }
            if existing.base_type != incoming.base_type {
                conflicts.push(conflict(
                    &key,
                    "base type",
                    existing.base_type.as_deref().unwrap_or("none"),
                    incoming.base_type.as_deref().unwrap_or("none"),
                ));
            }
            if existing.signature != incoming.signature {
                conflicts.push(conflict(&key, "signature", &existing.signature, &incoming.signature));
            }
        }

        existing.docs.merge_from(&incoming.docs);

        for member in incoming.members {
            match existing.member_mut(&member.key) {
                Some(current) => merge_member(current, member, &mut conflicts),
                None => existing.members.push(member),
            }
        }

        self.result.refresh_type(&key);
        for (key, message) in conflicts {
            let mut diagnostic = Diagnostic::new(DiagnosticKind::MergeConflict, message).with_key(key);
            if let Some(source) = source {
                diagnostic = diagnostic.with_module(source);
            }
            self.diagnostics.push(diagnostic);
        }
    }
}

fn merge_member(existing: &mut Member, incoming: Member, conflicts: &mut Vec<(String, String)>) {
    let key = existing.key.clone();
    if existing.kind != incoming.kind {
        conflicts.push(conflict(&key, "kind", existing.kind.as_str(), incoming.kind.as_str()));
    }
    if existing.visibility != incoming.visibility {
        conflicts.push(conflict(&key, "visibility", existing.visibility, incoming.visibility));
    }
    if existing.signature != incoming.signature {
        conflicts.push(conflict(&key, "signature", &existing.signature, &incoming.signature));
    }
    if existing.declaring_type_key != incoming.declaring_type_key {
        conflicts.push(conflict(
            &key,
            "declaring type",
            &existing.declaring_type_key,
            &incoming.declaring_type_key,
        ));
    }
    if flags(existing) != flags(&incoming) {
        conflicts.push(conflict(&key, "modifiers", flag_names(existing), flag_names(&incoming)));
    }

    existing.docs.merge_from(&incoming.docs);

    for param in incoming.parameters {
        match existing.parameters.iter_mut().find(|p| p.key == param.key) {
            Some(current) => {
                current.docs.merge_from(&param.docs);
            }
            None => conflicts.push((
                param.key.clone(),
                format!("parameter '{}' does not match any existing parameter", param.name),
            )),
        }
    }
}

fn flags(m: &Member) -> [bool; 6] {
    [
        m.is_static,
        m.is_inherited,
        m.is_override,
        m.is_virtual,
        m.is_abstract,
        m.is_extension,
    ]
}

fn flag_names(m: &Member) -> String {
    const NAMES: [&str; 6] = ["static", "inherited", "override", "virtual", "abstract", "extension"];
    let set: Vec<&str> = NAMES
        .iter()
        .zip(flags(m))
        .filter(|(_, on)| *on)
        .map(|(name, _)| *name)
        .collect();
    if set.is_empty() {
        "none".to_string()
    } else {
        set.join("+")
    }
}

fn conflict(key: &str, field: &str, kept: impl fmt::Display, dropped: impl fmt::Display) -> (String, String) {
    (
        key.to_string(),
        format!("{} differs: kept '{}', ignored '{}'", field, kept, dropped),
    )
}

/// Merge graphs in the given order.
pub fn merge<I>(graphs: I) -> Outcome<MergedGraph>
where
    I: IntoIterator<Item = EntityGraph>,
{
    let mut merger = GraphMerger::new();
    for graph in graphs {
        merger.add(graph);
    }
    merger.finish()
}
