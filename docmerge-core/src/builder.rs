//! Entity Graph Builder: one module's facts in, one per-module graph out.
//!
//! # Pipeline
//!
//! ```text
//! ModuleFacts ──► FactIndex ──► visibility filter ──► TypeEntity
//!                     │                                   │
//!                     └── InheritanceResolver ──► Member ─┘
//!                                                         │
//! InlineDocs ──► markup::extract ──► DocFragments ────────┘
//! ```
//!
//! Per-element problems (unnamed facts, malformed markup) are recorded as
//! `Fact` diagnostics and the element degrades. A broken container chain
//! fails the whole module with a structural error.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::common::{member_key, parameter_key, type_name_from_key, QualifiedPathBuilder};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Outcome};
use crate::docs::{self, DocFragments, ParsedDocs};
use crate::error::DocmergeResult;
use crate::facts::{InlineDocs, ModuleFacts, SymbolFact, TypeRef};
use crate::graph::EntityGraph;
use crate::inheritance::{FactIndex, IndexedType, InheritanceResolver, ResolveOptions, ResolvedMember};
use crate::model::{Member, Parameter, TypeEntity, TypeKind, Unit};

/// Build the graph of one module.
pub fn build_graph(
    facts: &ModuleFacts,
    inline_docs: &InlineDocs,
    options: &ResolveOptions,
) -> DocmergeResult<Outcome<EntityGraph>> {
    build_graph_with_references(facts, &[], inline_docs, options)
}

/// Build the graph of one module, letting its types inherit from types
/// declared in read-only reference modules.
pub fn build_graph_with_references(
    facts: &ModuleFacts,
    references: &[ModuleFacts],
    inline_docs: &InlineDocs,
    options: &ResolveOptions,
) -> DocmergeResult<Outcome<EntityGraph>> {
    let index = FactIndex::build(facts)?.with_references(references);
    let resolver = InheritanceResolver::new(&index, options);
    let mut builder = GraphBuilder::new(facts, inline_docs, options);

    for key in index.duplicates() {
        builder.fact_diagnostic(key, "duplicate type declaration ignored");
    }

    for ty in index.module_types() {
        if !builder.is_visible(&index, ty.fact) {
            debug!(module = %facts.module, key = %ty.key, "filtered by visibility");
            continue;
        }
        let members = resolver.resolve(&ty.key);
        builder.add_type(ty, members);
    }

    builder.add_declaring_types(&index);
    builder.apply_namespace_docs();
    let outcome = builder.finish();

    let stats = outcome.value.stats();
    info!(
        module = %facts.module,
        types = stats.types,
        members = stats.members,
        diagnostics = outcome.diagnostics.len(),
        "built entity graph"
    );
    Ok(outcome)
}

struct GraphBuilder<'a> {
    module: &'a str,
    inline_docs: &'a InlineDocs,
    options: &'a ResolveOptions,
    graph: EntityGraph,
    unit: Unit,
    diagnostics: Diagnostics,
    /// Extracted docs by source key; inherited copies share one extraction
    parsed: HashMap<String, Option<ParsedDocs>>,
}

impl<'a> GraphBuilder<'a> {
    fn new(facts: &'a ModuleFacts, inline_docs: &'a InlineDocs, options: &'a ResolveOptions) -> Self {
        Self {
            module: &facts.module,
            inline_docs,
            options,
            graph: EntityGraph::new(),
            unit: Unit::new(facts.module.clone(), facts.version.clone()),
            diagnostics: Diagnostics::new(),
            parsed: HashMap::new(),
        }
    }

    /// A type is visible when it and every enclosing type pass the filter.
    fn is_visible(&self, index: &FactIndex<'_>, fact: &SymbolFact) -> bool {
        if !self.options.filter.allows(fact.visibility) {
            return false;
        }
        match fact.container_key() {
            Some(container) => index
                .get(&container)
                .map(|outer| self.is_visible(index, outer.fact))
                .unwrap_or(false),
            None => true,
        }
    }

    fn add_type(&mut self, ty: &IndexedType<'_>, resolved: Vec<ResolvedMember<'_>>) {
        let fact = ty.fact;
        let Some(kind) = fact.kind.type_kind() else {
            return;
        };
        if fact.name.trim().is_empty() {
            self.fact_diagnostic(&ty.key, "type fact has no name");
            return;
        }

        let docs = self
            .parsed_docs(&ty.key, fact.docs.as_deref())
            .map(|p| p.fragments)
            .unwrap_or_default();

        let mut members = Vec::with_capacity(resolved.len());
        for entry in resolved {
            if let Some(member) = self.build_member(&ty.key, entry) {
                members.push(member);
            }
        }

        self.insert_entity(ty, kind, docs, members);
    }

    /// Bring in every type that declares an inherited member but is not in
    /// the graph yet: a type of a sibling or reference module, or one of this
    /// module's types dropped by the visibility filter.
    ///
    /// The copy carries the type's own identity and docs but no members.
    /// Markup problems of another module's type are that module's to report.
    fn add_declaring_types(&mut self, index: &FactIndex<'_>) {
        let missing: Vec<String> = self
            .graph
            .types()
            .flat_map(|t| t.members.iter())
            .filter(|m| m.is_inherited && !self.graph.contains_type(&m.declaring_type_key))
            .map(|m| m.declaring_type_key.clone())
            .collect();

        for key in missing {
            if self.graph.contains_type(&key) {
                continue;
            }
            let Some(ty) = index.get(&key) else {
                continue;
            };
            let Some(kind) = ty.fact.kind.type_kind() else {
                continue;
            };
            let parsed = if ty.module == self.module {
                self.parsed_docs(&key, ty.fact.docs.as_deref())
            } else {
                ty.fact.docs.as_deref().and_then(|markup| docs::extract(markup).ok())
            };
            let docs = parsed.map(|p| p.fragments).unwrap_or_default();

            debug!(module = %self.module, key = %key, from = %ty.module, "added declaring type");
            self.insert_entity(ty, kind, docs, Vec::new());
        }
    }

    fn insert_entity(
        &mut self,
        ty: &IndexedType<'_>,
        kind: TypeKind,
        docs: DocFragments,
        members: Vec<Member>,
    ) {
        let fact = ty.fact;
        let entity = TypeEntity {
            key: ty.key.clone(),
            name: type_name_from_key(&ty.key, &fact.namespace).to_string(),
            full_name: ty.key.clone(),
            namespace: fact.namespace.clone(),
            kind,
            visibility: fact.visibility,
            base_type: fact.base_type.as_ref().map(TypeRef::key),
            interfaces: fact.interfaces.iter().map(TypeRef::key).collect(),
            type_parameters: fact.type_parameters.clone(),
            is_static: fact.modifiers.is_static,
            is_external_placeholder: false,
            signature: fact.display_signature(),
            docs,
            members,
        };

        self.unit.contribute(&fact.namespace);
        self.graph.insert_type(entity);
    }

    fn build_member(&mut self, owner_key: &str, entry: ResolvedMember<'_>) -> Option<Member> {
        let fact = entry.fact;
        let kind = fact.kind.member_kind()?;
        let key = member_key(owner_key, &entry.local_key);
        if fact.name.trim().is_empty() {
            self.fact_diagnostic(&key, "member fact has no name");
            return None;
        }

        let (docs, param_docs) = match self.parsed_docs(&entry.source_key(), fact.docs.as_deref()) {
            Some(parsed) => (parsed.fragments, parsed.params),
            None => (DocFragments::default(), HashMap::new()),
        };

        let mut parameters = Vec::with_capacity(fact.parameters.len());
        for (ordinal, param) in fact.parameters.iter().enumerate() {
            let param_key = parameter_key(&key, &param.name);
            if param.type_name.trim().is_empty() && !entry.is_inherited {
                self.fact_diagnostic(&param_key, "parameter has no type name");
            }
            parameters.push(Parameter {
                key: param_key,
                name: param.name.clone(),
                type_name: param.type_name.clone(),
                ordinal,
                has_default: param.has_default,
                modifier: param.modifier,
                docs: param_docs
                    .get(&param.name)
                    .map(DocFragments::summary)
                    .unwrap_or_default(),
            });
        }

        let receiver = fact.extension_receiver.as_ref();
        Some(Member {
            key,
            name: fact.name.clone(),
            kind,
            visibility: fact.visibility,
            signature: fact.display_signature(),
            return_type: fact.return_type.clone(),
            parameters,
            type_parameters: fact.type_parameters.clone(),
            is_static: fact.modifiers.is_static,
            is_inherited: entry.is_inherited,
            is_override: entry.is_override,
            is_virtual: fact.modifiers.is_virtual,
            is_abstract: fact.modifiers.is_abstract,
            declaring_type_key: entry.declaring_type_key.to_string(),
            overridden_member_key: entry.overridden_member_key,
            is_extension: receiver.is_some(),
            extended_type_key: receiver.map(TypeRef::key),
            extended_type_namespace: receiver.map(|r| r.namespace.clone()),
            docs,
        })
    }

    /// Extract the markup for `key`, once per key.
    fn parsed_docs(&mut self, key: &str, fallback: Option<&str>) -> Option<ParsedDocs> {
        if let Some(cached) = self.parsed.get(key) {
            return cached.clone();
        }
        let markup = self.inline_docs.entity(key).or(fallback);
        let parsed = match markup.map(docs::extract) {
            None => None,
            Some(Ok(parsed)) => Some(parsed),
            Some(Err(e)) => {
                self.fact_diagnostic(key, e.to_string());
                None
            }
        };
        self.parsed.insert(key.to_string(), parsed.clone());
        parsed
    }

    fn apply_namespace_docs(&mut self) {
        for name in self.unit.namespaces.clone() {
            let Some(markup) = self.inline_docs.namespace(&name) else {
                continue;
            };
            match docs::extract(markup) {
                Ok(parsed) => {
                    if let Some(ns) = self.graph.namespace_mut(&name) {
                        ns.docs = parsed.fragments;
                    }
                }
                Err(e) => self.fact_diagnostic(&name, e.to_string()),
            }
        }
    }

    fn fact_diagnostic(&mut self, key: &str, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::new(DiagnosticKind::Fact, message)
                .with_module(self.module)
                .with_key(key),
        );
    }

    fn finish(mut self) -> Outcome<EntityGraph> {
        self.graph.add_unit(self.unit);
        Outcome::new(self.graph, self.diagnostics)
    }
}
