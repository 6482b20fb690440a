//! Effective member set of a type: declared members plus visible inherited
//! ones, with override detection.
//!
//! Ancestors are walked nearest first. For each local signature the first
//! occurrence wins, so a derived declaration always hides the base version
//! and is flagged as an override of it.

use std::collections::HashMap;

use super::fact_index::{FactIndex, IndexedType};
use super::hierarchy::HierarchyGraph;
use crate::common::{member_key, VisibilityFilter};
use crate::facts::{FactKind, SymbolFact};

/// Default implicit root of every class hierarchy.
pub const DEFAULT_UNIVERSAL_BASE: &str = "System.Object";

/// Knobs for member resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub filter: VisibilityFilter,
    /// Whether members of the universal base type are inherited
    pub include_universal_base_members: bool,
    pub universal_base_type: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            filter: VisibilityFilter::default(),
            include_universal_base_members: true,
            universal_base_type: DEFAULT_UNIVERSAL_BASE.to_string(),
        }
    }
}

/// One entry of a type's effective member set.
#[derive(Debug, Clone)]
pub struct ResolvedMember<'a> {
    pub fact: &'a SymbolFact,
    /// Owner-independent signature, shared by a member and its overrides
    pub local_key: String,
    pub declaring_type_key: &'a str,
    pub is_inherited: bool,
    pub is_override: bool,
    pub overridden_member_key: Option<String>,
}

impl ResolvedMember<'_> {
    /// Key of the source fact (the declaring type's own member key).
    pub fn source_key(&self) -> String {
        member_key(self.declaring_type_key, &self.local_key)
    }
}

/// Resolves effective member sets against one fact index.
pub struct InheritanceResolver<'a> {
    index: &'a FactIndex<'a>,
    hierarchy: HierarchyGraph<'a>,
    options: &'a ResolveOptions,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(index: &'a FactIndex<'a>, options: &'a ResolveOptions) -> Self {
        // The implicit edge is always added so explicit chains and implicit
        // ones walk the same way; inclusion is decided per ancestor.
        let universal = Some(options.universal_base_type.as_str()).filter(|u| !u.is_empty());
        Self {
            index,
            hierarchy: HierarchyGraph::build(index, universal),
            options,
        }
    }

    /// Effective members of `type_key`, declared first (fact order), then
    /// inherited ones nearest ancestor first.
    ///
    /// Unknown types resolve to an empty set.
    pub fn resolve(&self, type_key: &str) -> Vec<ResolvedMember<'a>> {
        let index: &'a FactIndex<'a> = self.index;
        let Some(target) = index.get(type_key) else {
            return Vec::new();
        };

        let mut resolved: Vec<ResolvedMember<'a>> = Vec::new();
        let mut by_local: HashMap<String, usize> = HashMap::new();

        for &fact in &target.members {
            if !self.options.filter.allows(fact.visibility) {
                continue;
            }
            let local_key = fact.local_key();
            if by_local.contains_key(&local_key) {
                continue;
            }
            by_local.insert(local_key.clone(), resolved.len());
            resolved.push(ResolvedMember {
                fact,
                local_key,
                declaring_type_key: target.key.as_str(),
                is_inherited: false,
                is_override: fact.modifiers.is_override,
                overridden_member_key: None,
            });
        }

        for ancestor in self.hierarchy.ancestors(target.key.as_str()) {
            if !self.options.include_universal_base_members
                && ancestor == self.options.universal_base_type
            {
                continue;
            }
            let Some(base) = index.get(ancestor) else {
                continue;
            };
            self.inherit_from(target, base, &mut resolved, &mut by_local);
        }

        resolved
    }

    fn inherit_from(
        &self,
        target: &IndexedType<'a>,
        base: &'a IndexedType<'a>,
        resolved: &mut Vec<ResolvedMember<'a>>,
        by_local: &mut HashMap<String, usize>,
    ) {
        let same_module = base.module == target.module;
        for &fact in &base.members {
            if fact.kind == FactKind::Constructor {
                continue;
            }
            if !fact.visibility.visible_to_derived(same_module)
                || !self.options.filter.allows(fact.visibility)
            {
                continue;
            }
            let local_key = fact.local_key();
            match by_local.get(&local_key) {
                Some(&slot) => {
                    let existing = &mut resolved[slot];
                    // Only declared members override; an inherited entry
                    // from a nearer ancestor already hides this one.
                    if !existing.is_inherited && existing.overridden_member_key.is_none() {
                        existing.is_override = true;
                        existing.overridden_member_key =
                            Some(member_key(&base.key, &local_key));
                    }
                }
                None => {
                    by_local.insert(local_key.clone(), resolved.len());
                    resolved.push(ResolvedMember {
                        fact,
                        local_key,
                        declaring_type_key: base.key.as_str(),
                        is_inherited: true,
                        is_override: fact.modifiers.is_override,
                        overridden_member_key: None,
                    });
                }
            }
        }
    }
}

/// One-shot resolution without reusing the hierarchy.
pub fn resolve_members<'a>(
    type_key: &str,
    index: &'a FactIndex<'a>,
    options: &'a ResolveOptions,
) -> Vec<ResolvedMember<'a>> {
    InheritanceResolver::new(index, options).resolve(type_key)
}
