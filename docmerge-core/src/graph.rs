//! The Entity Graph: an owned entity tree plus an identity-key index.
//!
//! Entities live in nested vectors (namespace → type → member → parameter)
//! in presentation order. The index maps every identity key to its position
//! so cross references can be resolved without pointers between entities.
//!
//! Performance characteristics:
//! - Key lookups: O(1)
//! - Appending a type or member: O(members of that type)
//! - Removing types: O(|graph|) full reindex

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Member, Namespace, Parameter, TypeEntity, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TypeSlot {
    ns: usize,
    ty: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemberSlot {
    ns: usize,
    ty: usize,
    member: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParamSlot {
    ns: usize,
    ty: usize,
    member: usize,
    param: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct GraphIndex {
    namespaces: HashMap<String, usize>,
    types: HashMap<String, TypeSlot>,
    members: HashMap<String, MemberSlot>,
    parameters: HashMap<String, ParamSlot>,
}

/// Any entity addressed by identity key.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Namespace(&'a Namespace),
    Type(&'a TypeEntity),
    Member(&'a TypeEntity, &'a Member),
    Parameter(&'a Member, &'a Parameter),
}

/// Entity counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub units: usize,
    pub namespaces: usize,
    pub types: usize,
    pub placeholders: usize,
    pub members: usize,
    pub inherited_members: usize,
    pub overrides: usize,
    pub extension_members: usize,
    pub parameters: usize,
}

#[derive(Deserialize)]
struct GraphParts {
    units: Vec<Unit>,
    namespaces: Vec<Namespace>,
}

impl From<GraphParts> for EntityGraph {
    fn from(parts: GraphParts) -> Self {
        let mut graph = EntityGraph {
            units: parts.units,
            namespaces: parts.namespaces,
            index: GraphIndex::default(),
        };
        graph.reindex();
        graph
    }
}

/// Normalized, queryable graph of one module or of a merged documentation set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphParts")]
pub struct EntityGraph {
    units: Vec<Unit>,
    namespaces: Vec<Namespace>,
    #[serde(skip)]
    index: GraphIndex,
}

impl PartialEq for EntityGraph {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units && self.namespaces == other.namespaces
    }
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn unit_mut(&mut self, name: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.name == name)
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Record `namespace` on every unit already contributing `via`.
    pub fn contribute_namespace(&mut self, via: &str, namespace: &str) {
        for unit in &mut self.units {
            if unit.namespaces.iter().any(|n| n == via) {
                unit.contribute(namespace);
            }
        }
    }

    // ------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.index.namespaces.get(name).map(|&i| &self.namespaces[i])
    }

    pub fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        let i = *self.index.namespaces.get(name)?;
        Some(&mut self.namespaces[i])
    }

    /// Look up or create a namespace (created ones go last).
    pub fn ensure_namespace(&mut self, name: &str) -> &mut Namespace {
        let i = match self.index.namespaces.get(name) {
            Some(&i) => i,
            None => {
                self.namespaces.push(Namespace::new(name));
                let i = self.namespaces.len() - 1;
                self.index.namespaces.insert(name.to_string(), i);
                i
            }
        };
        &mut self.namespaces[i]
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    pub fn types(&self) -> impl Iterator<Item = &TypeEntity> {
        self.namespaces.iter().flat_map(|ns| ns.types.iter())
    }

    /// Mutable access to every type. Callers must not change keys.
    pub(crate) fn types_mut(&mut self) -> impl Iterator<Item = &mut TypeEntity> {
        self.namespaces.iter_mut().flat_map(|ns| ns.types.iter_mut())
    }

    pub fn type_by_key(&self, key: &str) -> Option<&TypeEntity> {
        let slot = self.index.types.get(key)?;
        Some(&self.namespaces[slot.ns].types[slot.ty])
    }

    /// Mutable access to one type. Callers must not change keys.
    pub(crate) fn type_mut(&mut self, key: &str) -> Option<&mut TypeEntity> {
        let slot = *self.index.types.get(key)?;
        Some(&mut self.namespaces[slot.ns].types[slot.ty])
    }

    pub fn contains_type(&self, key: &str) -> bool {
        self.index.types.contains_key(key)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &TypeEntity> {
        self.types().filter(|t| t.is_external_placeholder)
    }

    /// Insert a type (with its members) into its namespace.
    ///
    /// Returns false, leaving the graph untouched, if the key already exists.
    pub fn insert_type(&mut self, ty: TypeEntity) -> bool {
        if self.index.types.contains_key(&ty.key) {
            return false;
        }
        self.ensure_namespace(&ty.namespace);
        let ns = self.index.namespaces[&ty.namespace];
        self.namespaces[ns].types.push(ty);
        let slot = TypeSlot {
            ns,
            ty: self.namespaces[ns].types.len() - 1,
        };
        self.index_type(slot);
        true
    }

    /// Remove every type for which `keep` returns false.
    pub fn retain_types(&mut self, mut keep: impl FnMut(&TypeEntity) -> bool) -> Vec<TypeEntity> {
        let mut removed = Vec::new();
        for ns in &mut self.namespaces {
            let (kept, dropped): (Vec<_>, Vec<_>) =
                std::mem::take(&mut ns.types).into_iter().partition(|t| keep(t));
            ns.types = kept;
            removed.extend(dropped);
        }
        if !removed.is_empty() {
            self.reindex();
        }
        removed
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Owning type and member for a member key.
    pub fn member_by_key(&self, key: &str) -> Option<(&TypeEntity, &Member)> {
        let slot = self.index.members.get(key)?;
        let ty = &self.namespaces[slot.ns].types[slot.ty];
        Some((ty, &ty.members[slot.member]))
    }

    pub fn owner_of_member(&self, key: &str) -> Option<&str> {
        self.member_by_key(key).map(|(ty, _)| ty.key.as_str())
    }

    /// Append a member to a type. Returns false if the type is missing or
    /// already owns the key.
    pub fn push_member(&mut self, type_key: &str, member: Member) -> bool {
        let Some(&slot) = self.index.types.get(type_key) else {
            return false;
        };
        let ty = &mut self.namespaces[slot.ns].types[slot.ty];
        if ty.has_member(&member.key) {
            return false;
        }
        ty.members.push(member);
        self.index_type(slot);
        true
    }

    /// Detach a member from its owning type.
    pub fn remove_member(&mut self, member_key: &str) -> Option<Member> {
        let slot = *self.index.members.get(member_key)?;
        let ty = &mut self.namespaces[slot.ns].types[slot.ty];
        let member = ty.members.remove(slot.member);
        self.unindex_member(&member);
        self.index_type(TypeSlot {
            ns: slot.ns,
            ty: slot.ty,
        });
        Some(member)
    }

    // ------------------------------------------------------------------
    // Cross-reference resolution
    // ------------------------------------------------------------------

    /// Resolve any identity key (type, member, parameter or namespace name).
    pub fn resolve(&self, key: &str) -> Option<EntityRef<'_>> {
        let key = key.trim();
        if let Some(ty) = self.type_by_key(key) {
            return Some(EntityRef::Type(ty));
        }
        if let Some((ty, member)) = self.member_by_key(key) {
            return Some(EntityRef::Member(ty, member));
        }
        if let Some(slot) = self.index.parameters.get(key) {
            let member = &self.namespaces[slot.ns].types[slot.ty].members[slot.member];
            return Some(EntityRef::Parameter(member, &member.parameters[slot.param]));
        }
        self.namespace(key).map(EntityRef::Namespace)
    }

    // ------------------------------------------------------------------
    // Whole-graph views
    // ------------------------------------------------------------------

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            units: self.units.len(),
            namespaces: self.namespaces.len(),
            ..GraphStats::default()
        };
        for ty in self.types() {
            stats.types += 1;
            if ty.is_external_placeholder {
                stats.placeholders += 1;
            }
            for member in &ty.members {
                stats.members += 1;
                stats.parameters += member.parameters.len();
                if member.is_inherited {
                    stats.inherited_members += 1;
                }
                if member.is_override {
                    stats.overrides += 1;
                }
                if member.is_extension {
                    stats.extension_members += 1;
                }
            }
        }
        stats
    }

    /// Order-independent form: every list sorted by identity key.
    ///
    /// Two graphs with the same entities compare equal once normalized,
    /// whatever order their sources were merged in.
    pub fn normalized(&self) -> EntityGraph {
        let mut graph = self.clone();
        graph.units.sort_by(|a, b| a.name.cmp(&b.name));
        for unit in &mut graph.units {
            unit.namespaces.sort();
        }
        graph.namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        for ns in &mut graph.namespaces {
            ns.types.sort_by(|a, b| a.key.cmp(&b.key));
            for ty in &mut ns.types {
                ty.members.sort_by(|a, b| a.key.cmp(&b.key));
            }
        }
        graph.reindex();
        graph
    }

    // ------------------------------------------------------------------
    // Index maintenance
    // ------------------------------------------------------------------

    /// Rebuild the whole key index.
    pub fn reindex(&mut self) {
        self.index = GraphIndex::default();
        for (ns_i, ns) in self.namespaces.iter().enumerate() {
            self.index.namespaces.insert(ns.name.clone(), ns_i);
        }
        for ns in 0..self.namespaces.len() {
            for ty in 0..self.namespaces[ns].types.len() {
                self.index_type(TypeSlot { ns, ty });
            }
        }
    }

    fn index_type(&mut self, slot: TypeSlot) {
        let ty = &self.namespaces[slot.ns].types[slot.ty];
        self.index.types.insert(ty.key.clone(), slot);
        for (m_i, member) in ty.members.iter().enumerate() {
            self.index.members.insert(
                member.key.clone(),
                MemberSlot {
                    ns: slot.ns,
                    ty: slot.ty,
                    member: m_i,
                },
            );
            for (p_i, param) in member.parameters.iter().enumerate() {
                self.index.parameters.insert(
                    param.key.clone(),
                    ParamSlot {
                        ns: slot.ns,
                        ty: slot.ty,
                        member: m_i,
                        param: p_i,
                    },
                );
            }
        }
    }

    /// Re-index one type after its members were edited in place.
    pub(crate) fn refresh_type(&mut self, key: &str) {
        if let Some(&slot) = self.index.types.get(key) {
            self.index_type(slot);
        }
    }

    fn unindex_member(&mut self, member: &Member) {
        self.index.members.remove(&member.key);
        for param in &member.parameters {
            self.index.parameters.remove(&param.key);
        }
    }

    /// Take the graph apart (units, namespaces with their subtrees).
    pub fn into_parts(self) -> (Vec<Unit>, Vec<Namespace>) {
        (self.units, self.namespaces)
    }
}
