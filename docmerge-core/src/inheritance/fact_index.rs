//! Key-indexed view over one module's facts (plus optional read-only
//! reference modules).
//!
//! Building the index is where container chains are checked: a member (or
//! nested type) whose enclosing type is absent from its own module's facts
//! is a structural error, fatal for that module only.

use std::collections::HashMap;

use crate::common::QualifiedPathBuilder;
use crate::error::{DocmergeError, DocmergeResult};
use crate::facts::{FactKind, ModuleFacts, SymbolFact};

/// A type fact with its declared members.
#[derive(Debug, Clone)]
pub struct IndexedType<'a> {
    pub key: String,
    pub fact: &'a SymbolFact,
    /// Module that declared the type
    pub module: &'a str,
    /// Base type key first, then interface keys, declaration order
    pub bases: Vec<String>,
    pub members: Vec<&'a SymbolFact>,
}

/// Type facts by identity key.
#[derive(Debug, Clone)]
pub struct FactIndex<'a> {
    module: &'a str,
    types: HashMap<String, IndexedType<'a>>,
    /// Primary module's type keys in fact order
    order: Vec<String>,
    /// Type keys declared more than once in the primary module
    duplicates: Vec<String>,
}

impl<'a> FactIndex<'a> {
    /// Index one module, validating every container chain.
    pub fn build(facts: &'a ModuleFacts) -> DocmergeResult<Self> {
        let mut index = Self {
            module: &facts.module,
            types: HashMap::new(),
            order: Vec::new(),
            duplicates: Vec::new(),
        };

        for fact in facts.symbols.iter().filter(|f| f.kind.is_type()) {
            let key = fact.key();
            if index.types.contains_key(&key) {
                index.duplicates.push(key);
                continue;
            }
            index.order.push(key.clone());
            index.types.insert(key.clone(), indexed(key, fact, &facts.module));
        }

        // Nested types must sit inside a type of the same module.
        for key in &index.order {
            let fact = index.types[key].fact;
            if let Some(container) = fact.container_key() {
                if !index.types.contains_key(&container) {
                    return Err(DocmergeError::structural(
                        &facts.module,
                        key,
                        format!("enclosing type '{}' is not declared in this module", container),
                    ));
                }
            }
        }

        for fact in facts.symbols.iter().filter(|f| f.kind.is_member()) {
            let container = fact.container_key().ok_or_else(|| {
                DocmergeError::structural(
                    &facts.module,
                    fact.key(),
                    format!("{} '{}' has no container chain", kind_name(fact.kind), fact.name),
                )
            })?;
            match index.types.get_mut(&container) {
                Some(owner) => owner.members.push(fact),
                None => {
                    return Err(DocmergeError::structural(
                        &facts.module,
                        fact.key(),
                        format!("container '{}' is not declared in this module", container),
                    ))
                }
            }
        }

        Ok(index)
    }

    /// Add read-only reference modules so types can inherit across modules.
    ///
    /// Types already indexed are never replaced. Members whose container is
    /// missing in a reference module are skipped rather than reported.
    pub fn with_references(mut self, references: &'a [ModuleFacts]) -> Self {
        for facts in references {
            if facts.module == self.module {
                continue;
            }
            let mut added: Vec<String> = Vec::new();
            for fact in facts.symbols.iter().filter(|f| f.kind.is_type()) {
                let key = fact.key();
                if !self.types.contains_key(&key) {
                    self.types.insert(key.clone(), indexed(key.clone(), fact, &facts.module));
                    added.push(key);
                }
            }
            for fact in facts.symbols.iter().filter(|f| f.kind.is_member()) {
                let Some(container) = fact.container_key() else {
                    continue;
                };
                if !added.contains(&container) {
                    continue;
                }
                if let Some(owner) = self.types.get_mut(&container) {
                    owner.members.push(fact);
                }
            }
        }
        self
    }

    pub fn module(&self) -> &'a str {
        self.module
    }

    pub fn get(&self, key: &str) -> Option<&IndexedType<'a>> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// Types of the primary module in fact order.
    pub fn module_types(&self) -> impl Iterator<Item = &IndexedType<'a>> {
        self.order.iter().filter_map(|k| self.types.get(k))
    }

    /// Every indexed type, reference modules included (unordered).
    pub fn all_types(&self) -> impl Iterator<Item = &IndexedType<'a>> {
        self.types.values()
    }

    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

fn indexed<'a>(key: String, fact: &'a SymbolFact, module: &'a str) -> IndexedType<'a> {
    let bases = fact
        .base_type
        .iter()
        .chain(fact.interfaces.iter())
        .map(|r| r.key())
        .collect();
    IndexedType {
        key,
        fact,
        module,
        bases,
        members: Vec::new(),
    }
}

fn kind_name(kind: FactKind) -> &'static str {
    kind.member_kind().map(|k| k.as_str()).unwrap_or("member")
}
