//! Symbol facts: the per-module input handed over by semantic analysis.
//!
//! A module's facts are a flat list of [`SymbolFact`]s. Each fact names its
//! namespace and enclosing type chain, so the tree is recovered from the
//! container chain rather than from nesting in the input. Facts arrive as
//! JSON ([`JsonFactFile`]) or are constructed in memory ([`StaticFacts`]).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{
    member_key, member_local_key, name_with_arity, type_key, QualifiedPathBuilder, Visibility,
};
use crate::error::{DocmergeError, DocmergeResult, IoResultExt};
use crate::model::{MemberKind, ParamModifier, TypeKind};

/// Kind of element a fact describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    /// Carries namespace-level documentation only
    Namespace,
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
    Constructor,
    Method,
    Property,
    Field,
    Event,
}

impl FactKind {
    pub fn type_kind(&self) -> Option<TypeKind> {
        match self {
            Self::Class => Some(TypeKind::Class),
            Self::Interface => Some(TypeKind::Interface),
            Self::Struct => Some(TypeKind::Struct),
            Self::Enum => Some(TypeKind::Enum),
            Self::Delegate => Some(TypeKind::Delegate),
            _ => None,
        }
    }

    pub fn member_kind(&self) -> Option<MemberKind> {
        match self {
            Self::Constructor => Some(MemberKind::Constructor),
            Self::Method => Some(MemberKind::Method),
            Self::Property => Some(MemberKind::Property),
            Self::Field => Some(MemberKind::Field),
            Self::Event => Some(MemberKind::Event),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        self.type_kind().is_some()
    }

    pub fn is_member(&self) -> bool {
        self.member_kind().is_some()
    }
}

/// Reference to a type by namespace and key-form name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(default)]
    pub namespace: String,
    /// Name including enclosing types and arity suffix (`Outer.Inner`, `List`1`)
    pub name: String,
}

impl TypeRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn key(&self) -> String {
        type_key(&self.namespace, &[], &self.name)
    }
}

/// One parameter of a callable or indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamFact {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub modifier: ParamModifier,
}

impl ParamFact {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            has_default: false,
            modifier: ParamModifier::None,
        }
    }
}

/// Declaration modifiers relevant to documentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub is_override: bool,
    pub is_sealed: bool,
}

/// A single element of a module's public surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFact {
    pub kind: FactKind,
    #[serde(default)]
    pub namespace: String,
    /// Enclosing type chain, outermost first, in key form
    #[serde(default)]
    pub containers: Vec<String>,
    pub name: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParamFact>,
    #[serde(default)]
    pub base_type: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Receiver type when this member is an extension function
    #[serde(default)]
    pub extension_receiver: Option<TypeRef>,
    /// Raw inline documentation markup
    #[serde(default)]
    pub docs: Option<String>,
}

impl QualifiedPathBuilder for SymbolFact {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn containers(&self) -> &[String] {
        &self.containers
    }
}

impl SymbolFact {
    /// Create a fact with everything optional left empty.
    pub fn new(kind: FactKind, namespace: &str, name: &str, visibility: Visibility) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            containers: Vec::new(),
            name: name.to_string(),
            visibility,
            signature: None,
            return_type: None,
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            modifiers: Modifiers::default(),
            extension_receiver: None,
            docs: None,
        }
    }

    /// Type name in key form (arity suffix applied).
    pub fn key_name(&self) -> String {
        if self.kind.is_type() {
            name_with_arity(&self.name, self.type_parameters.len(), "`")
        } else {
            self.name.clone()
        }
    }

    /// Whether the member's key includes a parameter list.
    fn has_parameter_list(&self) -> bool {
        match self.kind {
            FactKind::Constructor | FactKind::Method | FactKind::Delegate => true,
            FactKind::Property => !self.parameters.is_empty(),
            _ => false,
        }
    }

    /// Owner-independent member signature, e.g. `Add(System.Int32)`.
    pub fn local_key(&self) -> String {
        let params = self.has_parameter_list().then(|| {
            self.parameters
                .iter()
                .map(|p| (p.type_name.as_str(), p.modifier.is_by_ref()))
        });
        member_local_key(&self.name, self.type_parameters.len(), params)
    }

    /// Canonical identity key of this fact.
    ///
    /// Members without a container get their local key; the builder reports
    /// them as structural errors before the key is used.
    pub fn key(&self) -> String {
        if self.kind.is_member() {
            match self.container_key() {
                Some(owner) => member_key(&owner, &self.local_key()),
                None => self.local_key(),
            }
        } else if self.kind == FactKind::Namespace {
            self.namespace.clone()
        } else {
            self.build_type_key(&self.key_name())
        }
    }

    /// Display signature, synthesized when the source gave none.
    pub fn display_signature(&self) -> String {
        if let Some(sig) = &self.signature {
            return sig.clone();
        }
        let mut sig = String::from(self.visibility.as_str().replace('_', " "));
        if self.modifiers.is_static {
            sig.push_str(" static");
        }
        if self.modifiers.is_abstract {
            sig.push_str(" abstract");
        } else if self.modifiers.is_override {
            sig.push_str(" override");
        } else if self.modifiers.is_virtual {
            sig.push_str(" virtual");
        }
        if let Some(kind) = self.kind.type_kind() {
            sig.push(' ');
            sig.push_str(kind.as_str());
        } else if let Some(ret) = &self.return_type {
            sig.push(' ');
            sig.push_str(ret);
        }
        sig.push(' ');
        sig.push_str(&self.name);
        if !self.type_parameters.is_empty() {
            sig.push('<');
            sig.push_str(&self.type_parameters.join(", "));
            sig.push('>');
        }
        if self.has_parameter_list() {
            let params: Vec<String> = self
                .parameters
                .iter()
                .map(|p| match p.modifier.keyword() {
                    Some(kw) => format!("{} {} {}", kw, p.type_name, p.name),
                    None => format!("{} {}", p.type_name, p.name),
                })
                .collect();
            sig.push('(');
            sig.push_str(&params.join(", "));
            sig.push(')');
        }
        sig
    }
}

/// Raw documentation markup keyed by identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineDocs {
    entities: HashMap<String, String>,
    namespaces: HashMap<String, String>,
}

impl InlineDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, markup: impl Into<String>) {
        self.entities.insert(key.into(), markup.into());
    }

    pub fn insert_namespace(&mut self, name: impl Into<String>, markup: impl Into<String>) {
        self.namespaces.insert(name.into(), markup.into());
    }

    pub fn entity(&self, key: &str) -> Option<&str> {
        self.entities.get(key).map(String::as_str)
    }

    pub fn namespace(&self, name: &str) -> Option<&str> {
        self.namespaces.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len() + self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All facts for one compiled module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleFacts {
    pub module: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub symbols: Vec<SymbolFact>,
}

impl ModuleFacts {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            version: None,
            symbols: Vec::new(),
        }
    }

    /// Builder-style append.
    pub fn with(mut self, fact: SymbolFact) -> Self {
        self.symbols.push(fact);
        self
    }

    /// Collect the raw markup carried by the facts, keyed by identity key.
    pub fn inline_docs(&self) -> InlineDocs {
        let mut docs = InlineDocs::new();
        for fact in &self.symbols {
            let Some(markup) = &fact.docs else { continue };
            if fact.kind == FactKind::Namespace {
                docs.insert_namespace(fact.namespace.clone(), markup.clone());
            } else {
                docs.insert(fact.key(), markup.clone());
            }
        }
        docs
    }
}

/// Supplier of one module's facts.
///
/// `load` is the only blocking point of a module pipeline.
pub trait FactSource: Send + Sync {
    /// Module name used for diagnostics before the facts are loaded.
    fn name(&self) -> &str;

    fn load(&self) -> DocmergeResult<ModuleFacts>;
}

/// Facts read from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFactFile {
    path: PathBuf,
    name: String,
}

impl JsonFactFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FactSource for JsonFactFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> DocmergeResult<ModuleFacts> {
        let text = fs::read_to_string(&self.path).with_path(&self.path)?;
        serde_json::from_str(&text).map_err(|e| {
            DocmergeError::fact_source(
                &self.name,
                format!("invalid facts in {}: {}", self.path.display(), e),
            )
        })
    }
}

/// Facts already in memory.
#[derive(Debug, Clone)]
pub struct StaticFacts(pub ModuleFacts);

impl FactSource for StaticFacts {
    fn name(&self) -> &str {
        &self.0.module
    }

    fn load(&self) -> DocmergeResult<ModuleFacts> {
        Ok(self.0.clone())
    }
}
