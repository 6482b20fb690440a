//! Entity model of the documented API.
//!
//! Entities form a tree (Unit → Namespace → Type → Member → Parameter);
//! every cross-tree reference (base type, declaring type, overridden member,
//! extended type, see-also) is an identity key resolved lazily through
//! [`EntityGraph`](crate::graph::EntityGraph).

use serde::{Deserialize, Serialize};

use crate::common::Visibility;
use crate::docs::DocFragments;

/// Kind of a type entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Delegate => "delegate",
        }
    }
}

/// Kind of a member entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Constructor,
    Method,
    Property,
    Field,
    Event,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructor => "constructor",
            Self::Method => "method",
            Self::Property => "property",
            Self::Field => "field",
            Self::Event => "event",
        }
    }
}

/// Passing mode of a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamModifier {
    #[default]
    None,
    Ref,
    Out,
    In,
}

impl ParamModifier {
    /// By-reference parameters are marked in identity keys.
    pub fn is_by_ref(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Ref => Some("ref"),
            Self::Out => Some("out"),
            Self::In => Some("in"),
        }
    }
}

/// One compiled module's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub version: Option<String>,
    /// Contributed namespace names, first-seen order
    pub namespaces: Vec<String>,
}

impl Unit {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            namespaces: Vec::new(),
        }
    }

    /// Record a namespace, keeping the set ordered and duplicate-free.
    pub fn contribute(&mut self, namespace: &str) {
        if !self.namespaces.iter().any(|n| n == namespace) {
            self.namespaces.push(namespace.to_string());
        }
    }
}

/// A logical namespace. The empty name is the global namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub docs: DocFragments,
    pub types: Vec<TypeEntity>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: DocFragments::default(),
            types: Vec::new(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.name.is_empty()
    }
}

/// A documented type, real or an external placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntity {
    pub key: String,
    pub name: String,
    pub full_name: String,
    pub namespace: String,
    pub kind: TypeKind,
    pub visibility: Visibility,
    pub base_type: Option<String>,
    pub interfaces: Vec<String>,
    pub type_parameters: Vec<String>,
    /// Static/utility-only container
    pub is_static: bool,
    pub is_external_placeholder: bool,
    pub signature: String,
    pub docs: DocFragments,
    pub members: Vec<Member>,
}

impl TypeEntity {
    /// Synthesize the minimal placeholder for a type outside every module.
    pub fn placeholder(key: &str, namespace: &str) -> Self {
        let name = crate::common::type_name_from_key(key, namespace).to_string();
        Self {
            key: key.to_string(),
            full_name: key.to_string(),
            signature: format!("class {}", name),
            name,
            namespace: namespace.to_string(),
            kind: TypeKind::Class,
            visibility: Visibility::Public,
            base_type: None,
            interfaces: Vec::new(),
            type_parameters: Vec::new(),
            is_static: false,
            is_external_placeholder: true,
            docs: DocFragments::default(),
            members: Vec::new(),
        }
    }

    pub fn member(&self, key: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.key == key)
    }

    pub fn member_mut(&mut self, key: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.key == key)
    }

    pub fn has_member(&self, key: &str) -> bool {
        self.members.iter().any(|m| m.key == key)
    }

    /// Static container whose only purpose is hosting extension functions.
    pub fn is_extension_holder(&self) -> bool {
        self.is_static && !self.is_external_placeholder
    }
}

/// A member of a type, declared or inherited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub key: String,
    pub name: String,
    pub kind: MemberKind,
    pub visibility: Visibility,
    pub signature: String,
    pub return_type: Option<String>,
    pub parameters: Vec<Parameter>,
    pub type_parameters: Vec<String>,
    pub is_static: bool,
    pub is_inherited: bool,
    pub is_override: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    /// Type that declares this member; differs from the owner when inherited
    pub declaring_type_key: String,
    pub overridden_member_key: Option<String>,
    pub is_extension: bool,
    pub extended_type_key: Option<String>,
    /// Declared namespace of the receiver, used to place placeholders
    pub extended_type_namespace: Option<String>,
    pub docs: DocFragments,
}

impl Member {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A parameter of a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub name: String,
    pub type_name: String,
    pub ordinal: usize,
    pub has_default: bool,
    pub modifier: ParamModifier,
    pub docs: DocFragments,
}
