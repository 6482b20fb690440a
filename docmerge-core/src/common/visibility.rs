//! Visibility levels, the visibility filter, and inheritance visibility rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accessibility of a type or member as reported by the fact source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    /// protected-or-internal
    ProtectedInternal,
    Internal,
    /// protected-and-internal
    PrivateProtected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::ProtectedInternal => "protected_internal",
            Self::Internal => "internal",
            Self::PrivateProtected => "private_protected",
            Self::Private => "private",
        }
    }

    /// Whether this visibility is only meaningful inside the declaring module.
    pub fn is_module_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::PrivateProtected)
    }

    /// Whether a member with this visibility is visible from a derived type.
    ///
    /// Internal-like members are visible only when the derived type comes
    /// from the same module. Private members never are.
    pub fn visible_to_derived(&self, same_module: bool) -> bool {
        match self {
            Self::Public | Self::Protected | Self::ProtectedInternal => true,
            Self::Internal | Self::PrivateProtected => same_module,
            Self::Private => false,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "public" => Ok(Self::Public),
            "protected" => Ok(Self::Protected),
            "protected_internal" | "protected_or_internal" => Ok(Self::ProtectedInternal),
            "internal" => Ok(Self::Internal),
            "private_protected" | "protected_and_internal" => Ok(Self::PrivateProtected),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown visibility '{}'", other)),
        }
    }
}

/// Configured set of visibility levels allowed into the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityFilter {
    allowed: Vec<Visibility>,
}

impl VisibilityFilter {
    /// Build a filter from any set of levels (duplicates are ignored).
    pub fn new(levels: impl IntoIterator<Item = Visibility>) -> Self {
        let mut allowed: Vec<Visibility> = levels.into_iter().collect();
        allowed.sort();
        allowed.dedup();
        Self { allowed }
    }

    /// Only public facts enter the graph.
    pub fn public_only() -> Self {
        Self::new([Visibility::Public])
    }

    /// Everything reachable by an external consumer, including via derivation.
    pub fn externally_visible() -> Self {
        Self::new([
            Visibility::Public,
            Visibility::Protected,
            Visibility::ProtectedInternal,
        ])
    }

    pub fn allows(&self, visibility: Visibility) -> bool {
        self.allowed.contains(&visibility)
    }

    pub fn levels(&self) -> &[Visibility] {
        &self.allowed
    }
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self::public_only()
    }
}
