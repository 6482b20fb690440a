//! Documentation fragments attached to every entity.
//!
//! Every field is independently present or absent. Nothing here is ever
//! defaulted to an empty string or empty list: "no documentation" is `None`.

use serde::{Deserialize, Serialize};

/// A documented exception a member can throw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDoc {
    pub type_name: String,
    pub description: Option<String>,
}

/// Documentation of one generic type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDoc {
    pub name: String,
    pub description: Option<String>,
}

/// Human-authored supplementary content, applied by the overlay stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayFields {
    pub usage: Option<String>,
    pub examples: Option<String>,
    pub best_practices: Option<String>,
    pub patterns: Option<String>,
    pub considerations: Option<String>,
    pub related_apis: Option<Vec<String>>,
}

impl OverlayFields {
    pub fn is_empty(&self) -> bool {
        self.usage.is_none()
            && self.examples.is_none()
            && self.best_practices.is_none()
            && self.patterns.is_none()
            && self.considerations.is_none()
            && self.related_apis.is_none()
    }

    /// Fill absent fields from `other`. Returns true if anything changed.
    pub fn fill_from(&mut self, other: &OverlayFields) -> bool {
        let mut changed = false;
        changed |= fill(&mut self.usage, &other.usage);
        changed |= fill(&mut self.examples, &other.examples);
        changed |= fill(&mut self.best_practices, &other.best_practices);
        changed |= fill(&mut self.patterns, &other.patterns);
        changed |= fill(&mut self.considerations, &other.considerations);
        changed |= fill(&mut self.related_apis, &other.related_apis);
        changed
    }
}

/// Structured documentation extracted from inline markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFragments {
    pub summary: Option<String>,
    pub remarks: Option<String>,
    /// Members only
    pub returns: Option<String>,
    /// Property-like members only
    pub value: Option<String>,
    pub exceptions: Option<Vec<ExceptionDoc>>,
    pub type_parameters: Option<Vec<TypeParamDoc>>,
    /// Identity keys of related entities
    pub see_also: Option<Vec<String>>,
    #[serde(default)]
    pub overlay: OverlayFields,
}

impl DocFragments {
    /// Fragments with only a summary, mostly useful for parameters.
    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            summary: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.remarks.is_none()
            && self.returns.is_none()
            && self.value.is_none()
            && self.exceptions.is_none()
            && self.type_parameters.is_none()
            && self.see_also.is_none()
            && self.overlay.is_empty()
    }

    /// Field-by-field merge: absent fields are filled from `incoming`,
    /// present fields are kept. Returns true if anything changed.
    pub fn merge_from(&mut self, incoming: &DocFragments) -> bool {
        let mut changed = false;
        changed |= fill(&mut self.summary, &incoming.summary);
        changed |= fill(&mut self.remarks, &incoming.remarks);
        changed |= fill(&mut self.returns, &incoming.returns);
        changed |= fill(&mut self.value, &incoming.value);
        changed |= fill(&mut self.exceptions, &incoming.exceptions);
        changed |= fill(&mut self.type_parameters, &incoming.type_parameters);
        changed |= fill(&mut self.see_also, &incoming.see_also);
        changed |= self.overlay.fill_from(&incoming.overlay);
        changed
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) -> bool {
    if slot.is_none() && incoming.is_some() {
        *slot = incoming.clone();
        true
    } else {
        false
    }
}
