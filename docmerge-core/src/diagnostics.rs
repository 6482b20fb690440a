//! Accumulated diagnostics for partial-failure results.
//!
//! Stages keep going on per-element problems and record them here instead
//! of returning early. A stage result is an [`Outcome`]: the value that could
//! be built plus everything that was degraded or dropped on the way.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Category of a recorded problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed or incomplete fact for one element; documentation degraded
    Fact,
    /// Broken container chain; the whole module was dropped
    Structural,
    /// Two sources disagree on a non-mergeable property; first writer kept
    MergeConflict,
    /// Extension target not found and no placeholder synthesized
    UnresolvedExtension,
    /// Content store failed for one overlay key
    OverlayIo,
    /// A module pipeline failed and its contribution was dropped
    ModuleDropped,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Structural => "structural",
            Self::MergeConflict => "merge_conflict",
            Self::UnresolvedExtension => "unresolved_extension",
            Self::OverlayIo => "overlay_io",
            Self::ModuleDropped => "module_dropped",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One degraded or dropped element and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub module: Option<String>,
    pub key: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            module: None,
            key: None,
            message: message.into(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(module) = &self.module {
            write!(f, " {}", module)?;
        }
        if let Some(key) = &self.key {
            write!(f, " {}", key)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, also emitting it as a warning event.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(
            kind = %diagnostic.kind,
            module = diagnostic.module.as_deref().unwrap_or(""),
            key = diagnostic.key.as_deref().unwrap_or(""),
            detail = %diagnostic.message,
        );
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// A stage result paired with what went wrong along the way.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Move the diagnostics into `sink` and return the value.
    pub fn drain_into(self, sink: &mut Diagnostics) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::new(DiagnosticKind::Fact, "unclosed <summary>")
            .with_module("Core")
            .with_key("Acme.Widget");
        assert_eq!(d.to_string(), "[fact] Core Acme.Widget: unclosed <summary>");
    }

    #[test]
    fn test_count_by_kind() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticKind::Fact, "a"));
        diags.push(Diagnostic::new(DiagnosticKind::MergeConflict, "b"));
        diags.push(Diagnostic::new(DiagnosticKind::Fact, "c"));
        assert_eq!(diags.count(DiagnosticKind::Fact), 2);
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn test_outcome_drain_into() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticKind::OverlayIo, "offline"));
        let outcome = Outcome::new(7, diags);

        let mut sink = Diagnostics::new();
        let value = outcome.map(|v| v * 2).drain_into(&mut sink);
        assert_eq!(value, 14);
        assert_eq!(sink.len(), 1);
    }
}
