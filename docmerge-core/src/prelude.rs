//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use docmerge_core::prelude::*;
//! ```
//!
//! This provides the types needed to run a documentation build without
//! pulling in the per-stage internals.

// Errors and partial results
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Outcome};
pub use crate::error::{DocmergeError, DocmergeResult};

// Facts
pub use crate::facts::{FactSource, JsonFactFile, ModuleFacts, StaticFacts};

// Graph
pub use crate::graph::{EntityGraph, GraphStats};
pub use crate::merge::MergedGraph;

// Content stores
pub use crate::overlay::{ContentStore, FsContentStore, MemoryContentStore};

// File scanning
pub use crate::scan::{fact_sources, gather_fact_files};

// Configuration
pub use crate::config::{load_config, DocmergeConfig};

// Builder API
pub use crate::pipeline::{Docmerge, PipelineOutput};
