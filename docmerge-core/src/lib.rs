//! docmerge-core: documentation model construction and merge engine
//!
//! Turns per-module symbol facts into one normalized, cross-referenced
//! documentation graph.
//!
//! # Features
//!
//! - **Graph building**: Namespaces, types, members and parameters with stable identity keys
//! - **Inheritance**: Inherited members surfaced on derived types, overrides suppressing their bases
//! - **Extension relocation**: Extension members moved onto the type they extend
//! - **Merge**: Several module graphs unified into one documentation set
//! - **Conceptual overlay**: Authored content keyed per type, created exactly once when missing
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use docmerge_core::prelude::*;
//!
//! let output = Docmerge::new(DocmergeConfig::default())
//!     .sources(fact_sources(&["facts/".into()])?)
//!     .run()?;
//!
//! for d in output.diagnostics.iter() {
//!     println!("{}", d);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`facts`]: Symbol facts and fact sources
//! - [`builder`]: Entity graph construction for one module
//! - [`inheritance`]: Type hierarchy and inherited member resolution
//! - [`relocate`]: Extension member relocation
//! - [`merge`]: Graph merging
//! - [`overlay`]: Conceptual content overlay
//! - [`pipeline`]: Fluent builder API running every stage
//! - [`error`]: Typed error handling

pub mod builder;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod docs;
pub mod error;
pub mod facts;
pub mod graph;
pub mod inheritance;
pub mod logging;
pub mod merge;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod prelude;
pub mod relocate;
pub mod report;
pub mod scan;

// Common trait re-exports
pub use common::GraphTraversal;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DocmergeError, DocmergeResult, IoResultExt};

// Diagnostics
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Outcome};

// Facts
pub use facts::{
    FactKind, FactSource, InlineDocs, JsonFactFile, Modifiers, ModuleFacts, ParamFact,
    StaticFacts, SymbolFact, TypeRef,
};

// Model
pub use common::{Visibility, VisibilityFilter};
pub use docs::{DocFragments, OverlayFields};
pub use graph::{EntityGraph, EntityRef, GraphStats};
pub use model::{Member, MemberKind, Namespace, ParamModifier, Parameter, TypeEntity, TypeKind, Unit};

// Stages
pub use builder::{build_graph, build_graph_with_references};
pub use inheritance::{resolve_members, InheritanceResolver, ResolveOptions, ResolvedMember};
pub use merge::{merge, GraphMerger, MergedGraph};
pub use overlay::{
    overlay, overlay_key, AuthoredContent, ContentRegistry, ContentStore, FsContentStore,
    MemoryContentStore, OverlayCoordinator, OverlayOptions,
};
pub use relocate::{relocate, relocate_with_stats, RelocateOptions, RelocationStats};

// Builder API
pub use pipeline::{Docmerge, PipelineOutput};

// Configuration
pub use config::{load_config, DocmergeConfig};

// Logging
pub use logging::{init_structured_logging, log_error, log_event, log_info, log_warn};

// Reporting
pub use report::{print_json, print_plain, render_plain, RunReport};

// File scanning
pub use scan::{fact_sources, gather_fact_files, gather_fact_files_with_excludes};

#[cfg(test)]
mod tests;
