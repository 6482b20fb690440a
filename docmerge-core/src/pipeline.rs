//! Builder pattern API for a full documentation run.
//!
//! ```rust,ignore
//! use docmerge_core::prelude::*;
//!
//! let output = Docmerge::new(DocmergeConfig::default())
//!     .sources(scan::fact_sources(&inputs)?)
//!     .content_store(FsContentStore::new("docs/conceptual"))
//!     .run()?;
//!
//! println!("{} types", output.value.graph.stats().types);
//! ```
//!
//! # Stages
//!
//! ```text
//! source ─► load ─┐       ┌─► build+resolve ─► relocate ─┐
//! source ─► load ─┼─► all ─┼─► build+resolve ─► relocate ─┼─► barrier ─► merge ─► overlay
//! ref    ─► load ─┘ facts  └─► build+resolve ─► relocate ─┘
//! ```
//!
//! Every source is loaded before any module is built, so a type may inherit
//! from a type declared in a sibling module. Module pipelines only read the
//! shared facts and run on the rayon pool. A failed module is dropped and
//! reported; its siblings are unaffected. Merge and overlay run once, after
//! every module pipeline has finished.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::builder::build_graph_with_references;
use crate::config::DocmergeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Outcome};
use crate::error::{DocmergeError, DocmergeResult};
use crate::facts::{FactSource, ModuleFacts};
use crate::graph::EntityGraph;
use crate::inheritance::ResolveOptions;
use crate::merge::{merge, MergedGraph};
use crate::overlay::{ContentStore, FsContentStore, MemoryContentStore, OverlayCoordinator};
use crate::relocate::{relocate, RelocateOptions};

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub graph: MergedGraph,
    /// Module names merged, in merge order
    pub modules_built: Vec<String>,
    /// Source names whose pipeline failed, sorted
    pub modules_dropped: Vec<String>,
}

/// Builder for configuring a documentation run.
pub struct Docmerge {
    config: DocmergeConfig,
    sources: Vec<Box<dyn FactSource>>,
    references: Vec<Box<dyn FactSource>>,
    store: Option<Box<dyn ContentStore>>,
}

impl Docmerge {
    /// Create a run with the given configuration and no sources.
    pub fn new(config: DocmergeConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
            references: Vec::new(),
            store: None,
        }
    }

    /// Add one module to document.
    pub fn source(mut self, source: impl FactSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add several modules to document.
    pub fn sources<S: FactSource + 'static>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources
            .extend(sources.into_iter().map(|s| Box::new(s) as Box<dyn FactSource>));
        self
    }

    /// Add a read-only module that documented types may inherit from.
    pub fn reference(mut self, source: impl FactSource + 'static) -> Self {
        self.references.push(Box::new(source));
        self
    }

    /// Add several read-only modules.
    pub fn references<S: FactSource + 'static>(
        mut self,
        sources: impl IntoIterator<Item = S>,
    ) -> Self {
        self.references
            .extend(sources.into_iter().map(|s| Box::new(s) as Box<dyn FactSource>));
        self
    }

    /// Use this store for conceptual content.
    ///
    /// Without one, `overlay.content_dir` is used when configured, and an
    /// in-memory store otherwise.
    pub fn content_store(mut self, store: impl ContentStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn config(&self) -> &DocmergeConfig {
        &self.config
    }

    /// Run every stage and return the merged, overlaid graph.
    ///
    /// Fails only when no module could be built.
    pub fn run(&self) -> DocmergeResult<Outcome<PipelineOutput>> {
        let resolve_options = self.config.resolve_options();
        let relocate_options = self.config.relocate_options();
        let mut diagnostics = Diagnostics::new();

        info!(
            modules = self.sources.len(),
            references = self.references.len(),
            "starting documentation run"
        );

        let mut dropped: Vec<String> = Vec::new();
        let (names, mut visible) = self.load_sources(&mut diagnostics, &mut dropped);
        let loaded = visible.len();
        visible.extend(self.load_references(&mut diagnostics));

        // Barrier: collect() returns only after every module pipeline is done.
        // Each build reads every loaded module; the fact index skips its own.
        let results: Vec<(String, DocmergeResult<Outcome<(String, EntityGraph)>>)> = visible[..loaded]
            .par_iter()
            .zip(names.into_par_iter())
            .map(|(facts, name)| {
                let result = build_module(facts, &visible, &resolve_options, &relocate_options);
                (name, result)
            })
            .collect();

        let mut graphs: Vec<(String, EntityGraph)> = Vec::new();
        for (name, result) in results {
            match result {
                Ok(outcome) => graphs.push(outcome.drain_into(&mut diagnostics)),
                Err(e) => {
                    if let DocmergeError::Structural { key, message, .. } = &e {
                        diagnostics.push(
                            Diagnostic::new(DiagnosticKind::Structural, message.clone())
                                .with_module(&name)
                                .with_key(key),
                        );
                    }
                    drop_module(&mut diagnostics, &mut dropped, name, &e);
                }
            }
        }
        dropped.sort();

        if graphs.is_empty() {
            return Err(DocmergeError::NoModulesBuilt {
                failed: dropped.len(),
            });
        }

        graphs.sort_by(|a, b| a.0.cmp(&b.0));
        let built: Vec<String> = graphs.iter().map(|(name, _)| name.clone()).collect();

        let merged = merge(graphs.into_iter().map(|(_, graph)| graph)).drain_into(&mut diagnostics);
        let overlaid = self.overlay(merged).drain_into(&mut diagnostics);

        info!(
            built = built.len(),
            dropped = dropped.len(),
            diagnostics = diagnostics.len(),
            "documentation run complete"
        );

        Ok(Outcome::new(
            PipelineOutput {
                graph: overlaid,
                modules_built: built,
                modules_dropped: dropped,
            },
            diagnostics,
        ))
    }

    /// Load every source in parallel. Failed loads are dropped and reported.
    fn load_sources(
        &self,
        diagnostics: &mut Diagnostics,
        dropped: &mut Vec<String>,
    ) -> (Vec<String>, Vec<ModuleFacts>) {
        let loaded: Vec<(String, DocmergeResult<ModuleFacts>)> = self
            .sources
            .par_iter()
            .map(|s| (s.name().to_string(), s.load()))
            .collect();

        let mut names = Vec::with_capacity(loaded.len());
        let mut facts = Vec::with_capacity(loaded.len());
        for (name, result) in loaded {
            match result {
                Ok(module) => {
                    names.push(name);
                    facts.push(module);
                }
                Err(e) => drop_module(diagnostics, dropped, name, &e),
            }
        }
        (names, facts)
    }

    fn load_references(&self, diagnostics: &mut Diagnostics) -> Vec<ModuleFacts> {
        let loaded: Vec<(String, DocmergeResult<ModuleFacts>)> = self
            .references
            .par_iter()
            .map(|r| (r.name().to_string(), r.load()))
            .collect();

        let mut references = Vec::with_capacity(loaded.len());
        for (name, result) in loaded {
            match result {
                Ok(facts) => references.push(facts),
                Err(e) => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::ModuleDropped,
                        format!("reference module unavailable: {}", e),
                    )
                    .with_module(name),
                ),
            }
        }
        references
    }

    fn overlay(&self, merged: MergedGraph) -> Outcome<MergedGraph> {
        let options = self.config.overlay_options();
        if let Some(store) = &self.store {
            return OverlayCoordinator::new(store.as_ref(), options).run(merged);
        }
        match &self.config.overlay.content_dir {
            Some(dir) => {
                let store = FsContentStore::new(dir);
                OverlayCoordinator::new(&store, options).run(merged)
            }
            None => {
                debug!("no content store configured, overlay uses an in-memory store");
                let store = MemoryContentStore::new();
                OverlayCoordinator::new(&store, options).run(merged)
            }
        }
    }
}

fn drop_module(
    diagnostics: &mut Diagnostics,
    dropped: &mut Vec<String>,
    name: String,
    error: &DocmergeError,
) {
    diagnostics.push(
        Diagnostic::new(DiagnosticKind::ModuleDropped, error.to_string()).with_module(&name),
    );
    dropped.push(name);
}

/// One module's pipeline: build with inheritance, relocate.
fn build_module(
    facts: &ModuleFacts,
    visible: &[ModuleFacts],
    resolve_options: &ResolveOptions,
    relocate_options: &RelocateOptions,
) -> DocmergeResult<Outcome<(String, EntityGraph)>> {
    let inline_docs = facts.inline_docs();

    let built = build_graph_with_references(facts, visible, &inline_docs, resolve_options)?;
    let mut diagnostics = built.diagnostics;

    let relocated = relocate(built.value, relocate_options);
    diagnostics.extend(relocated.diagnostics);

    debug!(module = %facts.module, "module pipeline finished");
    Ok(Outcome::new((facts.module.clone(), relocated.value), diagnostics))
}
