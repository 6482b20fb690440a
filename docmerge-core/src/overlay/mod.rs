//! Conceptual Overlay Coordinator.
//!
//! Computes a canonical content key per type (and optionally per member) of
//! the merged graph, resolves each key through a [`ContentRegistry`] backed
//! by a [`ContentStore`], and copies authored content into absent overlay
//! fields. Placeholder content is registered in the store but never copied
//! into the graph.
//!
//! Only a [`MergedGraph`] is accepted: running per source graph would let
//! two modules create content for the same placeholder key.

pub mod registry;
pub mod store;

use rayon::prelude::*;
use tracing::info;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Outcome};
use crate::error::DocmergeResult;
use crate::merge::MergedGraph;

pub use registry::{ContentRegistry, RegistryStats};
pub use store::{AuthoredContent, ContentStore, FsContentStore, MemoryContentStore};

/// Overlay settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayOptions {
    /// Also key content per member (`<ns>/<type>/<member>`)
    pub include_members: bool,
}

/// Build the overlay key `<namespace or "global">/<type>[/<member>]`.
///
/// Segments are restricted to `[A-Za-z0-9._-]`; anything else becomes `_`.
pub fn overlay_key(namespace: &str, type_name: &str, member: Option<&str>) -> String {
    let ns = if namespace.is_empty() { "global" } else { namespace };
    let mut key = format!("{}/{}", sanitize(ns), sanitize(type_name));
    if let Some(member) = member {
        key.push('/');
        key.push_str(&sanitize(member));
    }
    key
}

fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone)]
struct Target {
    type_key: String,
    member_key: Option<String>,
    overlay_key: String,
    title: String,
}

/// Runs the overlay once over a merged graph.
pub struct OverlayCoordinator<'s> {
    store: &'s dyn ContentStore,
    registry: ContentRegistry,
    options: OverlayOptions,
}

impl<'s> OverlayCoordinator<'s> {
    pub fn new(store: &'s dyn ContentStore, options: OverlayOptions) -> Self {
        Self {
            store,
            registry: ContentRegistry::new(),
            options,
        }
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    /// Resolve every key and apply authored content.
    pub fn run(&self, mut merged: MergedGraph) -> Outcome<MergedGraph> {
        let targets = self.targets(&merged);

        // Keys resolve in parallel; the registry serialises creation decisions.
        let resolutions: Vec<(&Target, DocmergeResult<AuthoredContent>)> = targets
            .par_iter()
            .map(|t| (t, self.registry.claim(&t.overlay_key, &t.title, self.store)))
            .collect();

        let mut diagnostics = Diagnostics::new();
        let mut applied = 0usize;
        let graph = merged.graph_mut();

        for (target, resolution) in resolutions {
            let content = match resolution {
                Ok(content) => content,
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::OverlayIo, e.to_string())
                            .with_key(target.member_key.as_deref().unwrap_or(&target.type_key)),
                    );
                    continue;
                }
            };
            if content.is_placeholder || content.fields.is_empty() {
                continue;
            }
            let Some(ty) = graph.type_mut(&target.type_key) else {
                continue;
            };
            let docs = match &target.member_key {
                Some(key) => match ty.member_mut(key) {
                    Some(member) => &mut member.docs,
                    None => continue,
                },
                None => &mut ty.docs,
            };
            if docs.overlay.fill_from(&content.fields) {
                applied += 1;
            }
        }

        let stats = self.registry.stats();
        info!(
            keys = stats.keys,
            created = stats.created,
            authored = stats.authored,
            failed = stats.failed,
            applied,
            "overlay complete"
        );
        Outcome::new(merged, diagnostics)
    }

    fn targets(&self, merged: &MergedGraph) -> Vec<Target> {
        let mut targets = Vec::new();
        for ty in merged.types() {
            targets.push(Target {
                type_key: ty.key.clone(),
                member_key: None,
                overlay_key: overlay_key(&ty.namespace, &ty.name, None),
                title: ty.full_name.clone(),
            });
            if !self.options.include_members {
                continue;
            }
            for member in &ty.members {
                targets.push(Target {
                    type_key: ty.key.clone(),
                    member_key: Some(member.key.clone()),
                    overlay_key: overlay_key(&ty.namespace, &ty.name, Some(&member.name)),
                    title: format!("{}.{}", ty.full_name, member.name),
                });
            }
        }
        targets
    }
}

/// One-shot overlay with a fresh registry.
pub fn overlay(
    merged: MergedGraph,
    store: &dyn ContentStore,
    options: OverlayOptions,
) -> Outcome<MergedGraph> {
    OverlayCoordinator::new(store, options).run(merged)
}
