//! Configuration loading from docmerge.toml.
//!
//! ```toml
//! [visibility]
//! allowed = ["public", "protected"]
//!
//! [inheritance]
//! include_universal_base_members = true
//! universal_base_type = "System.Object"
//!
//! [extensions]
//! synthesize_placeholders = true
//!
//! [overlay]
//! include_members = false
//! content_dir = "docs/conceptual"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::{fs, path::Path};

use crate::common::{Visibility, VisibilityFilter};
use crate::inheritance::{ResolveOptions, DEFAULT_UNIVERSAL_BASE};
use crate::overlay::OverlayOptions;
use crate::relocate::RelocateOptions;

/// Config file name looked up in the project root.
pub const CONFIG_FILE: &str = "docmerge.toml";

/// Main configuration structure for docmerge.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocmergeConfig {
    pub visibility: VisibilityConfig,
    pub inheritance: InheritanceConfig,
    pub extensions: ExtensionsConfig,
    pub overlay: OverlayConfig,
}

/// Which visibility levels enter the graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub allowed: Vec<Visibility>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            allowed: vec![Visibility::Public],
        }
    }
}

/// Inherited member handling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InheritanceConfig {
    pub include_universal_base_members: bool,
    pub universal_base_type: String,
}

impl Default for InheritanceConfig {
    fn default() -> Self {
        Self {
            include_universal_base_members: true,
            universal_base_type: DEFAULT_UNIVERSAL_BASE.to_string(),
        }
    }
}

/// Extension relocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub synthesize_placeholders: bool,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            synthesize_placeholders: true,
        }
    }
}

/// Conceptual content overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub include_members: bool,
    /// Directory of authored markdown content
    pub content_dir: Option<PathBuf>,
}

impl DocmergeConfig {
    /// Parse configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid docmerge.toml")
    }

    pub fn visibility_filter(&self) -> VisibilityFilter {
        VisibilityFilter::new(self.visibility.allowed.iter().copied())
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            filter: self.visibility_filter(),
            include_universal_base_members: self.inheritance.include_universal_base_members,
            universal_base_type: self.inheritance.universal_base_type.clone(),
        }
    }

    pub fn relocate_options(&self) -> RelocateOptions {
        RelocateOptions {
            synthesize_placeholders: self.extensions.synthesize_placeholders,
        }
    }

    pub fn overlay_options(&self) -> OverlayOptions {
        OverlayOptions {
            include_members: self.overlay.include_members,
        }
    }
}

/// Loads configuration from docmerge.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<DocmergeConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = DocmergeConfig::from_toml_str(&content)?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DocmergeConfig::default();
        assert!(cfg.visibility_filter().allows(Visibility::Public));
        assert!(!cfg.visibility_filter().allows(Visibility::Internal));
        assert!(cfg.inheritance.include_universal_base_members);
        assert_eq!(cfg.inheritance.universal_base_type, "System.Object");
        assert!(cfg.extensions.synthesize_placeholders);
        assert!(!cfg.overlay.include_members);
        assert!(cfg.overlay.content_dir.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let cfg = DocmergeConfig::from_toml_str(
            r#"
            [visibility]
            allowed = ["public", "protected"]

            [overlay]
            content_dir = "docs/conceptual"
            "#,
        )
        .unwrap();

        let filter = cfg.visibility_filter();
        assert!(filter.allows(Visibility::Protected));
        assert_eq!(cfg.overlay.content_dir, Some(PathBuf::from("docs/conceptual")));
        assert!(cfg.extensions.synthesize_placeholders);
        assert_eq!(cfg.resolve_options().universal_base_type, "System.Object");
    }

    #[test]
    fn test_invalid_visibility_rejected() {
        let err = DocmergeConfig::from_toml_str("[visibility]\nallowed = [\"friend\"]\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = std::env::temp_dir().join(format!("docmerge_cfg_missing_{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        assert!(load_config(&dir).unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = std::env::temp_dir().join(format!("docmerge_cfg_read_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(CONFIG_FILE),
            "[extensions]\nsynthesize_placeholders = false\n",
        )
        .unwrap();

        let cfg = load_config(&dir).unwrap().unwrap();
        assert!(!cfg.relocate_options().synthesize_placeholders);
        let _ = fs::remove_dir_all(&dir);
    }
}
