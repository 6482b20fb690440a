//! Fact file discovery with early directory pruning.
//!
//! Performance optimizations:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel entry filtering via Rayon's `par_bridge`
//!
//! Results are sorted so module order (and with it merge order) does not
//! depend on filesystem iteration order.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::facts::JsonFactFile;

/// Directories to exclude by default.
const EXCLUDED_DIRS: &[&str] = &["target", ".git", "node_modules"];

/// Extension of fact files.
const FACT_EXTENSION: &str = "json";

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Gathers all `*.json` fact files under `root`, sorted by path.
///
/// A `root` that is itself a file is returned as-is.
pub fn gather_fact_files(root: &Path) -> Result<Vec<PathBuf>> {
    gather_fact_files_with_excludes(root, &[])
}

/// Gathers fact files, also pruning directories named in `excludes`.
pub fn gather_fact_files_with_excludes(root: &Path, excludes: &[&str]) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().copied())
        .collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == FACT_EXTENSION) {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to gather fact files from {}", root.display()))?;

    files.sort();
    Ok(files)
}

/// Expand files and directories into fact sources, one per file.
pub fn fact_sources(inputs: &[PathBuf]) -> Result<Vec<JsonFactFile>> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for input in inputs {
        for file in gather_fact_files(input)? {
            if seen.insert(file.clone()) {
                sources.push(JsonFactFile::new(file));
            }
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_fact_tree(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "docmerge_scan_{}_{}",
            label,
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }

        // facts/
        //   core.json
        //   extras/io.json
        //   extras/readme.md
        //   target/stale.json
        let extras = dir.join("extras");
        let target = dir.join("target");
        fs::create_dir_all(&extras).unwrap();
        fs::create_dir_all(&target).unwrap();
        fs::write(dir.join("core.json"), "{}").unwrap();
        fs::write(extras.join("io.json"), "{}").unwrap();
        fs::write(extras.join("readme.md"), "# notes").unwrap();
        fs::write(target.join("stale.json"), "{}").unwrap();

        dir
    }

    #[test]
    fn test_gather_sorted_and_pruned() {
        let dir = create_fact_tree("gather");
        let files = gather_fact_files(&dir).unwrap();

        assert_eq!(files, vec![dir.join("core.json"), dir.join("extras").join("io.json")]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_custom_excludes() {
        let dir = create_fact_tree("excludes");
        let files = gather_fact_files_with_excludes(&dir, &["extras"]).unwrap();

        assert_eq!(files, vec![dir.join("core.json")]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fact_sources_dedup_file_and_dir() {
        let dir = create_fact_tree("sources");
        let inputs = vec![dir.join("core.json"), dir.clone()];
        let sources = fact_sources(&inputs).unwrap();

        let names: Vec<&str> = sources.iter().map(|s| s.path().file_stem().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["core", "io"]);
        fs::remove_dir_all(&dir).ok();
    }
}
