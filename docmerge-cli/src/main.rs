//! docmerge CLI - builds one merged documentation model from per-module facts.
//!
//! Features:
//! - Fact file discovery (files or directories of `*.json`)
//! - Rayon-powered per-module pipelines
//! - Extension relocation with external placeholders
//! - Conceptual content overlay from a markdown directory

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use docmerge_core::{
    fact_sources, init_structured_logging, load_config, print_json, print_plain, Docmerge,
    DocmergeConfig, DocmergeError, Visibility,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Documentation model builder and merger")]
pub struct Cli {
    /// Fact files or directories containing them
    #[arg(default_value = ".", num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Fact files or directories of modules that are inherited from but not documented
    #[arg(long = "reference", value_name = "PATH")]
    references: Vec<PathBuf>,

    /// Path to a docmerge.toml (default: ./docmerge.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of authored conceptual content
    #[arg(long, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Comma-separated visibility levels to document (e.g. public,protected)
    #[arg(long, value_delimiter = ',')]
    visibility: Vec<String>,

    /// Do not inherit members of the universal base type
    #[arg(long)]
    exclude_universal_base: bool,

    /// Leave extensions on unknown types in place instead of synthesizing placeholders
    #[arg(long)]
    no_placeholders: bool,

    /// Also key conceptual content per member
    #[arg(long)]
    overlay_members: bool,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Write the merged graph as JSON to a file (debug dump)
    #[arg(long, value_name = "FILE")]
    emit_graph: Option<String>,
}

/// Security: Validates output file paths to prevent path traversal attacks.
///
/// Rejects:
/// - Absolute paths (must be relative to current directory)
/// - Paths containing `..` (parent directory traversal)
/// - Paths with null bytes (injection attacks)
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);

    if p.is_absolute() {
        return Err(anyhow!(
            "Output path must be relative, not absolute: {}",
            path
        ));
    }

    for component in p.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(anyhow!(
                "Path traversal (..) not allowed in output paths: {}",
                path
            ));
        }
    }

    let normalized = path.replace('\\', "/");
    if normalized.contains("/../") || normalized.starts_with("../") {
        return Err(anyhow!("Path traversal attempt detected: {}", path));
    }

    Ok(p)
}

/// Loads the explicit config file, or `./docmerge.toml`, or defaults.
fn resolve_config(explicit: Option<&Path>) -> Result<DocmergeConfig> {
    match explicit {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            DocmergeConfig::from_toml_str(&text)
        }
        None => Ok(load_config(Path::new("."))?.unwrap_or_default()),
    }
}

/// Applies command-line overrides on top of the file configuration.
fn apply_overrides(mut config: DocmergeConfig, cli: &Cli) -> Result<DocmergeConfig> {
    if !cli.visibility.is_empty() {
        config.visibility.allowed = cli
            .visibility
            .iter()
            .map(|v| v.parse::<Visibility>().map_err(|e| anyhow!(e)))
            .collect::<Result<Vec<_>>>()?;
    }
    if cli.exclude_universal_base {
        config.inheritance.include_universal_base_members = false;
    }
    if cli.no_placeholders {
        config.extensions.synthesize_placeholders = false;
    }
    if cli.overlay_members {
        config.overlay.include_members = true;
    }
    if let Some(dir) = &cli.content_dir {
        config.overlay.content_dir = Some(dir.clone());
    }
    Ok(config)
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] docmerge internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    let config = apply_overrides(resolve_config(cli.config.as_deref())?, &cli)?;
    let sources = fact_sources(&cli.inputs).context("Failed to discover fact files")?;
    if sources.is_empty() {
        eprintln!("[ERROR] No fact files found in the given inputs.");
        std::process::exit(2);
    }

    let references =
        fact_sources(&cli.references).context("Failed to discover reference fact files")?;

    let outcome = match Docmerge::new(config)
        .sources(sources)
        .references(references)
        .run()
    {
        Ok(outcome) => outcome,
        Err(DocmergeError::NoModulesBuilt { failed }) => {
            eprintln!("[ERROR] No module could be built ({} failed).", failed);
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Documentation run failed"),
    };

    if let Some(ref file) = cli.emit_graph {
        match validate_output_path(file) {
            Ok(safe_path) => {
                let json = serde_json::to_string_pretty(&outcome.value.graph)?;
                if let Err(e) = fs::write(&safe_path, json) {
                    eprintln!("[WARN] Graph write failed to {}: {}", safe_path.display(), e);
                } else {
                    eprintln!("Graph saved to: {}", safe_path.display());
                }
            }
            Err(e) => {
                eprintln!("[ERROR] Invalid output path: {}", e);
                std::process::exit(2);
            }
        }
    }

    if cli.json {
        print_json(&outcome);
    } else {
        print_plain(&outcome);
    }

    std::process::exit(if outcome.diagnostics.is_empty() { 0 } else { 1 });
}
