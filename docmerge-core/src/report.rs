//! Output formatting - plaintext and JSON.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Outcome};
use crate::graph::GraphStats;
use crate::pipeline::PipelineOutput;

/// Summary of one run, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: String,
    pub modules_built: &'a [String],
    pub modules_dropped: &'a [String],
    pub stats: GraphStats,
    pub diagnostics: Vec<&'a Diagnostic>,
}

impl<'a> RunReport<'a> {
    pub fn new(outcome: &'a Outcome<PipelineOutput>) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            modules_built: &outcome.value.modules_built,
            modules_dropped: &outcome.value.modules_dropped,
            stats: outcome.value.graph.stats(),
            diagnostics: outcome.diagnostics.iter().collect(),
        }
    }

    fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Render a report as plain text.
pub fn render_plain(report: &RunReport<'_>) -> String {
    let s = &report.stats;
    let mut out = String::new();
    out.push_str(&format!(
        "MODULES: {} built, {} dropped\n",
        report.modules_built.len(),
        report.modules_dropped.len()
    ));
    for m in report.modules_dropped {
        out.push_str(&format!("- dropped {}\n", m));
    }
    out.push_str(&format!(
        "GRAPH: {} namespaces, {} types ({} placeholders), {} members ({} inherited, {} extensions), {} parameters\n",
        s.namespaces, s.types, s.placeholders, s.members, s.inherited_members, s.extension_members, s.parameters
    ));

    if report.diagnostics.is_empty() {
        out.push_str("No diagnostics.\n");
        return out;
    }

    out.push_str(&format!("DIAGNOSTICS ({}):\n", report.diagnostics.len()));
    for kind in [
        DiagnosticKind::Structural,
        DiagnosticKind::ModuleDropped,
        DiagnosticKind::Fact,
        DiagnosticKind::MergeConflict,
        DiagnosticKind::UnresolvedExtension,
        DiagnosticKind::OverlayIo,
    ] {
        let n = report.count(kind);
        if n > 0 {
            out.push_str(&format!("  {}: {}\n", kind, n));
        }
    }
    for d in &report.diagnostics {
        out.push_str(&format!("- {}\n", d));
    }
    out
}

/// Prints a run summary in plain text format.
pub fn print_plain(outcome: &Outcome<PipelineOutput>) {
    print!("{}", render_plain(&RunReport::new(outcome)));
}

/// Prints a run summary in JSON format.
///
/// Falls back to a minimal object if serialization fails.
pub fn print_json(outcome: &Outcome<PipelineOutput>) {
    let report = RunReport::new(outcome);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!(
                "{}",
                json!({
                    "generated_at": report.generated_at,
                    "diagnostics": report.diagnostics.len(),
                })
            );
        }
    }
}
