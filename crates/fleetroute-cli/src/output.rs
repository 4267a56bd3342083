//! Output formatting for command results.
//!
//! Everything here writes to stdout; diagnostics go through `tracing` to
//! stderr.

use std::fmt::Write as _;
use std::io::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use fleetroute_lib::{GraphSummary, PlanReport, RenderMode, RouteSummary};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Multi-line human-readable text.
    #[default]
    Text,
    /// One line per item.
    Compact,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    fn render_mode(self) -> RenderMode {
        match self {
            OutputFormat::Compact => RenderMode::Compact,
            _ => RenderMode::PlainText,
        }
    }
}

fn emit(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(text.as_bytes())?;
    handle.flush()?;
    Ok(())
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    emit(&text)
}

/// Print a planning report.
pub fn print_plan(report: &PlanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => emit_json(report),
        other => emit(&report.render(other.render_mode())),
    }
}

/// One `path` query result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathResult {
    Found(RouteSummary),
    Unreachable { start: String, goal: String },
}

/// Print the results of a `path` query.
pub fn print_paths(results: &[PathResult], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return emit_json(&results);
    }

    let mut buffer = String::new();
    for result in results {
        match result {
            PathResult::Found(summary) => buffer.push_str(&summary.render(format.render_mode())),
            PathResult::Unreachable { start, goal } => {
                let _ = writeln!(
                    buffer,
                    "FAILURE: no path from {start} to {goal} in the filtered graph"
                );
            }
        }
    }
    emit(&buffer)
}

/// Graph overview printed by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub graph: GraphSummary,
    pub hazards: usize,
    pub excluded_nodes: Vec<String>,
}

pub fn print_inspect(report: &InspectReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return emit_json(report);
    }

    let summary = &report.graph;
    let mut buffer = String::new();
    let _ = writeln!(
        buffer,
        "Nodes: {}, edges: {} ({} directed, {} without energy)",
        summary.nodes, summary.edges, summary.directed_edges, summary.edges_missing_energy
    );
    if format == OutputFormat::Text {
        let _ = writeln!(buffer, "Terrain:");
        for (terrain, count) in &summary.terrain {
            let _ = writeln!(buffer, "  {terrain}: {count}");
        }
    }
    let _ = writeln!(
        buffer,
        "Hazards: {} ({} annotated on nodes)",
        report.hazards,
        summary.annotated_hazards.len()
    );
    if report.excluded_nodes.is_empty() {
        let _ = writeln!(buffer, "Excluded at threshold: none");
    } else {
        let _ = writeln!(
            buffer,
            "Excluded at threshold: {}",
            report.excluded_nodes.join(", ")
        );
    }
    emit(&buffer)
}
