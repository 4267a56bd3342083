//! `inspect`: summarise the terrain graph and the hazards that apply to it.

use anyhow::Result;

use fleetroute_lib::{filtered_view, MissionSources, Severity};

use super::load_graph_and_hazards;
use crate::output::{print_inspect, InspectReport, OutputFormat};

pub fn handle_inspect_command(
    sources: &MissionSources,
    threshold: Severity,
    format: OutputFormat,
) -> Result<()> {
    let (graph, hazards) = load_graph_and_hazards(sources)?;
    let view = filtered_view(&graph, &hazards, threshold);

    let report = InspectReport {
        graph: graph.summary(),
        hazards: hazards.len(),
        excluded_nodes: view.excluded().cloned().collect(),
    };
    print_inspect(&report, format)
}
