//! `path`: shortest routes from one node, optionally checked against limits.

use anyhow::{Context, Result};

use fleetroute_lib::feasibility::check_profile;
use fleetroute_lib::{
    filtered_view, shortest_path, ConstraintProfile, MissionSources, PathOutcome, RouteSummary,
    Severity, WeightKey,
};

use super::load_graph_and_hazards;
use crate::output::{print_paths, OutputFormat, PathResult};

/// Arguments for the path command.
#[derive(Debug, Clone)]
pub struct PathCommandArgs {
    pub from: String,
    /// One or more goals.
    pub to: Vec<String>,
    pub weight: WeightKey,
    pub threshold: Severity,
    /// Limits to check each route against; an empty profile skips checking.
    pub limits: ConstraintProfile,
}

impl PathCommandArgs {
    fn has_limits(&self) -> bool {
        self.limits != ConstraintProfile::default()
    }
}

pub fn handle_path_command(
    sources: &MissionSources,
    args: &PathCommandArgs,
    format: OutputFormat,
) -> Result<()> {
    args.limits
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid unit limits")?;

    let (graph, hazards) = load_graph_and_hazards(sources)?;
    let view = filtered_view(&graph, &hazards, args.threshold);

    let mut results = Vec::with_capacity(args.to.len());
    for goal in &args.to {
        let outcome = shortest_path(&view, &args.from, goal, args.weight)
            .with_context(|| format!("failed to route from {} to {goal}", args.from))?;
        let result = match outcome {
            PathOutcome::Found(route) => {
                let mut summary = RouteSummary::from_route(&graph, &route)?;
                if args.has_limits() {
                    summary = summary.with_feasibility(check_profile(&route, &args.limits));
                }
                PathResult::Found(summary)
            }
            PathOutcome::Unreachable { start, goal } => PathResult::Unreachable { start, goal },
        };
        results.push(result);
    }

    print_paths(&results, format)
}
