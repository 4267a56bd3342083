//! `plan`: assign the roster to the target list.

use anyhow::{Context, Result};

use fleetroute_lib::{plan_mission, MissionInputs, MissionSources, PlannerOptions};

use crate::output::{print_plan, OutputFormat};

pub fn handle_plan_command(
    sources: &MissionSources,
    options: &PlannerOptions,
    format: OutputFormat,
) -> Result<()> {
    let paths = sources
        .resolve()
        .context("failed to locate mission files")?;
    let inputs = MissionInputs::load(&paths).context("failed to load mission inputs")?;

    tracing::info!(
        weight = %options.weight,
        threshold = %options.threshold,
        parallel = options.parallel,
        "planning assignments"
    );
    let report = plan_mission(&inputs, options).context("planning failed")?;
    tracing::info!(
        assigned = report.summary.assigned,
        unassigned = report.summary.unassigned,
        "plan complete"
    );

    print_plan(&report, format)
}
