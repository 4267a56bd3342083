//! Subcommand handlers. `main.rs` parses arguments and dispatches here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use fleetroute_lib::{hazards_from_graph, load_graph, load_hazards, Graph, Hazard, MissionSources};

pub mod inspect;
pub mod path;
pub mod plan;

/// Per-file overrides for mission inputs.
#[derive(Debug, Clone, Default, Args)]
pub struct MissionFileArgs {
    /// Terrain graph file, JSON or GraphML (default: <data-dir>/terrain.json, then terrain.graphml).
    #[arg(long)]
    pub graph: Option<PathBuf>,
    /// Unit roster, JSON or CSV (default: <data-dir>/units.json or units.csv).
    #[arg(long)]
    pub units: Option<PathBuf>,
    /// Target list (default: <data-dir>/targets.json).
    #[arg(long)]
    pub targets: Option<PathBuf>,
    /// Hazard list (default: <data-dir>/hazards.json when present).
    #[arg(long)]
    pub hazards: Option<PathBuf>,
}

impl MissionFileArgs {
    pub fn sources(&self, data_dir: Option<&Path>) -> MissionSources {
        MissionSources {
            data_dir: data_dir.map(Path::to_path_buf),
            graph: self.graph.clone(),
            roster: self.units.clone(),
            targets: self.targets.clone(),
            hazards: self.hazards.clone(),
        }
    }
}

/// Load the terrain graph and every known hazard (node annotations first).
pub(crate) fn load_graph_and_hazards(sources: &MissionSources) -> Result<(Graph, Vec<Hazard>)> {
    let graph_path = sources
        .graph_path()
        .context("failed to locate the terrain graph")?;
    let graph = load_graph(&graph_path)
        .with_context(|| format!("failed to load terrain graph from {}", graph_path.display()))?;

    let mut hazards = hazards_from_graph(&graph);
    if let Some(path) = sources
        .hazards_path()
        .context("failed to locate the hazard list")?
    {
        let listed = load_hazards(&path)
            .with_context(|| format!("failed to load hazards from {}", path.display()))?;
        hazards.extend(listed);
    }
    Ok((graph, hazards))
}
