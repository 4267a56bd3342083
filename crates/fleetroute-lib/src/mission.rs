//! Mission input resolution and the single planning entry point.
//!
//! Files are located from explicit configuration only. For each input the
//! resolution order is:
//! 1. An explicit per-file path.
//! 2. The explicit data directory (`--data-dir`).
//! 3. The `FLEETROUTE_DATA_DIR` environment variable.
//! 4. The platform data directory from [`ProjectDirs`].
//!
//! The current working directory is never searched implicitly.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fleet::{load_roster, load_targets, Target, Unit};
use crate::graph::{load_graph, Graph};
use crate::hazard::{filtered_view, hazards_from_graph, load_hazards, Hazard};
use crate::output::PlanReport;
use crate::planner::{plan_assignments, PlannerOptions};

/// Environment variable naming the mission data directory.
pub const DATA_DIR_ENV: &str = "FLEETROUTE_DATA_DIR";

pub const GRAPH_FILENAME: &str = "terrain.json";
/// GraphML terrain export, used when no JSON graph is present.
pub const GRAPHML_FILENAME: &str = "terrain.graphml";
/// Roster file names tried in order inside a data directory.
pub const ROSTER_FILENAMES: [&str; 2] = ["units.json", "units.csv"];
pub const TARGETS_FILENAME: &str = "targets.json";
pub const HAZARDS_FILENAME: &str = "hazards.json";

/// Resolve the platform data directory for mission files.
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("org", "fleetroute", "fleetroute").ok_or(Error::DataDirUnavailable)?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Resolve the data directory: explicit argument, then environment, then the
/// platform default.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_data_dir_from(explicit, env::var_os(DATA_DIR_ENV))
}

fn resolve_data_dir_from(explicit: Option<&Path>, env_value: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env_value.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    default_data_dir()
}

/// Where mission inputs should come from. Unset fields fall back to the data
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionSources {
    pub data_dir: Option<PathBuf>,
    pub graph: Option<PathBuf>,
    pub roster: Option<PathBuf>,
    pub targets: Option<PathBuf>,
    pub hazards: Option<PathBuf>,
}

impl MissionSources {
    /// Sources rooted at a single directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    fn data_dir(&self) -> Result<PathBuf> {
        resolve_data_dir(self.data_dir.as_deref())
    }

    /// Path to the terrain graph; fails when the file does not exist.
    pub fn graph_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.graph {
            return require_file(path.clone());
        }
        let dir = self.data_dir()?;
        [GRAPH_FILENAME, GRAPHML_FILENAME]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::MissionFileMissing {
                path: dir.join(GRAPH_FILENAME),
            })
    }

    pub fn roster_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.roster {
            return require_file(path.clone());
        }
        let dir = self.data_dir()?;
        ROSTER_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::MissionFileMissing {
                path: dir.join(ROSTER_FILENAMES[0]),
            })
    }

    pub fn targets_path(&self) -> Result<PathBuf> {
        let path = match &self.targets {
            Some(path) => path.clone(),
            None => self.data_dir()?.join(TARGETS_FILENAME),
        };
        require_file(path)
    }

    /// Hazard file, if any. An explicit path must exist; the data-directory
    /// default is optional.
    pub fn hazards_path(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.hazards {
            return require_file(path.clone()).map(Some);
        }
        let dir = match self.data_dir() {
            Ok(dir) => dir,
            Err(Error::DataDirUnavailable) => return Ok(None),
            Err(err) => return Err(err),
        };
        let path = dir.join(HAZARDS_FILENAME);
        Ok(path.is_file().then_some(path))
    }

    /// Resolve every mission file.
    pub fn resolve(&self) -> Result<MissionPaths> {
        let paths = MissionPaths {
            graph: self.graph_path()?,
            roster: self.roster_path()?,
            targets: self.targets_path()?,
            hazards: self.hazards_path()?,
        };
        debug!(?paths, "mission files resolved");
        Ok(paths)
    }
}

fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissionFileMissing { path })
    }
}

/// Concrete mission file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionPaths {
    pub graph: PathBuf,
    pub roster: PathBuf,
    pub targets: PathBuf,
    pub hazards: Option<PathBuf>,
}

/// Loaded mission inputs.
#[derive(Debug, Clone)]
pub struct MissionInputs {
    pub graph: Graph,
    pub units: Vec<Unit>,
    pub targets: Vec<Target>,
    /// Hazards from the hazard document only; graph annotations are merged
    /// in by [`MissionInputs::all_hazards`].
    pub hazards: Vec<Hazard>,
}

impl MissionInputs {
    pub fn load(paths: &MissionPaths) -> Result<Self> {
        let graph = load_graph(&paths.graph)?;
        let units = load_roster(&paths.roster)?;
        let targets = load_targets(&paths.targets)?;
        let hazards = match &paths.hazards {
            Some(path) => load_hazards(path)?,
            None => Vec::new(),
        };

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            units = units.len(),
            targets = targets.len(),
            hazards = hazards.len(),
            "mission inputs loaded"
        );

        Ok(Self {
            graph,
            units,
            targets,
            hazards,
        })
    }

    /// Graph-annotated hazards followed by the hazard document.
    pub fn all_hazards(&self) -> Vec<Hazard> {
        let mut hazards = hazards_from_graph(&self.graph);
        hazards.extend(self.hazards.iter().cloned());
        hazards
    }
}

/// Filter hazards, assign units and shape the report.
pub fn plan_mission(inputs: &MissionInputs, options: &PlannerOptions) -> Result<PlanReport> {
    let hazards = inputs.all_hazards();
    let view = filtered_view(&inputs.graph, &hazards, options.threshold);
    let plan = plan_assignments(&view, &inputs.units, &inputs.targets, options)?;
    Ok(PlanReport::from_plan(&plan, &view))
}
