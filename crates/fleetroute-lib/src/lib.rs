//! Fleetroute library entry points.
//!
//! This crate loads a terrain graph, derives hazard-filtered views, computes
//! shortest paths, checks them against unit limits and assigns units to
//! targets. Consumers (the CLI) should only depend on the items exported here
//! instead of reimplementing behavior.

#![deny(warnings)]

pub mod error;
pub mod feasibility;
pub mod fleet;
pub mod graph;
pub mod graphml;
pub mod hazard;
pub mod mission;
pub mod output;
pub mod path;
pub mod planner;

pub use error::{Error, Result};
pub use feasibility::{check, Feasibility, InfeasibleReason, FEASIBILITY_TOLERANCE};
pub use fleet::{
    load_roster, load_targets, Capability, Capable, ConstraintProfile, Target, Unit, UnitKind,
};
pub use graph::{load_graph, Edge, Graph, GraphDocument, GraphSummary, Node, NodeId};
pub use hazard::{filtered_view, hazards_from_graph, load_hazards, GraphView, Hazard, Severity};
pub use mission::{plan_mission, MissionInputs, MissionPaths, MissionSources};
pub use output::{PlanReport, RenderMode, RouteSummary};
pub use path::{route_matrix, shortest_path, PathOutcome, Route, RouteLeg, WeightKey};
pub use planner::{
    plan_assignments, Assignment, AssignmentMode, AssignmentPlan, PlannerOptions,
    UnassignedReason, UnplannableReason,
};
