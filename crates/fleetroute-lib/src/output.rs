use std::fmt::Write;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::feasibility::Feasibility;
use crate::fleet::UnitKind;
use crate::graph::{Graph, NodeId, UNKNOWN_TERRAIN};
use crate::hazard::{GraphView, Severity};
use crate::path::{Route, RouteLeg, WeightKey};
use crate::planner::{
    AssignmentMode, AssignmentPlan, PairVerdict, UnassignedTarget, UnplannableUnit,
};

/// Presentation style for text renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Multi-line report with every section.
    #[default]
    PlainText,
    /// One line per assignment plus a summary line.
    Compact,
}

/// Step along a rendered route.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteStep {
    pub index: usize,
    pub id: NodeId,
    pub terrain: String,
    pub cumulative_distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_energy: Option<f64>,
}

/// Structured single-route summary, as printed by the `path` command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub weight: WeightKey,
    pub hops: usize,
    pub start: NodeId,
    pub goal: NodeId,
    pub distance: f64,
    pub energy: Option<f64>,
    pub steps: Vec<RouteStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feasibility: Option<Feasibility>,
}

impl RouteSummary {
    /// Convert a [`Route`] into a summary with terrain resolved from the graph.
    pub fn from_route(graph: &Graph, route: &Route) -> Result<Self> {
        let (Some(start), Some(goal)) = (route.nodes.first(), route.nodes.last()) else {
            return Err(Error::EmptyRoute);
        };

        let terrain = |id: &str| {
            graph
                .node(id)
                .map(|node| node.terrain.clone())
                .unwrap_or_else(|| UNKNOWN_TERRAIN.to_string())
        };

        let mut steps = vec![RouteStep {
            index: 0,
            id: start.clone(),
            terrain: terrain(start),
            cumulative_distance: 0.0,
            cumulative_energy: Some(0.0),
        }];
        steps.extend(route.legs.iter().enumerate().map(|(offset, leg)| RouteStep {
            index: offset + 1,
            id: leg.to.clone(),
            terrain: terrain(&leg.to),
            cumulative_distance: leg.cumulative_distance,
            cumulative_energy: leg.cumulative_energy,
        }));

        Ok(Self {
            weight: route.weight,
            hops: route.hop_count(),
            start: start.clone(),
            goal: goal.clone(),
            distance: route.distance,
            energy: route.energy,
            steps,
            feasibility: None,
        })
    }

    /// Attach the result of a feasibility check.
    pub fn with_feasibility(mut self, feasibility: Feasibility) -> Self {
        self.feasibility = Some(feasibility);
        self
    }

    /// Render the summary using the requested textual mode.
    pub fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::PlainText => self.render_plain(),
            RenderMode::Compact => self.render_compact(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route: {} -> {} ({} hops, weight: {})",
            self.start, self.goal, self.hops, self.weight
        );
        for step in &self.steps {
            let _ = writeln!(
                buffer,
                "{:>3}: {} [{}] {:.2}",
                step.index, step.id, step.terrain, step.cumulative_distance
            );
        }
        let _ = writeln!(
            buffer,
            "Total distance: {:.2}, energy: {}",
            self.distance,
            format_energy(self.energy)
        );
        if let Some(line) = self.feasibility_line() {
            let _ = writeln!(buffer, "{line}");
        }
        buffer
    }

    fn render_compact(&self) -> String {
        let mut buffer = self
            .steps
            .iter()
            .map(|step| step.id.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        let _ = write!(buffer, " ({:.2})", self.distance);
        if let Some(line) = self.feasibility_line() {
            let _ = write!(buffer, " {line}");
        }
        buffer.push('\n');
        buffer
    }

    fn feasibility_line(&self) -> Option<String> {
        self.feasibility.map(|feasibility| match feasibility {
            Feasibility::Feasible => "SUCCESS: route is within unit limits".to_string(),
            Feasibility::Infeasible(reason) => format!("FAILURE: {} {reason}", reason.code()),
        })
    }
}

/// Assignment as shown in a [`PlanReport`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssignmentRecord {
    pub unit: String,
    pub unit_kind: UnitKind,
    pub target: NodeId,
    pub priority: Option<u32>,
    pub route: Vec<NodeId>,
    pub legs: Vec<RouteLeg>,
    pub distance: f64,
    pub energy: Option<f64>,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Unreachable,
    Infeasible,
}

/// Evaluated pair that could not be used.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RejectedPair {
    pub unit: String,
    pub target: NodeId,
    pub outcome: RejectionKind,
    pub code: Option<&'static str>,
    pub diagnostic: String,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct PlanSummary {
    pub targets: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub evaluated_pairs: usize,
    pub rejected_pairs: usize,
    pub unplannable_units: usize,
    pub excluded_nodes: usize,
}

/// Serialisable outcome of a planning run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanReport {
    pub weight: WeightKey,
    pub threshold: Severity,
    pub assignment_mode: AssignmentMode,
    pub summary: PlanSummary,
    pub assignments: Vec<AssignmentRecord>,
    pub rejected: Vec<RejectedPair>,
    pub unassigned: Vec<UnassignedTarget>,
    pub unplannable: Vec<UnplannableUnit>,
    pub excluded_nodes: Vec<NodeId>,
}

impl PlanReport {
    pub fn from_plan(plan: &AssignmentPlan, view: &GraphView<'_>) -> Self {
        let assignments = plan
            .assignments
            .iter()
            .map(|assignment| AssignmentRecord {
                unit: assignment.unit_id.clone(),
                unit_kind: assignment.unit_kind.clone(),
                target: assignment.target.clone(),
                priority: assignment.priority,
                route: assignment.route.nodes.clone(),
                legs: assignment.route.legs.clone(),
                distance: assignment.route.distance,
                energy: assignment.route.energy,
                rationale: assignment.rationale.clone(),
            })
            .collect::<Vec<_>>();

        let rejected = plan
            .rejected()
            .map(|evaluation| {
                let distance = evaluation.route.as_ref().map(|route| route.distance);
                match &evaluation.verdict {
                    PairVerdict::Infeasible(reason) => RejectedPair {
                        unit: evaluation.unit_id.clone(),
                        target: evaluation.target.clone(),
                        outcome: RejectionKind::Infeasible,
                        code: Some(reason.code()),
                        diagnostic: reason.to_string(),
                        distance,
                    },
                    _ => RejectedPair {
                        unit: evaluation.unit_id.clone(),
                        target: evaluation.target.clone(),
                        outcome: RejectionKind::Unreachable,
                        code: None,
                        diagnostic: if view.is_excluded(&evaluation.target) {
                            format!("target {} is excluded by hazards", evaluation.target)
                        } else {
                            format!(
                                "no path from the unit start to {} in the filtered graph",
                                evaluation.target
                            )
                        },
                        distance,
                    },
                }
            })
            .collect::<Vec<_>>();

        let excluded_nodes = view.excluded().cloned().collect::<Vec<_>>();

        let summary = PlanSummary {
            targets: assignments.len() + plan.unassigned.len(),
            assigned: assignments.len(),
            unassigned: plan.unassigned.len(),
            evaluated_pairs: plan.evaluations.len(),
            rejected_pairs: rejected.len(),
            unplannable_units: plan.unplannable.len(),
            excluded_nodes: excluded_nodes.len(),
        };

        Self {
            weight: plan.options.weight,
            threshold: plan.options.threshold,
            assignment_mode: plan.options.assignment,
            summary,
            assignments,
            rejected,
            unassigned: plan.unassigned.clone(),
            unplannable: plan.unplannable.clone(),
            excluded_nodes,
        }
    }

    /// Canonical JSON encoding.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::PlainText => self.render_plain(),
            RenderMode::Compact => self.render_compact(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let mode = match self.assignment_mode {
            AssignmentMode::Exclusive => "exclusive".to_string(),
            AssignmentMode::MultiTarget { max_per_unit: None } => "multi-target".to_string(),
            AssignmentMode::MultiTarget {
                max_per_unit: Some(max),
            } => format!("multi-target, max {max} per unit"),
        };
        let _ = writeln!(
            buffer,
            "Fleet plan (weight: {}, threshold: {}, mode: {mode})",
            self.weight, self.threshold
        );

        let _ = writeln!(buffer, "Assignments ({}):", self.assignments.len());
        for record in &self.assignments {
            let priority = record
                .priority
                .map(|p| format!(" [priority {p}]"))
                .unwrap_or_default();
            let _ = writeln!(
                buffer,
                "  {} ({}) -> {}{priority}: {}",
                record.unit,
                record.unit_kind,
                record.target,
                record.route.join(" -> ")
            );
            let _ = writeln!(
                buffer,
                "      distance {:.2}, energy {}",
                record.distance,
                format_energy(record.energy)
            );
            let _ = writeln!(buffer, "      {}", record.rationale);
        }

        if !self.rejected.is_empty() {
            let _ = writeln!(buffer, "Rejected pairs ({}):", self.rejected.len());
            for pair in &self.rejected {
                let code = pair.code.unwrap_or("UNREACHABLE");
                let _ = writeln!(
                    buffer,
                    "  {} -> {}: {code} {}",
                    pair.unit, pair.target, pair.diagnostic
                );
            }
        }

        if !self.unassigned.is_empty() {
            let _ = writeln!(buffer, "Unassigned targets ({}):", self.unassigned.len());
            for target in &self.unassigned {
                let _ = writeln!(buffer, "  {}: {}", target.target, target.reason.as_str());
            }
        }

        if !self.unplannable.is_empty() {
            let _ = writeln!(buffer, "Unplannable units ({}):", self.unplannable.len());
            for unit in &self.unplannable {
                let _ = writeln!(
                    buffer,
                    "  {} at {}: {}",
                    unit.unit_id,
                    unit.location,
                    unit.reason.as_str()
                );
            }
        }

        if !self.excluded_nodes.is_empty() {
            let _ = writeln!(buffer, "Excluded nodes: {}", self.excluded_nodes.join(", "));
        }

        let _ = writeln!(buffer, "{}", self.summary_line());
        buffer
    }

    fn render_compact(&self) -> String {
        let mut buffer = String::new();
        for record in &self.assignments {
            let _ = writeln!(
                buffer,
                "{} -> {} ({:.2})",
                record.unit, record.target, record.distance
            );
        }
        for target in &self.unassigned {
            let _ = writeln!(buffer, "- -> {} ({})", target.target, target.reason.as_str());
        }
        let _ = writeln!(buffer, "{}", self.summary_line());
        buffer
    }

    fn summary_line(&self) -> String {
        format!(
            "Summary: {} of {} targets assigned, {} pairs evaluated, {} rejected, {} excluded nodes",
            self.summary.assigned,
            self.summary.targets,
            self.summary.evaluated_pairs,
            self.summary.rejected_pairs,
            self.summary.excluded_nodes
        )
    }
}

fn format_energy(energy: Option<f64>) -> String {
    energy
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "unknown".to_string())
}
