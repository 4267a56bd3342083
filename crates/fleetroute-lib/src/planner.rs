//! Greedy nearest-feasible fleet assignment.
//!
//! Every capable (unit, target) pair is routed and checked, then feasible
//! pairs are walked in ascending route distance (ties by unit id, then target
//! id) and assigned while the target is uncovered and the unit has capacity.
//! The result is deterministic but not globally optimal: a unit may take a
//! target that a later, slightly worse pairing would have needed.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::feasibility::{self, Feasibility, InfeasibleReason};
use crate::fleet::{Capable, Target, Unit, UnitKind};
use crate::graph::NodeId;
use crate::hazard::{GraphView, Severity};
use crate::path::{shortest_path, PathOutcome, Route, WeightKey};

/// How many targets a unit may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AssignmentMode {
    /// One target per unit.
    #[default]
    Exclusive,
    /// Several sorties per unit, each measured from the unit's start node.
    MultiTarget { max_per_unit: Option<usize> },
}

impl AssignmentMode {
    fn capacity(&self) -> Option<usize> {
        match self {
            AssignmentMode::Exclusive => Some(1),
            AssignmentMode::MultiTarget { max_per_unit } => *max_per_unit,
        }
    }
}

/// Planning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannerOptions {
    pub weight: WeightKey,
    /// Hazards at or above this severity are excluded before planning.
    pub threshold: Severity,
    pub assignment: AssignmentMode,
    /// Evaluate pairs on the rayon pool.
    pub parallel: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            weight: WeightKey::Distance,
            threshold: Severity::High,
            assignment: AssignmentMode::Exclusive,
            parallel: true,
        }
    }
}

/// Verdict for one evaluated (unit, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum PairVerdict {
    Feasible,
    Unreachable,
    Infeasible(InfeasibleReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairEvaluation {
    pub unit_id: String,
    pub target: NodeId,
    pub verdict: PairVerdict,
    /// Shortest route, when one exists in the view.
    pub route: Option<Route>,
}

/// Finalised unit-to-target pairing. Only built from feasible routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub unit_id: String,
    pub unit_kind: UnitKind,
    pub target: NodeId,
    pub priority: Option<u32>,
    pub route: Route,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnassignedReason {
    /// No unit in the roster offers the required capability.
    NoCapableUnit,
    /// Capable units exist but none has a feasible route.
    NoFeasibleUnit,
    /// Feasible units exist but all of them were used up by closer targets.
    UnitsExhausted,
}

impl UnassignedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnassignedReason::NoCapableUnit => "NO_CAPABLE_UNIT",
            UnassignedReason::NoFeasibleUnit => "NO_FEASIBLE_UNIT",
            UnassignedReason::UnitsExhausted => "UNITS_EXHAUSTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnassignedTarget {
    pub target: NodeId,
    pub priority: Option<u32>,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnplannableReason {
    /// The start node is not in the terrain graph.
    UnknownStart,
    /// The start node is covered by an excluding hazard.
    StartExcluded,
}

impl UnplannableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnplannableReason::UnknownStart => "UNKNOWN_START",
            UnplannableReason::StartExcluded => "START_EXCLUDED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnplannableUnit {
    pub unit_id: String,
    pub location: NodeId,
    pub reason: UnplannableReason,
}

/// Everything the planner decided, in deterministic order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentPlan {
    pub options: PlannerOptions,
    /// In assignment order (ascending distance, unit id, target id).
    pub assignments: Vec<Assignment>,
    /// In roster order, then target order.
    pub evaluations: Vec<PairEvaluation>,
    /// In target input order.
    pub unassigned: Vec<UnassignedTarget>,
    /// In roster order.
    pub unplannable: Vec<UnplannableUnit>,
}

impl AssignmentPlan {
    /// Pairs that were evaluated but not feasible.
    pub fn rejected(&self) -> impl Iterator<Item = &PairEvaluation> {
        self.evaluations
            .iter()
            .filter(|evaluation| evaluation.verdict != PairVerdict::Feasible)
    }

    pub fn assignment_for(&self, target: &str) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.target == target)
    }
}

/// Assign units to targets over a hazard-filtered view.
///
/// Fails only on structural problems: a target node that does not exist in
/// the terrain graph, or the same node listed as a target twice. Everything
/// else is reported in the plan.
pub fn plan_assignments(
    view: &GraphView<'_>,
    units: &[Unit],
    targets: &[Target],
    options: &PlannerOptions,
) -> Result<AssignmentPlan> {
    let graph = view.graph();

    // 1. Targets must name real, distinct nodes.
    if let Some(missing) = targets.iter().find(|target| !graph.contains(&target.node)) {
        return Err(graph.unknown_node(&missing.node));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = targets.iter().find(|target| !seen.insert(target.node.as_str())) {
        return Err(Error::InvalidTargets {
            message: format!("duplicate target node {}", duplicate.node),
        });
    }

    // 2. Split the roster into plannable and unplannable units.
    let mut plannable = Vec::new();
    let mut unplannable = Vec::new();
    for unit in units {
        let reason = if view.contains(&unit.location) {
            plannable.push(unit);
            continue;
        } else if graph.contains(&unit.location) {
            UnplannableReason::StartExcluded
        } else {
            UnplannableReason::UnknownStart
        };
        tracing::warn!(
            unit = %unit.id,
            location = %unit.location,
            reason = reason.as_str(),
            "unit cannot be planned"
        );
        unplannable.push(UnplannableUnit {
            unit_id: unit.id.clone(),
            location: unit.location.clone(),
            reason,
        });
    }

    // 3. Capability-matched pairs, roster order then target order.
    let pairs: Vec<(&Unit, &Target)> = plannable
        .iter()
        .flat_map(|unit| {
            targets
                .iter()
                .filter(move |target| unit.satisfies(target.capability.as_ref()))
                .map(move |target| (*unit, target))
        })
        .collect();

    // 4. Route and check every pair.
    let evaluations: Vec<PairEvaluation> = if options.parallel {
        pairs
            .par_iter()
            .map(|(unit, target)| evaluate_pair(view, unit, target, options.weight))
            .collect::<Result<_>>()?
    } else {
        pairs
            .iter()
            .map(|(unit, target)| evaluate_pair(view, unit, target, options.weight))
            .collect::<Result<_>>()?
    };

    tracing::debug!(
        units = plannable.len(),
        targets = targets.len(),
        pairs = evaluations.len(),
        parallel = options.parallel,
        "pair evaluation complete"
    );

    // 5. Greedy walk over feasible pairs, nearest first.
    let mut candidates: Vec<(&PairEvaluation, &Route)> = evaluations
        .iter()
        .filter(|evaluation| evaluation.verdict == PairVerdict::Feasible)
        .filter_map(|evaluation| evaluation.route.as_ref().map(|route| (evaluation, route)))
        .collect();
    candidates.sort_by(|(a, a_route), (b, b_route)| compare_candidates(a, a_route, b, b_route));

    let feasible_per_target = candidates.iter().fold(
        HashMap::<&str, usize>::new(),
        |mut counts, (evaluation, _)| {
            *counts.entry(evaluation.target.as_str()).or_default() += 1;
            counts
        },
    );

    let capacity = options.assignment.capacity();
    let mut load: HashMap<&str, usize> = HashMap::new();
    let mut covered: HashSet<&str> = HashSet::new();
    let mut assignments = Vec::new();

    for (evaluation, route) in &candidates {
        if covered.contains(evaluation.target.as_str()) {
            continue;
        }
        let used = load.get(evaluation.unit_id.as_str()).copied().unwrap_or(0);
        if capacity.is_some_and(|limit| used >= limit) {
            continue;
        }

        let Some(unit) = plannable.iter().find(|unit| unit.id == evaluation.unit_id) else {
            continue;
        };
        let target = targets
            .iter()
            .find(|target| target.node == evaluation.target);

        covered.insert(evaluation.target.as_str());
        load.insert(evaluation.unit_id.as_str(), used + 1);

        let alternatives = feasible_per_target
            .get(evaluation.target.as_str())
            .copied()
            .unwrap_or(1);
        let rationale = rationale(unit, route, alternatives);
        tracing::debug!(unit = %unit.id, target = %evaluation.target, %rationale, "assigned");

        assignments.push(Assignment {
            unit_id: unit.id.clone(),
            unit_kind: unit.kind.clone(),
            target: evaluation.target.clone(),
            priority: target.and_then(|target| target.priority),
            route: (*route).clone(),
            rationale,
        });
    }

    // 6. Explain every uncovered target.
    let unassigned = targets
        .iter()
        .filter(|target| !covered.contains(target.node.as_str()))
        .map(|target| {
            let reason = if !units
                .iter()
                .any(|unit| unit.satisfies(target.capability.as_ref()))
            {
                UnassignedReason::NoCapableUnit
            } else if feasible_per_target.contains_key(target.node.as_str()) {
                UnassignedReason::UnitsExhausted
            } else {
                UnassignedReason::NoFeasibleUnit
            };
            UnassignedTarget {
                target: target.node.clone(),
                priority: target.priority,
                reason,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        assigned = assignments.len(),
        unassigned = unassigned.len(),
        unplannable = unplannable.len(),
        "assignment complete"
    );

    Ok(AssignmentPlan {
        options: *options,
        assignments,
        evaluations,
        unassigned,
        unplannable,
    })
}

fn evaluate_pair(
    view: &GraphView<'_>,
    unit: &Unit,
    target: &Target,
    weight: WeightKey,
) -> Result<PairEvaluation> {
    let unreachable = || PairEvaluation {
        unit_id: unit.id.clone(),
        target: target.node.clone(),
        verdict: PairVerdict::Unreachable,
        route: None,
    };

    if view.is_excluded(&target.node) {
        return Ok(unreachable());
    }

    let route = match shortest_path(view, &unit.location, &target.node, weight)? {
        PathOutcome::Found(route) => route,
        PathOutcome::Unreachable { .. } => return Ok(unreachable()),
    };

    let verdict = match feasibility::check(&route, unit) {
        Feasibility::Feasible => PairVerdict::Feasible,
        Feasibility::Infeasible(reason) => PairVerdict::Infeasible(reason),
    };

    Ok(PairEvaluation {
        unit_id: unit.id.clone(),
        target: target.node.clone(),
        verdict,
        route: Some(route),
    })
}

fn compare_candidates(
    a: &PairEvaluation,
    a_route: &Route,
    b: &PairEvaluation,
    b_route: &Route,
) -> Ordering {
    a_route
        .distance
        .total_cmp(&b_route.distance)
        .then_with(|| a.unit_id.cmp(&b.unit_id))
        .then_with(|| a.target.cmp(&b.target))
}

fn rationale(unit: &Unit, route: &Route, alternatives: usize) -> String {
    let energy = route
        .energy
        .map(|energy| format!(", energy {energy:.2}"))
        .unwrap_or_default();
    let others = alternatives.saturating_sub(1);
    let competition = match others {
        0 => "only feasible unit".to_string(),
        1 => "nearest of 2 feasible units".to_string(),
        n => format!("nearest of {} feasible units", n + 1),
    };
    format!(
        "{competition}; {kind} {id} reaches {goal} in {hops} hop(s), distance {distance:.2}{energy}",
        kind = unit.kind,
        id = unit.id,
        goal = route.goal(),
        hops = route.hop_count(),
        distance = route.distance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn line() -> Graph {
        Graph::from_json_str(
            r#"{"nodes": [{"id": "N1"}, {"id": "N2"}, {"id": "N3"}, {"id": "N4"}],
                "edges": [
                    {"source": "N1", "target": "N2", "distance": 10.0},
                    {"source": "N2", "target": "N3", "distance": 15.0},
                    {"source": "N3", "target": "N4", "distance": 5.0}
                ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn exclusive_mode_gives_each_unit_one_target() {
        let graph = line();
        let units = vec![Unit::new("R1", UnitKind::Rover, "N1")];
        let targets = vec![Target::new("N2"), Target::new("N3")];
        let plan =
            plan_assignments(&graph.view(), &units, &targets, &PlannerOptions::default()).unwrap();

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].target, "N2");
        assert_eq!(plan.unassigned[0].target, "N3");
        assert_eq!(plan.unassigned[0].reason, UnassignedReason::UnitsExhausted);
    }

    #[test]
    fn multi_target_mode_respects_cap() {
        let graph = line();
        let units = vec![Unit::new("R1", UnitKind::Rover, "N1")];
        let targets = vec![Target::new("N2"), Target::new("N3"), Target::new("N4")];
        let options = PlannerOptions {
            assignment: AssignmentMode::MultiTarget {
                max_per_unit: Some(2),
            },
            ..PlannerOptions::default()
        };
        let plan = plan_assignments(&graph.view(), &units, &targets, &options).unwrap();

        let assigned: Vec<&str> = plan.assignments.iter().map(|a| a.target.as_str()).collect();
        assert_eq!(assigned, vec!["N2", "N3"]);
        assert_eq!(plan.assignments[1].route.nodes, vec!["N1", "N2", "N3"]);
        assert_eq!(plan.unassigned[0].target, "N4");
    }

    #[test]
    fn units_outside_the_graph_are_unplannable() {
        let graph = line();
        let units = vec![
            Unit::new("R1", UnitKind::Rover, "N99"),
            Unit::new("R2", UnitKind::Rover, "N4"),
        ];
        let plan = plan_assignments(
            &graph.view(),
            &units,
            &[Target::new("N3")],
            &PlannerOptions::default(),
        )
        .unwrap();

        assert_eq!(plan.unplannable.len(), 1);
        assert_eq!(plan.unplannable[0].reason, UnplannableReason::UnknownStart);
        assert_eq!(plan.assignments[0].unit_id, "R2");
    }

    #[test]
    fn unknown_target_is_an_error() {
        let graph = line();
        let err = plan_assignments(
            &graph.view(),
            &[Unit::new("R1", UnitKind::Rover, "N1")],
            &[Target::new("N7")],
            &PlannerOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::UnknownNode { .. }));
    }

    #[test]
    fn rationale_mentions_competition() {
        let graph = line();
        let units = vec![
            Unit::new("R1", UnitKind::Rover, "N1"),
            Unit::new("D1", UnitKind::Drone, "N4"),
        ];
        let plan = plan_assignments(
            &graph.view(),
            &units,
            &[Target::new("N3")],
            &PlannerOptions::default(),
        )
        .unwrap();
        let assignment = plan.assignment_for("N3").unwrap();
        assert_eq!(assignment.unit_id, "D1");
        assert!(assignment.rationale.starts_with("nearest of 2 feasible units"));
        assert!(assignment.rationale.contains("drone D1"));
    }
}
