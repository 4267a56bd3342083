use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{Edge, NodeId};
use crate::hazard::GraphView;

/// Edge attribute minimised by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightKey {
    /// Geometric distance (default). Energy is summed after the path is fixed.
    #[default]
    Distance,
    /// Energy consumption. Edges without an energy value are not traversable.
    Energy,
}

impl fmt::Display for WeightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            WeightKey::Distance => "distance",
            WeightKey::Energy => "energy",
        };
        f.write_str(value)
    }
}

impl FromStr for WeightKey {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "distance" | "length" => Ok(WeightKey::Distance),
            "energy" => Ok(WeightKey::Energy),
            other => Err(format!(
                "unknown weight key '{other}'; expected distance or energy"
            )),
        }
    }
}

/// Single hop of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLeg {
    pub from: NodeId,
    pub to: NodeId,
    /// Index of the traversed edge in the graph document.
    pub edge: usize,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    pub cumulative_distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_energy: Option<f64>,
}

/// Ordered path with accumulated costs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub weight: WeightKey,
    pub nodes: Vec<NodeId>,
    pub legs: Vec<RouteLeg>,
    pub distance: f64,
    /// Total energy, or `None` when any traversed edge lacks an energy value.
    pub energy: Option<f64>,
}

impl Route {
    /// Zero-length route that stays on `node`.
    pub fn stationary(node: &str, weight: WeightKey) -> Self {
        Self {
            weight,
            nodes: vec![node.to_string()],
            legs: Vec::new(),
            distance: 0.0,
            energy: Some(0.0),
        }
    }

    /// Assemble a route from its start and the edges walked in order.
    pub fn from_edges(start: &str, edges: &[&Edge], weight: WeightKey) -> Self {
        let mut nodes = vec![start.to_string()];
        let mut legs = Vec::with_capacity(edges.len());
        let mut distance = 0.0;
        let mut energy = Some(0.0);
        let mut current = start.to_string();

        for edge in edges {
            let next = edge.opposite(&current).to_string();
            distance += edge.distance;
            energy = energy.zip(edge.energy).map(|(total, hop)| total + hop);
            legs.push(RouteLeg {
                from: current.clone(),
                to: next.clone(),
                edge: edge.index,
                distance: edge.distance,
                energy: edge.energy,
                cumulative_distance: distance,
                cumulative_energy: energy,
            });
            nodes.push(next.clone());
            current = next;
        }

        Self {
            weight,
            nodes,
            legs,
            distance,
            energy,
        }
    }

    pub fn start(&self) -> &str {
        self.nodes.first().map(String::as_str).unwrap_or_default()
    }

    pub fn goal(&self) -> &str {
        self.nodes.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of hops in the route.
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Result of a path query. Unreachability is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathOutcome {
    Found(Route),
    Unreachable { start: NodeId, goal: NodeId },
}

impl PathOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            PathOutcome::Found(route) => Some(route),
            PathOutcome::Unreachable { .. } => None,
        }
    }

    pub fn into_route(self) -> Option<Route> {
        match self {
            PathOutcome::Found(route) => Some(route),
            PathOutcome::Unreachable { .. } => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }
}

/// Minimum-cost path between `start` and `goal` within `view`.
///
/// Both endpoints must be visible in the view; a node removed by hazard
/// filtering is reported as unknown rather than searched in the full graph.
/// Among equal-cost paths the first one discovered wins, with nodes expanded
/// in ascending id order, so results are reproducible.
pub fn shortest_path(
    view: &GraphView<'_>,
    start: &str,
    goal: &str,
    weight: WeightKey,
) -> Result<PathOutcome> {
    view.require(start)?;
    view.require(goal)?;

    if start == goal {
        return Ok(PathOutcome::Found(Route::stationary(start, weight)));
    }

    let mut costs: HashMap<&str, f64> = HashMap::new();
    let mut parents: HashMap<&str, (&str, &Edge)> = HashMap::new();
    let mut settled: HashSet<&str> = HashSet::new();
    let mut queue = BinaryHeap::new();

    let start_node = view
        .graph()
        .node(start)
        .map(|node| node.id.as_str())
        .unwrap_or(start);
    costs.insert(start_node, 0.0);
    queue.push(QueueEntry::new(start_node, 0.0));

    while let Some(entry) = queue.pop() {
        if !settled.insert(entry.node) {
            continue;
        }

        if entry.node == goal {
            let route = reconstruct_route(&parents, start_node, entry.node, weight);
            tracing::debug!(
                start,
                goal,
                %weight,
                hops = route.hop_count(),
                distance = route.distance,
                "path found"
            );
            return Ok(PathOutcome::Found(route));
        }

        for (neighbor, edge) in view.adjacent(entry.node) {
            let next = neighbor.as_str();
            if settled.contains(next) {
                continue;
            }
            let Some(step) = edge.cost(weight) else {
                continue;
            };

            let next_cost = entry.cost.0 + step;
            if next_cost < *costs.get(next).unwrap_or(&f64::INFINITY) {
                costs.insert(next, next_cost);
                parents.insert(next, (entry.node, edge));
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    tracing::debug!(start, goal, %weight, "no path within view");
    Ok(PathOutcome::Unreachable {
        start: start.to_string(),
        goal: goal.to_string(),
    })
}

/// One row of a [`route_matrix`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatrixEntry {
    pub start: NodeId,
    pub goal: NodeId,
    pub outcome: PathOutcome,
}

/// Shortest paths for every start/goal combination, in input order.
///
/// Rows are computed in parallel; the view is shared read-only.
pub fn route_matrix(
    view: &GraphView<'_>,
    starts: &[NodeId],
    goals: &[NodeId],
    weight: WeightKey,
) -> Result<Vec<RouteMatrixEntry>> {
    let pairs: Vec<(&NodeId, &NodeId)> = starts
        .iter()
        .flat_map(|start| goals.iter().map(move |goal| (start, goal)))
        .collect();

    pairs
        .into_par_iter()
        .map(|(start, goal)| {
            shortest_path(view, start, goal, weight).map(|outcome| RouteMatrixEntry {
                start: start.clone(),
                goal: goal.clone(),
                outcome,
            })
        })
        .collect()
}

fn reconstruct_route(
    parents: &HashMap<&str, (&str, &Edge)>,
    start: &str,
    goal: &str,
    weight: WeightKey,
) -> Route {
    let mut edges = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(&(previous, edge)) = parents.get(current) else {
            break;
        };
        edges.push(edge);
        current = previous;
    }
    edges.reverse();
    Route::from_edges(start, &edges, weight)
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry<'a> {
    node: &'a str,
    cost: FloatOrd,
}

impl<'a> QueueEntry<'a> {
    fn new(node: &'a str, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost, then id.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for QueueEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
