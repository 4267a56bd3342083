//! Hazard model and the hazard-filtered search view.
//!
//! Filtering never touches the loaded [`Graph`]. [`filtered_view`] returns a
//! [`GraphView`] that hides every node covered by a hazard at or above the
//! severity threshold, together with all adjacency through those nodes.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, NodeId};

/// Ordered hazard severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    /// Default exclusion threshold.
    #[default]
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Critical", alias = "CRITICAL")]
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "unknown severity '{other}'; expected low, medium, high or critical"
            )),
        }
    }
}

/// Hazard covering one or more nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hazard {
    pub nodes: Vec<NodeId>,
    pub kind: String,
    pub severity: Severity,
}

impl Hazard {
    pub fn new(nodes: Vec<NodeId>, kind: impl Into<String>, severity: Severity) -> Self {
        Self {
            nodes,
            kind: kind.into(),
            severity,
        }
    }

    /// Whether this hazard removes its nodes at the given threshold.
    pub fn excludes_at(&self, threshold: Severity) -> bool {
        self.severity >= threshold
    }
}

#[derive(Debug, Deserialize)]
struct HazardRecord {
    #[serde(default)]
    node: Option<String>,
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default, alias = "type", alias = "hazard_type")]
    kind: Option<String>,
    severity: Option<Severity>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HazardDocument {
    Wrapped { hazards: Vec<HazardRecord> },
    List(Vec<HazardRecord>),
}

/// Parse a hazard list from JSON (either a bare list or `{"hazards": [...]}`).
pub fn hazards_from_json_str(json: &str) -> Result<Vec<Hazard>> {
    let document: HazardDocument = serde_json::from_str(json).map_err(|err| {
        Error::InvalidHazards {
            message: format!("unreadable hazard document: {err}"),
        }
    })?;
    let records = match document {
        HazardDocument::Wrapped { hazards } => hazards,
        HazardDocument::List(list) => list,
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let mut nodes = record.nodes;
            if let Some(node) = record.node {
                nodes.insert(0, node);
            }
            nodes.retain(|id| !id.trim().is_empty());
            if nodes.is_empty() {
                return Err(Error::InvalidHazards {
                    message: format!("hazard #{index} does not name any node"),
                });
            }
            let severity = record.severity.ok_or_else(|| Error::InvalidHazards {
                message: format!("hazard #{index} has no severity"),
            })?;
            Ok(Hazard {
                nodes,
                kind: record.kind.unwrap_or_else(|| "unspecified".to_string()),
                severity,
            })
        })
        .collect()
}

/// Load a hazard list from a JSON file.
pub fn load_hazards(path: &Path) -> Result<Vec<Hazard>> {
    let contents = fs::read_to_string(path)?;
    hazards_from_json_str(&contents)
}

/// Hazards implied by `hazard`/`severity` annotations on graph nodes.
///
/// A node with a hazard tag but no severity is treated as `low`, so it is
/// reported but only excluded when the threshold is `low`.
pub fn hazards_from_graph(graph: &Graph) -> Vec<Hazard> {
    graph
        .nodes()
        .filter(|node| node.hazard.is_some() || node.severity.is_some())
        .map(|node| Hazard {
            nodes: vec![node.id.clone()],
            kind: node
                .hazard
                .clone()
                .unwrap_or_else(|| "unspecified".to_string()),
            severity: node.severity.unwrap_or(Severity::Low),
        })
        .collect()
}

/// Read-only search view over a [`Graph`] with some nodes excluded.
#[derive(Debug, Clone)]
pub struct GraphView<'g> {
    graph: &'g Graph,
    excluded: BTreeSet<NodeId>,
}

impl PartialEq for GraphView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.excluded == other.excluded
    }
}

impl Eq for GraphView<'_> {}

impl Graph {
    /// Unfiltered view over the whole graph.
    pub fn view(&self) -> GraphView<'_> {
        GraphView {
            graph: self,
            excluded: BTreeSet::new(),
        }
    }
}

impl<'g> GraphView<'g> {
    /// Underlying graph.
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Whether the node is part of this view.
    pub fn contains(&self, id: &str) -> bool {
        self.graph.contains(id) && !self.excluded.contains(id)
    }

    /// Whether the node exists in the graph but was filtered out.
    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    /// Excluded node ids in ascending order.
    pub fn excluded(&self) -> impl Iterator<Item = &NodeId> {
        self.excluded.iter()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Number of nodes visible through the view.
    pub fn node_count(&self) -> usize {
        self.graph.node_count() - self.excluded.len()
    }

    /// Fail with [`Error::UnknownNode`] unless the node is visible.
    pub fn require(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(self.graph.unknown_node(id))
        }
    }

    /// Visible neighbours of a visible node.
    pub fn neighbors(&self, id: &str) -> Result<Vec<(&'g NodeId, &'g Edge)>> {
        self.require(id)?;
        Ok(self.adjacent(id).collect())
    }

    pub(crate) fn adjacent(&self, id: &str) -> impl Iterator<Item = (&'g NodeId, &'g Edge)> + '_ {
        self.graph
            .adjacent(id)
            .filter(move |(neighbor, _)| !self.excluded.contains(neighbor.as_str()))
    }

    /// Narrow this view further by the given hazards.
    pub fn filtered(&self, hazards: &[Hazard], threshold: Severity) -> GraphView<'g> {
        let mut excluded = self.excluded.clone();
        for hazard in hazards.iter().filter(|h| h.excludes_at(threshold)) {
            for node in &hazard.nodes {
                if self.graph.contains(node) {
                    excluded.insert(node.clone());
                } else {
                    tracing::warn!(
                        node = %node,
                        kind = %hazard.kind,
                        "hazard references a node outside the terrain graph; ignoring"
                    );
                }
            }
        }

        tracing::debug!(
            threshold = %threshold,
            excluded = excluded.len(),
            "hazard filter applied"
        );

        GraphView {
            graph: self.graph,
            excluded,
        }
    }
}

/// Derive the hazard-filtered search view for a planning run.
pub fn filtered_view<'g>(
    graph: &'g Graph,
    hazards: &[Hazard],
    threshold: Severity,
) -> GraphView<'g> {
    graph.view().filtered(hazards, threshold)
}
