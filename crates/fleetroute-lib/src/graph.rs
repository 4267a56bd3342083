//! Terrain graph model.
//!
//! A [`Graph`] is loaded once per planning run from a [`GraphDocument`] and is
//! read-only afterwards. Hazard exclusion never edits the graph; it produces a
//! [`crate::GraphView`] instead.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hazard::Severity;
use crate::path::WeightKey;

/// Identifier of a terrain node (for example `"N52"`).
pub type NodeId = String;

/// Terrain tag used when a node document omits one.
pub const UNKNOWN_TERRAIN: &str = "unknown";

/// Minimum Jaro-Winkler similarity for a node id to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Location within the terrain graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub terrain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Traversable connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// Position of the edge in the source document.
    pub index: usize,
    pub source: NodeId,
    pub target: NodeId,
    pub distance: f64,
    /// Energy needed to traverse the edge. `None` means unknown, not free.
    pub energy: Option<f64>,
    pub directed: bool,
}

impl Edge {
    /// Cost of the edge under the given weight key, if defined.
    pub fn cost(&self, weight: WeightKey) -> Option<f64> {
        match weight {
            WeightKey::Distance => Some(self.distance),
            WeightKey::Energy => self.energy,
        }
    }

    /// Endpoint reached when leaving `from` along this edge.
    pub fn opposite(&self, from: &str) -> &str {
        if self.source == from {
            &self.target
        } else {
            &self.source
        }
    }
}

#[derive(Debug, Clone)]
struct Adjacent {
    neighbor: NodeId,
    edge: usize,
}

/// Serialized terrain graph as produced by the map exporters.
///
/// Field aliases accept the node-link layout written by map exporters
/// (`links`, `terrain_type`, `from`/`to`). GraphML exports are converted into
/// this shape by [`Graph::from_graphml_str`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphDocument {
    /// Default directedness for edges that do not specify their own.
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, alias = "links")]
    pub edges: Vec<EdgeRecord>,
}

/// Node entry inside a [`GraphDocument`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "terrain_type")]
    pub terrain: Option<String>,
    #[serde(default)]
    pub hazard: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Edge entry inside a [`GraphDocument`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EdgeRecord {
    #[serde(default, alias = "from")]
    pub source: Option<String>,
    #[serde(default, alias = "to")]
    pub target: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    /// Exporter name for `distance`; read only when `distance` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub directed: Option<bool>,
}

/// In-memory terrain graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    adjacency: BTreeMap<NodeId, Vec<Adjacent>>,
}

impl Graph {
    /// Build a graph from a parsed document, validating its integrity.
    pub fn from_document(document: GraphDocument) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        for (position, record) in document.nodes.into_iter().enumerate() {
            let id = required_id(record.id, || format!("node #{position} has no id"))?;
            if nodes.contains_key(&id) {
                return Err(Error::malformed(format!("duplicate node id {id}")));
            }
            let terrain = record
                .terrain
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TERRAIN.to_string());
            nodes.insert(
                id.clone(),
                Node {
                    id,
                    terrain,
                    hazard: record.hazard,
                    severity: record.severity,
                },
            );
        }

        let mut adjacency: BTreeMap<NodeId, Vec<Adjacent>> =
            nodes.keys().map(|id| (id.clone(), Vec::new())).collect();
        let mut edges = Vec::with_capacity(document.edges.len());

        for (index, record) in document.edges.into_iter().enumerate() {
            let source = required_id(record.source, || format!("edge #{index} has no source"))?;
            let target = required_id(record.target, || format!("edge #{index} has no target"))?;
            for endpoint in [&source, &target] {
                if !nodes.contains_key(endpoint) {
                    return Err(Error::malformed(format!(
                        "edge #{index} references unknown node {endpoint}"
                    )));
                }
            }

            let distance = record.distance.or(record.length).ok_or_else(|| {
                Error::malformed(format!(
                    "edge #{index} ({source} - {target}) has no distance"
                ))
            })?;
            validate_cost(distance, "distance", index)?;
            if let Some(energy) = record.energy {
                validate_cost(energy, "energy", index)?;
            }

            let directed = record.directed.unwrap_or(document.directed);
            adjacency.entry(source.clone()).or_default().push(Adjacent {
                neighbor: target.clone(),
                edge: index,
            });
            if !directed && source != target {
                adjacency.entry(target.clone()).or_default().push(Adjacent {
                    neighbor: source.clone(),
                    edge: index,
                });
            }

            edges.push(Edge {
                index,
                source,
                target,
                distance,
                energy: record.energy,
                directed,
            });
        }

        for list in adjacency.values_mut() {
            list.sort_by(|a, b| a.neighbor.cmp(&b.neighbor).then(a.edge.cmp(&b.edge)));
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "loaded terrain graph"
        );

        Ok(Self {
            nodes,
            edges,
            adjacency,
        })
    }

    /// Parse a JSON graph document. Any parse failure is a malformed graph.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(json)
            .map_err(|err| Error::malformed(format!("unreadable graph document: {err}")))?;
        Self::from_document(document)
    }

    /// Parse a JSON graph document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: GraphDocument = serde_json::from_reader(reader)
            .map_err(|err| Error::malformed(format!("unreadable graph document: {err}")))?;
        Self::from_document(document)
    }

    /// Parse a GraphML terrain export.
    pub fn from_graphml_str(xml: &str) -> Result<Self> {
        Self::from_document(crate::graphml::graphml_document(xml)?)
    }

    /// Whether the node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in document order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Neighbours of `id` with the connecting edge, ordered by neighbour id.
    pub fn neighbors(&self, id: &str) -> Result<Vec<(&NodeId, &Edge)>> {
        let adjacent = self
            .adjacency
            .get(id)
            .ok_or_else(|| self.unknown_node(id))?;
        Ok(adjacent
            .iter()
            .map(|entry| (&entry.neighbor, &self.edges[entry.edge]))
            .collect())
    }

    /// Adjacency for search code that has already validated the node.
    pub(crate) fn adjacent(&self, id: &str) -> impl Iterator<Item = (&NodeId, &Edge)> {
        self.adjacency
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|entry| (&entry.neighbor, &self.edges[entry.edge]))
    }

    /// Node ids similar to `id`, best first.
    pub fn fuzzy_node_matches(&self, id: &str, limit: usize) -> Vec<String> {
        let mut scored: Vec<(f64, &NodeId)> = self
            .nodes
            .keys()
            .map(|candidate| (strsim::jaro_winkler(id, candidate), candidate))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        scored
            .into_iter()
            .take(limit)
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }

    /// Build an [`Error::UnknownNode`] with suggestions drawn from this graph.
    pub fn unknown_node(&self, id: &str) -> Error {
        Error::UnknownNode {
            id: id.to_string(),
            suggestions: self.fuzzy_node_matches(id, 3),
        }
    }

    /// Counts and terrain breakdown for reporting.
    pub fn summary(&self) -> GraphSummary {
        let mut terrain: BTreeMap<String, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            *terrain.entry(node.terrain.clone()).or_default() += 1;
        }
        let annotated_hazards = self
            .nodes
            .values()
            .filter(|node| node.hazard.is_some() || node.severity.is_some())
            .map(|node| node.id.clone())
            .collect();

        GraphSummary {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            directed_edges: self.edges.iter().filter(|e| e.directed).count(),
            edges_missing_energy: self.edges.iter().filter(|e| e.energy.is_none()).count(),
            terrain,
            annotated_hazards,
        }
    }
}

/// Aggregate description of a loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub directed_edges: usize,
    pub edges_missing_energy: usize,
    pub terrain: BTreeMap<String, usize>,
    pub annotated_hazards: Vec<NodeId>,
}

/// Load a terrain graph from a file. `.graphml` and `.xml` files are read as
/// GraphML; anything else as JSON.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let graph = if is_graphml(path) {
        Graph::from_graphml_str(&fs::read_to_string(path)?)?
    } else {
        let file = fs::File::open(path)?;
        Graph::from_reader(std::io::BufReader::new(file))?
    };
    tracing::debug!(path = %path.display(), "terrain graph file parsed");
    Ok(graph)
}

fn is_graphml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("graphml") || ext.eq_ignore_ascii_case("xml"))
}

fn required_id(value: Option<String>, context: impl FnOnce() -> String) -> Result<String> {
    match value {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(Error::malformed(context())),
    }
}

fn validate_cost(value: f64, field: &str, index: usize) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::malformed(format!(
            "edge #{index} has invalid {field} {value}; expected a finite non-negative number"
        )));
    }
    Ok(())
}
