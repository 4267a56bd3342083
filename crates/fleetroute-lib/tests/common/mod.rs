//! Shared fixtures and graph builders for integration tests.

use std::path::PathBuf;

use fleetroute_lib::graph::{EdgeRecord, NodeRecord};
use fleetroute_lib::{Graph, GraphDocument, MissionInputs, MissionSources};

/// Directory holding the mission fixture files.
#[allow(dead_code)]
pub fn mission_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/mission")
}

/// Load every mission fixture file.
#[allow(dead_code)]
pub fn mission_inputs() -> MissionInputs {
    let paths = MissionSources::in_dir(mission_dir())
        .resolve()
        .expect("fixture files resolve");
    MissionInputs::load(&paths).expect("fixture mission loads")
}

/// Build an undirected graph from `(source, target, distance, energy)` tuples.
/// Nodes are created for every endpoint mentioned.
#[allow(dead_code)]
pub fn graph_from_edges(edges: &[(&str, &str, f64, Option<f64>)]) -> Graph {
    let mut ids: Vec<&str> = edges.iter().flat_map(|(a, b, _, _)| [*a, *b]).collect();
    ids.sort_unstable();
    ids.dedup();

    let document = GraphDocument {
        directed: false,
        nodes: ids
            .into_iter()
            .map(|id| NodeRecord {
                id: Some(id.to_string()),
                ..NodeRecord::default()
            })
            .collect(),
        edges: edges
            .iter()
            .map(|(source, target, distance, energy)| EdgeRecord {
                source: Some(source.to_string()),
                target: Some(target.to_string()),
                distance: Some(*distance),
                energy: *energy,
                length: None,
                directed: None,
            })
            .collect(),
    };
    Graph::from_document(document).expect("test graph is valid")
}

/// The three-node line used by the basic planning scenarios:
/// N1 -10- N2 -15- N3, plus N4 -3- N3.
#[allow(dead_code)]
pub fn scenario_graph() -> Graph {
    graph_from_edges(&[
        ("N1", "N2", 10.0, Some(4.0)),
        ("N2", "N3", 15.0, Some(6.0)),
        ("N4", "N3", 3.0, Some(1.0)),
    ])
}

/// Deterministic pseudo-random connected graph for reference comparisons.
#[allow(dead_code)]
pub fn pseudo_random_graph(nodes: usize, extra_edges: usize, seed: u64) -> Graph {
    let mut state = seed;
    let mut next = move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let names: Vec<String> = (0..nodes).map(|i| format!("N{i}")).collect();
    let mut edges = Vec::new();
    for i in 1..nodes {
        let parent = (next() as usize) % i;
        let distance = 1.0 + (next() % 50) as f64;
        edges.push((names[parent].clone(), names[i].clone(), distance));
    }
    for _ in 0..extra_edges {
        let a = (next() as usize) % nodes;
        let b = (next() as usize) % nodes;
        let distance = 1.0 + (next() % 50) as f64;
        edges.push((names[a].clone(), names[b].clone(), distance));
    }

    let borrowed: Vec<(&str, &str, f64, Option<f64>)> = edges
        .iter()
        .map(|(a, b, d)| (a.as_str(), b.as_str(), *d, Some(*d / 2.0)))
        .collect();
    graph_from_edges(&borrowed)
}
