mod common;

use std::collections::HashMap;

use fleetroute_lib::{
    filtered_view, route_matrix, shortest_path, Error, Graph, Hazard, PathOutcome, Severity,
    WeightKey,
};

/// All-pairs distances by Floyd-Warshall, independent of the search code.
fn reference_distances(graph: &Graph) -> HashMap<(String, String), f64> {
    let ids: Vec<String> = graph.nodes().map(|node| node.id.clone()).collect();
    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let n = ids.len();
    let mut dist = vec![vec![f64::INFINITY; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for edge in graph.edges() {
        let a = index[edge.source.as_str()];
        let b = index[edge.target.as_str()];
        dist[a][b] = dist[a][b].min(edge.distance);
        if !edge.directed {
            dist[b][a] = dist[b][a].min(edge.distance);
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let through = dist[i][k] + dist[k][j];
                if through < dist[i][j] {
                    dist[i][j] = through;
                }
            }
        }
    }

    let mut out = HashMap::new();
    for (i, a) in ids.iter().enumerate() {
        for (j, b) in ids.iter().enumerate() {
            out.insert((a.clone(), b.clone()), dist[i][j]);
        }
    }
    out
}

fn assert_matches_reference(graph: &Graph) {
    let reference = reference_distances(graph);
    let view = graph.view();
    for ((start, goal), expected) in &reference {
        let outcome = shortest_path(&view, start, goal, WeightKey::Distance).unwrap();
        match outcome {
            PathOutcome::Found(route) => {
                assert!(
                    (route.distance - expected).abs() < 1e-9,
                    "{start}->{goal}: got {}, expected {expected}",
                    route.distance
                );
                assert_eq!(route.start(), start.as_str());
                assert_eq!(route.goal(), goal.as_str());
                for pair in route.nodes.windows(2) {
                    let linked = graph
                        .neighbors(&pair[0])
                        .unwrap()
                        .iter()
                        .any(|(next, _)| **next == pair[1]);
                    assert!(linked, "{} and {} are not adjacent", pair[0], pair[1]);
                }
            }
            PathOutcome::Unreachable { .. } => {
                assert!(expected.is_infinite(), "{start}->{goal} should be reachable");
            }
        }
    }
}

#[test]
fn scenario_line_route() {
    let graph = common::scenario_graph();
    let outcome = shortest_path(&graph.view(), "N1", "N3", WeightKey::Distance).unwrap();
    let route = outcome.route().expect("reachable");

    assert_eq!(route.nodes, vec!["N1", "N2", "N3"]);
    assert_eq!(route.distance, 25.0);
    assert_eq!(route.energy, Some(10.0));
    assert_eq!(route.legs[1].cumulative_distance, 25.0);
}

#[test]
fn distances_match_reference_on_fixture() {
    let graph = fleetroute_lib::load_graph(&common::mission_dir().join("terrain.json")).unwrap();
    assert_matches_reference(&graph);
}

#[test]
fn distances_match_reference_on_generated_graphs() {
    for seed in [7_u64, 42, 1_234_567] {
        let graph = common::pseudo_random_graph(25, 30, seed);
        assert_matches_reference(&graph);
    }
}

#[test]
fn same_start_and_goal_is_zero_length() {
    let graph = common::scenario_graph();
    let outcome = shortest_path(&graph.view(), "N2", "N2", WeightKey::Energy).unwrap();
    let route = outcome.into_route().unwrap();
    assert_eq!(route.nodes, vec!["N2"]);
    assert_eq!(route.distance, 0.0);
    assert!(route.legs.is_empty());
}

#[test]
fn unknown_endpoint_is_an_error() {
    let graph = common::scenario_graph();
    let err = shortest_path(&graph.view(), "N1", "N30", WeightKey::Distance).unwrap_err();
    match err {
        Error::UnknownNode { id, suggestions } => {
            assert_eq!(id, "N30");
            assert!(suggestions.contains(&"N3".to_string()));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn excluded_endpoint_is_unknown_not_searched() {
    let graph = common::scenario_graph();
    let hazards = vec![Hazard::new(vec!["N3".to_string()], "crevasse", Severity::High)];
    let view = filtered_view(&graph, &hazards, Severity::High);
    let err = shortest_path(&view, "N1", "N3", WeightKey::Distance).unwrap_err();
    assert!(matches!(err, Error::UnknownNode { .. }));
}

#[test]
fn critical_hazard_disconnects_target() {
    let graph = common::graph_from_edges(&[("N1", "N2", 10.0, None), ("N2", "N3", 15.0, None)]);
    let hazards = vec![Hazard::new(
        vec!["N2".to_string()],
        "dust_storm",
        Severity::Critical,
    )];
    let view = filtered_view(&graph, &hazards, Severity::High);
    let outcome = shortest_path(&view, "N1", "N3", WeightKey::Distance).unwrap();
    assert_eq!(
        outcome,
        PathOutcome::Unreachable {
            start: "N1".to_string(),
            goal: "N3".to_string()
        }
    );
}

#[test]
fn energy_weight_skips_edges_without_energy() {
    // Short path A-B-D has no energy on B-D; long path A-C-D is fully costed.
    let graph = common::graph_from_edges(&[
        ("A", "B", 1.0, Some(1.0)),
        ("B", "D", 1.0, None),
        ("A", "C", 5.0, Some(2.0)),
        ("C", "D", 5.0, Some(2.0)),
    ]);
    let view = graph.view();

    let by_distance = shortest_path(&view, "A", "D", WeightKey::Distance)
        .unwrap()
        .into_route()
        .unwrap();
    assert_eq!(by_distance.nodes, vec!["A", "B", "D"]);
    assert_eq!(by_distance.energy, None);

    let by_energy = shortest_path(&view, "A", "D", WeightKey::Energy)
        .unwrap()
        .into_route()
        .unwrap();
    assert_eq!(by_energy.nodes, vec!["A", "C", "D"]);
    assert_eq!(by_energy.energy, Some(4.0));
    assert_eq!(by_energy.distance, 10.0);
}

#[test]
fn energy_weight_prefers_cheaper_energy_over_distance() {
    let graph = common::graph_from_edges(&[
        ("A", "B", 2.0, Some(9.0)),
        ("A", "C", 3.0, Some(1.0)),
        ("C", "B", 3.0, Some(1.0)),
    ]);
    let route = shortest_path(&graph.view(), "A", "B", WeightKey::Energy)
        .unwrap()
        .into_route()
        .unwrap();
    assert_eq!(route.nodes, vec!["A", "C", "B"]);
}

#[test]
fn directed_edge_is_not_traversed_backwards() {
    let graph = Graph::from_json_str(
        r#"{"nodes": [{"id": "A"}, {"id": "B"}],
            "edges": [{"source": "A", "target": "B", "distance": 1, "directed": true}]}"#,
    )
    .unwrap();
    let view = graph.view();
    assert!(shortest_path(&view, "A", "B", WeightKey::Distance)
        .unwrap()
        .is_reachable());
    assert!(!shortest_path(&view, "B", "A", WeightKey::Distance)
        .unwrap()
        .is_reachable());
}

#[test]
fn equal_cost_paths_resolve_to_lowest_ids() {
    // A-B-D and A-C-D both cost 2; the route through B is discovered first.
    let graph = common::graph_from_edges(&[
        ("A", "C", 1.0, None),
        ("C", "D", 1.0, None),
        ("A", "B", 1.0, None),
        ("B", "D", 1.0, None),
    ]);
    for _ in 0..5 {
        let route = shortest_path(&graph.view(), "A", "D", WeightKey::Distance)
            .unwrap()
            .into_route()
            .unwrap();
        assert_eq!(route.nodes, vec!["A", "B", "D"]);
    }
}

#[test]
fn parallel_edges_use_the_cheaper_one() {
    let graph =
        common::graph_from_edges(&[("A", "B", 9.0, Some(1.0)), ("A", "B", 4.0, Some(7.0))]);
    let view = graph.view();

    let short = shortest_path(&view, "A", "B", WeightKey::Distance)
        .unwrap()
        .into_route()
        .unwrap();
    assert_eq!(short.legs[0].edge, 1);
    assert_eq!(short.energy, Some(7.0));

    let frugal = shortest_path(&view, "A", "B", WeightKey::Energy)
        .unwrap()
        .into_route()
        .unwrap();
    assert_eq!(frugal.legs[0].edge, 0);
    assert_eq!(frugal.distance, 9.0);
}

#[test]
fn route_matrix_keeps_input_order() {
    let graph = common::graph_from_edges(&[
        ("N1", "N2", 10.0, None),
        ("N2", "N3", 15.0, None),
        ("N5", "N6", 1.0, None),
    ]);
    let starts = vec!["N1".to_string(), "N5".to_string()];
    let goals = vec!["N3".to_string(), "N6".to_string()];
    let rows = route_matrix(&graph.view(), &starts, &goals, WeightKey::Distance).unwrap();

    let summary: Vec<(&str, &str, bool)> = rows
        .iter()
        .map(|row| (row.start.as_str(), row.goal.as_str(), row.outcome.is_reachable()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("N1", "N3", true),
            ("N1", "N6", false),
            ("N5", "N3", false),
            ("N5", "N6", true),
        ]
    );
}
