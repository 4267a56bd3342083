//! End-to-end tests for the `fleetroute` binary over the mission fixtures.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/mission")
}

fn fleetroute() -> Command {
    let mut cmd = Command::cargo_bin("fleetroute").expect("binary exists");
    cmd.env_remove("FLEETROUTE_DATA_DIR")
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT");
    cmd
}

fn with_fixtures() -> Command {
    let mut cmd = fleetroute();
    cmd.arg("--data-dir").arg(fixture_dir());
    cmd
}

#[test]
fn inspect_reports_counts() {
    with_fixtures()
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nodes: 8, edges: 9 (1 directed, 1 without energy)",
        ))
        .stdout(predicate::str::contains("Hazards: 3 (1 annotated on nodes)"))
        .stdout(predicate::str::contains("Excluded at threshold: N2"));
}

#[test]
fn inspect_json_is_parseable() {
    let output = with_fixtures()
        .args(["--format", "json", "inspect", "--threshold", "medium"])
        .output()
        .expect("command runs");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["graph"]["nodes"], 8);
    assert_eq!(value["excluded_nodes"], serde_json::json!(["N2", "N5"]));
}

#[test]
fn graphml_terrain_is_accepted() {
    with_fixtures()
        .arg("inspect")
        .arg("--graph")
        .arg(fixture_dir().join("terrain.graphml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nodes: 8, edges: 9 (1 directed, 1 without energy)",
        ))
        .stdout(predicate::str::contains("Excluded at threshold: N2"));
}

#[test]
fn path_avoids_excluded_nodes() {
    with_fixtures()
        .args(["path", "--from", "N1", "--to", "N3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Route: N1 -> N3 (3 hops, weight: distance)"))
        .stdout(predicate::str::contains("Total distance: 37.00, energy: 23.00"));
}

#[test]
fn path_reports_failure_when_out_of_range() {
    with_fixtures()
        .args(["path", "--from", "N1", "--to", "N3", "--max-range", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FAILURE: RANGE_EXCEEDED"));
}

#[test]
fn path_reports_success_within_range() {
    with_fixtures()
        .args([
            "--format", "compact", "path", "--from", "N4", "--to", "N3", "--max-range", "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("N4 -> N3 (5.00) SUCCESS"));
}

#[test]
fn path_to_several_goals_with_unreachable() {
    with_fixtures()
        .args([
            "path",
            "--from",
            "N1",
            "--to",
            "N6",
            "--to",
            "N3",
            "--threshold",
            "medium",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "FAILURE: no path from N1 to N6 in the filtered graph",
        ))
        .stdout(predicate::str::contains(
            "FAILURE: no path from N1 to N3 in the filtered graph",
        ));
}

#[test]
fn path_unknown_node_suggests_alternatives() {
    with_fixtures()
        .args(["path", "--from", "N1", "--to", "N33"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown node: N33"))
        .stderr(predicate::str::contains("N3"));
}

#[test]
fn plan_text_end_to_end() {
    with_fixtures()
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assignments (3):"))
        .stdout(predicate::str::contains("R1 (rover) -> N3 [priority 1]: N1 -> N5 -> N6 -> N3"))
        .stdout(predicate::str::contains("R3 -> N3: RANGE_EXCEEDED"))
        .stdout(predicate::str::contains("R2 at N99: UNKNOWN_START"))
        .stdout(predicate::str::contains("Summary: 3 of 3 targets assigned"));
}

#[test]
fn plan_json_is_identical_across_runs_and_threads() {
    let run = |extra: &[&str]| {
        let output = with_fixtures()
            .args(["--format", "json", "plan"])
            .args(extra)
            .output()
            .expect("command runs");
        assert!(output.status.success());
        output.stdout
    };

    let first = run(&[]);
    assert_eq!(first, run(&[]));
    assert_eq!(first, run(&["--sequential"]));

    let value: serde_json::Value = serde_json::from_slice(&first).expect("valid json");
    assert_eq!(value["summary"]["assigned"], 3);
    assert_eq!(value["assignments"][0]["unit"], "D1");
    assert_eq!(value["rejected"][0]["code"], "RANGE_EXCEEDED");
}

#[test]
fn plan_uses_environment_data_dir() {
    fleetroute()
        .env("FLEETROUTE_DATA_DIR", fixture_dir())
        .args(["--format", "compact", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("D1 -> N8 (14.00)"));
}

#[test]
fn plan_with_explicit_files_and_csv_roster() {
    let temp = TempDir::new().expect("temp dir");
    let targets = temp.path().join("targets.json");
    fs::write(&targets, r#"[{"node": "N3", "capability": "surface_sampling"}]"#).unwrap();

    fleetroute()
        .args(["--format", "compact", "plan"])
        .arg("--graph")
        .arg(fixture_dir().join("terrain.json"))
        .arg("--units")
        .arg(fixture_dir().join("units.csv"))
        .arg("--targets")
        .arg(&targets)
        .assert()
        .success()
        .stdout(predicate::str::contains("R1 -> N3 (37.00)"))
        .stdout(predicate::str::contains("Summary: 1 of 1 targets assigned"));
}

#[test]
fn plan_without_mission_files_fails() {
    let temp = TempDir::new().expect("temp dir");
    fleetroute()
        .arg("--data-dir")
        .arg(temp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mission file not found"));
}

#[test]
fn max_per_unit_requires_multi_target() {
    with_fixtures()
        .args(["plan", "--max-per-unit", "2"])
        .assert()
        .failure();
}
