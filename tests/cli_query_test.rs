//! Integration tests for the read-only query commands:
//! `show`, `areas`, `levels`, `intervals` and `presets`.

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;

#[test]
fn test_show_aggregated_item() {
    let env = TestEnv::with_sample();
    let output = env
        .roadmap()
        .args(["show", "3", "--snapshot", "snapshot.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value = parse_json(&output.stdout);
    assert_eq!(value["item"]["id"], 3);
    assert_eq!(value["item"]["start"], "2024-02-05");
    assert_eq!(value["item"]["calculated_start"], true);
    assert_eq!(value["item"]["project"], "1");
    assert_eq!(value["ancestors"][0]["id"], 1);
    assert_eq!(value["ancestors"][0]["type"], "Epic");
    assert_eq!(value["children"], serde_json::json!([4]));
}

#[test]
fn test_show_human() {
    let env = TestEnv::with_sample();
    env.roadmap()
        .args(["show", "4", "--snapshot", "snapshot.json", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[4] User Story: Export CSV"))
        .stdout(predicate::str::contains("Start: 2024-02-05 (calculated)"))
        .stdout(predicate::str::contains("Ancestors:"))
        .stdout(predicate::str::contains("[3] Feature: Reporting"))
        .stdout(predicate::str::contains("[1] Epic: Ship v2"));
}

#[test]
fn test_show_missing_item() {
    let env = TestEnv::with_sample();
    env.roadmap()
        .args(["show", "42", "--snapshot", "snapshot.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Work item not found: 42"));
}

#[test]
fn test_areas_from_items() {
    let env = TestEnv::with_sample();
    let output = env
        .roadmap()
        .args(["areas", "--snapshot", "snapshot.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value = parse_json(&output.stdout);
    assert_eq!(value["count"], 2);
    assert_eq!(value["areas"][0]["path"], "Proj\\Data");
    assert_eq!(value["areas"][1]["name"], "Web");
}

#[test]
fn test_areas_from_classification_paths() {
    let env = TestEnv::new();
    env.write_snapshot(r#"{"area_paths": ["\\Proj\\Area\\Mobile", "\\Proj\\Area\\Web"]}"#);

    env.roadmap()
        .args(["areas", "--snapshot", "snapshot.json", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 area path(s):"))
        .stdout(predicate::str::contains("Proj\\Mobile (Mobile)"));
}

#[test]
fn test_levels_sorted_by_rank() {
    let env = TestEnv::with_sample();
    let output = env
        .roadmap()
        .args(["levels", "--snapshot", "snapshot.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value = parse_json(&output.stdout);
    let names: Vec<&str> = value["levels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Epics", "Features", "Stories"]);
}

#[test]
fn test_intervals_human_marks_configured_default() {
    let env = TestEnv::new();
    env.write_system_config("interval \"Sprint\"\n");

    env.roadmap()
        .args(["intervals", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint (default)"))
        .stdout(predicate::str::contains("Month (default)").not());
}

#[test]
fn test_presets_lists_five_fiscal_years() {
    let env = TestEnv::new();
    let output = env.roadmap().arg("presets").output().unwrap();
    assert!(output.status.success());

    let value = parse_json(&output.stdout);
    let presets = value["presets"].as_array().unwrap();
    assert_eq!(presets.len(), 5);
    assert!(presets[0]["id"].as_str().unwrap().ends_with("-04-01"));
    assert!(
        presets[0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Changed After: ")
    );
}

#[test]
fn test_show_cycle_root_has_no_ancestors() {
    let env = TestEnv::new();
    env.write_snapshot(
        r#"{"items": [
            {"id": 1, "parent": 2, "title": "Loop A", "type": "Epic"},
            {"id": 2, "parent": 1, "title": "Loop B", "type": "Feature"}
        ]}"#,
    );

    let output = env
        .roadmap()
        .args(["show", "1", "--snapshot", "snapshot.json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    assert!(value["item"]["project"].is_null());
    assert_eq!(value["ancestors"], serde_json::json!([]));
    assert_eq!(value["children"], serde_json::json!([2]));

    let output = env
        .roadmap()
        .args(["show", "2", "--snapshot", "snapshot.json"])
        .output()
        .unwrap();
    let value = parse_json(&output.stdout);
    assert_eq!(value["item"]["project"], "1");
    assert_eq!(value["ancestors"][0]["id"], 1);
}
