#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const EVENTS: &str = r#"op,id,start,end,type,props
create,1,1,2,TEST,"{""k1"":""v1""}"
create,2,1,3,TEST,"{""k1"":""v2""}"
create,3,4,1,AUDIT,
create,4,1,5,TEST,"{""k1"":""v3""}"
delete,4,,,,
"#;

fn setup(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.csv"));
    fs::write(&path, EVENTS).expect("write events");
    (dir, path)
}

fn missing_config(dir: &Path) -> PathBuf {
    dir.join("absent.toml")
}

fn replay_json(dir: &TempDir, events: &Path, extra: &[&str]) -> Value {
    let output = cargo_bin_cmd!("relcount")
        .env("RELCOUNT_CONFIG", missing_config(dir.path()))
        .args(["--format", "json", "replay"])
        .arg(events)
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

fn node<'a>(report: &'a Value, id: u64) -> &'a Value {
    report["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .find(|node| node["node"].as_u64() == Some(id))
        .expect("node present")
}

#[test]
fn replay_reports_degrees_as_json() {
    let (dir, events) = setup("json");
    let report = replay_json(&dir, &events, &["--batch", "2"]);

    assert_eq!(report["events"].as_u64(), Some(5));
    assert_eq!(report["batches"].as_u64(), Some(3));

    let hub = node(&report, 1)["degrees"].as_array().expect("degrees");
    assert_eq!(hub.len(), 3);
    let total: u64 = hub.iter().filter_map(|entry| entry["count"].as_u64()).sum();
    assert_eq!(total, 3);
    assert!(report["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|node| node["node"].as_u64() != Some(5)));
}

#[test]
fn threshold_override_compacts_and_queries_fall_back() {
    let (dir, events) = setup("threshold");
    let report = replay_json(
        &dir,
        &events,
        &["--threshold", "2", "--query", "TEST:out:k1=v1", "--query", "TEST:out"],
    );

    let hub = node(&report, 1)["degrees"].as_array().expect("degrees");
    assert_eq!(hub.len(), 2);

    let counts = report["counts"].as_array().expect("counts");
    let for_hub: Vec<u64> = counts
        .iter()
        .filter(|count| count["node"].as_u64() == Some(1))
        .filter_map(|count| count["count"].as_u64())
        .collect();
    assert_eq!(for_hub, vec![1, 2]);
}

#[test]
fn replay_prints_text_summary() {
    let (dir, events) = setup("text");
    let output = cargo_bin_cmd!("relcount")
        .env("RELCOUNT_CONFIG", missing_config(dir.path()))
        .arg("replay")
        .arg(&events)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("Replayed 5 events in 1 units of work"), "{text}");
    assert!(text.contains("node 1:"), "{text}");
    assert!(text.contains("TEST#OUTGOING#{k1"), "{text}");
}

#[test]
fn settings_file_excludes_types() {
    let (dir, events) = setup("settings");
    let config = dir.path().join("relcount.toml");
    fs::write(&config, "exclude_types = [\"AUDIT\"]\n").expect("write settings");

    let output = cargo_bin_cmd!("relcount")
        .args(["--format", "json", "--config"])
        .arg(&config)
        .arg("replay")
        .arg(&events)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).expect("valid json");
    assert!(report["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|node| node["node"].as_u64() != Some(4)));
    assert_eq!(node(&report, 1)["degrees"].as_array().unwrap().len(), 2);
}

#[test]
fn malformed_queries_are_rejected() {
    let (dir, events) = setup("bad_query");
    let output = cargo_bin_cmd!("relcount")
        .env("RELCOUNT_CONFIG", missing_config(dir.path()))
        .arg("replay")
        .arg(&events)
        .args(["--query", "TEST:sideways"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.contains("unknown direction"), "{stderr}");
}

#[test]
fn invalid_settings_fail_fast() {
    let (dir, events) = setup("bad_settings");
    let config = dir.path().join("relcount.toml");
    fs::write(&config, "threshold = 0\n").expect("write settings");

    cargo_bin_cmd!("relcount")
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(&events)
        .assert()
        .failure();
}
