//! End-to-end tests driving the `csvstore` binary.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};
use tempfile::TempDir;

fn csvstore(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_csvstore"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("CSVSTORE_LOG")
        .output()
        .expect("failed to run csvstore")
}

fn run(root: &Path, args: &[&str]) -> (bool, Value) {
    let output = csvstore(root, args);
    let body: Value = serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    (output.status.success(), body)
}

#[test]
fn create_add_query_delete() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let (ok, body) = run(root, &["create", "notes", "--fields", "id,text"]);
    assert!(ok);
    assert_eq!(body["status"], "success");
    assert_eq!(body["fields"], json!(["id", "text"]));

    let (ok, body) = run(root, &["add", "notes", "--json", r#"{"text": "hello"}"#]);
    assert!(ok);
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 8);

    let (ok, body) = run(root, &["query", "notes"]);
    assert!(ok);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"], json!([{"id": id, "text": "hello"}]));

    let (ok, body) = run(root, &["delete", "notes", "--id", &id]);
    assert!(ok);
    assert_eq!(body["message"], format!("Document {} deleted.", id));

    let (ok, body) = run(root, &["delete", "notes", "--id", &id]);
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["kind"], "not_found_id");
}

#[test]
fn errors_are_structured() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let (ok, body) = run(root, &["add", "ghost", "--json", r#"{"text": "x"}"#]);
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["kind"], "not_found");

    run(root, &["create", "t", "--fields", "id,v"]);
    let (ok, body) = run(root, &["create", "t", "--fields", "other"]);
    assert!(!ok);
    assert_eq!(body["kind"], "already_exists");

    let (ok, body) = run(root, &["add", "t", "--json", "[1, 2]"]);
    assert!(!ok);
    assert_eq!(body["status"], "fatal_error");

    let (ok, body) = run(root, &["add", "t", "--json", "{not json"]);
    assert!(!ok);
    assert_eq!(body["status"], "fatal_error");
}

#[test]
fn filter_compares_strings() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    run(root, &["create", "t", "--fields", "id,v"]);
    run(root, &["add", "t", "--json", r#"{"id": "a", "v": 7}"#]);
    run(root, &["add", "t", "--json", r#"{"id": "b", "v": 7.0}"#]);

    let (_, body) = run(root, &["query", "t", "--field", "v", "--value", "7"]);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], "a");
}

#[test]
fn concurrent_processes_append_whole_lines() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    run(root, &["create", "t", "--fields", "id,payload"]);

    let payload = "p".repeat(4096);
    let children: Vec<_> = (0..8)
        .map(|i| {
            let data = json!({"id": i.to_string(), "payload": payload}).to_string();
            Command::new(env!("CARGO_BIN_EXE_csvstore"))
                .arg("--root")
                .arg(root)
                .args(["add", "t", "--json", &data])
                .stdout(Stdio::null())
                .spawn()
                .unwrap()
        })
        .collect();
    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    let text = std::fs::read_to_string(root.join("t.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 9);
    assert!(lines[1..].iter().all(|l| l.ends_with(&payload) && l.split(',').count() == 2));
}
