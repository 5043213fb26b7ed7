#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

pub fn run_talus(store: &Path, cwd: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_talus"));
    command.current_dir(cwd);
    command.env_remove("RUST_LOG");
    command.env_remove("TALUS_STORE");
    command.env_remove("TALUS_HOME");
    command.env("TALUS_USER", "alice");
    command.arg("--store").arg(store);
    command.args(args);
    command.output().expect("failed to run talus binary")
}

pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|error| {
        panic!(
            "stdout should be valid JSON ({error}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

pub fn assert_success(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command should succeed: stdout={} stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    stdout_json(output)
}

pub fn assert_error_type(output: &Output, expected_type: &str) -> Value {
    assert!(
        !output.status.success(),
        "command should fail: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let response = stdout_json(output);
    assert_eq!(response["error"]["type"], expected_type, "{response}");
    response
}

/// Writes a store with five crash results; newest first they are r5, r4, r3,
/// r2, r1.
pub fn write_sample_store(dir: &Path) -> PathBuf {
    let records = json!([
        {"id": "r1", "created": 1, "tags": ["alice", "IE"], "job": "j1", "tool": "fuzz",
         "data": {"crashing_module": "libxml", "exploitability": "EXPLOITABLE",
                  "registers": {"eax": 4}, "hash": "00ff"}},
        {"id": "r2", "created": 2, "tags": ["bob", "adobe"], "job": "j1", "tool": "fuzz",
         "data": {"crashing_module": "acrord", "exploitability": "UNKNOWN",
                  "registers": {"eax": 3}, "hash": "00fe"}},
        {"id": "r3", "created": 3, "tags": ["alice", "IE"], "job": "j2", "tool": "fuzz",
         "name": "first-ie", "data": {"crashing_module": "libxml",
                  "exploitability": "EXPLOITABLE", "registers": {"eax": 9}, "hash": "00fd"}},
        {"id": "r4", "created": 4, "tags": ["alice", "adobe"], "job": "j2", "tool": "fuzz",
         "data": {"crashing_module": "libxml", "exploitability": "EXPLOITABLE",
                  "registers": {"eax": 1}, "hash": "00fc"}},
        {"id": "r5", "created": 5, "tags": ["bob", "IE"], "job": "j3", "tool": "fuzz",
         "data": {"crashing_module": "mshtml", "exploitability": "PROBABLY_EXPLOITABLE",
                  "registers": {"eax": 7}, "hash": "00fb"}}
    ]);
    let path = dir.join("results.json");
    fs::write(
        &path,
        serde_json::to_vec_pretty(&records).expect("serialize store"),
    )
    .expect("write store");
    path
}

pub fn ids(response: &Value) -> Vec<String> {
    response["results"]
        .as_array()
        .expect("results should be an array")
        .iter()
        .map(|result| result["id"].as_str().expect("id").to_string())
        .collect()
}
