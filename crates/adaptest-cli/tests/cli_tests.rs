//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = "../../adaptest.toml";
const BANK: &str = "../../question-banks/sample.toml";

fn adaptest() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("adaptest").unwrap()
}

fn simulate_json(seed: &str) -> serde_json::Value {
    let output = adaptest()
        .args(["simulate", "--config", CONFIG, "--bank", BANK])
        .args(["--ability", "7", "--seed", seed, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn validate_sample_files() {
    adaptest()
        .args(["validate", "--config", CONFIG, "--bank", BANK])
        .assert()
        .success()
        .stdout(predicate::str::contains("range [1, 10]"))
        .stdout(predicate::str::contains("20 questions"))
        .stdout(predicate::str::contains("Config and question bank valid"));
}

#[test]
fn validate_config_only() {
    adaptest()
        .args(["validate", "--config", CONFIG])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config valid."));
}

#[test]
fn validate_defaults_without_config() {
    adaptest()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("range [1, 100], starting level 50"));
}

#[test]
fn validate_reports_bank_warnings() {
    let dir = TempDir::new().unwrap();
    let bank = dir.path().join("messy.toml");
    std::fs::write(
        &bank,
        r#"
[bank]
id = "messy"
name = "Messy"

[[questions]]
id = 1
name = "untagged"

[[questions]]
id = 2
name = "too hard"
tags = ["adpq_50"]
"#,
    )
    .unwrap();

    adaptest()
        .args(["validate", "--config", CONFIG, "--bank"])
        .arg(&bank)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING: no difficulty tag"))
        .stdout(predicate::str::contains("[q2] WARNING: difficulty 50 is outside"))
        .stdout(predicate::str::contains("3 warning(s) found."));
}

#[test]
fn validate_nonexistent_file() {
    adaptest()
        .args(["validate", "--config", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "starting_level = 0\n").unwrap();

    adaptest()
        .args(["validate", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("starting level 0 is outside"));
}

#[test]
fn simulate_text_output() {
    adaptest()
        .args(["simulate", "--config", CONFIG, "--bank", BANK])
        .args(["--ability", "7", "--seed", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Std. error"))
        .stdout(predicate::str::contains("Stopped:"))
        .stdout(predicate::str::contains("Estimated ability:"));
}

#[test]
fn simulate_json_output() {
    let report = simulate_json("42");
    assert_eq!(report["true_ability"], 7);
    assert_eq!(report["seed"], 42);
    assert_eq!(report["bank_id"], "sample");

    let steps = report["steps"].as_array().unwrap();
    assert!(!steps.is_empty() && steps.len() <= 15, "{} steps", steps.len());
    assert_eq!(steps[0]["level"], 5);
    assert!(report["stop_reason"]["kind"].is_string());
}

#[test]
fn simulate_is_reproducible_with_seed() {
    let a = simulate_json("17");
    let b = simulate_json("17");
    assert_eq!(a["steps"], b["steps"]);
    assert_ne!(a["id"], b["id"]);
}

#[test]
fn simulate_writes_report_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("report.json");

    adaptest()
        .args(["simulate", "--config", CONFIG, "--bank", BANK])
        .args(["--ability", "3", "--seed", "1", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Report saved to"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["true_ability"], 3);
}

#[test]
fn simulate_rejects_ability_outside_range() {
    adaptest()
        .args(["simulate", "--config", CONFIG, "--bank", BANK])
        .args(["--ability", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the difficulty range"));
}

#[test]
fn simulate_rejects_unknown_format() {
    adaptest()
        .args(["simulate", "--config", CONFIG, "--bank", BANK])
        .args(["--ability", "5", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created adaptest.toml"))
        .stdout(predicate::str::contains(
            "Created question-banks/example.toml",
        ));

    assert!(dir.path().join("adaptest.toml").exists());
    assert!(dir.path().join("question-banks/example.toml").exists());

    // The generated files are usable as-is.
    adaptest()
        .current_dir(dir.path())
        .args(["validate", "--config", "adaptest.toml", "--bank", "question-banks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config and question bank valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    adaptest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Computerized adaptive testing engine"));
}

#[test]
fn version_output() {
    adaptest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptest"));
}
