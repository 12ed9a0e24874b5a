mod common;

use basisga::optimizer::ResultRecord;
use regex::Regex;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    ensemble_path: PathBuf,
}

impl TestContext {
    fn new(nx: usize) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let ensemble_path = dir.path().join("toy.csv");
        let ens = common::synthetic_ensemble(12, 1, nx, 5);
        common::write_csv(&ensemble_path, &ens);
        Self { dir, ensemble_path }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_basisga"))
            .args(args)
            .arg("--output-dir")
            .arg(self.dir.path())
            .output()
            .expect("Failed to execute binary")
    }
}

#[test]
fn test_cli_search_writes_log_and_result() {
    let ctx = TestContext::new(4);
    let output = ctx.run(&[
        "search",
        ctx.ensemble_path.to_str().unwrap(),
        "3",
        "--max-iters",
        "5",
        "--seed",
        "4",
        "--threads",
        "1",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{}", stdout);

    let re = Regex::new(r"Final ERF: ([0-9.eE+-]+)").unwrap();
    let printed: f64 = re.captures(&stdout).expect("no final ERF line")[1]
        .parse()
        .unwrap();

    let json = std::fs::read_to_string(ctx.dir.path().join("toy_hessian_3.json")).unwrap();
    let record: ResultRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record.final_erf, printed);
    assert_eq!(record.iterations, 5);
    assert_eq!(record.pdf_name, "toy");
    assert_eq!(record.nrep, 3);
    assert_eq!(record.q, 1.0);
    assert_eq!(record.epsilon, 100.0);

    let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(raw.get("Final ERF").is_some());
    assert!(raw.get("Iterations").is_some());
    assert!(raw.get("Q").is_some());

    let log = std::fs::read_to_string(ctx.dir.path().join("toy_hessian_3.log")).unwrap();
    assert_eq!(log.matches("- Iteration:").count(), 5);
}

#[test]
fn test_cli_initial_basis_and_scale() {
    let ctx = TestContext::new(4);
    let output = ctx.run(&[
        "search",
        ctx.ensemble_path.to_str().unwrap(),
        "2",
        "--initial",
        "7,3",
        "--max-iters",
        "1",
        "-Q",
        "1.65",
    ]);
    assert!(output.status.success());

    let json = std::fs::read_to_string(ctx.dir.path().join("toy_hessian_2.json")).unwrap();
    let record: ResultRecord = serde_json::from_str(&json).unwrap();
    // a single iteration only scores the initial basis
    assert_eq!(record.basis, vec![3, 7]);
    assert_eq!(record.q, 1.65);
}

#[test]
fn test_cli_evaluate_prints_erf() {
    let ctx = TestContext::new(4);
    let output = ctx.run(&[
        "evaluate",
        ctx.ensemble_path.to_str().unwrap(),
        "--basis",
        "1,5,9",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{}", stdout);
    assert!(Regex::new(r"ERF: [0-9.eE+-]+").unwrap().is_match(&stdout));
    assert!(stdout.contains("TOTAL"));
}

#[test]
fn test_cli_rejects_oversized_basis() {
    let ctx = TestContext::new(2);
    let output = ctx.run(&[
        "search",
        ctx.ensemble_path.to_str().unwrap(),
        "3",
        "--max-iters",
        "5",
    ]);
    assert!(!output.status.success());
    assert!(!ctx.dir.path().join("toy_hessian_3.json").exists());
}

#[test]
fn test_cli_rejects_bad_basis() {
    let ctx = TestContext::new(4);
    let dup = ctx.run(&["evaluate", ctx.ensemble_path.to_str().unwrap(), "-b", "2,2"]);
    assert!(!dup.status.success());

    let range = ctx.run(&["evaluate", ctx.ensemble_path.to_str().unwrap(), "-b", "1,13"]);
    assert!(!range.status.success());
}

#[test]
fn test_cli_missing_ensemble_fails() {
    let ctx = TestContext::new(4);
    let output = ctx.run(&["search", "/definitely/not/here.csv", "2"]);
    assert!(!output.status.success());
}
