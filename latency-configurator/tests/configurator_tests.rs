//! End-to-end tests against a temporary charts directory
//!
//! Covers single-service updates (append, update in place, idempotence),
//! the soft failure paths, reset-all over several services, and the
//! binary's output streams and exit status.

use latency_configurator::*;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const SERVICE_WITH_LATENCY: &str = "\
replicaCount: 1
container:
  image: deathstarbench/media-microservices
  ports:
    - containerPort: 9090
  env:
    - name: LOG_LEVEL
      value: info
    - name: EXTRA_LATENCY
      value: 100ms
";

const SERVICE_WITHOUT_LATENCY: &str = "\
container:
  image: deathstarbench/media-microservices
  env:
    - name: LOG_LEVEL
      value: info
";

fn write_service(charts: &Path, service: &str, contents: &str) -> PathBuf {
    let dir = charts.join(service);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("values.yaml");
    fs::write(&path, contents).unwrap();
    path
}

fn configurator(charts: &Path) -> LatencyConfigurator {
    LatencyConfigurator::new(ConfiguratorConfig::new(charts))
}

fn load(path: &Path) -> Value {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn extra_latency_values(doc: &Value) -> Vec<String> {
    doc["container"]["env"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter(|e| e["name"].as_str() == Some(EXTRA_LATENCY_ENV))
        .map(|e| e["value"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_update_sets_single_entry_and_preserves_rest() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_service(temp_dir.path(), "movie-id-service", SERVICE_WITH_LATENCY);
    let before = load(&path);

    let outcome = configurator(temp_dir.path()).update_extra_latency("movie-id-service", 250);
    assert!(outcome.is_updated());

    let after = load(&path);
    assert_eq!(extra_latency_values(&after), vec!["250ms"]);
    assert_eq!(after["replicaCount"], before["replicaCount"]);
    assert_eq!(after["container"]["image"], before["container"]["image"]);
    assert_eq!(after["container"]["ports"], before["container"]["ports"]);
    assert_eq!(after["container"]["env"][0], before["container"]["env"][0]);
    assert!(after["container"].get(LEGACY_LATENCY_FIELD).is_none());
}

#[test]
fn test_update_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_service(temp_dir.path(), "user-review-service", SERVICE_WITHOUT_LATENCY);
    let configurator = configurator(temp_dir.path());

    configurator.update_extra_latency("user-review-service", 20);
    let once = fs::read(&path).unwrap();
    configurator.update_extra_latency("user-review-service", 20);
    let twice = fs::read(&path).unwrap();

    assert_eq!(once, twice);
    assert_eq!(extra_latency_values(&load(&path)), vec!["20ms"]);
}

#[test]
fn test_append_then_update_keeps_one_entry() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_service(temp_dir.path(), "rating-service", SERVICE_WITHOUT_LATENCY);
    let configurator = configurator(temp_dir.path());

    configurator.update_extra_latency("rating-service", 10);
    let doc = load(&path);
    assert_eq!(extra_latency_values(&doc), vec!["10ms"]);
    assert_eq!(doc["container"]["env"].as_sequence().unwrap().len(), 2);

    configurator.update_extra_latency("rating-service", 75);
    let doc = load(&path);
    assert_eq!(extra_latency_values(&doc), vec!["75ms"]);
    assert_eq!(doc["container"]["env"].as_sequence().unwrap().len(), 2);
}

#[test]
fn test_missing_service_is_reported_without_writing() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = configurator(temp_dir.path()).update_extra_latency("nonexistent-service", 5);

    assert!(!outcome.is_updated());
    assert_eq!(outcome.service(), "nonexistent-service");

    let mut out = Vec::new();
    let mut err = Vec::new();
    colored::control::set_override(false);
    outcome.render(&mut out, &mut err).unwrap();
    assert!(out.is_empty());
    assert!(String::from_utf8(err).unwrap().contains("nonexistent-service"));

    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_container_leaves_file_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_service(temp_dir.path(), "page-service", "replicaCount: 1\n");

    let outcome = configurator(temp_dir.path()).update_extra_latency("page-service", 5);
    match outcome {
        ServiceOutcome::Skipped {
            reason: ConfiguratorError::Schema { reason, .. },
            ..
        } => assert!(reason.contains("container")),
        other => panic!("expected schema skip, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), "replicaCount: 1\n");
}

#[test]
fn test_malformed_yaml_leaves_file_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let contents = "container:\n  env: [\n";
    let path = write_service(temp_dir.path(), "text-service", contents);

    let outcome = configurator(temp_dir.path()).update_extra_latency("text-service", 5);
    assert!(matches!(
        outcome,
        ServiceOutcome::Skipped {
            reason: ConfiguratorError::Parse { .. },
            ..
        }
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), contents);
}

#[test]
fn test_legacy_field_is_written_when_enabled() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_service(temp_dir.path(), "cast-info-service", SERVICE_WITHOUT_LATENCY);
    let configurator =
        LatencyConfigurator::new(ConfiguratorConfig::new(temp_dir.path()).with_legacy_field(true));

    assert!(configurator.update_extra_latency("cast-info-service", 30).is_updated());

    let doc = load(&path);
    assert_eq!(doc["container"][LEGACY_LATENCY_FIELD].as_i64(), Some(30));
    assert_eq!(extra_latency_values(&doc), vec!["30ms"]);
}

#[test]
fn test_reset_all_services() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = ["a", "b", "c"]
        .iter()
        .map(|s| write_service(temp_dir.path(), s, SERVICE_WITH_LATENCY))
        .collect();

    let report = configurator(temp_dir.path()).reset_all_services().unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.updated().count(), 3);
    assert_eq!(
        report.outcomes().iter().map(ServiceOutcome::service).collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );

    for path in &paths {
        assert_eq!(extra_latency_values(&load(path)), vec!["0ms"]);
    }

    colored::control::set_override(false);
    let mut out = Vec::new();
    let mut err = Vec::new();
    report.render(&mut out, &mut err).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("for 3 services"));
    assert_eq!(out.matches("Finished resetting all services").count(), 1);
    assert!(err.is_empty());
}

#[test]
fn test_reset_all_continues_past_failures() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_service(temp_dir.path(), "a-service", SERVICE_WITH_LATENCY);
    write_service(temp_dir.path(), "b-service", "replicaCount: 1\n");
    fs::create_dir_all(temp_dir.path().join("c-service")).unwrap();
    let last = write_service(temp_dir.path(), "d-service", SERVICE_WITHOUT_LATENCY);

    let report = configurator(temp_dir.path()).reset_all_services().unwrap();
    assert_eq!(report.len(), 4);
    assert_eq!(report.updated().count(), 2);
    assert_eq!(
        report.skipped().map(ServiceOutcome::service).collect::<Vec<_>>(),
        vec!["b-service", "c-service"]
    );
    assert_eq!(extra_latency_values(&load(&good)), vec!["0ms"]);
    assert_eq!(extra_latency_values(&load(&last)), vec!["0ms"]);
}

#[test]
fn test_reset_all_without_charts_dir() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("charts");

    let result = configurator(&missing).reset_all_services();
    assert!(matches!(result, Err(ConfiguratorError::MissingBaseDirectory(_))));
    assert!(!missing.exists());
}

#[test]
fn test_reset_all_with_no_services() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Chart.yaml"), "name: media\n").unwrap();

    let result = configurator(temp_dir.path()).reset_all_services();
    assert!(matches!(result, Err(ConfiguratorError::NoServicesFound(_))));
}

// Binary behaviour: stream separation and exit codes

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_set-extra-latency"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_cli_updates_single_service() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_service(temp_dir.path(), "movie-id-service", SERVICE_WITHOUT_LATENCY);
    let charts = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--charts-dir", charts, "movie-id-service", "40"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("movie-id-service"));
    assert!(stdout.contains("40ms"));
    assert!(output.stderr.is_empty());
    assert_eq!(extra_latency_values(&load(&path)), vec!["40ms"]);
}

#[test]
fn test_cli_missing_service_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    let charts = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--charts-dir", charts, "nonexistent-service", "5"]);
    assert!(output.status.success());
    assert!(String::from_utf8(output.stderr)
        .unwrap()
        .contains("nonexistent-service"));
}

#[test]
fn test_cli_reset_all_without_charts_dir() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("charts");

    let output = run_cli(&["--charts-dir", missing.to_str().unwrap(), "--reset-all"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(String::from_utf8(output.stderr).unwrap().lines().count(), 1);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_cli_usage_error_exits_nonzero() {
    let output = run_cli(&["movie-id-service"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_show() {
    let temp_dir = TempDir::new().unwrap();
    write_service(temp_dir.path(), "rating-service", SERVICE_WITH_LATENCY);
    let charts = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--charts-dir", charts, "--show"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("rating-service"));
    assert!(stdout.contains("100ms"));
}
