//! Integration test: probe configuration files driving a full run.

use std::fs;
use std::path::PathBuf;

use strata::{ProbeConfig, ProbeError, ProbeRunner};

fn temp_config_path(tag: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("strata_probe_{tag}_{id}.toml"))
}

#[test]
fn test_config_file_drives_a_passing_run() {
    let path = temp_config_path("ok");
    fs::write(
        &path,
        "elements = 40\nfail_at_clone = 39\nlog_filter = \"strata=trace\"\n",
    )
    .unwrap();

    let config = ProbeConfig::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(config.elements, 40);
    assert_eq!(config.log_filter, "strata=trace");

    let mut runner = ProbeRunner::new(config);
    runner.run_all();
    assert!(runner.all_passed(), "{:?}", runner.results());
}

#[test]
fn test_thorough_preset_passes() {
    let mut runner = ProbeRunner::new(ProbeConfig::thorough());
    runner.run_all();
    assert!(runner.all_passed(), "{:?}", runner.results());
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let path = temp_config_path("bad");
    fs::write(&path, "elements = \"many\"\n").unwrap();

    let err = ProbeConfig::load(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, ProbeError::Parse(_)));
}
