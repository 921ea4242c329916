//! Integration tests for the CLI interface

mod common;

use common::{cli, TestCacheBuilder};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_cli_help_flag() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_run_help_lists_datasets() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nyu-rest"))
        .stdout(predicate::str::contains("spm-auditory"))
        .stdout(predicate::str::contains("--no-wait"));
}

#[test]
fn test_list_shows_defaults() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("nyu-rest"))
        .stdout(predicate::str::contains("NYU resting state"))
        .stdout(predicate::str::contains("/tmp/nyu_data"))
        .stdout(predicate::str::contains("/tmp/fsl_feeds_mrimc_output"))
        .stdout(predicate::str::contains("SPM Multimodal fMRI faces vs scrambled"));
}

#[test]
fn test_unknown_dataset_is_argument_error() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .args(["run", "abide"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_dataset_fails_with_storage_error() {
    let cache = TestCacheBuilder::new().unwrap().build().unwrap();
    cli(cache.temp_dir.path())
        .args(["run", "fsl-feeds", "--no-wait", "--data-dir"])
        .arg(&cache.data_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found in cache"));
}

#[test]
fn test_missing_config_file_exits_with_two() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .arg("-c")
        .arg(temp.path().join("absent.toml"))
        .args(["run", "fsl-feeds"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration problem"));
}

#[test]
fn test_invalid_config_file_exits_with_two() {
    let cache = TestCacheBuilder::new()
        .unwrap()
        .with_config("[engine\nprogram = ")
        .build()
        .unwrap();
    cli(cache.temp_dir.path())
        .arg("-c")
        .arg(cache.config_path.as_ref().unwrap())
        .args(["run", "fsl-feeds"])
        .assert()
        .code(2);
}

#[test]
fn test_output_dir_needs_single_dataset() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .args(["run", "fsl-feeds", "spm-auditory", "--output-dir"])
        .arg(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("single dataset"));
}

#[test]
fn test_session_zero_is_rejected() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .args(["run", "nyu-rest", "--session", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_engine_program_fails() {
    let cache = TestCacheBuilder::new()
        .unwrap()
        .with_fsl_feeds()
        .with_config("[engine]\nprogram = \"definitely-not-a-realign-binary\"\n")
        .build()
        .unwrap();
    cli(cache.temp_dir.path())
        .arg("-c")
        .arg(cache.config_path.as_ref().unwrap())
        .args(["run", "fsl-feeds", "--no-wait", "--data-dir"])
        .arg(&cache.data_dir)
        .arg("--output-dir")
        .arg(&cache.output_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("definitely-not-a-realign-binary"));
}

#[cfg(unix)]
#[test]
fn test_run_fsl_feeds_with_script_engine() {
    let cache = TestCacheBuilder::new()
        .unwrap()
        .with_fsl_feeds()
        .with_engine_script()
        .with_config("[engine]\nprogram = \"{engine}\"\n")
        .build()
        .unwrap();

    cli(cache.temp_dir.path())
        .arg("-c")
        .arg(cache.config_path.as_ref().unwrap())
        .args(["run", "fsl-feeds", "--no-wait", "--data-dir"])
        .arg(&cache.data_dir)
        .arg("--output-dir")
        .arg(&cache.output_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Estimated motion for sub001 (session 0) of 'FSL FEEDS'",
        ))
        .stdout(predicate::str::contains("2 volumes"))
        .stdout(predicate::str::contains("FSL FEEDS: 1 subject(s), 1 session(s)"));

    assert!(cache.output_dir.join("sub001").join("rp_fmri.txt").is_file());
}

#[cfg(unix)]
#[test]
fn test_run_nyu_session_two_with_env_engine() {
    let cache = TestCacheBuilder::new()
        .unwrap()
        .with_nyu_subject(1, "sub05676")
        .with_nyu_subject(2, "sub05676")
        .with_nyu_subject(2, "sub08224")
        .with_engine_script()
        .build()
        .unwrap();

    cli(cache.temp_dir.path())
        .env("REALIGN_ENGINE", cache.engine_path.as_ref().unwrap())
        .env("REALIGN_NO_WAIT", "1")
        .args(["run", "nyu-rest", "--session", "2", "--data-dir"])
        .arg(&cache.data_dir)
        .arg("--output-dir")
        .arg(&cache.output_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("NYU resting state: 2 subject(s), 2 session(s)"));

    let session_dir = cache.output_dir.join("session2");
    assert!(session_dir.join("sub05676").join("rp_lfo.txt").is_file());
    assert!(session_dir.join("sub08224").join("rp_lfo.txt").is_file());
    assert!(!cache.output_dir.join("session1").exists());
}
