//! Tests that run the built binary.
//!
//! None of these reach a server: every case fails during argument or
//! configuration validation, before a connection is opened.

use std::path::Path;
use std::process::{Command, Output};

const CLEARED_ENV: &[&str] = &[
    "DATABASE_URL",
    "MYSQL_HOST",
    "MYSQL_TCP_PORT",
    "MYSQL_USER",
    "MYSQL_PWD",
    "MYSQL_DATABASE",
    "RUST_LOG",
];

/// Runs the binary in `dir` with a clean MySQL environment and no config file.
fn tpch_mysql(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tpch-mysql"));
    command
        .current_dir(dir)
        .arg("--config")
        .arg(dir.join("missing.toml"))
        .args(args);
    for key in CLEARED_ENV {
        command.env_remove(key);
    }
    command.output().expect("failed to run tpch-mysql")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_run_without_selection_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = tpch_mysql(dir.path(), &["run"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_query_id_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let output = tpch_mysql(dir.path(), &["run", "--query", "6,23"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown query id: 23"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_gen_rejects_zero_scale_factor() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let output = tpch_mysql(
        dir.path(),
        &[
            "gen",
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--scale-factor",
            "0",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--scale-factor must be greater than 0"));
    assert!(!data_dir.exists());
}

#[test]
fn test_run_without_host_names_the_flag() {
    let dir = tempfile::tempdir().unwrap();
    let output = tpch_mysql(dir.path(), &["run", "--all"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--host"));
}

#[test]
fn test_load_rejects_unknown_table() {
    let dir = tempfile::tempdir().unwrap();
    let output = tpch_mysql(
        dir.path(),
        &["load", "--data-dir", "data", "--tables", "nation,widgets"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("widgets"));
}

#[test]
fn test_unreadable_monitor_pid_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let output = tpch_mysql(
        dir.path(),
        &["run", "--all", "--monitor-pid", "4294967295"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--monitor-pid 4294967295"));
    assert!(!stderr(&output).contains("--host"));
}
