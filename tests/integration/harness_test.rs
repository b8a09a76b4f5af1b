//! End-to-end harness tests against the mock client.
//!
//! Arguments go through the real CLI parser and the real TPC-H catalog.

use clap::Parser;
use pretty_assertions::assert_eq;
use tpch_mysql::catalog::QueryCatalog;
use tpch_mysql::cli::{Cli, Command, RunArgs};
use tpch_mysql::commands::run_queries;
use tpch_mysql::db::{FailingDatabaseClient, MockDatabaseClient};
use tpch_mysql::harness::render_report;

fn run_args(args: &[&str]) -> RunArgs {
    let mut argv = vec!["tpch-mysql", "run"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Run(run) => run,
        other => panic!("expected run, got {other:?}"),
    }
}

#[tokio::test]
async fn test_repeated_query_flags_report_in_request_order() {
    let catalog = QueryCatalog::tpch();
    let options = run_args(&["--query", "1", "--query", "6,19"])
        .to_options(&catalog)
        .unwrap();
    let mut db = MockDatabaseClient::new();

    let results = run_queries(&mut db, &catalog, &options).await.unwrap();

    let ids: Vec<u32> = results.iter().map(|r| r.query_id()).collect();
    assert_eq!(ids, vec![1, 6, 19]);
    assert_eq!(results[1].title(), "Forecasting Revenue Change Query");
    assert!(results.iter().all(|r| r.is_ok()));
}

#[tokio::test]
async fn test_all_runs_22_queries_in_ascending_order() {
    let catalog = QueryCatalog::tpch();
    let options = run_args(&["--all"]).to_options(&catalog).unwrap();
    let mut db = MockDatabaseClient::new();

    let results = run_queries(&mut db, &catalog, &options).await.unwrap();

    let ids: Vec<u32> = results.iter().map(|r| r.query_id()).collect();
    assert_eq!(ids, (1..=22).collect::<Vec<u32>>());
    // Q15 drops and creates its view, then selects once and drops again.
    assert_eq!(results[14].rows(), Some(1));
}

#[tokio::test]
async fn test_disabled_timeout_sends_catalog_text_verbatim() {
    let catalog = QueryCatalog::tpch();
    let options = run_args(&["--all", "--timeout-seconds", "0"])
        .to_options(&catalog)
        .unwrap();
    let mut db = MockDatabaseClient::new();

    run_queries(&mut db, &catalog, &options).await.unwrap();

    let expected: Vec<&str> = catalog
        .ids()
        .into_iter()
        .flat_map(|id| catalog.get(id).unwrap().statements.iter().copied())
        .collect();
    assert_eq!(db.executed(), expected.as_slice());
}

#[tokio::test]
async fn test_timeout_hints_every_read_only_statement() {
    let catalog = QueryCatalog::tpch();
    let options = run_args(&["--query", "15", "--timeout-seconds", "10"])
        .to_options(&catalog)
        .unwrap();
    let mut db = MockDatabaseClient::new();

    run_queries(&mut db, &catalog, &options).await.unwrap();

    let executed = db.executed();
    assert_eq!(executed[0], "SET SESSION max_execution_time = 10000");
    assert_eq!(executed.len(), 5);
    assert_eq!(db.executed_matching("MAX_EXECUTION_TIME(10000)").len(), 1);
    assert!(executed[3].starts_with("select /*+ MAX_EXECUTION_TIME(10000) */"));
}

#[tokio::test]
async fn test_report_from_dead_connection_is_complete() {
    let catalog = QueryCatalog::tpch();
    let options = run_args(&["--query", "2,2,9"]).to_options(&catalog).unwrap();
    let mut db = FailingDatabaseClient::new("Lost connection to MySQL server during query");

    let results = run_queries(&mut db, &catalog, &options).await.unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&render_report(&results).unwrap()).unwrap();

    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for entry in entries {
        assert_eq!(entry["ok"], false);
        assert_eq!(
            entry["error"],
            "Lost connection to MySQL server during query"
        );
        assert!(entry.get("rows").is_none());
    }
}

#[tokio::test]
async fn test_monitor_failure_is_recorded_per_query() {
    let catalog = QueryCatalog::tpch();
    let mut options = run_args(&["--query", "1,6"]).to_options(&catalog).unwrap();
    // A process that exits after argument validation.
    options.monitor_pid = Some(u32::MAX);
    let mut db = MockDatabaseClient::new();

    let results = run_queries(&mut db, &catalog, &options).await.unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&render_report(&results).unwrap()).unwrap();

    assert_eq!(db.executed().len(), 2);
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert_eq!(entry["ok"], true);
        assert_eq!(entry["rows"], 1);
        assert_eq!(entry["monitor_pid"], u32::MAX);
        assert!(entry["monitor_error"]
            .as_str()
            .unwrap()
            .starts_with("read /proc/4294967295/status"));
    }
}
