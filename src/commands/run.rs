//! `run` and `bench`.

use std::path::PathBuf;

use tracing::info;

use crate::catalog::QueryCatalog;
use crate::connection::ConnectionManager;
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::generate::GeneratorRequest;
use crate::harness::precheck::run_precheck;
use crate::harness::{write_report, ExecutionResult, QueryHarness, QueryTimeout};
use crate::load::LoadOptions;

use super::setup::setup_phases;

/// Options for a timed query run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Query ids in execution order; duplicates run again.
    pub query_ids: Vec<u32>,
    pub timeout: QueryTimeout,
    pub precheck: bool,
    pub monitor_pid: Option<u32>,
    /// Report destination; stdout when unset.
    pub output: Option<PathBuf>,
}

/// Optional precheck, then the timed run of every requested query.
pub async fn run_queries(
    db: &mut dyn DatabaseClient,
    catalog: &QueryCatalog,
    options: &RunOptions,
) -> Result<Vec<ExecutionResult>> {
    if options.precheck {
        run_precheck(db, catalog, &options.query_ids, options.timeout).await?;
    }
    QueryHarness::new(db, catalog, options.timeout)
        .with_monitor(options.monitor_pid)
        .run(&options.query_ids)
        .await
}

/// Runs the queries and writes the report.
///
/// Succeeds even when individual queries fail; their errors are in the report.
pub async fn cmd_run(
    mut conn: ConnectionManager,
    catalog: &QueryCatalog,
    options: &RunOptions,
) -> Result<()> {
    let outcome = run_phase(&mut conn, catalog, options).await;
    let results = conn.finish(outcome).await?;
    finish_report(&results, options)
}

/// Schema, generation, load, then a timed run of the requested queries.
pub async fn cmd_bench(
    mut conn: ConnectionManager,
    catalog: &QueryCatalog,
    request: &GeneratorRequest,
    load: &LoadOptions,
    options: &RunOptions,
) -> Result<()> {
    let outcome = bench_phases(&mut conn, catalog, request, load, options).await;
    let results = conn.finish(outcome).await?;
    finish_report(&results, options)
}

async fn bench_phases(
    conn: &mut ConnectionManager,
    catalog: &QueryCatalog,
    request: &GeneratorRequest,
    load: &LoadOptions,
    options: &RunOptions,
) -> Result<Vec<ExecutionResult>> {
    setup_phases(conn, request, load).await?;
    info!("run: {} queries", options.query_ids.len());
    run_phase(conn, catalog, options).await
}

async fn run_phase(
    conn: &mut ConnectionManager,
    catalog: &QueryCatalog,
    options: &RunOptions,
) -> Result<Vec<ExecutionResult>> {
    run_queries(conn.db()?, catalog, options).await
}

fn finish_report(results: &[ExecutionResult], options: &RunOptions) -> Result<()> {
    let failed = results.iter().filter(|r| !r.is_ok()).count();
    let total: f64 = results.iter().map(ExecutionResult::seconds).sum();
    info!(
        "{} of {} queries succeeded, {:.3}s total",
        results.len() - failed,
        results.len(),
        total
    );
    write_report(results, options.output.as_deref())?;
    if let Some(path) = &options.output {
        info!("Report written to {}", path.display());
    }
    Ok(())
}
