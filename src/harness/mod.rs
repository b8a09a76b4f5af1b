//! Query execution harness.
//!
//! Runs a batch of catalog queries on one session, strictly one after another,
//! and records a timing and an outcome for each. A failing query never stops
//! the batch: its error text goes into the report and the next query starts.

pub mod precheck;
pub mod report;
pub mod statement;

pub use report::{render_report, write_report, ExecutionResult, Outcome};
pub use statement::{
    apply_execution_time_hint, is_read_only, session_limit_statement, QueryTimeout,
};

use std::time::Instant;

use tracing::{info, warn};

use crate::catalog::{QueryCatalog, QueryDefinition};
use crate::connection::try_set_session_limit;
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::monitor::{MemoryStats, RssSampler, SAMPLE_INTERVAL};

/// Executes catalog queries against a session and collects their results.
pub struct QueryHarness<'a> {
    db: &'a mut dyn DatabaseClient,
    catalog: &'a QueryCatalog,
    timeout: QueryTimeout,
    monitor_pid: Option<u32>,
}

impl<'a> QueryHarness<'a> {
    /// Creates a harness over `db` using queries from `catalog`.
    pub fn new(
        db: &'a mut dyn DatabaseClient,
        catalog: &'a QueryCatalog,
        timeout: QueryTimeout,
    ) -> Self {
        Self {
            db,
            catalog,
            timeout,
            monitor_pid: None,
        }
    }

    /// Samples the RSS of `pid` while each query runs.
    pub fn with_monitor(mut self, pid: Option<u32>) -> Self {
        self.monitor_pid = pid;
        self
    }

    /// Runs `query_ids` in the given order, duplicates included.
    ///
    /// Every id is resolved before anything executes, so an unknown id fails
    /// the call without touching the database. After that the returned vector
    /// always has one entry per requested id, in request order.
    pub async fn run(&mut self, query_ids: &[u32]) -> Result<Vec<ExecutionResult>> {
        let catalog = self.catalog;
        let queries = catalog.resolve(query_ids)?;
        info!(
            "Running {} queries (timeout: {})",
            queries.len(),
            self.timeout
        );

        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let result = self.run_query(query).await;
            match result.error() {
                None => info!(
                    "Q{} ok in {:.3}s ({} rows)",
                    result.query_id(),
                    result.seconds(),
                    result.rows().unwrap_or_default()
                ),
                Some(e) => warn!(
                    "Q{} failed after {:.3}s: {}",
                    result.query_id(),
                    result.seconds(),
                    e
                ),
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Runs one query: session limit, timed statements, classification.
    ///
    /// Statement failures become a failed [`ExecutionResult`]. A memory
    /// monitor that cannot start (the process died mid-run) is recorded as
    /// `monitor_error` on this query's result.
    async fn run_query(&mut self, query: &QueryDefinition) -> ExecutionResult {
        let _ = try_set_session_limit(&mut *self.db, self.timeout).await;

        let sampler = self.monitor_pid.map(|pid| {
            RssSampler::start(pid, SAMPLE_INTERVAL).map_err(|e| {
                warn!("Q{}: memory monitor unavailable: {e}", query.id);
                MemoryStats::unavailable(pid, e.message())
            })
        });

        let start = Instant::now();
        let outcome = execute_statements(&mut *self.db, query, self.timeout).await;
        let seconds = start.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(rows) => ExecutionResult::succeeded(query, seconds, rows),
            Err(e) => ExecutionResult::failed(query, seconds, e.message()),
        };

        match sampler {
            Some(Ok(sampler)) => result.with_monitor(sampler.stop().await),
            Some(Err(stats)) => result.with_monitor(stats),
            None => result,
        }
    }
}

/// Executes a query's statements in order, stopping at the first error.
///
/// Each statement is classified on its own: read-only statements get the
/// execution-time hint and contribute their row count to the total.
pub async fn execute_statements(
    db: &mut dyn DatabaseClient,
    query: &QueryDefinition,
    timeout: QueryTimeout,
) -> Result<u64> {
    let mut rows = 0;
    for statement in query.statements {
        let sql = apply_execution_time_hint(statement, timeout);
        if is_read_only(&sql) {
            rows += db.fetch_row_count(&sql).await?;
        } else {
            db.execute(&sql).await?;
        }
    }
    Ok(rows)
}
