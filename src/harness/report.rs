//! Per-query results and the JSON report.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::catalog::QueryDefinition;
use crate::error::{Result, TpchError};
use crate::monitor::MemoryStats;

/// How a query ended: with a row count or with an error message.
///
/// Serialized flattened into [`ExecutionResult`] as exactly one of the
/// `rows` or `error` keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Rows(u64),
    Error(String),
}

/// Result of running one query from the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    query_id: u32,
    title: String,
    ok: bool,
    seconds: f64,
    #[serde(flatten)]
    outcome: Outcome,
    #[serde(flatten)]
    monitor: Option<MemoryStats>,
}

impl ExecutionResult {
    /// A query whose statements all succeeded.
    pub fn succeeded(query: &QueryDefinition, seconds: f64, rows: u64) -> Self {
        Self::new(query, seconds, Outcome::Rows(rows))
    }

    /// A query that stopped at a failing statement.
    pub fn failed(query: &QueryDefinition, seconds: f64, error: impl Into<String>) -> Self {
        Self::new(query, seconds, Outcome::Error(error.into()))
    }

    fn new(query: &QueryDefinition, seconds: f64, outcome: Outcome) -> Self {
        Self {
            query_id: query.id,
            title: query.title.to_string(),
            ok: matches!(outcome, Outcome::Rows(_)),
            seconds,
            outcome,
            monitor: None,
        }
    }

    /// Attaches memory samples taken while the query ran.
    pub fn with_monitor(mut self, stats: MemoryStats) -> Self {
        self.monitor = Some(stats);
        self
    }

    pub fn query_id(&self) -> u32 {
        self.query_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Elapsed wall time in seconds, measured on a monotonic clock.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Total rows returned by the read-only statements, when the query succeeded.
    pub fn rows(&self) -> Option<u64> {
        match self.outcome {
            Outcome::Rows(rows) => Some(rows),
            Outcome::Error(_) => None,
        }
    }

    /// The driver's error text, when the query failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Rows(_) => None,
            Outcome::Error(e) => Some(e),
        }
    }

    pub fn monitor(&self) -> Option<&MemoryStats> {
        self.monitor.as_ref()
    }
}

/// Renders the report as pretty-printed JSON with a trailing newline.
pub fn render_report(results: &[ExecutionResult]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(results)
        .map_err(|e| TpchError::internal(format!("Failed to serialize report: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Writes the report to `output`, or to stdout when no path is given.
pub fn write_report(results: &[ExecutionResult], output: Option<&Path>) -> Result<()> {
    let json = render_report(results)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| TpchError::io(format!("Failed to write {}: {e}", path.display()))),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(json.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| TpchError::io(format!("Failed to write report to stdout: {e}")))
        }
    }
}
