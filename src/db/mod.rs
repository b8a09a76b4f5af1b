//! Database abstraction layer for tpch-mysql.
//!
//! Provides a trait-based interface for the few operations the benchmark
//! needs, so the harness can run against MySQL or an in-memory mock.

mod mock;
mod mysql;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;

use crate::config::MySqlConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens a MySQL session for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &MySqlConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = MySqlClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// A client wraps exactly one session: session variables set through
/// [`DatabaseClient::execute`] apply to every later statement.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a statement that returns no rows, returning the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Executes a statement and returns the number of rows it produced.
    ///
    /// Rows are consumed as they arrive and not retained.
    async fn fetch_row_count(&mut self, sql: &str) -> Result<u64>;

    /// Closes the session. Closing an already closed client is a no-op.
    async fn close(&mut self) -> Result<()>;
}
