//! Mock database clients for testing.
//!
//! Provides an in-memory client with scripted responses and a client that
//! rejects every statement.

use super::DatabaseClient;
use crate::error::{Result, TpchError};
use async_trait::async_trait;
use std::time::Duration;

/// Scripted response for statements containing a given fragment.
#[derive(Debug, Clone)]
enum Response {
    Rows(u64),
    Fail(String),
    Delay(Duration),
}

/// A mock database client that returns scripted results.
///
/// Every statement is recorded, in order, so tests can assert on exactly what
/// reached the "server". Read statements return one row unless a rule says
/// otherwise; rules are matched by case-sensitive substring, first match wins.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    rules: Vec<(String, Response)>,
    executed: Vec<String>,
    close_calls: usize,
    closed: bool,
}

impl MockDatabaseClient {
    /// Creates a new mock client with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements containing `fragment` return `rows` rows.
    pub fn with_rows(mut self, fragment: impl Into<String>, rows: u64) -> Self {
        self.rules.push((fragment.into(), Response::Rows(rows)));
        self
    }

    /// Statements containing `fragment` fail with `message`.
    pub fn with_failure(mut self, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules
            .push((fragment.into(), Response::Fail(message.into())));
        self
    }

    /// Statements containing `fragment` take `delay` before returning one row.
    pub fn with_delay(mut self, fragment: impl Into<String>, delay: Duration) -> Self {
        self.rules.push((fragment.into(), Response::Delay(delay)));
        self
    }

    /// Every statement received so far, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Statements received so far that contain `fragment`.
    pub fn executed_matching(&self, fragment: &str) -> Vec<&str> {
        self.executed
            .iter()
            .filter(|s| s.contains(fragment))
            .map(String::as_str)
            .collect()
    }

    /// Number of times `close` was called.
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// Returns true once the client has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn respond(&mut self, sql: &str, default_rows: u64) -> Result<u64> {
        if self.closed {
            return Err(TpchError::connection("connection is already closed"));
        }
        self.executed.push(sql.to_string());

        let response = self
            .rules
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, response)| response.clone());

        match response {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Fail(message)) => Err(TpchError::query(message)),
            Some(Response::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(default_rows)
            }
            None => Ok(default_rows),
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.respond(sql, 0).await
    }

    async fn fetch_row_count(&mut self, sql: &str) -> Result<u64> {
        self.respond(sql, 1).await
    }

    async fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        self.closed = true;
        Ok(())
    }
}

/// A client whose every statement fails with the same message.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    message: String,
    attempts: usize,
}

impl FailingDatabaseClient {
    /// Creates a client failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            attempts: 0,
        }
    }

    /// Number of statements attempted.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute(&mut self, _sql: &str) -> Result<u64> {
        self.attempts += 1;
        Err(TpchError::query(self.message.clone()))
    }

    async fn fetch_row_count(&mut self, _sql: &str) -> Result<u64> {
        self.attempts += 1;
        Err(TpchError::query(self.message.clone()))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_select_defaults_to_one_row() {
        let mut client = MockDatabaseClient::new();
        let rows = client.fetch_row_count("SELECT 1").await.unwrap();
        assert_eq!(rows, 1);
        assert_eq!(client.executed(), ["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_mock_scripted_rows_and_failures() {
        let mut client = MockDatabaseClient::new()
            .with_rows("lineitem", 4)
            .with_failure("orders", "ERROR 1146 (42S02): Table 'tpch.orders' doesn't exist");

        assert_eq!(client.fetch_row_count("select * from lineitem").await.unwrap(), 4);
        let err = client.fetch_row_count("select * from orders").await.unwrap_err();
        assert!(err.message().contains("1146"));
        assert_eq!(client.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_insert_returns_zero() {
        let mut client = MockDatabaseClient::new();
        let affected = client.execute("INSERT INTO t VALUES (1)").await.unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_mock_rejects_after_close() {
        let mut client = MockDatabaseClient::new();
        client.close().await.unwrap();
        client.close().await.unwrap();
        assert_eq!(client.close_calls(), 2);
        assert!(client.execute("select 1").await.is_err());
        assert!(client.executed().is_empty());
    }

    #[tokio::test]
    async fn test_failing_client() {
        let mut client = FailingDatabaseClient::new("server has gone away");
        let err = client.execute("select 1").await.unwrap_err();
        assert_eq!(err.message(), "server has gone away");
        assert_eq!(client.attempts(), 1);
    }
}
