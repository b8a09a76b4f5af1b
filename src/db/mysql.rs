//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! on top of a single sqlx `MySqlConnection`.

use crate::config::MySqlConfig;
use crate::db::DatabaseClient;
use crate::error::{Result, TpchError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError};
use sqlx::{ConnectOptions, Connection, Executor};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// MySQL database client holding one session.
#[derive(Debug)]
pub struct MySqlClient {
    conn: Option<MySqlConnection>,
}

impl MySqlClient {
    /// Connects to MySQL, retrying transient network failures.
    ///
    /// Auto-commit is enabled on the new session; the benchmark never opens
    /// explicit transactions.
    pub async fn connect(config: &MySqlConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .disable_statement_logging();

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            match options.connect().await {
                Ok(mut conn) => {
                    debug!("Connected to {}", config.display_string());
                    Executor::execute(&mut conn, sqlx::raw_sql("SET autocommit = 1"))
                        .await
                        .map_err(|e| TpchError::connection(format_query_error(e)))?;
                    return Ok(Self { conn: Some(conn) });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        last_error = Some(e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        return Err(map_connection_error(e, config));
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => map_connection_error(e, config),
            None => TpchError::connection("no connection attempt was made"),
        })
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| TpchError::connection("connection is already closed"))
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let conn = self.conn()?;
        let result = Executor::execute(&mut *conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| TpchError::query(format_query_error(e)))?;
        Ok(result.rows_affected())
    }

    async fn fetch_row_count(&mut self, sql: &str) -> Result<u64> {
        let conn = self.conn()?;
        let mut rows = sqlx::raw_sql(sql).fetch(&mut *conn);
        let mut count = 0u64;
        while rows
            .try_next()
            .await
            .map_err(|e| TpchError::query(format_query_error(e)))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| TpchError::connection(format!("Failed to close connection: {e}")))?;
            debug!("Connection closed");
        }
        Ok(())
    }
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::Io(_)) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();

    // Authentication and unknown-database errors are not transient
    if error_str.contains("access denied")
        || error_str.contains("unknown database")
        || error_str.contains("ssl")
        || error_str.contains("tls")
    {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
        || error_str.contains("too many connections")
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &MySqlConfig) -> TpchError {
    let host = &config.host;
    let port = config.port;
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        TpchError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        TpchError::connection(format!(
            "Access denied for user '{}'. Check your credentials.",
            config.user
        ))
    } else if error_str.contains("unknown database") {
        TpchError::connection(format!(
            "Database '{}' does not exist. Create it before running tpch-mysql.",
            config.database
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        TpchError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        TpchError::connection(error.to_string())
    }
}

/// Formats a statement error the way the mysql client prints it.
///
/// Server errors become `ERROR <number> (<sqlstate>): <message>`; other
/// driver errors keep their own text.
fn format_query_error(error: sqlx::Error) -> String {
    if let Some(db_error) = error.as_database_error() {
        if let Some(mysql_error) = db_error.try_downcast_ref::<MySqlDatabaseError>() {
            return match mysql_error.code() {
                Some(state) => format!(
                    "ERROR {} ({}): {}",
                    mysql_error.number(),
                    state,
                    mysql_error.message()
                ),
                None => format!("ERROR {}: {}", mysql_error.number(), mysql_error.message()),
            };
        }
        return db_error.message().to_string();
    }
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests need a running MySQL server; they skip unless DATABASE_URL is set.

    async fn get_test_client() -> Option<MySqlClient> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let config = crate::config::ConnectionConfig::from_connection_string(&url)
            .ok()?
            .resolve()
            .ok()?;
        MySqlClient::connect(&config).await.ok()
    }

    #[tokio::test]
    async fn test_fetch_row_count() {
        let Some(mut client) = get_test_client().await else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        let rows = client
            .fetch_row_count("select 1 union all select 2 union all select 3")
            .await
            .unwrap();
        assert_eq!(rows, 3);

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_query_error_has_mysql_format() {
        let Some(mut client) = get_test_client().await else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        let err = client
            .fetch_row_count("select * from nonexistent_table_xyz")
            .await
            .unwrap_err();
        assert!(err.message().starts_with("ERROR 1146"), "{err}");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_reports_affected_rows() {
        let Some(mut client) = get_test_client().await else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        client
            .execute("CREATE TEMPORARY TABLE tpch_mysql_affected (x INT)")
            .await
            .unwrap();
        let inserted = client
            .execute("INSERT INTO tpch_mysql_affected VALUES (1), (2)")
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert!(client
            .execute("SET SESSION max_execution_time = 1000")
            .await
            .is_ok());

        client.close().await.unwrap();
    }

    #[test]
    fn test_statement_futures_are_send() {
        fn assert_send<T: Send>(_: &T) {}

        fn check(client: &mut MySqlClient) {
            let execute = client.execute("SET SESSION max_execution_time = 1000");
            assert_send(&execute);
            drop(execute);
            let fetch = client.fetch_row_count("select 1");
            assert_send(&fetch);
        }

        let _ = check;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let Some(mut client) = get_test_client().await else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(client.execute("select 1").await.is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_connection_error_messages() {
        let config = MySqlConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "bench".to_string(),
            password: "bench".to_string(),
            database: "tpch".to_string(),
        };

        let result = MySqlClient::connect(&config).await;
        let error = result.unwrap_err();
        assert!(matches!(error, TpchError::Connection(_)));
    }

    #[test]
    fn test_io_errors_are_transient() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(is_transient_error(&err));
    }

    #[test]
    fn test_protocol_errors_are_not_transient() {
        let err = sqlx::Error::Protocol("Access denied for user 'bench'".to_string());
        assert!(!is_transient_error(&err));
    }

    #[test]
    fn test_map_connection_error_refused() {
        let config = MySqlConfig {
            host: "db".to_string(),
            port: 3306,
            user: "bench".to_string(),
            password: String::new(),
            database: "tpch".to_string(),
        };
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused (os error 111)",
        ));
        let mapped = map_connection_error(err, &config);
        assert_eq!(
            mapped.to_string(),
            "Connection error: Cannot connect to db:3306. Check that the server is running."
        );
    }

    #[test]
    fn test_format_non_database_error() {
        let err = sqlx::Error::Protocol("unexpected packet".to_string());
        assert_eq!(
            format_query_error(err),
            "encountered unexpected or invalid data: unexpected packet"
        );
    }
}
