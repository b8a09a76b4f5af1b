//! Dry run of the requested queries against empty shadow tables.
//!
//! The TPC-H tables are recreated as session-local temporary tables, which
//! MySQL resolves ahead of the real tables of the same name. Every query then
//! runs once against empty data, so syntax and name errors surface in
//! milliseconds instead of after a long benchmark.

use tracing::{info, warn};

use crate::catalog::{QueryCatalog, QueryDefinition};
use crate::connection::try_set_session_limit;
use crate::db::DatabaseClient;
use crate::error::{Result, TpchError};
use crate::schema::{split_script, Table, SCHEMA_SQL};

use super::statement::{apply_execution_time_hint, is_read_only, QueryTimeout};

/// What happened to the precheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecheckOutcome {
    /// Every checkable query ran cleanly against the shadow tables.
    Passed,
    /// The server does not accept temporary tables; nothing was checked.
    Unsupported,
}

/// Rewrites a `CREATE TABLE` statement into `CREATE TEMPORARY TABLE`.
///
/// Leading whitespace is kept; anything else is returned unchanged.
pub fn to_temporary_table_ddl(statement: &str) -> String {
    const CREATE_TABLE: &str = "create table";

    let stripped = statement.trim_start();
    let is_create_table = stripped
        .get(..CREATE_TABLE.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(CREATE_TABLE));
    if !is_create_table {
        return statement.to_string();
    }
    let indent = &statement[..statement.len() - stripped.len()];
    format!(
        "{indent}CREATE TEMPORARY TABLE{}",
        &stripped[CREATE_TABLE.len()..]
    )
}

/// Returns true for a query that defines a view.
///
/// MySQL neither lets a view read a temporary table nor lets one statement
/// open the same temporary table twice, so such queries cannot run against
/// the shadow schema.
pub fn defines_view(query: &QueryDefinition) -> bool {
    query.statements.iter().any(|statement| {
        let mut words = statement.split_whitespace();
        let create = words.next().is_some_and(|w| w.eq_ignore_ascii_case("create"));
        create && words.next().is_some_and(|w| w.eq_ignore_ascii_case("view"))
    })
}

/// Returns true when `error` is the server rejecting `TEMPORARY` syntax.
pub fn should_skip_precheck(error: &TpchError) -> bool {
    let message = error.message();
    message.contains("1064") && message.to_ascii_uppercase().contains("TEMPORARY")
}

fn drop_temporary_statement(table: Table) -> String {
    format!("DROP TEMPORARY TABLE IF EXISTS `{}`", table.name())
}

/// Creates the temporary shadow of every TPC-H table.
pub async fn install_shadow_schema(db: &mut dyn DatabaseClient) -> Result<()> {
    drop_shadow_schema(db).await?;
    for statement in split_script(SCHEMA_SQL) {
        let ddl = to_temporary_table_ddl(statement);
        db.execute(&ddl).await.map_err(|e| {
            TpchError::query(format!(
                "precheck: install temporary schema: {}",
                e.message()
            ))
        })?;
    }
    Ok(())
}

/// Drops the shadow tables so later statements see the real ones again.
pub async fn drop_shadow_schema(db: &mut dyn DatabaseClient) -> Result<()> {
    for table in Table::ALL {
        db.execute(&drop_temporary_statement(table))
            .await
            .map_err(|e| {
                TpchError::query(format!(
                    "precheck: drop temporary table `{table}`: {}",
                    e.message()
                ))
            })?;
    }
    Ok(())
}

/// Runs each query once, failing on the first statement error.
pub async fn precheck_queries(
    db: &mut dyn DatabaseClient,
    queries: &[&QueryDefinition],
    timeout: QueryTimeout,
) -> Result<()> {
    for query in queries {
        if defines_view(query) {
            info!("Precheck: Q{} defines a view, skipped", query.id);
            continue;
        }
        for (index, statement) in query.statements.iter().enumerate() {
            let _ = try_set_session_limit(db, timeout).await;
            let sql = apply_execution_time_hint(statement, timeout);
            let executed = if is_read_only(&sql) {
                db.fetch_row_count(&sql).await.map(|_| ())
            } else {
                db.execute(&sql).await.map(|_| ())
            };
            executed.map_err(|e| {
                TpchError::query(format!(
                    "precheck failed (Q{} - {}) stmt#{index}: {}",
                    query.id,
                    query.title,
                    e.message()
                ))
            })?;
        }
    }
    Ok(())
}

/// Installs the shadow schema, checks `query_ids`, then removes the shadows.
///
/// A server that rejects temporary tables yields
/// [`PrecheckOutcome::Unsupported`] instead of an error. The shadows are
/// always removed before returning `Passed`, otherwise the timed run would
/// read the empty tables.
pub async fn run_precheck(
    db: &mut dyn DatabaseClient,
    catalog: &QueryCatalog,
    query_ids: &[u32],
    timeout: QueryTimeout,
) -> Result<PrecheckOutcome> {
    let queries = catalog.resolve(query_ids)?;

    match install_shadow_schema(db).await {
        Ok(()) => {}
        Err(e) if should_skip_precheck(&e) => {
            warn!("Precheck disabled: server does not support TEMPORARY TABLE ({e})");
            return Ok(PrecheckOutcome::Unsupported);
        }
        Err(e) => return Err(e),
    }

    if let Err(e) = precheck_queries(db, &queries, timeout).await {
        if let Err(drop_err) = drop_shadow_schema(db).await {
            warn!("Failed to drop precheck tables: {drop_err}");
        }
        return Err(e);
    }

    drop_shadow_schema(db).await?;
    info!("Precheck passed for {} queries", queries.len());
    Ok(PrecheckOutcome::Passed)
}
