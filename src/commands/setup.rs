//! `schema`, `load` and `all`.

use tracing::info;

use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::generate::{generate, GeneratorRequest};
use crate::load::{load_tables, LoadOptions};
use crate::schema::create_schema;

/// Creates the TPC-H tables.
pub async fn cmd_schema(mut conn: ConnectionManager) -> Result<()> {
    let outcome = schema_phase(&mut conn).await;
    conn.finish(outcome).await
}

/// Loads the generated data files.
pub async fn cmd_load(mut conn: ConnectionManager, options: &LoadOptions) -> Result<()> {
    let outcome = load_phase(&mut conn, options).await;
    conn.finish(outcome).await
}

/// Schema, then data generation, then load; stops at the first failure.
pub async fn cmd_all(
    mut conn: ConnectionManager,
    request: &GeneratorRequest,
    load: &LoadOptions,
) -> Result<()> {
    let outcome = setup_phases(&mut conn, request, load).await;
    conn.finish(outcome).await
}

pub(super) async fn setup_phases(
    conn: &mut ConnectionManager,
    request: &GeneratorRequest,
    load: &LoadOptions,
) -> Result<()> {
    info!("schema: creating tables");
    schema_phase(conn).await?;
    info!("gen: running {}", request.program);
    generate(request).await?;
    info!("load: loading {} tables", load.tables.len());
    load_phase(conn, load).await
}

async fn schema_phase(conn: &mut ConnectionManager) -> Result<()> {
    create_schema(conn.db()?).await
}

async fn load_phase(conn: &mut ConnectionManager, options: &LoadOptions) -> Result<()> {
    load_tables(conn.db()?, options).await
}
