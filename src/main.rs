//! tpch-mysql - TPC-H benchmark orchestration for MySQL.

use tpch_mysql::catalog::QueryCatalog;
use tpch_mysql::cli::{Cli, Command};
use tpch_mysql::commands::{cmd_all, cmd_bench, cmd_load, cmd_run, cmd_schema};
use tpch_mysql::config::Config;
use tpch_mysql::connection::ConnectionManager;
use tpch_mysql::error::Result;
use tpch_mysql::generate::generate;
use tpch_mysql::logging;
use tracing::{debug, error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    logging::init_stderr_logging();
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    if let Err(e) = run(Cli::parse_args()).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;
    let catalog = QueryCatalog::tpch();

    // Validate everything before connecting
    match cli.command {
        Command::Schema(args) => {
            let mysql = args.mysql.resolve(&config)?;
            cmd_schema(ConnectionManager::open(&mysql).await?).await
        }
        Command::Gen(args) => generate(&args.to_request(&config)?).await,
        Command::Load(args) => {
            let options = args.to_options();
            let mysql = args.mysql.resolve(&config)?;
            cmd_load(ConnectionManager::open(&mysql).await?, &options).await
        }
        Command::Run(args) => {
            let options = args.to_options(&catalog)?;
            let mysql = args.mysql.resolve(&config)?;
            cmd_run(ConnectionManager::open(&mysql).await?, &catalog, &options).await
        }
        Command::All(args) => {
            let request = args.gen.to_request(&config)?;
            let load = args.load_options()?;
            let mysql = args.mysql.resolve(&config)?;
            cmd_all(ConnectionManager::open(&mysql).await?, &request, &load).await
        }
        Command::Bench(args) => {
            let request = args.gen.to_request(&config)?;
            let load = args.load_options()?;
            let options = args.run_options(&catalog)?;
            let mysql = args.mysql.resolve(&config)?;
            let conn = ConnectionManager::open(&mysql).await?;
            cmd_bench(conn, &catalog, &request, &load, &options).await
        }
    }
}
