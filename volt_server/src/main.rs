#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use volt_driver::DEFAULT_PORT;
use volt_server::{Engine, ProcedureRegistry, Server};

#[derive(Debug, Parser)]
#[command(name = "voltd", version, about = "Serve stored procedures over a SQLite database")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value_t = format!("127.0.0.1:{DEFAULT_PORT}"), env = "VOLTD_BIND")]
    bind: String,

    /// SQLite database file; an empty in-memory database when omitted
    #[arg(short, long, env = "VOLTD_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let filter = EnvFilter::try_from_env("VOLTD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = ProcedureRegistry::default();
    let engine = match &args.database {
        Some(database) => {
            info!("opening {}", database.display());
            Engine::open(database, registry)?
        }
        None => {
            warn!("no database given; using an empty in-memory database");
            Engine::open_in_memory(registry)?
        }
    };
    for procedure in engine.registry().procedures() {
        info!(
            "procedure {} ({:?})",
            procedure.name(),
            procedure.partitioning()
        );
    }

    let server = Server::bind(&args.bind, engine).await?;
    info!("listening on {}", server.local_addr()?);
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
