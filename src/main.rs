use crate::config::DashboardConfig;
use crate::responses::error_to_response;
use crate::router::handle;
use crate::state::AppState;
use astra::Server;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

mod aggregate;
mod assembler;
mod config;
mod domain;
mod errors;
mod filters;
mod responses;
mod router;
mod spreadsheets;
mod state;
mod store;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "solutions_dashboard")]
#[command(about = "Serves filtered durable-solutions dashboard data")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "DASHBOARD_CONFIG", default_value = "dashboard.toml")]
    config: PathBuf,

    /// Beneficiary CSV (overrides config file)
    #[arg(short, long, env = "DASHBOARD_DATA")]
    data: Option<PathBuf>,

    /// Listen address (overrides config file)
    #[arg(long, env = "DASHBOARD_BIND")]
    bind: Option<String>,

    /// Fail on the first invalid row instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("solutions_dashboard=info")),
        )
        .init();

    let cli = Cli::parse();

    // 1️⃣ Configuration: file first, then CLI / env overrides
    let mut config = match DashboardConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Config error ({}): {e}", cli.config.display());
            std::process::exit(1);
        }
    };
    if let Some(data) = cli.data {
        config.data.path = data;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    config.data.strict |= cli.strict;

    // 2️⃣ Load the dataset once; requests only ever read it
    let state = match AppState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Dataset load failed ({}): {e}", config.data.path.display());
            std::process::exit(1);
        }
    };

    // 3️⃣ Start the server
    let addr: SocketAddr = match config.server.bind_addr.parse() {
        Ok(a) => a,
        Err(e) => {
            error!("Invalid bind address '{}': {e}", config.server.bind_addr);
            std::process::exit(1);
        }
    };
    info!("Starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(config.server.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        error!("Server ended with error: {e}");
    }

    info!("Server shut down cleanly.");
}
