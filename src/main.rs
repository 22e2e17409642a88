//! `node-daemon`: run a node with its administrative API until interrupted.
//!
//! # Architecture Overview
//!
//! ```text
//!   <repo>/config.toml ──▶ config ──▶ ServerConfig ─────────────┐
//!   --api / --swarmlisten / --offline ─┘                         │
//!                                                                ▼
//!   SIGINT/SIGTERM ──▶ SignalWatcher ──▶ lifecycle::Controller ──▶ node.start()/stop()
//!                                              │
//!                                              ├──▶ http::ControlApiServer (admin router)
//!                                              └──▶ <repo>/api (discovery file)
//! ```

use std::fs;

use clap::Parser;

use node_daemon::admin::setup_admin_router;
use node_daemon::config::{self, validation::validate_config, ConfigError};
use node_daemon::lifecycle::{Controller, SignalWatcher};
use node_daemon::node::{LocalNode, NodeOptions};
use node_daemon::observability::init_logging;

#[derive(Parser)]
#[command(name = "node-daemon")]
#[command(about = "Start a long-running daemon process", long_about = None)]
struct Cli {
    /// Repository directory holding config.toml and the api file.
    #[arg(long, default_value = "~/.node-daemon")]
    repodir: String,

    /// Address for the administrative API, overriding api.address.
    #[arg(long)]
    api: Option<String>,

    /// Multiaddr for the swarm to listen on, overriding swarm.address.
    #[arg(long)]
    swarmlisten: Option<String>,

    /// Run without peer-to-peer networking.
    #[arg(long)]
    offline: bool,

    /// Log level, overriding observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let repo_dir = config::expand_repo_dir(&cli.repodir);
    fs::create_dir_all(&repo_dir)?;

    let mut config = config::load_repo_config(&repo_dir)?;
    if let Some(api) = cli.api {
        config.api.address = api;
    }
    if let Some(swarm) = cli.swarmlisten {
        config.swarm.address = swarm;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        repo = %repo_dir.display(),
        api_address = %config.api.address,
        offline = cli.offline,
        "node-daemon starting"
    );

    let node = LocalNode::new(NodeOptions {
        swarm_address: config.swarm.address.clone(),
        offline: cli.offline,
    });
    let handler = setup_admin_router(node.info());

    Controller::new(
        node,
        config.api.server_config(),
        handler,
        &repo_dir,
        SignalWatcher::os(),
    )
    .run()
    .await?;

    Ok(())
}
