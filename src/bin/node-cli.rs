use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use node_daemon::config::{expand_repo_dir, load_repo_config};
use node_daemon::lifecycle::read_endpoint;

#[derive(Parser)]
#[command(name = "node-cli")]
#[command(about = "Talk to a running node-daemon found through its repository", long_about = None)]
struct Cli {
    #[arg(long, default_value = "~/.node-daemon")]
    repodir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the address of the running daemon
    Endpoint,
    /// Show the daemon version
    Version,
    /// Show the node's peer ID and swarm addresses
    Id,
    /// Check whether the node is running
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let repo_dir: PathBuf = expand_repo_dir(&cli.repodir);

    let Some(address) = read_endpoint(&repo_dir)? else {
        eprintln!("Error: daemon not running (no api file in {})", repo_dir.display());
        std::process::exit(1);
    };
    let prefix = load_repo_config(&repo_dir)?.api.path_prefix;
    let base = format!("http://{}{}", address.trim(), prefix.trim_end_matches('/'));

    let path = match cli.command {
        Commands::Endpoint => {
            println!("{}", address.trim());
            return Ok(());
        }
        Commands::Version => "/version",
        Commands::Id => "/id",
        Commands::Status => "/daemon/status",
    };

    let res = reqwest::get(format!("{}{}", base, path)).await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
