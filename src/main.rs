use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use mentiva::server::{ServerConfig, start_server};

#[derive(Parser)]
#[command(name = "mentiva")]
#[command(version, about = "Vision-board goal coaching backend")]
struct Cli {
    /// Port to serve on
    #[arg(short, long, default_value = "4280")]
    port: u16,

    /// Path to the SQLite database
    #[arg(long, default_value = ".mentiva/mentiva.db")]
    db_path: PathBuf,

    /// Bind on all interfaces and allow any CORS origin
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mentiva=info".into()),
        )
        .init();

    let cli = Cli::parse();
    start_server(ServerConfig {
        port: cli.port,
        db_path: cli.db_path,
        dev_mode: cli.dev,
    })
    .await
}
