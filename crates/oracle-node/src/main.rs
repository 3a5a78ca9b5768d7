use anyhow::{Context, Result};
use clap::Parser;
use spot_oracle_common::NodeConfig;
use spot_oracle_node::{build_race, SpotServer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spot-oracle")]
#[command(about = "Spot price API answered by the fastest of several exchanges")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen address, overrides server.listen_addr
    #[arg(long)]
    listen: Option<String>,

    /// Per-request exchange deadline in milliseconds, overrides race.request_timeout_ms
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn load_config(&self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => NodeConfig::default(),
        };

        if let Some(listen) = &self.listen {
            config.server.listen_addr = listen.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.race.request_timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spot_oracle_node=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    if args.print_config {
        println!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!(
        "Starting spot oracle: exchanges={:?}, timeout={:?}",
        config.exchanges.enabled,
        config.race.request_timeout()
    );

    let race = build_race(&config)?;
    SpotServer::new(config.server, race).serve().await
}
