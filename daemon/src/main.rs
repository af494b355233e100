//! Murmur daemon: entry point for running a Murmur node.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use murmur_node::{init_logging, MurmurNode, NodeConfig};

#[derive(Parser)]
#[command(name = "murmur-daemon", about = "Murmur comment vote server")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the LMDB environment.
    #[arg(long, env = "MURMUR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "MURMUR_LISTEN_ADDR")]
    listen_addr: Option<IpAddr>,

    /// HTTP API port.
    #[arg(long, env = "MURMUR_PORT")]
    port: Option<u16>,

    /// LMDB map size in bytes.
    #[arg(long, env = "MURMUR_MAP_SIZE")]
    map_size: Option<usize>,

    /// Maximum displayed like count per comment.
    #[arg(long, env = "MURMUR_LIKE_CEILING")]
    like_ceiling: Option<u64>,

    /// Maximum displayed dislike count per comment.
    #[arg(long, env = "MURMUR_DISLIKE_CEILING")]
    dislike_ceiling: Option<u64>,

    /// Retries after a transient storage failure.
    #[arg(long, env = "MURMUR_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Initial retry backoff in milliseconds.
    #[arg(long, env = "MURMUR_RETRY_BACKOFF_MS")]
    retry_backoff_ms: Option<u64>,

    /// Fingerprint voters by subnet (/24 or /48) rather than exact address.
    #[arg(long, env = "MURMUR_ANONYMIZE_ADDRESSES")]
    anonymize_addresses: bool,

    /// Allowed CORS origins (comma-separated). Empty allows any origin.
    #[arg(long, env = "MURMUR_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MURMUR_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MURMUR_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Node operations.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the server.
    Run,
    /// Recompute displayed counts from the vote ledger and exit.
    RebuildCounts,
    /// Print the effective configuration as TOML and exit.
    PrintConfig,
}

impl Cli {
    /// Layer CLI flags and env vars over `base`.
    fn merge_into(self, base: NodeConfig) -> (NodeConfig, Command) {
        let config = NodeConfig {
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            listen_addr: self.listen_addr.unwrap_or(base.listen_addr),
            port: self.port.unwrap_or(base.port),
            map_size: self.map_size.unwrap_or(base.map_size),
            like_ceiling: self.like_ceiling.unwrap_or(base.like_ceiling),
            dislike_ceiling: self.dislike_ceiling.unwrap_or(base.dislike_ceiling),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            retry_backoff_ms: self.retry_backoff_ms.unwrap_or(base.retry_backoff_ms),
            anonymize_addresses: self.anonymize_addresses || base.anonymize_addresses,
            cors_origins: if self.cors_origins.is_empty() {
                base.cors_origins
            } else {
                self.cors_origins
            },
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        };
        (config, self.command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match cli.config {
        Some(ref path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    let config_path = cli.config.clone();
    let (config, command) = cli.merge_into(base);

    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = config_path {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    match command {
        Command::Node { action } => match action {
            NodeAction::Run => {
                let node = MurmurNode::open(config).context("opening node")?;
                node.start().await?;

                tracing::info!("shutdown signal received, stopping node");
                node.stop()?;
                tracing::info!("Murmur daemon exited cleanly");
            }
            NodeAction::RebuildCounts => {
                let node = MurmurNode::open(config).context("opening node")?;
                let report = node.rebuild_counts()?;
                println!(
                    "checked {} comments, repaired {}",
                    report.comments_checked,
                    report.repaired.len()
                );
                node.stop()?;
            }
            NodeAction::PrintConfig => {
                print!("{}", config.to_toml_string()?);
            }
        },
    }

    Ok(())
}
