//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use murmur_types::{VoteParams, DEFAULT_VOTE_CEILING};
use murmur_votes::retry::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS};
use murmur_votes::RetryPolicy;

use crate::{LogFormat, NodeError};

/// Configuration for a Murmur node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Displayed likes never exceed this.
    #[serde(default = "default_ceiling")]
    pub like_ceiling: u64,

    /// Displayed dislikes never exceed this.
    #[serde(default = "default_ceiling")]
    pub dislike_ceiling: u64,

    /// Retries after the first attempt when storage fails transiently.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Fingerprint voters by /24 (IPv4) or /48 (IPv6) network instead of
    /// by exact address.
    #[serde(default)]
    pub anonymize_addresses: bool,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, e.g. "info" or "info,murmur_votes=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./murmur_data")
}

fn default_listen_addr() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_ceiling() -> u64 {
    DEFAULT_VOTE_CEILING
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }

    pub fn vote_params(&self) -> VoteParams {
        VoteParams {
            like_ceiling: self.like_ceiling,
            dislike_ceiling: self.dislike_ceiling,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.saturating_add(1),
            initial_backoff_ms: self.retry_backoff_ms,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS.max(self.retry_backoff_ms),
        }
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            port: default_port(),
            map_size: default_map_size(),
            like_ceiling: default_ceiling(),
            dislike_ceiling: default_ceiling(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            anonymize_addresses: false,
            cors_origins: Vec::new(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.listen_addr, config.listen_addr);
        assert_eq!(parsed.vote_params(), config.vote_params());
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 8080);
        assert_eq!(config.vote_params(), VoteParams::default());
        assert!(!config.anonymize_addresses);
        assert_eq!(config.log_format().unwrap(), LogFormat::Human);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            listen_addr = "0.0.0.0"
            like_ceiling = 10
            anonymize_addresses = true
            cors_origins = ["https://example.org"]
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.socket_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.vote_params().like_ceiling, 10);
        assert_eq!(config.vote_params().dislike_ceiling, DEFAULT_VOTE_CEILING);
        assert!(config.anonymize_addresses);
        assert_eq!(config.cors_origins, vec!["https://example.org"]);
    }

    #[test]
    fn retry_policy_counts_first_attempt() {
        let config = NodeConfig {
            max_retries: 0,
            ..NodeConfig::default()
        };
        assert_eq!(config.retry_policy().max_attempts, 1);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/murmur.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
