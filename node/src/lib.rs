//! Murmur server node.
//!
//! The node is the coordinator that:
//! - Opens and migrates the LMDB environment
//! - Loads (or creates) the installation's fingerprint secret
//! - Checks storage integrity and rebuilds displayed vote counts
//! - Serves the HTTP API until shutdown

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::MurmurNode;
pub use shutdown::ShutdownController;
