//! Node lifecycle: open storage, prepare the vote core, serve HTTP.

use std::sync::Arc;

use murmur_crypto::{FingerprintSecret, KeyedBlake2Deriver};
use murmur_rpc::{RpcServer, RpcState};
use murmur_store::{MetaStore, FINGERPRINT_SECRET_KEY};
use murmur_store_lmdb::integrity::check_data_dir;
use murmur_store_lmdb::{check_integrity, LmdbEnvironment, Migrator};
use murmur_votes::{RebuildReport, VoteAggregator};

use crate::config::NodeConfig;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// A running Murmur node.
pub struct MurmurNode {
    pub config: NodeConfig,
    pub env: Arc<LmdbEnvironment>,
    pub aggregator: Arc<VoteAggregator>,
    pub shutdown: Arc<ShutdownController>,
    deriver: Arc<KeyedBlake2Deriver>,
}

impl MurmurNode {
    /// Open the LMDB environment at `config.data_dir` and prepare the vote
    /// core. Call [`MurmurNode::start`] to begin serving requests.
    ///
    /// Opening runs schema migrations, loads or creates the fingerprint
    /// secret and logs an integrity report.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        check_data_dir(&config.data_dir).map_err(NodeError::Config)?;
        let env = Arc::new(LmdbEnvironment::open(&config.data_dir, config.map_size)?);

        let meta = env.meta_store();
        Migrator::run(&meta)?;
        let secret = load_or_create_secret(&meta)?;

        let params = config.vote_params();
        let report = check_integrity(&env, &params)?;
        if report.is_healthy() {
            tracing::info!(
                databases = report.databases_checked,
                entries = report.total_entries,
                stale_counts = report.stale_counts.len(),
                "integrity check passed"
            );
        } else {
            for error in &report.errors {
                tracing::error!(%error, "integrity check");
            }
        }

        let aggregator = Arc::new(
            VoteAggregator::new(env.clone(), params).with_retry(config.retry_policy()),
        );

        Ok(Self {
            config,
            env,
            aggregator,
            shutdown: Arc::new(ShutdownController::new()),
            deriver: Arc::new(KeyedBlake2Deriver::new(secret)),
        })
    }

    /// Recompute every displayed count from the ledger.
    pub fn rebuild_counts(&self) -> Result<RebuildReport, NodeError> {
        Ok(self.aggregator.rebuild_counts()?)
    }

    pub fn rpc_state(&self) -> Arc<RpcState> {
        Arc::new(RpcState {
            aggregator: Arc::clone(&self.aggregator),
            comments: Arc::new(self.env.comment_store()),
            deriver: self.deriver.clone(),
            anonymize_addresses: self.config.anonymize_addresses,
        })
    }

    /// Serve the HTTP API until a shutdown signal arrives.
    ///
    /// Displayed counts are rebuilt from the ledger first, so a changed
    /// ceiling or an interrupted write is reconciled before the first vote.
    pub async fn start(&self) -> Result<(), NodeError> {
        tracing::info!(
            addr = %self.config.socket_addr(),
            data_dir = %self.config.data_dir.display(),
            like_ceiling = self.config.like_ceiling,
            dislike_ceiling = self.config.dislike_ceiling,
            anonymize = self.config.anonymize_addresses,
            "Murmur node starting"
        );

        let aggregator = Arc::clone(&self.aggregator);
        tokio::task::spawn_blocking(move || aggregator.rebuild_counts()).await??;

        let server = RpcServer::new(
            self.config.socket_addr(),
            self.rpc_state(),
            self.config.cors_origins.clone(),
        );
        let mut server = tokio::spawn(server.start(self.shutdown.signalled()));

        tokio::select! {
            result = &mut server => {
                // The server only returns early on a bind or accept error.
                self.shutdown.shutdown();
                return Ok(result??);
            }
            _ = self.shutdown.wait_for_signal() => {}
        }

        match server.await {
            Ok(Ok(())) => tracing::info!("HTTP API stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP API error during shutdown"),
            Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        }
        Ok(())
    }

    /// Stop the node: signal shutdown and flush LMDB to disk.
    pub fn stop(&self) -> Result<(), NodeError> {
        self.shutdown.shutdown();
        self.env
            .env()
            .force_sync()
            .map_err(murmur_store_lmdb::LmdbError::from)?;
        tracing::info!("Murmur node stopped");
        Ok(())
    }
}

/// Load the installation's fingerprint secret, generating and persisting a
/// fresh one on first start.
pub fn load_or_create_secret(meta: &impl MetaStore) -> Result<FingerprintSecret, NodeError> {
    if let Some(bytes) = meta.get_meta(FINGERPRINT_SECRET_KEY)? {
        return Ok(FingerprintSecret::from_slice(&bytes)?);
    }
    let secret = FingerprintSecret::generate()?;
    meta.put_meta(FINGERPRINT_SECRET_KEY, secret.as_bytes())?;
    tracing::info!("generated new fingerprint secret");
    Ok(secret)
}
