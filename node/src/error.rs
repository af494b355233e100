use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] murmur_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] murmur_store_lmdb::LmdbError),

    #[error("vote error: {0}")]
    Vote(#[from] murmur_votes::VoteError),

    #[error("fingerprint secret error: {0}")]
    Secret(#[from] murmur_crypto::SecretError),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Rpc(#[from] murmur_rpc::RpcError),

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
