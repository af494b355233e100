use murmur_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoteError {
    /// Transient failures persisted through every retry.
    #[error("storage unavailable after {attempts} attempts: {source}")]
    StorageExhausted {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
