//! Vote ledger trait.
//!
//! The ledger is append-only: at most one [`VoteRecord`] per
//! `(comment, voter)` pair, whatever the direction, never updated or
//! removed. Its cardinality per direction is the only source of raw totals.

use crate::StoreError;
use murmur_types::{CommentId, Fingerprint, Timestamp, VoteDirection};
use serde::{Deserialize, Serialize};

/// A single accepted vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub comment: CommentId,
    pub voter: Fingerprint,
    pub direction: VoteDirection,
    pub timestamp: Timestamp,
}

/// Result of an insert-if-absent into the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The voter already has an entry for this comment (either direction).
    AlreadyVoted,
}

/// Trait for vote ledger operations. Each call is its own transaction.
pub trait VoteLedger: Send + Sync {
    /// Whether `voter` has voted on `comment` in either direction.
    fn contains(&self, comment: CommentId, voter: &Fingerprint) -> Result<bool, StoreError>;

    /// Atomically insert `vote` unless the voter already has an entry.
    fn record(&self, vote: &VoteRecord) -> Result<RecordOutcome, StoreError>;

    /// Number of ledger entries for `comment` in `direction`.
    fn count_by_direction(
        &self,
        comment: CommentId,
        direction: VoteDirection,
    ) -> Result<u64, StoreError>;

    /// All entries for `comment`, ordered by voter fingerprint.
    fn votes_for_comment(&self, comment: CommentId) -> Result<Vec<VoteRecord>, StoreError>;
}
