//! Write batches: every step of a vote inside one storage transaction.
//!
//! A vote reads the comment, inserts into the ledger, recounts, and persists
//! the displayed counts. Running all four against one [`VoteBatch`] makes
//! the insert-if-absent atomic with respect to concurrent voters and
//! guarantees the count update never commits without its ledger entry.
//!
//! Dropping a batch without calling [`VoteBatch::commit`] rolls it back.

use crate::{CommentRecord, RecordOutcome, StoreError, VoteRecord};
use murmur_types::{CommentId, VoteCounts, VoteDirection};

/// An open write transaction over comments and the vote ledger.
pub trait VoteBatch {
    fn get_comment(&self, id: CommentId) -> Result<Option<CommentRecord>, StoreError>;

    /// Insert `vote` unless the voter already has an entry for the comment.
    fn record_vote(&mut self, vote: &VoteRecord) -> Result<RecordOutcome, StoreError>;

    fn count_by_direction(
        &self,
        comment: CommentId,
        direction: VoteDirection,
    ) -> Result<u64, StoreError>;

    fn persist_displayed_counts(
        &mut self,
        id: CommentId,
        counts: VoteCounts,
    ) -> Result<(), StoreError>;

    /// Ids of every stored comment, ascending.
    fn comment_ids(&self) -> Result<Vec<CommentId>, StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// A store able to open [`VoteBatch`]es. Concurrent batches are serialised
/// by the backend.
pub trait VoteBackend: Send + Sync {
    fn write_batch(&self) -> Result<Box<dyn VoteBatch + '_>, StoreError>;
}
