//! Write batching: one LMDB write transaction spanning comment reads, the
//! ledger insert, the recount, and the count update of a single vote.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! if batch.record_vote(&vote)? == RecordOutcome::Recorded {
//!     let raw = batch.count_by_direction(vote.comment, vote.direction)?;
//!     batch.persist_displayed_counts(vote.comment, counts)?;
//! }
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`VoteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use murmur_store::{CommentRecord, RecordOutcome, StoreError, VoteBatch, VoteRecord};
use murmur_types::{CommentId, VoteCounts, VoteDirection};

use crate::environment::LmdbEnvironment;
use crate::{comment, ledger, LmdbError};

/// A write batch over the comments and votes databases.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch. Blocks while another batch is open.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }
}

impl VoteBatch for WriteBatch<'_> {
    fn get_comment(&self, id: CommentId) -> Result<Option<CommentRecord>, StoreError> {
        Ok(comment::read_comment(&self.env.comments_db, &self.txn, id)?)
    }

    fn record_vote(&mut self, vote: &VoteRecord) -> Result<RecordOutcome, StoreError> {
        Ok(ledger::insert_vote(
            &self.env.votes_db,
            &self.env.tallies_db,
            &mut self.txn,
            vote,
        )?)
    }

    fn count_by_direction(
        &self,
        comment: CommentId,
        direction: VoteDirection,
    ) -> Result<u64, StoreError> {
        Ok(ledger::count_direction(
            &self.env.tallies_db,
            &self.txn,
            comment,
            direction,
        )?)
    }

    fn persist_displayed_counts(
        &mut self,
        id: CommentId,
        counts: VoteCounts,
    ) -> Result<(), StoreError> {
        Ok(comment::write_counts(
            &self.env.comments_db,
            &mut self.txn,
            id,
            counts,
        )?)
    }

    fn comment_ids(&self) -> Result<Vec<CommentId>, StoreError> {
        Ok(comment::read_comment_ids(&self.env.comments_db, &self.txn)?)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
