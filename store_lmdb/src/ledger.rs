//! LMDB implementation of VoteLedger.
//!
//! Key format: `comment_id (u64 BE) ++ fingerprint`; value: direction tag
//! followed by the timestamp. One key per voter means the uniqueness invariant
//! is the key itself, whatever the direction. Each insert also bumps the
//! (comment, direction) tally in the same transaction, so cardinality is a
//! single lookup.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};

use murmur_store::ledger::{RecordOutcome, VoteLedger, VoteRecord};
use murmur_store::StoreError;
use murmur_types::{CommentId, Fingerprint, VoteDirection};

use crate::keys::{decode_vote_value, split_vote_key, tally_key, vote_key, vote_value, VoteRange};
use crate::LmdbError;

pub struct LmdbVoteLedger {
    pub(crate) env: Arc<Env>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) tallies_db: Database<Bytes, Bytes>,
}

pub(crate) fn read_contains(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    comment: CommentId,
    voter: &Fingerprint,
) -> Result<bool, LmdbError> {
    Ok(db.get(txn, &vote_key(comment, voter))?.is_some())
}

/// Insert-if-absent. LMDB admits a single writer at a time, so the lookup
/// and the put below cannot interleave with another voter's.
pub(crate) fn insert_vote(
    votes_db: &Database<Bytes, Bytes>,
    tallies_db: &Database<Bytes, Bytes>,
    txn: &mut RwTxn<'_>,
    vote: &VoteRecord,
) -> Result<RecordOutcome, LmdbError> {
    let key = vote_key(vote.comment, &vote.voter);
    if votes_db.get(txn, &key)?.is_some() {
        return Ok(RecordOutcome::AlreadyVoted);
    }
    votes_db.put(txn, &key, &vote_value(vote.direction, vote.timestamp))?;

    let tally = read_tally(tallies_db, txn, vote.comment, vote.direction)?;
    tallies_db.put(
        txn,
        &tally_key(vote.comment, vote.direction),
        &(tally + 1).to_be_bytes(),
    )?;
    Ok(RecordOutcome::Recorded)
}

pub(crate) fn decode_tally(value: &[u8]) -> Result<u64, LmdbError> {
    let bytes: [u8; 8] = value
        .try_into()
        .map_err(|_| LmdbError::Serialization("malformed tally value".to_string()))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Stored tally for one (comment, direction); absent means no votes.
pub(crate) fn read_tally(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    comment: CommentId,
    direction: VoteDirection,
) -> Result<u64, LmdbError> {
    match db.get(txn, &tally_key(comment, direction))? {
        Some(value) => decode_tally(value),
        None => Ok(0),
    }
}

pub(crate) fn read_votes(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    comment: CommentId,
) -> Result<Vec<VoteRecord>, LmdbError> {
    let range = VoteRange::for_comment(comment);
    let mut votes = Vec::new();
    for entry in db.range(txn, &range.bounds())? {
        let (key, value) = entry?;
        let (comment, voter) = split_vote_key(key)
            .ok_or_else(|| LmdbError::Serialization("malformed vote key".to_string()))?;
        let (direction, timestamp) = decode_vote_value(value)
            .ok_or_else(|| LmdbError::Serialization("malformed vote value".to_string()))?;
        votes.push(VoteRecord {
            comment,
            voter,
            direction,
            timestamp,
        });
    }
    Ok(votes)
}

pub(crate) fn count_direction(
    tallies_db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    comment: CommentId,
    direction: VoteDirection,
) -> Result<u64, LmdbError> {
    read_tally(tallies_db, txn, comment, direction)
}

impl VoteLedger for LmdbVoteLedger {
    fn contains(&self, comment: CommentId, voter: &Fingerprint) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(read_contains(&self.votes_db, &rtxn, comment, voter)?)
    }

    fn record(&self, vote: &VoteRecord) -> Result<RecordOutcome, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let outcome = insert_vote(&self.votes_db, &self.tallies_db, &mut wtxn, vote)?;
        if outcome == RecordOutcome::Recorded {
            wtxn.commit().map_err(LmdbError::from)?;
        }
        Ok(outcome)
    }

    fn count_by_direction(
        &self,
        comment: CommentId,
        direction: VoteDirection,
    ) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(count_direction(&self.tallies_db, &rtxn, comment, direction)?)
    }

    fn votes_for_comment(&self, comment: CommentId) -> Result<Vec<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(read_votes(&self.votes_db, &rtxn, comment)?)
    }
}
