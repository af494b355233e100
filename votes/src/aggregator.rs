//! The vote aggregator.
//!
//! Each vote runs as one write batch: read the comment, insert into the
//! ledger, recount, persist. Nothing is cached in process; the ledger's
//! cardinality is recounted inside the same batch that inserted the vote,
//! so concurrent voters can never lose each other's updates.

use std::sync::Arc;

use murmur_store::{RecordOutcome, StoreError, VoteBackend, VoteRecord};
use murmur_types::{CommentId, Fingerprint, Timestamp, VoteCounts, VoteDirection, VoteParams};

use crate::{RetryPolicy, VoteError, VoteOutcome};

/// Result of [`VoteAggregator::rebuild_counts`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub comments_checked: u64,
    /// Comments whose stored counts were rewritten.
    pub repaired: Vec<CommentId>,
}

pub struct VoteAggregator {
    backend: Arc<dyn VoteBackend>,
    params: VoteParams,
    retry: RetryPolicy,
}

impl VoteAggregator {
    pub fn new(backend: Arc<dyn VoteBackend>, params: VoteParams) -> Self {
        Self {
            backend,
            params,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cast a vote from `voter` on `comment`.
    pub fn vote(
        &self,
        comment: CommentId,
        voter: Fingerprint,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, VoteError> {
        let outcome = self
            .retry
            .run(|| self.try_vote(comment, voter, direction))?;
        tracing::debug!(
            %comment,
            %direction,
            outcome = outcome.as_str(),
            counts = ?outcome.counts(),
            "vote processed"
        );
        Ok(outcome)
    }

    fn try_vote(
        &self,
        id: CommentId,
        voter: Fingerprint,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, StoreError> {
        // Early returns drop the batch, which rolls back an untouched txn.
        let mut batch = self.backend.write_batch()?;

        let Some(comment) = batch.get_comment(id)? else {
            return Ok(VoteOutcome::NotFound);
        };
        let current = comment.counts();

        if comment.author == voter {
            return Ok(VoteOutcome::SelfVote(current));
        }

        let vote = VoteRecord {
            comment: id,
            voter,
            direction,
            timestamp: Timestamp::now(),
        };
        if batch.record_vote(&vote)? == RecordOutcome::AlreadyVoted {
            return Ok(VoteOutcome::AlreadyVoted(current));
        }

        let raw = batch.count_by_direction(id, direction)?;
        let counts = current.with(direction, self.params.displayed(direction, raw));
        batch.persist_displayed_counts(id, counts)?;
        batch.commit()?;

        if raw > self.params.ceiling(direction) {
            tracing::trace!(%id, %direction, raw, "vote recorded above ceiling");
        }
        Ok(VoteOutcome::Counted(counts))
    }

    /// Recompute every comment's displayed counts from the ledger under the
    /// current ceilings. Runs as a single batch.
    pub fn rebuild_counts(&self) -> Result<RebuildReport, VoteError> {
        let report = self.retry.run(|| self.try_rebuild())?;
        if report.repaired.is_empty() {
            tracing::info!(comments = report.comments_checked, "vote counts consistent with ledger");
        } else {
            tracing::warn!(
                comments = report.comments_checked,
                repaired = report.repaired.len(),
                "rebuilt stale vote counts from ledger"
            );
        }
        Ok(report)
    }

    fn try_rebuild(&self) -> Result<RebuildReport, StoreError> {
        let mut batch = self.backend.write_batch()?;
        let mut report = RebuildReport::default();

        for id in batch.comment_ids()? {
            let Some(comment) = batch.get_comment(id)? else {
                continue;
            };
            report.comments_checked += 1;

            let mut expected = VoteCounts::ZERO;
            for direction in VoteDirection::ALL {
                let raw = batch.count_by_direction(id, direction)?;
                expected = expected.with(direction, self.params.displayed(direction, raw));
            }
            if expected != comment.counts() {
                batch.persist_displayed_counts(id, expected)?;
                report.repaired.push(id);
            }
        }

        batch.commit()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_nullables::NullStore;
    use murmur_store::{CommentStore, NewComment, VoteLedger};

    const AUTHOR: Fingerprint = Fingerprint::new([0xAA; 32]);

    fn voter(n: u16) -> Fingerprint {
        let mut bytes = [0u8; 32];
        bytes[..2].copy_from_slice(&n.to_be_bytes());
        bytes[31] = 1;
        Fingerprint::new(bytes)
    }

    fn setup(params: VoteParams) -> (Arc<NullStore>, VoteAggregator, CommentId) {
        let store = Arc::new(NullStore::new());
        let comment = store
            .create_comment(&NewComment {
                thread: "test".to_string(),
                author: AUTHOR,
                text: "...".to_string(),
                created: Timestamp::new(1),
            })
            .unwrap();
        let aggregator = VoteAggregator::new(store.clone(), params)
            .with_retry(RetryPolicy::immediate(3));
        (store, aggregator, comment.id)
    }

    #[test]
    fn single_like_counts_once() {
        let (_store, agg, id) = setup(VoteParams::default());
        assert_eq!(
            agg.vote(id, voter(1), VoteDirection::Like).unwrap(),
            VoteOutcome::Counted(VoteCounts::new(1, 0))
        );
    }

    #[test]
    fn repeat_vote_is_idempotent() {
        let (store, agg, id) = setup(VoteParams::default());
        agg.vote(id, voter(1), VoteDirection::Like).unwrap();
        for _ in 0..3 {
            assert_eq!(
                agg.vote(id, voter(1), VoteDirection::Like).unwrap(),
                VoteOutcome::AlreadyVoted(VoteCounts::new(1, 0))
            );
        }
        assert_eq!(store.vote_count(), 1);
    }

    #[test]
    fn switching_direction_is_rejected() {
        let (store, agg, id) = setup(VoteParams::default());
        agg.vote(id, voter(1), VoteDirection::Dislike).unwrap();
        assert_eq!(
            agg.vote(id, voter(1), VoteDirection::Like).unwrap(),
            VoteOutcome::AlreadyVoted(VoteCounts::new(0, 1))
        );
        assert_eq!(store.count_by_direction(id, VoteDirection::Like).unwrap(), 0);
    }

    #[test]
    fn author_cannot_vote() {
        let (store, agg, id) = setup(VoteParams::default());
        for direction in VoteDirection::ALL {
            assert_eq!(
                agg.vote(id, AUTHOR, direction).unwrap(),
                VoteOutcome::SelfVote(VoteCounts::ZERO)
            );
        }
        assert_eq!(store.vote_count(), 0);
    }

    #[test]
    fn unknown_comment_is_not_found_without_side_effects() {
        let (store, agg, _id) = setup(VoteParams::default());
        assert_eq!(
            agg.vote(CommentId::new(99), voter(1), VoteDirection::Like).unwrap(),
            VoteOutcome::NotFound
        );
        assert_eq!(store.vote_count(), 0);
        assert_eq!(store.comment_count().unwrap(), 1);
        assert_eq!(store.get_comment(CommentId::new(99)).unwrap(), None);
    }

    #[test]
    fn likes_plateau_at_ceiling() {
        let (store, agg, id) = setup(VoteParams::with_ceiling(5));
        for n in 1..=8u16 {
            let outcome = agg.vote(id, voter(n), VoteDirection::Like).unwrap();
            assert_eq!(outcome.counts().unwrap().likes, u64::from(n).min(5));
        }
        // The ledger keeps every distinct voter.
        assert_eq!(store.count_by_direction(id, VoteDirection::Like).unwrap(), 8);
    }

    #[test]
    fn directions_are_independent() {
        let (_store, agg, id) = setup(VoteParams {
            like_ceiling: 2,
            dislike_ceiling: 10,
        });
        for n in 1..=3 {
            agg.vote(id, voter(n), VoteDirection::Like).unwrap();
        }
        let outcome = agg.vote(id, voter(100), VoteDirection::Dislike).unwrap();
        assert_eq!(outcome, VoteOutcome::Counted(VoteCounts::new(2, 1)));
    }

    #[test]
    fn transient_failures_are_retried() {
        let (store, agg, id) = setup(VoteParams::default());
        store.fail_next_commits(2);
        assert_eq!(
            agg.vote(id, voter(1), VoteDirection::Like).unwrap(),
            VoteOutcome::Counted(VoteCounts::new(1, 0))
        );
        assert_eq!(store.vote_count(), 1);
    }

    #[test]
    fn exhausted_retries_surface_as_error_not_not_found() {
        let (store, agg, id) = setup(VoteParams::default());
        store.fail_next_commits(10);
        let err = agg.vote(id, voter(1), VoteDirection::Like).unwrap_err();
        assert!(matches!(err, VoteError::StorageExhausted { attempts: 3, .. }));
        assert_eq!(store.vote_count(), 0);
        assert_eq!(store.get_comment(id).unwrap().unwrap().counts(), VoteCounts::ZERO);
    }

    #[test]
    fn rebuild_repairs_stale_counts() {
        let (store, agg, id) = setup(VoteParams::with_ceiling(3));
        for n in 1..=4 {
            agg.vote(id, voter(n), VoteDirection::Like).unwrap();
        }
        store.corrupt_counts(id, VoteCounts::new(0, 7)).unwrap();

        let report = agg.rebuild_counts().unwrap();
        assert_eq!(report.comments_checked, 1);
        assert_eq!(report.repaired, vec![id]);
        assert_eq!(store.get_comment(id).unwrap().unwrap().counts(), VoteCounts::new(3, 0));

        let again = agg.rebuild_counts().unwrap();
        assert!(again.repaired.is_empty());
    }

    #[test]
    fn rebuild_applies_raised_ceiling() {
        let (store, agg, id) = setup(VoteParams::with_ceiling(2));
        for n in 1..=4 {
            agg.vote(id, voter(n), VoteDirection::Like).unwrap();
        }
        let raised = VoteAggregator::new(store.clone(), VoteParams::with_ceiling(10));
        raised.rebuild_counts().unwrap();
        assert_eq!(store.get_comment(id).unwrap().unwrap().likes, 4);
    }
}
