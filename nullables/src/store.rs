//! Nullable store: thread-safe in-memory comments, ledger and metadata.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use murmur_store::{
    CommentRecord, CommentStore, MetaStore, NewComment, RecordOutcome, StoreError, VoteBackend,
    VoteBatch, VoteLedger, VoteRecord,
};
use murmur_types::{CommentId, Fingerprint, VoteCounts, VoteDirection};

#[derive(Clone, Default)]
struct State {
    comments: BTreeMap<CommentId, CommentRecord>,
    votes: BTreeMap<(CommentId, Fingerprint), VoteRecord>,
    meta: HashMap<String, Vec<u8>>,
    next_id: u64,
}

impl State {
    fn insert_vote(&mut self, vote: &VoteRecord) -> RecordOutcome {
        let key = (vote.comment, vote.voter);
        if self.votes.contains_key(&key) {
            return RecordOutcome::AlreadyVoted;
        }
        self.votes.insert(key, *vote);
        RecordOutcome::Recorded
    }

    fn count(&self, comment: CommentId, direction: VoteDirection) -> u64 {
        self.votes_of(comment)
            .filter(|v| v.direction == direction)
            .count() as u64
    }

    fn votes_of(&self, comment: CommentId) -> impl Iterator<Item = &VoteRecord> {
        self.votes
            .range((comment, Fingerprint::new([0; 32]))..=(comment, Fingerprint::new([0xFF; 32])))
            .map(|(_, v)| v)
    }

    fn write_counts(&mut self, id: CommentId, counts: VoteCounts) -> Result<(), StoreError> {
        let comment = self
            .comments
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))?;
        comment.likes = counts.likes;
        comment.dislikes = counts.dislikes;
        Ok(())
    }
}

/// An in-memory implementation of every storage trait.
///
/// A [`VoteBatch`] holds the store lock until it is committed or dropped,
/// serialising batches the way LMDB serialises writers. Do not call other
/// store methods from the thread holding an open batch.
pub struct NullStore {
    state: Mutex<State>,
    failing_commits: AtomicU32,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            failing_commits: AtomicU32::new(0),
        }
    }

    /// Make the next `n` batch commits fail with a transient error. The
    /// failed batches leave no trace.
    pub fn fail_next_commits(&self, n: u32) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Number of ledger entries across all comments.
    pub fn vote_count(&self) -> usize {
        self.lock().map(|s| s.votes.len()).unwrap_or(0)
    }

    /// Overwrite displayed counts without touching the ledger, simulating
    /// a crash between a ledger write and its count update.
    pub fn corrupt_counts(&self, id: CommentId, counts: VoteCounts) -> Result<(), StoreError> {
        self.lock()?.write_counts(id, counts)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("null store lock poisoned".to_string()))
    }

    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentStore for NullStore {
    fn create_comment(&self, new: &NewComment) -> Result<CommentRecord, StoreError> {
        let mut state = self.lock()?;
        let id = CommentId::new(state.next_id);
        state.next_id += 1;
        let comment = CommentRecord {
            id,
            thread: new.thread.clone(),
            author: new.author,
            text: new.text.clone(),
            created: new.created,
            likes: 0,
            dislikes: 0,
        };
        state.comments.insert(id, comment.clone());
        Ok(comment)
    }

    fn get_comment(&self, id: CommentId) -> Result<Option<CommentRecord>, StoreError> {
        Ok(self.lock()?.comments.get(&id).cloned())
    }

    fn persist_displayed_counts(
        &self,
        id: CommentId,
        counts: VoteCounts,
    ) -> Result<(), StoreError> {
        self.lock()?.write_counts(id, counts)
    }

    fn comment_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.comments.len() as u64)
    }
}

impl VoteLedger for NullStore {
    fn contains(&self, comment: CommentId, voter: &Fingerprint) -> Result<bool, StoreError> {
        Ok(self.lock()?.votes.contains_key(&(comment, *voter)))
    }

    fn record(&self, vote: &VoteRecord) -> Result<RecordOutcome, StoreError> {
        Ok(self.lock()?.insert_vote(vote))
    }

    fn count_by_direction(
        &self,
        comment: CommentId,
        direction: VoteDirection,
    ) -> Result<u64, StoreError> {
        Ok(self.lock()?.count(comment, direction))
    }

    fn votes_for_comment(&self, comment: CommentId) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self.lock()?.votes_of(comment).copied().collect())
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.lock()?.meta.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock()?.meta.get(key).cloned())
    }
}

/// Batch over a staged copy of the state; commit swaps it in.
struct NullBatch<'a> {
    store: &'a NullStore,
    guard: MutexGuard<'a, State>,
    staged: State,
}

impl VoteBatch for NullBatch<'_> {
    fn get_comment(&self, id: CommentId) -> Result<Option<CommentRecord>, StoreError> {
        Ok(self.staged.comments.get(&id).cloned())
    }

    fn record_vote(&mut self, vote: &VoteRecord) -> Result<RecordOutcome, StoreError> {
        Ok(self.staged.insert_vote(vote))
    }

    fn count_by_direction(
        &self,
        comment: CommentId,
        direction: VoteDirection,
    ) -> Result<u64, StoreError> {
        Ok(self.staged.count(comment, direction))
    }

    fn persist_displayed_counts(
        &mut self,
        id: CommentId,
        counts: VoteCounts,
    ) -> Result<(), StoreError> {
        self.staged.write_counts(id, counts)
    }

    fn comment_ids(&self) -> Result<Vec<CommentId>, StoreError> {
        Ok(self.staged.comments.keys().copied().collect())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let NullBatch {
            store,
            mut guard,
            staged,
        } = *self;
        if store.take_commit_failure() {
            return Err(StoreError::Transient("injected commit failure".to_string()));
        }
        *guard = staged;
        Ok(())
    }
}

impl VoteBackend for NullStore {
    fn write_batch(&self) -> Result<Box<dyn VoteBatch + '_>, StoreError> {
        let guard = self.lock()?;
        let staged = guard.clone();
        Ok(Box::new(NullBatch {
            store: self,
            guard,
            staged,
        }))
    }
}
