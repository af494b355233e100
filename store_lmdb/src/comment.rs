//! LMDB implementation of CommentStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};

use murmur_store::comment::{CommentRecord, CommentStore, NewComment};
use murmur_store::StoreError;
use murmur_types::{CommentId, VoteCounts};

use crate::keys::{comment_key, decode_comment_key};
use crate::LmdbError;

/// Meta key holding the next comment id to hand out.
const NEXT_COMMENT_ID_KEY: &[u8] = b"next_comment_id";

pub struct LmdbCommentStore {
    pub(crate) env: Arc<Env>,
    pub(crate) comments_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

pub(crate) fn read_comment(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    id: CommentId,
) -> Result<Option<CommentRecord>, LmdbError> {
    match db.get(txn, &comment_key(id))? {
        Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
        None => Ok(None),
    }
}

pub(crate) fn write_comment(
    db: &Database<Bytes, Bytes>,
    txn: &mut RwTxn<'_>,
    comment: &CommentRecord,
) -> Result<(), LmdbError> {
    let bytes = bincode::serialize(comment)?;
    db.put(txn, &comment_key(comment.id), &bytes)?;
    Ok(())
}

/// Rewrite the displayed counts of an existing comment.
pub(crate) fn write_counts(
    db: &Database<Bytes, Bytes>,
    txn: &mut RwTxn<'_>,
    id: CommentId,
    counts: VoteCounts,
) -> Result<(), LmdbError> {
    let mut comment =
        read_comment(db, txn, id)?.ok_or_else(|| LmdbError::NotFound(format!("comment {id}")))?;
    comment.likes = counts.likes;
    comment.dislikes = counts.dislikes;
    write_comment(db, txn, &comment)
}

pub(crate) fn read_comment_ids(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
) -> Result<Vec<CommentId>, LmdbError> {
    let mut ids = Vec::new();
    for entry in db.iter(txn)? {
        let (key, _) = entry?;
        let id = decode_comment_key(key)
            .ok_or_else(|| LmdbError::Serialization("malformed comment key".to_string()))?;
        ids.push(id);
    }
    Ok(ids)
}

/// Take the next id from the counter. Ids start at 1 and are never reused,
/// even if the comment they named is later removed.
fn allocate_id(meta_db: &Database<Bytes, Bytes>, txn: &mut RwTxn<'_>) -> Result<CommentId, LmdbError> {
    let next = match meta_db.get(txn, NEXT_COMMENT_ID_KEY)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization("next_comment_id has unexpected byte length".to_string())
            })?;
            u64::from_be_bytes(arr)
        }
        None => 1,
    };
    meta_db.put(txn, NEXT_COMMENT_ID_KEY, &(next + 1).to_be_bytes())?;
    Ok(CommentId::new(next))
}

impl CommentStore for LmdbCommentStore {
    fn create_comment(&self, new: &NewComment) -> Result<CommentRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = allocate_id(&self.meta_db, &mut wtxn)?;
        let comment = CommentRecord {
            id,
            thread: new.thread.clone(),
            author: new.author,
            text: new.text.clone(),
            created: new.created,
            likes: 0,
            dislikes: 0,
        };
        write_comment(&self.comments_db, &mut wtxn, &comment)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(comment = %id, thread = %comment.thread, "comment created");
        Ok(comment)
    }

    fn get_comment(&self, id: CommentId) -> Result<Option<CommentRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(read_comment(&self.comments_db, &rtxn, id)?)
    }

    fn persist_displayed_counts(
        &self,
        id: CommentId,
        counts: VoteCounts,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        write_counts(&self.comments_db, &mut wtxn, id, counts)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn comment_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.comments_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_types::{Fingerprint, Timestamp};

    fn open_test_env() -> (tempfile::TempDir, crate::LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        (dir, env)
    }

    fn new_comment(author: u8) -> NewComment {
        NewComment {
            thread: "/blog/post-1".to_string(),
            author: Fingerprint::new([author; 32]),
            text: "...".to_string(),
            created: Timestamp::new(1_700_000_000),
        }
    }

    #[test]
    fn created_comment_starts_at_zero() {
        let (_dir, env) = open_test_env();
        let store = env.comment_store();

        let comment = store.create_comment(&new_comment(1)).unwrap();
        assert_eq!(comment.id, CommentId::new(1));
        assert_eq!(comment.counts(), VoteCounts::ZERO);
        assert_eq!(store.get_comment(comment.id).unwrap(), Some(comment));
    }

    #[test]
    fn ids_are_sequential() {
        let (_dir, env) = open_test_env();
        let store = env.comment_store();

        let a = store.create_comment(&new_comment(1)).unwrap();
        let b = store.create_comment(&new_comment(2)).unwrap();
        assert_eq!(a.id, CommentId::new(1));
        assert_eq!(b.id, CommentId::new(2));
        assert_eq!(store.comment_count().unwrap(), 2);
    }

    #[test]
    fn author_fingerprint_lookup() {
        let (_dir, env) = open_test_env();
        let store = env.comment_store();

        let c = store.create_comment(&new_comment(5)).unwrap();
        assert_eq!(
            store.get_author_fingerprint(c.id).unwrap(),
            Some(Fingerprint::new([5; 32]))
        );
        assert_eq!(store.get_author_fingerprint(CommentId::new(99)).unwrap(), None);
    }

    #[test]
    fn persisted_counts_are_visible() {
        let (_dir, env) = open_test_env();
        let store = env.comment_store();

        let c = store.create_comment(&new_comment(1)).unwrap();
        store
            .persist_displayed_counts(c.id, VoteCounts::new(3, 1))
            .unwrap();
        let read = store.get_comment(c.id).unwrap().unwrap();
        assert_eq!(read.counts(), VoteCounts::new(3, 1));
        assert_eq!(read.text, "...");
    }

    #[test]
    fn persisting_unknown_comment_is_not_found() {
        let (_dir, env) = open_test_env();
        let store = env.comment_store();

        let err = store
            .persist_displayed_counts(CommentId::new(42), VoteCounts::new(1, 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
