//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use murmur_store::{StoreError, VoteBackend, VoteBatch};

use crate::comment::LmdbCommentStore;
use crate::ledger::LmdbVoteLedger;
use crate::meta::LmdbMetaStore;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

pub(crate) const COMMENTS_DB: &str = "comments";
pub(crate) const VOTES_DB: &str = "votes";
pub(crate) const META_DB: &str = "meta";
pub(crate) const TALLIES_DB: &str = "tallies";

const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) comments_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    /// Ledger cardinality per (comment, direction), kept in step with `votes_db`.
    pub(crate) tallies_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never accessed outside heed.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let comments_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(COMMENTS_DB))?;
        let votes_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(VOTES_DB))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(META_DB))?;
        let tallies_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(TALLIES_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            comments_db,
            votes_db,
            meta_db,
            tallies_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn comment_store(&self) -> LmdbCommentStore {
        LmdbCommentStore {
            env: Arc::clone(&self.env),
            comments_db: self.comments_db,
            meta_db: self.meta_db,
        }
    }

    pub fn vote_ledger(&self) -> LmdbVoteLedger {
        LmdbVoteLedger {
            env: Arc::clone(&self.env),
            votes_db: self.votes_db,
            tallies_db: self.tallies_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}

impl VoteBackend for LmdbEnvironment {
    fn write_batch(&self) -> Result<Box<dyn VoteBatch + '_>, StoreError> {
        Ok(Box::new(WriteBatch::new(self)?))
    }
}
