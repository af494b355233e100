//! LMDB storage backend for the Murmur vote core.
//!
//! Implements the storage traits from `murmur-store` using the `heed` LMDB
//! bindings. Comments, the vote ledger, and metadata live in three named
//! databases within a single environment, so one write transaction can
//! cover a whole vote.

pub mod comment;
pub mod environment;
pub mod error;
pub mod integrity;
mod keys;
pub mod ledger;
pub mod meta;
pub mod migration;
pub mod write_batch;

pub use comment::LmdbCommentStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use ledger::LmdbVoteLedger;
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
