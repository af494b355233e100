//! Abstract storage traits for the Murmur vote core.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod batch;
pub mod comment;
pub mod error;
pub mod ledger;
pub mod meta;

pub use batch::{VoteBackend, VoteBatch};
pub use comment::{CommentRecord, CommentStore, NewComment};
pub use error::StoreError;
pub use ledger::{RecordOutcome, VoteLedger, VoteRecord};
pub use meta::{MetaStore, FINGERPRINT_SECRET_KEY, SCHEMA_VERSION_KEY};
