//! Vote aggregation for comment likes and dislikes.
//!
//! The [`VoteAggregator`] turns a `(comment, voter fingerprint, direction)`
//! request into an outcome:
//! - unknown comment → [`VoteOutcome::NotFound`]
//! - the comment's author → [`VoteOutcome::SelfVote`], nothing recorded
//! - a voter already in the ledger → [`VoteOutcome::AlreadyVoted`]
//! - otherwise the vote is recorded and the displayed count for its
//!   direction is recomputed as `min(ledger cardinality, ceiling)`
//!
//! Only infrastructure failures surface as [`VoteError`].

pub mod aggregator;
pub mod error;
pub mod outcome;
pub mod retry;

pub use aggregator::{RebuildReport, VoteAggregator};
pub use error::VoteError;
pub use outcome::VoteOutcome;
pub use retry::RetryPolicy;
