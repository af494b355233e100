//! Fundamental types for the Murmur vote core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! comment identifiers, voter fingerprints, vote directions, displayed counts,
//! timestamps, and the tunable vote parameters.

pub mod comment;
pub mod fingerprint;
pub mod params;
pub mod time;
pub mod vote;

pub use comment::CommentId;
pub use fingerprint::Fingerprint;
pub use params::{VoteParams, DEFAULT_VOTE_CEILING};
pub use time::Timestamp;
pub use vote::{VoteCounts, VoteDirection};
