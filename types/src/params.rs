//! Tunable vote parameters.

use serde::{Deserialize, Serialize};

use crate::vote::VoteDirection;

/// Default displayed-count ceiling for each direction.
pub const DEFAULT_VOTE_CEILING: u64 = 142;

/// Parameters governing how raw ledger cardinality becomes a displayed count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteParams {
    /// Displayed likes never exceed this value.
    pub like_ceiling: u64,
    /// Displayed dislikes never exceed this value.
    pub dislike_ceiling: u64,
}

impl VoteParams {
    pub fn with_ceiling(ceiling: u64) -> Self {
        Self {
            like_ceiling: ceiling,
            dislike_ceiling: ceiling,
        }
    }

    pub fn ceiling(&self, direction: VoteDirection) -> u64 {
        match direction {
            VoteDirection::Like => self.like_ceiling,
            VoteDirection::Dislike => self.dislike_ceiling,
        }
    }

    /// Displayed count for a raw distinct-voter count: `min(raw, ceiling)`.
    pub fn displayed(&self, direction: VoteDirection, raw: u64) -> u64 {
        raw.min(self.ceiling(direction))
    }
}

impl Default for VoteParams {
    fn default() -> Self {
        Self::with_ceiling(DEFAULT_VOTE_CEILING)
    }
}
