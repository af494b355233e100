//! Vote directions and displayed counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a vote. Likes and dislikes are tallied independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Like,
    Dislike,
}

impl VoteDirection {
    pub const ALL: [VoteDirection; 2] = [VoteDirection::Like, VoteDirection::Dislike];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Single-byte tag used in ledger values and tally keys.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Like => 1,
            Self::Dislike => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Like),
            2 => Some(Self::Dislike),
            _ => None,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Displayed (post-ceiling) counts of a comment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub likes: u64,
    pub dislikes: u64,
}

impl VoteCounts {
    pub const ZERO: Self = Self {
        likes: 0,
        dislikes: 0,
    };

    pub fn new(likes: u64, dislikes: u64) -> Self {
        Self { likes, dislikes }
    }

    pub fn get(&self, direction: VoteDirection) -> u64 {
        match direction {
            VoteDirection::Like => self.likes,
            VoteDirection::Dislike => self.dislikes,
        }
    }

    /// Copy of these counts with one direction replaced.
    pub fn with(self, direction: VoteDirection, value: u64) -> Self {
        match direction {
            VoteDirection::Like => Self {
                likes: value,
                ..self
            },
            VoteDirection::Dislike => Self {
                dislikes: value,
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_byte_tags_are_stable() {
        for d in VoteDirection::ALL {
            assert_eq!(VoteDirection::from_byte(d.as_byte()), Some(d));
        }
        assert_eq!(VoteDirection::from_byte(0), None);
    }

    #[test]
    fn with_only_touches_one_direction() {
        let counts = VoteCounts::new(3, 4).with(VoteDirection::Dislike, 9);
        assert_eq!(counts, VoteCounts::new(3, 9));
        assert_eq!(counts.get(VoteDirection::Like), 3);
    }

    #[test]
    fn counts_serialize_as_likes_and_dislikes() {
        let json = serde_json::to_string(&VoteCounts::new(1, 0)).unwrap();
        assert_eq!(json, r#"{"likes":1,"dislikes":0}"#);
    }
}
