//! Vote outcomes.

use murmur_types::VoteCounts;

/// Result of a vote request. Every variant is a normal outcome; only
/// storage failures are errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was recorded; carries the updated displayed counts.
    Counted(VoteCounts),
    /// The voter had already voted on this comment (in either direction).
    AlreadyVoted(VoteCounts),
    /// The voter is the comment's author.
    SelfVote(VoteCounts),
    /// No comment with that id exists.
    NotFound,
}

impl VoteOutcome {
    /// Displayed counts after the request, or `None` for an unknown comment.
    pub fn counts(&self) -> Option<VoteCounts> {
        match self {
            Self::Counted(c) | Self::AlreadyVoted(c) | Self::SelfVote(c) => Some(*c),
            Self::NotFound => None,
        }
    }

    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counted(_) => "counted",
            Self::AlreadyVoted(_) => "already_voted",
            Self::SelfVote(_) => "self_vote",
            Self::NotFound => "not_found",
        }
    }
}
