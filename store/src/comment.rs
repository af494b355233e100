//! Comment storage trait (the collaborator boundary of the vote core).

use crate::StoreError;
use murmur_types::{CommentId, Fingerprint, Timestamp, VoteCounts};
use serde::{Deserialize, Serialize};

/// A stored comment. The vote core reads `id` and `author` and rewrites
/// `likes` / `dislikes`; everything else belongs to the comment pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    /// URI of the thread the comment belongs to.
    pub thread: String,
    /// Fingerprint of the origin that created the comment.
    pub author: Fingerprint,
    pub text: String,
    pub created: Timestamp,
    /// Displayed (post-ceiling) like count.
    pub likes: u64,
    /// Displayed (post-ceiling) dislike count.
    pub dislikes: u64,
}

impl CommentRecord {
    pub fn counts(&self) -> VoteCounts {
        VoteCounts::new(self.likes, self.dislikes)
    }
}

/// Input for [`CommentStore::create_comment`].
#[derive(Clone, Debug)]
pub struct NewComment {
    pub thread: String,
    pub author: Fingerprint,
    pub text: String,
    pub created: Timestamp,
}

/// Trait for comment storage operations.
pub trait CommentStore: Send + Sync {
    /// Insert a comment with zero counts under a freshly assigned id.
    fn create_comment(&self, comment: &NewComment) -> Result<CommentRecord, StoreError>;

    fn get_comment(&self, id: CommentId) -> Result<Option<CommentRecord>, StoreError>;

    fn get_author_fingerprint(&self, id: CommentId) -> Result<Option<Fingerprint>, StoreError> {
        Ok(self.get_comment(id)?.map(|c| c.author))
    }

    /// Overwrite the displayed counts. Fails with `NotFound` for unknown ids.
    /// Durable and visible to subsequent reads once this returns `Ok`.
    fn persist_displayed_counts(&self, id: CommentId, counts: VoteCounts)
        -> Result<(), StoreError>;

    fn comment_count(&self) -> Result<u64, StoreError>;
}
