//! Binary key and value layouts.
//!
//! - comments: `comment_id (u64 BE)`
//! - votes: `comment_id (u64 BE) ++ fingerprint (32 bytes)`
//!   → `direction tag (1 byte) ++ timestamp (u64 BE)`
//! - tallies: `comment_id (u64 BE) ++ direction tag` → `count (u64 BE)`
//!
//! Big-endian ids keep every comment's votes contiguous, so a range scan
//! over one id prefix yields exactly that comment's ledger.

use std::ops::Bound;

use murmur_types::{CommentId, Fingerprint, Timestamp, VoteDirection};

pub(crate) const VOTE_KEY_LEN: usize = 8 + Fingerprint::LEN;

pub(crate) fn comment_key(id: CommentId) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn vote_key(id: CommentId, voter: &Fingerprint) -> [u8; VOTE_KEY_LEN] {
    let mut key = [0u8; VOTE_KEY_LEN];
    key[..8].copy_from_slice(&id.to_be_bytes());
    key[8..].copy_from_slice(voter.as_bytes());
    key
}

/// Decode a vote key back into its parts. `None` on malformed keys.
pub(crate) fn split_vote_key(key: &[u8]) -> Option<(CommentId, Fingerprint)> {
    if key.len() != VOTE_KEY_LEN {
        return None;
    }
    let id: [u8; 8] = key[..8].try_into().ok()?;
    Some((CommentId::from_be_bytes(id), Fingerprint::from_slice(&key[8..])?))
}

pub(crate) fn vote_value(direction: VoteDirection, timestamp: Timestamp) -> [u8; 9] {
    let mut value = [0u8; 9];
    value[0] = direction.as_byte();
    value[1..].copy_from_slice(&timestamp.as_secs().to_be_bytes());
    value
}

pub(crate) fn decode_vote_value(value: &[u8]) -> Option<(VoteDirection, Timestamp)> {
    let (&tag, secs) = value.split_first()?;
    let secs: [u8; 8] = secs.try_into().ok()?;
    Some((
        VoteDirection::from_byte(tag)?,
        Timestamp::new(u64::from_be_bytes(secs)),
    ))
}

pub(crate) fn tally_key(id: CommentId, direction: VoteDirection) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[..8].copy_from_slice(&id.to_be_bytes());
    key[8] = direction.as_byte();
    key
}

pub(crate) fn decode_tally_key(key: &[u8]) -> Option<(CommentId, VoteDirection)> {
    let id: [u8; 8] = key.get(..8)?.try_into().ok()?;
    match key.get(8..)? {
        [tag] => Some((CommentId::from_be_bytes(id), VoteDirection::from_byte(*tag)?)),
        _ => None,
    }
}

pub(crate) fn decode_comment_key(key: &[u8]) -> Option<CommentId> {
    let id: [u8; 8] = key.try_into().ok()?;
    Some(CommentId::from_be_bytes(id))
}

/// Owned bounds for the vote range of one comment.
pub(crate) struct VoteRange {
    lower: [u8; 8],
    upper: Option<[u8; 8]>,
}

impl VoteRange {
    pub(crate) fn for_comment(id: CommentId) -> Self {
        Self {
            lower: id.to_be_bytes(),
            upper: id.as_u64().checked_add(1).map(u64::to_be_bytes),
        }
    }

    pub(crate) fn bounds(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        let upper = match &self.upper {
            Some(u) => Bound::Excluded(u.as_slice()),
            None => Bound::Unbounded,
        };
        (Bound::Included(self.lower.as_slice()), upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_key_round_trips() {
        let fp = Fingerprint::new([9u8; 32]);
        let key = vote_key(CommentId::new(77), &fp);
        assert_eq!(split_vote_key(&key), Some((CommentId::new(77), fp)));
        assert_eq!(split_vote_key(&key[..10]), None);
    }

    #[test]
    fn vote_keys_group_by_comment() {
        let low = vote_key(CommentId::new(1), &Fingerprint::new([0xFF; 32]));
        let high = vote_key(CommentId::new(2), &Fingerprint::new([0x00; 32]));
        assert!(low < high);
    }

    #[test]
    fn vote_value_carries_direction_tag() {
        let value = vote_value(VoteDirection::Dislike, Timestamp::new(1_700_000_000));
        assert_eq!(value[0], VoteDirection::Dislike.as_byte());
        assert_eq!(
            decode_vote_value(&value),
            Some((VoteDirection::Dislike, Timestamp::new(1_700_000_000)))
        );
        assert_eq!(decode_vote_value(&[9; 9]), None);
        assert_eq!(decode_vote_value(&value[..5]), None);
    }

    #[test]
    fn tally_keys_decode_and_reject_garbage() {
        let key = tally_key(CommentId::new(5), VoteDirection::Like);
        assert_eq!(decode_tally_key(&key), Some((CommentId::new(5), VoteDirection::Like)));
        assert_eq!(decode_tally_key(&key[..8]), None);
        assert_eq!(decode_tally_key(&[0; 10]), None);
    }

    #[test]
    fn last_comment_id_range_is_unbounded_above() {
        let range = VoteRange::for_comment(CommentId::new(u64::MAX));
        assert!(matches!(range.bounds().1, Bound::Unbounded));
    }
}
