//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the server begins
//! accepting votes. Besides counting entries in each database, the check
//! confirms that every ledger entry points at a stored comment and that
//! every displayed count equals `min(ledger cardinality, ceiling)`. Stored
//! tallies are compared against a full scan of the ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use murmur_types::{CommentId, VoteCounts, VoteDirection, VoteParams};

use crate::environment::{COMMENTS_DB, META_DB, TALLIES_DB, VOTES_DB};
use crate::keys::{decode_tally_key, decode_vote_value, split_vote_key};
use crate::{comment, ledger, LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
    /// Comments whose displayed counts disagree with the ledger.
    pub stale_counts: Vec<CommentId>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid Murmur environment.
const EXPECTED_DATABASES: &[&str] = &[COMMENTS_DB, VOTES_DB, META_DB, TALLIES_DB];

/// Check LMDB database integrity on startup.
///
/// Read failures are recorded in the report rather than causing a hard
/// error. Stale counts are not errors: a rebuild repairs them.
pub fn check_integrity(
    env: &LmdbEnvironment,
    params: &VoteParams,
) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
        stale_counts: Vec::new(),
    };

    let rtxn = env.env().read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env
            .env()
            .open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name))
        {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    let mut raw: BTreeMap<CommentId, VoteCounts> = BTreeMap::new();
    for entry in env.votes_db.iter(&rtxn)? {
        let (key, value) = entry?;
        let Some((comment, _voter)) = split_vote_key(key) else {
            report.errors.push("malformed vote key".to_string());
            continue;
        };
        let Some((direction, _)) = decode_vote_value(value) else {
            report
                .errors
                .push(format!("undecodable vote on comment {}", comment));
            continue;
        };
        let tally = raw.entry(comment).or_default();
        *tally = tally.with(direction, tally.get(direction) + 1);
    }

    let mut tallied: BTreeMap<CommentId, VoteCounts> = BTreeMap::new();
    for entry in env.tallies_db.iter(&rtxn)? {
        let (key, value) = entry?;
        let Some((comment, direction)) = decode_tally_key(key) else {
            report.errors.push("malformed tally key".to_string());
            continue;
        };
        match ledger::decode_tally(value) {
            Ok(count) => {
                let tally = tallied.entry(comment).or_default();
                *tally = tally.with(direction, count);
            }
            Err(e) => report
                .errors
                .push(format!("undecodable tally on comment {}: {}", comment, e)),
        }
    }

    for id in raw.keys().chain(tallied.keys()).collect::<BTreeSet<_>>() {
        let scanned = raw.get(id).copied().unwrap_or_default();
        let stored = tallied.get(id).copied().unwrap_or_default();
        if scanned != stored {
            report.errors.push(format!(
                "tally for comment {} is {}/{} but ledger holds {}/{}",
                id, stored.likes, stored.dislikes, scanned.likes, scanned.dislikes
            ));
        }
    }

    for id in raw.keys() {
        if comment::read_comment(&env.comments_db, &rtxn, *id)?.is_none() {
            report
                .errors
                .push(format!("ledger references missing comment {}", id));
        }
    }

    for id in comment::read_comment_ids(&env.comments_db, &rtxn)? {
        let Some(stored) = comment::read_comment(&env.comments_db, &rtxn, id)? else {
            continue;
        };
        let tally = raw.get(&id).copied().unwrap_or_default();
        let expected = VoteCounts::new(
            params.displayed(VoteDirection::Like, tally.likes),
            params.displayed(VoteDirection::Dislike, tally.dislikes),
        );
        if stored.counts() != expected {
            report.stale_counts.push(id);
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent or empty) directory. Returns an
/// error if the directory holds files but `data.mdb` is missing, which
/// suggests corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let is_empty = std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .map_err(|e| format!("cannot read data directory {}: {}", path.display(), e))?;
    if !is_empty && !path.join("data.mdb").exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_store::{CommentStore, NewComment, RecordOutcome, VoteLedger, VoteRecord};
    use murmur_types::{Fingerprint, Timestamp};

    fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        (dir, env)
    }

    #[test]
    fn fresh_environment_is_healthy() {
        let (_dir, env) = open_test_env();
        let report = check_integrity(&env, &VoteParams::default()).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.databases_checked, 4);
        assert!(report.stale_counts.is_empty());
    }

    #[test]
    fn unpersisted_ledger_entry_is_stale() {
        let (_dir, env) = open_test_env();
        let comment = env
            .comment_store()
            .create_comment(&NewComment {
                thread: "/t".into(),
                author: Fingerprint::new([1; 32]),
                text: String::new(),
                created: Timestamp::new(1),
            })
            .unwrap();
        let outcome = env
            .vote_ledger()
            .record(&VoteRecord {
                comment: comment.id,
                voter: Fingerprint::new([2; 32]),
                direction: VoteDirection::Like,
                timestamp: Timestamp::new(2),
            })
            .unwrap();
        assert_eq!(outcome, RecordOutcome::Recorded);

        let report = check_integrity(&env, &VoteParams::default()).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.stale_counts, vec![comment.id]);
    }

    #[test]
    fn orphaned_vote_is_an_error() {
        let (_dir, env) = open_test_env();
        env.vote_ledger()
            .record(&VoteRecord {
                comment: CommentId::new(9),
                voter: Fingerprint::new([2; 32]),
                direction: VoteDirection::Dislike,
                timestamp: Timestamp::new(2),
            })
            .unwrap();

        let report = check_integrity(&env, &VoteParams::default()).unwrap();
        assert!(!report.is_healthy());
    }

    #[test]
    fn tally_drift_from_ledger_is_an_error() {
        let (_dir, env) = open_test_env();
        let comment = env
            .comment_store()
            .create_comment(&NewComment {
                thread: "/t".into(),
                author: Fingerprint::new([1; 32]),
                text: String::new(),
                created: Timestamp::new(1),
            })
            .unwrap();
        env.vote_ledger()
            .record(&VoteRecord {
                comment: comment.id,
                voter: Fingerprint::new([2; 32]),
                direction: VoteDirection::Like,
                timestamp: Timestamp::new(2),
            })
            .unwrap();
        let report = check_integrity(&env, &VoteParams::default()).unwrap();
        assert!(report.is_healthy());

        let mut wtxn = env.env().write_txn().unwrap();
        env.tallies_db
            .put(
                &mut wtxn,
                &crate::keys::tally_key(comment.id, VoteDirection::Like),
                &5u64.to_be_bytes(),
            )
            .unwrap();
        wtxn.commit().unwrap();

        let report = check_integrity(&env, &VoteParams::default()).unwrap();
        assert!(!report.is_healthy());
        assert!(report.errors.iter().any(|e| e.contains("tally")));
    }

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("never-created")).is_ok());
        assert!(check_data_dir(dir.path()).is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"x").unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }
}
