//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta store and
//! runs sequential migration functions to bring an older database up to date.

use murmur_store::MetaStore;

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - If the stored version is *higher* than what this code supports,
    ///   the database was written by a newer release and we refuse to open it.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let current = meta_store
            .get_schema_version()
            .map_err(|e| LmdbError::Serialization(e.to_string()))?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::info!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        meta_store
            .set_schema_version(CURRENT_SCHEMA_VERSION)
            .map_err(|e| LmdbError::Serialization(e.to_string()))?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: comments, votes keyed (comment, voter), meta.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::UnknownMigration { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_env() -> (tempfile::TempDir, crate::LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        (dir, env)
    }

    #[test]
    fn unknown_migration_is_error() {
        assert!(matches!(
            run_migration(99, 100),
            Err(LmdbError::UnknownMigration { from: 99, to: 100 })
        ));
    }

    #[test]
    fn fresh_database_is_stamped() {
        let (_dir, env) = open_test_env();
        let meta = env.meta_store();
        Migrator::run(&meta).unwrap();
        assert_eq!(meta.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        Migrator::run(&meta).unwrap();
    }

    #[test]
    fn newer_schema_is_refused() {
        let (_dir, env) = open_test_env();
        let meta = env.meta_store();
        meta.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(
            Migrator::run(&meta),
            Err(LmdbError::SchemaTooNew { .. })
        ));
    }
}
