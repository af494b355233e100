//! LMDB implementation of MetaStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use murmur_store::meta::MetaStore;
use murmur_store::StoreError;

use crate::LmdbError;

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl MetaStore for LmdbMetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let meta = env.meta_store();

        assert_eq!(meta.get_meta("missing").unwrap(), None);
        meta.put_meta("fingerprint_secret", &[1, 2, 3]).unwrap();
        assert_eq!(meta.get_meta("fingerprint_secret").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn schema_version_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let meta = env.meta_store();

        assert_eq!(meta.get_schema_version().unwrap(), 0);
        meta.set_schema_version(3).unwrap();
        assert_eq!(meta.get_schema_version().unwrap(), 3);
    }
}
