use heed::MdbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("unknown migration: {from} -> {to}")]
    UnknownMigration { from: u32, to: u32 },
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for murmur_store::StoreError {
    fn from(e: LmdbError) -> Self {
        use murmur_store::StoreError;
        match e {
            LmdbError::NotFound(key) => StoreError::NotFound(key),
            LmdbError::Serialization(msg) => StoreError::Serialization(msg),
            LmdbError::Io(err) => StoreError::Transient(err.to_string()),
            LmdbError::Heed(heed::Error::Io(err)) => StoreError::Transient(err.to_string()),
            LmdbError::Heed(heed::Error::Mdb(mdb)) => match mdb {
                MdbError::MapFull
                | MdbError::MapResized
                | MdbError::ReadersFull
                | MdbError::TxnFull
                | MdbError::TlsFull => StoreError::Transient(mdb.to_string()),
                MdbError::Corrupted | MdbError::PageNotFound | MdbError::Panic => {
                    StoreError::Corruption(mdb.to_string())
                }
                other => StoreError::Backend(other.to_string()),
            },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_store::StoreError;

    #[test]
    fn map_full_is_transient() {
        let err: StoreError = LmdbError::Heed(heed::Error::Mdb(MdbError::MapFull)).into();
        assert!(err.is_transient());
    }

    #[test]
    fn corruption_is_not_transient() {
        let err: StoreError = LmdbError::Heed(heed::Error::Mdb(MdbError::Corrupted)).into();
        assert!(matches!(err, StoreError::Corruption(_)));
    }

    #[test]
    fn not_found_keeps_its_meaning() {
        let err: StoreError = LmdbError::NotFound("comment 7".into()).into();
        assert!(matches!(err, StoreError::NotFound(ref k) if k == "comment 7"));
    }
}
