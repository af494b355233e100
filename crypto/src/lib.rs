//! Voter identity primitives for the Murmur vote core.
//!
//! - **Blake2b-256** for hashing
//! - **Fingerprints**: requester address → opaque, keyed, one-way voter identity
//! - **Anonymisation**: optional subnet masking applied before fingerprinting

pub mod anonymize;
pub mod fingerprint;
pub mod hash;

pub use anonymize::anonymize;
pub use fingerprint::{FingerprintDeriver, FingerprintSecret, KeyedBlake2Deriver, SecretError};
pub use hash::{blake2b_256, blake2b_256_multi};
