//! Voter fingerprint derivation.
//!
//! A fingerprint is `Blake2b-256(tag ‖ secret ‖ canonical address octets)`.
//! The installation secret makes fingerprints unlinkable across
//! installations and keeps raw addresses from being brute-forced out of a
//! leaked database. Blake2b has no length-extension weakness, so a
//! secret-prefix construction is a sound keyed hash.

use std::net::IpAddr;

use murmur_types::Fingerprint;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::hash::blake2b_256_multi;

/// Domain separation tag, bumped if the derivation ever changes.
const FINGERPRINT_TAG: &[u8] = b"murmur-voter-fingerprint-v1";

/// Turns a requester's network address into a [`Fingerprint`].
///
/// Implementations must be pure and deterministic: the same address always
/// yields the same fingerprint for the lifetime of the installation.
pub trait FingerprintDeriver: Send + Sync {
    fn derive(&self, addr: &IpAddr) -> Fingerprint;
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("fingerprint secret must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("OS randomness unavailable: {0}")]
    Entropy(String),
}

/// Installation-wide key mixed into every fingerprint. Zeroised on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FingerprintSecret([u8; 32]);

impl FingerprintSecret {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh secret from OS randomness.
    pub fn generate() -> Result<Self, SecretError> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(|e| SecretError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Restore a secret previously persisted with [`FingerprintSecret::as_bytes`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SecretError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| SecretError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for FingerprintSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FingerprintSecret(..)")
    }
}

/// The default deriver: keyed Blake2b-256 over canonical address octets.
pub struct KeyedBlake2Deriver {
    secret: FingerprintSecret,
}

impl KeyedBlake2Deriver {
    pub fn new(secret: FingerprintSecret) -> Self {
        Self { secret }
    }
}

impl FingerprintDeriver for KeyedBlake2Deriver {
    fn derive(&self, addr: &IpAddr) -> Fingerprint {
        // An IPv4 peer seen through a dual-stack socket must fingerprint the
        // same as the plain IPv4 address.
        let digest = match addr.to_canonical() {
            IpAddr::V4(v4) => {
                blake2b_256_multi(&[FINGERPRINT_TAG, self.secret.as_bytes(), b"4", &v4.octets()])
            }
            IpAddr::V6(v6) => {
                blake2b_256_multi(&[FINGERPRINT_TAG, self.secret.as_bytes(), b"6", &v6.octets()])
            }
        };
        Fingerprint::new(digest)
    }
}
