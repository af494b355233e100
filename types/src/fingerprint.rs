//! Voter fingerprint: the pseudonymous identity of a network origin.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte opaque voter fingerprint.
///
/// Only ever compared for equality; the raw address it was derived from
/// cannot be recovered.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a byte slice of exactly [`Fingerprint::LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_requires_exact_length() {
        assert!(Fingerprint::from_slice(&[7u8; 32]).is_some());
        assert!(Fingerprint::from_slice(&[7u8; 31]).is_none());
        assert!(Fingerprint::from_slice(&[7u8; 33]).is_none());
    }

    #[test]
    fn debug_is_truncated() {
        let fp = Fingerprint::new([0xAB; 32]);
        assert_eq!(format!("{:?}", fp), "Fingerprint(abababab\u{2026})");
        assert_eq!(fp.to_string().len(), 64);
    }
}
