use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use proptest::prelude::*;

use murmur_crypto::{anonymize, FingerprintDeriver, FingerprintSecret, KeyedBlake2Deriver};

fn deriver() -> KeyedBlake2Deriver {
    KeyedBlake2Deriver::new(FingerprintSecret::new([0x5A; 32]))
}

proptest! {
    /// Derivation is deterministic for any IPv4 address.
    #[test]
    fn ipv4_derivation_is_deterministic(octets in prop::array::uniform4(0u8..)) {
        let d = deriver();
        let addr = IpAddr::V4(Ipv4Addr::from(octets));
        prop_assert_eq!(d.derive(&addr), d.derive(&addr));
    }

    /// Distinct IPv4 addresses produce distinct fingerprints.
    #[test]
    fn distinct_ipv4_distinct_fingerprints(
        a in prop::array::uniform4(0u8..),
        b in prop::array::uniform4(0u8..),
    ) {
        prop_assume!(a != b);
        let d = deriver();
        let fa = d.derive(&IpAddr::V4(Ipv4Addr::from(a)));
        let fb = d.derive(&IpAddr::V4(Ipv4Addr::from(b)));
        prop_assert_ne!(fa, fb);
    }

    /// Anonymisation is idempotent.
    #[test]
    fn anonymize_is_idempotent(segments in prop::array::uniform8(0u16..)) {
        let addr = IpAddr::V6(Ipv6Addr::from(segments));
        let once = anonymize(&addr);
        prop_assert_eq!(anonymize(&once), once);
    }
}
