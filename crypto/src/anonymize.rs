//! Subnet masking applied to requester addresses before fingerprinting.
//!
//! IPv4 addresses keep their /24 network, IPv6 addresses their /48. A voter
//! cycling through host addresses inside one allocation is then seen as a
//! single origin.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Mask `addr` to its /24 (IPv4) or /48 (IPv6) network.
pub fn anonymize(addr: &IpAddr) -> IpAddr {
    match addr.to_canonical() {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            IpAddr::V4(Ipv4Addr::new(a, b, c, 0))
        }
        IpAddr::V6(v6) => {
            let s = v6.segments();
            IpAddr::V6(Ipv6Addr::new(s[0], s[1], s[2], 0, 0, 0, 0, 0))
        }
    }
}
