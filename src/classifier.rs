/* src/classifier.rs */

use ipnet::IpNet;
use std::net::IpAddr;
use std::sync::LazyLock;

use crate::error::{RealIpError, Result};

/// Private, loopback, link-local and unique-local blocks.
const RESERVED_CIDRS: [&str; 7] = [
    "127.0.0.0/8",
    "10.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "::1/128",
    "fc00::/7",
];

static DEFAULT_RANGES: LazyLock<ReservedRanges> = LazyLock::new(|| {
    ReservedRanges::from_cidrs(RESERVED_CIDRS)
        .unwrap_or_else(|err| panic!("built-in reserved range table is malformed: {err}"))
});

/// Outcome of classifying a textual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Inside one of the reserved ranges.
    Local,
    /// A valid address outside every reserved range.
    Public,
    /// Not an IP address at all.
    Unparsable,
}

/// An immutable set of CIDR blocks considered internal to the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedRanges {
    nets: Vec<IpNet>,
}

impl Default for ReservedRanges {
    fn default() -> Self {
        Self::default_ranges().clone()
    }
}

impl ReservedRanges {
    /// The built-in table, parsed once and shared by every caller.
    pub fn default_ranges() -> &'static ReservedRanges {
        &DEFAULT_RANGES
    }

    /// Build a table from CIDR strings such as `"10.0.0.0/8"` or `"fc00::/7"`.
    pub fn from_cidrs<I, S>(cidrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nets = cidrs
            .into_iter()
            .map(|cidr| {
                let cidr = cidr.as_ref();
                cidr.trim()
                    .parse::<IpNet>()
                    .map_err(|source| RealIpError::InvalidCidr {
                        cidr: cidr.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { nets })
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNet> {
        self.nets.iter()
    }

    /// Whether `ip` falls inside any of the ranges.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are tested as their IPv4 form.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.nets.iter().any(|net| net.contains(&ip))
    }

    /// Parse and classify a textual address (no port).
    pub fn classify(&self, addr: &str) -> Classification {
        match addr.parse::<IpAddr>() {
            Ok(ip) if self.contains(ip) => Classification::Local,
            Ok(_) => Classification::Public,
            Err(_) => {
                tracing::debug!("Treating unparsable address {:?} as non-local", addr);
                Classification::Unparsable
            }
        }
    }

    /// True only for addresses that parse and fall inside a range.
    pub fn is_local_address(&self, addr: &str) -> bool {
        self.classify(addr) == Classification::Local
    }
}

/// Check `addr` against the built-in reserved ranges.
///
/// Unparsable input is never local.
///
/// ```rust
/// use realip::is_local_address;
///
/// assert!(is_local_address("192.168.0.1"));
/// assert!(!is_local_address("147.12.56.11"));
/// assert!(!is_local_address("not an ip"));
/// ```
pub fn is_local_address(addr: &str) -> bool {
    ReservedRanges::default_ranges().is_local_address(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_addresses_are_local() {
        for addr in [
            "127.0.0.0",
            "10.0.0.0",
            "169.254.0.0",
            "192.168.0.0",
            "::1",
            "fc00::",
        ] {
            assert!(is_local_address(addr), "{addr} should be local address");
        }
    }

    #[test]
    fn test_slash_12_boundaries() {
        assert!(!is_local_address("172.15.0.0"));
        assert!(is_local_address("172.16.0.0"));
        assert!(is_local_address("172.31.0.0"));
        assert!(is_local_address("172.31.255.255"));
        assert!(!is_local_address("172.32.0.0"));
    }

    #[test]
    fn test_public_address() {
        assert!(!is_local_address("147.12.56.11"));
        assert!(!is_local_address("2001:4860:4860::8888"));
        assert_eq!(
            ReservedRanges::default_ranges().classify("147.12.56.11"),
            Classification::Public
        );
    }

    #[test]
    fn test_unique_local_block_covers_fd() {
        assert!(is_local_address("fdff:ffff::1"));
        assert!(!is_local_address("fe00::1"));
    }

    #[test]
    fn test_ipv4_mapped_ipv6() {
        assert!(is_local_address("::ffff:10.0.0.1"));
        assert!(!is_local_address("::ffff:203.0.113.1"));
    }

    #[test]
    fn test_unparsable_is_not_local() {
        let ranges = ReservedRanges::default_ranges();
        for addr in ["", "localhost", "127.0.0.1:80", "[::1]", "10.0.0.256", " 10.0.0.1"] {
            assert_eq!(ranges.classify(addr), Classification::Unparsable, "{addr:?}");
            assert!(!is_local_address(addr));
        }
    }

    #[test]
    fn test_classification_is_stable() {
        for _ in 0..3 {
            assert!(is_local_address("192.168.1.1"));
            assert!(!is_local_address("198.51.100.7"));
        }
    }

    #[test]
    fn test_default_table() {
        let ranges = ReservedRanges::default();
        assert_eq!(ranges.len(), 7);
        assert_eq!(&ranges, ReservedRanges::default_ranges());
    }

    #[test]
    fn test_custom_ranges() {
        let ranges = ReservedRanges::from_cidrs(["100.64.0.0/10", " 198.51.100.0/24 "]).unwrap();
        assert_eq!(ranges.len(), 2);
        assert!(ranges.is_local_address("100.64.1.1"));
        assert!(ranges.is_local_address("198.51.100.7"));
        assert!(!ranges.is_local_address("10.0.0.1"));
    }

    #[test]
    fn test_invalid_cidr() {
        let err = ReservedRanges::from_cidrs(["10.0.0.0/8", "10.0.0.0/33"]).unwrap_err();
        match err {
            RealIpError::InvalidCidr { cidr, .. } => assert_eq!(cidr, "10.0.0.0/33"),
        }
    }

    #[test]
    fn test_empty_table_matches_nothing() {
        let ranges = ReservedRanges::from_cidrs(Vec::<String>::new()).unwrap();
        assert!(ranges.is_empty());
        assert!(!ranges.is_local_address("127.0.0.1"));
    }
}
