/* src/resolver.rs */

use std::borrow::Cow;
use std::collections::HashMap;

use crate::classifier::ReservedRanges;

/// Type alias for header maps. Keys are matched case-insensitively.
pub type HeaderMap = HashMap<String, String>;

pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The request headers that take part in resolution.
///
/// Values borrow from the request where possible; header bytes that are not
/// valid UTF-8 are replaced with U+FFFD so the header still counts as present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet<'a> {
    /// `X-Real-Ip`, a single address set by a trusted proxy.
    pub real_ip: Option<Cow<'a, str>>,
    /// `X-Forwarded-For`, comma-separated, original client first.
    pub forwarded_for: Option<Cow<'a, str>>,
}

impl<'a> HeaderSet<'a> {
    pub fn new(real_ip: Option<&'a str>, forwarded_for: Option<&'a str>) -> Self {
        Self {
            real_ip: real_ip.map(Cow::Borrowed),
            forwarded_for: forwarded_for.map(Cow::Borrowed),
        }
    }

    /// Pick the relevant headers out of a plain string map.
    ///
    /// An exact lowercase key wins. Otherwise the first case-insensitive
    /// match in key order is used, so duplicates differing only in case
    /// resolve the same way on every call.
    pub fn from_map(headers: &'a HeaderMap) -> Self {
        let lookup = |name: &str| {
            headers
                .get(name)
                .or_else(|| {
                    headers
                        .iter()
                        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
                        .min_by(|(a, _), (b, _)| a.cmp(b))
                        .map(|(_, value)| value)
                })
                .map(|value| value.as_str())
        };

        Self::new(lookup(X_REAL_IP), lookup(X_FORWARDED_FOR))
    }

    /// Pick the relevant headers out of an `http` header map.
    ///
    /// Only the first value of a repeated header is used.
    #[cfg(feature = "axum")]
    pub fn from_http(headers: &'a axum::http::HeaderMap) -> Self {
        let lookup = |name: &str| {
            headers
                .get(name)
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
        };

        Self {
            real_ip: lookup(X_REAL_IP),
            forwarded_for: lookup(X_FORWARDED_FOR),
        }
    }

    fn real_ip(&self) -> &str {
        self.real_ip.as_deref().unwrap_or_default()
    }

    fn forwarded_for(&self) -> &str {
        self.forwarded_for.as_deref().unwrap_or_default()
    }
}

/// Which input the resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The connection's peer address; no forwarding headers were present.
    Peer,
    /// The first non-local entry of `X-Forwarded-For`.
    ForwardedFor,
    /// `X-Real-Ip`, possibly empty.
    RealIpHeader,
}

/// A resolved client address together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub address: String,
    pub source: Source,
}

/// Drop a trailing `:port` by truncating at the last colon.
///
/// This does not understand IPv6: `"[::1]:80"` becomes `"[::1]"`, but a bare
/// `"12:34::0"` becomes `"12:34:"`.
pub fn strip_port(addr: &str) -> &str {
    match addr.rfind(':') {
        Some(idx) => &addr[..idx],
        None => addr,
    }
}

/// Picks the public client address for a request.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    ranges: ReservedRanges,
}

impl Resolver {
    /// Create a resolver using the built-in reserved ranges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ranges that are skipped in `X-Forwarded-For`.
    pub fn with_ranges(mut self, ranges: ReservedRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn ranges(&self) -> &ReservedRanges {
        &self.ranges
    }

    /// Resolve the client address and report which input supplied it.
    pub fn resolve(&self, peer_addr: &str, headers: &HeaderSet<'_>) -> Resolution {
        let real_ip = headers.real_ip();
        let forwarded_for = headers.forwarded_for();

        if real_ip.is_empty() && forwarded_for.is_empty() {
            return Resolution {
                address: strip_port(peer_addr).to_string(),
                source: Source::Peer,
            };
        }

        if !forwarded_for.is_empty()
            && let Some(addr) = self.first_public(forwarded_for)
        {
            return Resolution {
                address: addr.to_string(),
                source: Source::ForwardedFor,
            };
        }

        Resolution {
            address: real_ip.to_string(),
            source: Source::RealIpHeader,
        }
    }

    /// Resolve the client address. The result is empty only when
    /// `X-Forwarded-For` holds nothing but local addresses and `X-Real-Ip`
    /// is missing.
    pub fn real_ip(&self, peer_addr: &str, headers: &HeaderSet<'_>) -> String {
        self.resolve(peer_addr, headers).address
    }

    /// Leftmost entry of the chain that is not inside a reserved range.
    fn first_public<'h>(&self, forwarded_for: &'h str) -> Option<&'h str> {
        forwarded_for
            .split(',')
            .map(str::trim)
            .find(|candidate| !self.ranges.is_local_address(candidate))
    }
}

/// Resolve the client address with the built-in reserved ranges.
///
/// # Examples
///
/// ```rust
/// use realip::{HeaderSet, real_ip};
///
/// let headers = HeaderSet::new(None, Some("10.0.0.1, 203.0.113.9, 198.51.100.2"));
/// assert_eq!(real_ip("192.168.0.2:41000", &headers), "203.0.113.9");
///
/// assert_eq!(real_ip("203.0.113.5:4000", &HeaderSet::default()), "203.0.113.5");
/// ```
pub fn real_ip(peer_addr: &str, headers: &HeaderSet<'_>) -> String {
    Resolver::new().real_ip(peer_addr, headers)
}
