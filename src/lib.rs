/* src/lib.rs */
//! # Real IP
//!
//! Determine the public client address of an HTTP request that may have
//! passed through proxies and load balancers.
//!
//! ## Resolution order
//!
//! - With neither `X-Real-Ip` nor `X-Forwarded-For` present, the peer address
//!   is returned with its trailing `:port` removed.
//! - Otherwise the leftmost `X-Forwarded-For` entry outside the reserved
//!   ranges (loopback, private, link-local, unique-local) is returned.
//! - Failing that, `X-Real-Ip` is returned as is, even when empty.
//!
//! An optional Axum layer and extractor are available via the `axum` feature.
//!
//! ## Examples
//!
//! ```rust
//! use realip::{HeaderMap, HeaderSet, real_ip};
//! use std::collections::HashMap;
//!
//! let mut headers: HeaderMap = HashMap::new();
//! headers.insert("X-Forwarded-For".to_string(), "192.168.1.4, 203.0.113.9".to_string());
//!
//! let ip = real_ip("10.0.0.2:51432", &HeaderSet::from_map(&headers));
//! assert_eq!(ip, "203.0.113.9");
//! ```

pub mod classifier;
pub mod error;
pub mod resolver;

#[cfg(feature = "axum")]
pub mod middleware;

pub use classifier::{Classification, ReservedRanges, is_local_address};
pub use error::{RealIpError, Result};
pub use resolver::{HeaderMap, HeaderSet, Resolution, Resolver, Source, real_ip, strip_port};

#[cfg(feature = "axum")]
pub use middleware::{RealIp, RealIpLayer, RealIpService};
