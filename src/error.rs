/* src/error.rs */

use thiserror::Error;

/// Result type alias for operations that may fail with `RealIpError`.
pub type Result<T> = std::result::Result<T, RealIpError>;

/// Errors raised while building a reserved range table.
///
/// Address resolution itself never fails; see [`crate::Resolver`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RealIpError {
    /// A CIDR block could not be parsed.
    #[error("Invalid CIDR block {cidr:?}: {source}")]
    InvalidCidr {
        cidr: String,
        #[source]
        source: ipnet::AddrParseError,
    },
}
