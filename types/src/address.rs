//! Member address type with `acre_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An Acre member address, always prefixed with `acre_`.
///
/// Derived from the member's public key via Blake2b hashing + base32
/// encoding; the encoded public key is recoverable from the address itself
/// (see `acre_crypto::decode_address`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberAddress(String);

impl MemberAddress {
    /// The standard prefix for all Acre member addresses.
    pub const PREFIX: &'static str = "acre_";

    /// Create a member address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `acre_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with acre_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this address is superficially well-formed (prefix + payload).
    /// Checksum validation lives in `acre_crypto::validate_address`.
    pub fn is_well_formed(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemberAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_string() {
        let a = MemberAddress::new("acre_someencodedkey");
        assert!(a.is_well_formed());
        assert_eq!(a.as_str(), "acre_someencodedkey");
    }

    #[test]
    #[should_panic]
    fn rejects_wrong_prefix() {
        MemberAddress::new("dao_someencodedkey");
    }

    #[test]
    fn bare_prefix_is_not_well_formed() {
        let a = MemberAddress::new("acre_");
        assert!(!a.is_well_formed());
    }
}
