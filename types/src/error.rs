//! Error category taxonomy shared across crates.

use std::fmt;

/// The five failure categories every Acre error maps onto.
///
/// Each crate keeps its own granular `thiserror` enum; `kind()` on those
/// enums collapses a variant into one of these categories so callers (and
/// tests) can assert on the class of failure without matching every
/// variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed arguments: array-length mismatch, out-of-range settings,
    /// future-timestamp voting-power query.
    Validation,
    /// Caller lacks the required role: non-member, non-proposer,
    /// non-manager, non-whitelisted extension.
    Authorization,
    /// Operation is illegal in the current state: double voting, voting
    /// outside the window, out-of-order processing, reentrant gateway call.
    State,
    /// Invalid, expired, or mismatched structured-message signature.
    Signature,
    /// Withdraw/transfer/burn/allowance exceeds the available balance.
    InsufficientBalance,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::State => "state",
            Self::Signature => "signature",
            Self::InsufficientBalance => "insufficient balance",
        };
        write!(f, "{name}")
    }
}
