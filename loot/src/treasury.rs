//! The external funding-asset primitive.
//!
//! The treasury is denominated in a fungible asset that lives outside the
//! governance core. The core only assumes the capability described by
//! `FundingAsset`: balance queries, transfers, and a permit-based pull that
//! consumes an off-chain signed pre-authorization. Implementations are
//! external collaborators; `acre-nullables` provides the deterministic
//! in-memory one used in tests.

use acre_types::{ErrorKind, MemberAddress, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("permit deadline {deadline} has passed (now {now})")]
    PermitExpired { deadline: Timestamp, now: Timestamp },

    #[error("permit nonce mismatch: expected {expected}, got {got}")]
    PermitNonceMismatch { expected: u64, got: u64 },

    #[error("permit signature rejected")]
    PermitRejected,

    #[error("permit value {value} does not cover {needed}")]
    PermitValueTooSmall { value: u128, needed: u128 },

    #[error("funding asset rejected the operation: {0}")]
    Rejected(String),
}

impl TreasuryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientBalance,
            Self::PermitExpired { .. }
            | Self::PermitNonceMismatch { .. }
            | Self::PermitRejected
            | Self::PermitValueTooSmall { .. } => ErrorKind::Signature,
            Self::Rejected(_) => ErrorKind::State,
        }
    }
}

/// An off-chain signed pre-authorization over
/// `(owner, spender, value, nonce, deadline)`, allowing `spender` to pull
/// up to `value` of the owner's funding asset without a prior approval
/// call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PermitAuth {
    pub owner: MemberAddress,
    pub spender: MemberAddress,
    pub value: u128,
    pub nonce: u64,
    pub deadline: Timestamp,
    pub signature: Signature,
}

/// The trusted external fungible-balance capability.
pub trait FundingAsset {
    /// Balance held by an address (the DAO's own address is the treasury).
    fn balance_of(&self, holder: &MemberAddress) -> u128;

    /// Move funds between addresses.
    fn transfer(
        &mut self,
        from: &MemberAddress,
        to: &MemberAddress,
        amount: u128,
    ) -> Result<(), TreasuryError>;

    /// Pull `amount` from `auth.owner` to `to`, consuming the permit.
    /// Implementations verify the signature, deadline, and nonce, and must
    /// reject replays.
    fn pull_with_permit(
        &mut self,
        auth: &PermitAuth,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), TreasuryError>;
}
