//! Claim ledger for the Acre DAO.
//!
//! Loot is the non-voting economic balance: a redeemable claim on the
//! treasury's funding asset. This crate also defines the `FundingAsset`
//! trait — the trusted external fungible-balance primitive the treasury is
//! denominated in — and the permit pre-authorization it consumes.

pub mod error;
pub mod ledger;
pub mod treasury;

pub use error::LootError;
pub use ledger::LootLedger;
pub use treasury::{FundingAsset, PermitAuth, TreasuryError};
