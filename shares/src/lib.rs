//! Voting-power ledger for the Acre DAO.
//!
//! Shares are the transferable membership balance: they carry voting weight
//! and can be delegated. Every balance change writes a historical
//! checkpoint for the affected delegate, so voting power can be queried
//! both "now" and as of any past instant.

pub mod checkpoint;
pub mod error;
pub mod ledger;

pub use checkpoint::{Checkpoint, VoteCheckpoints};
pub use error::SharesError;
pub use ledger::{ShareAccount, SharesLedger};
