//! Fundamental types for the Acre DAO.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: member addresses, timestamps, key material, governance
//! settings, state enums, and the error-category taxonomy.

pub mod address;
pub mod error;
pub mod keys;
pub mod settings;
pub mod state;
pub mod time;

pub use address::MemberAddress;
pub use error::ErrorKind;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use settings::{
    GovSettings, SettingsError, MAX_VOTE_PERIOD_SECS, MIN_SUPERMAJORITY_PCT,
    MIN_VOTE_PERIOD_SECS, PROPOSAL_KIND_COUNT,
};
pub use state::{LifecycleState, ProposalStatus, VoteKind};
pub use time::Timestamp;
