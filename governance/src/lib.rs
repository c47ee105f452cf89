//! Governance engine for the Acre DAO.
//!
//! Proposal lifecycle: propose → sponsor → vote → process. Processing
//! evaluates quorum and supermajority against the voting-power ledger and
//! dispatches one of thirteen typed effects; external modules are reached
//! only through the guarded extension gateway.

pub mod engine;
pub mod error;
pub mod gateway;
pub mod proposal;
pub mod store;

pub use engine::{Dao, InitParams, ProcessOutcome, FOUNDER_SHARES};
pub use error::GovernanceError;
pub use gateway::{Extension, ExtensionGateway, ExtensionHost};
pub use proposal::{
    ExtensionToggle, ExternalCall, PeriodSlot, Proposal, ProposalAction, ProposalKind, SaleIntent,
    GRACE_PERIOD_SLOT,
};
pub use store::ProposalStore;
