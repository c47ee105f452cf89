use crate::proposal::ProposalKind;
use acre_loot::{LootError, TreasuryError};
use acre_shares::SharesError;
use acre_types::{ErrorKind, LifecycleState, MemberAddress, SettingsError, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    // ── Validation ───────────────────────────────────────────────────────
    #[error("proposal arrays must have equal lengths ({targets}/{values}/{payloads})")]
    ArrayLengthMismatch {
        targets: usize,
        values: usize,
        payloads: usize,
    },

    #[error("unknown proposal kind {0}")]
    UnknownKind(u8),

    #[error("unknown vote kind {0}")]
    UnknownVoteKind(u8),

    #[error("{kind:?} proposal is malformed: {reason}")]
    MalformedProposal {
        kind: ProposalKind,
        reason: &'static str,
    },

    #[error("init requires one setup payload per extension: {extensions} extensions, {payloads} payloads")]
    ExtensionSetupMismatch { extensions: usize, payloads: usize },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("snapshot bytes are corrupt")]
    SnapshotCorrupt,

    // ── Authorization ────────────────────────────────────────────────────
    #[error("{0} is not a member")]
    NotMember(MemberAddress),

    #[error("only the original proposer may cancel")]
    NotProposer,

    #[error("only the manager may perform this operation")]
    NotManager,

    #[error("extension {0} is not whitelisted")]
    NotWhitelisted(MemberAddress),

    #[error("callback requires a whitelisted module")]
    UnprivilegedCallback,

    // ── State ────────────────────────────────────────────────────────────
    #[error("proposal {0} does not exist")]
    UnknownProposal(u64),

    #[error("proposal {0} is already sponsored")]
    AlreadySponsored(u64),

    #[error("proposal {0} has not been sponsored")]
    NotSponsored(u64),

    #[error("proposal {0} has reached a terminal status")]
    ProposalTerminal(u64),

    #[error("member has already voted on proposal {0}")]
    AlreadyVoted(u64),

    #[error("voting window for proposal {0} is closed")]
    VotingClosed(u64),

    #[error("voting window for proposal {id} is open until {end}")]
    VotingStillOpen { id: u64, end: Timestamp },

    #[error("grace period for proposal {id} runs until {until}")]
    GraceNotElapsed { id: u64, until: Timestamp },

    #[error("proposal {blocked} cannot process before proposal {blocking}")]
    OutOfOrder { blocked: u64, blocking: u64 },

    #[error("reentrant gateway call rejected")]
    Reentrancy,

    #[error("no module registered at {0}")]
    ModuleNotRegistered(MemberAddress),

    #[error("lifecycle cannot move from {from:?} to {to:?}")]
    LifecycleBackward {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("dividends are not accepted while {0:?}")]
    DividendsClosed(LifecycleState),

    #[error("extension module failed: {0}")]
    ModuleFailed(String),

    // ── Signature ────────────────────────────────────────────────────────
    #[error("invalid signature")]
    InvalidSignature,

    #[error("signed message expired at {expiry} (now {now})")]
    SignatureExpired { expiry: Timestamp, now: Timestamp },

    #[error("signature nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("signer address does not embed a decodable public key")]
    UnresolvableSigner,

    // ── Wrapped ledger/treasury failures ─────────────────────────────────
    #[error(transparent)]
    Shares(#[from] SharesError),

    #[error(transparent)]
    Loot(#[from] LootError),

    #[error(transparent)]
    Treasury(#[from] TreasuryError),
}

impl GovernanceError {
    /// Collapse this error into the five-category taxonomy.
    pub fn category(&self) -> ErrorKind {
        match self {
            Self::ArrayLengthMismatch { .. }
            | Self::UnknownKind(_)
            | Self::UnknownVoteKind(_)
            | Self::MalformedProposal { .. }
            | Self::ExtensionSetupMismatch { .. }
            | Self::Settings(_)
            | Self::SnapshotCorrupt => ErrorKind::Validation,

            Self::NotMember(_)
            | Self::NotProposer
            | Self::NotManager
            | Self::NotWhitelisted(_)
            | Self::UnprivilegedCallback => ErrorKind::Authorization,

            Self::UnknownProposal(_)
            | Self::AlreadySponsored(_)
            | Self::NotSponsored(_)
            | Self::ProposalTerminal(_)
            | Self::AlreadyVoted(_)
            | Self::VotingClosed(_)
            | Self::VotingStillOpen { .. }
            | Self::GraceNotElapsed { .. }
            | Self::OutOfOrder { .. }
            | Self::Reentrancy
            | Self::ModuleNotRegistered(_)
            | Self::LifecycleBackward { .. }
            | Self::DividendsClosed(_)
            | Self::ModuleFailed(_) => ErrorKind::State,

            Self::InvalidSignature
            | Self::SignatureExpired { .. }
            | Self::NonceMismatch { .. }
            | Self::UnresolvableSigner => ErrorKind::Signature,

            Self::Shares(e) => e.kind(),
            Self::Loot(e) => e.kind(),
            Self::Treasury(e) => e.kind(),
        }
    }
}
