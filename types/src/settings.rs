//! Governance settings — the vote-resolution parameters of the DAO.
//!
//! Every scalar here is governable after init through the corresponding
//! proposal kinds (voting periods, quorum, supermajority, vote kinds).

use crate::state::VoteKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the closed proposal taxonomy.
pub const PROPOSAL_KIND_COUNT: usize = 13;

/// Shortest allowed voting window: 12 hours.
pub const MIN_VOTE_PERIOD_SECS: u64 = 43_200;

/// Longest allowed voting window (and grace period): 30 days.
pub const MAX_VOTE_PERIOD_SECS: u64 = 2_592_000;

/// Lowest allowed supermajority threshold, in percent.
pub const MIN_SUPERMAJORITY_PCT: u8 = 52;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("quorum {0}% exceeds 100%")]
    QuorumOutOfRange(u8),

    #[error("supermajority {0}% outside [52, 100]")]
    SupermajorityOutOfRange(u8),

    #[error("voting period {secs}s for kind {kind} outside [{MIN_VOTE_PERIOD_SECS}, {MAX_VOTE_PERIOD_SECS}]")]
    VotePeriodOutOfRange { kind: usize, secs: u64 },

    #[error("grace period {0}s exceeds {MAX_VOTE_PERIOD_SECS}s")]
    GracePeriodOutOfRange(u64),
}

/// Validated vote-resolution parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovSettings {
    /// Minimum participation, percent of total voting supply.
    pub quorum_pct: u8,
    /// Minimum yes-share of cast votes for supermajority-designated kinds.
    pub supermajority_pct: u8,
    /// Per-proposal-kind vote resolution.
    pub vote_kinds: [VoteKind; PROPOSAL_KIND_COUNT],
    /// Per-proposal-kind voting window in seconds.
    pub vote_periods_secs: [u64; PROPOSAL_KIND_COUNT],
    /// Delay after voting closes before a decided proposal may process.
    pub grace_period_secs: u64,
}

impl GovSettings {
    /// Build a validated settings struct. Grace defaults to zero; use
    /// `with_grace_period` or the `VotePeriod` grace slot to change it.
    pub fn new(
        quorum_pct: u8,
        supermajority_pct: u8,
        vote_kinds: [VoteKind; PROPOSAL_KIND_COUNT],
        vote_periods_secs: [u64; PROPOSAL_KIND_COUNT],
    ) -> Result<Self, SettingsError> {
        Self::check_quorum(quorum_pct)?;
        Self::check_supermajority(supermajority_pct)?;
        for (kind, &secs) in vote_periods_secs.iter().enumerate() {
            if !(MIN_VOTE_PERIOD_SECS..=MAX_VOTE_PERIOD_SECS).contains(&secs) {
                return Err(SettingsError::VotePeriodOutOfRange { kind, secs });
            }
        }
        Ok(Self {
            quorum_pct,
            supermajority_pct,
            vote_kinds,
            vote_periods_secs,
            grace_period_secs: 0,
        })
    }

    /// Same settings with a validated grace period.
    pub fn with_grace_period(mut self, secs: u64) -> Result<Self, SettingsError> {
        Self::check_grace(secs)?;
        self.grace_period_secs = secs;
        Ok(self)
    }

    pub fn check_quorum(pct: u8) -> Result<(), SettingsError> {
        if pct > 100 {
            return Err(SettingsError::QuorumOutOfRange(pct));
        }
        Ok(())
    }

    pub fn check_supermajority(pct: u8) -> Result<(), SettingsError> {
        if !(MIN_SUPERMAJORITY_PCT..=100).contains(&pct) {
            return Err(SettingsError::SupermajorityOutOfRange(pct));
        }
        Ok(())
    }

    pub fn check_vote_period(kind: usize, secs: u64) -> Result<(), SettingsError> {
        if !(MIN_VOTE_PERIOD_SECS..=MAX_VOTE_PERIOD_SECS).contains(&secs) {
            return Err(SettingsError::VotePeriodOutOfRange { kind, secs });
        }
        Ok(())
    }

    pub fn check_grace(secs: u64) -> Result<(), SettingsError> {
        if secs > MAX_VOTE_PERIOD_SECS {
            return Err(SettingsError::GracePeriodOutOfRange(secs));
        }
        Ok(())
    }
}

/// Defaults mirror the reference deployment: no quorum, 60% supermajority,
/// simple-majority-with-quorum resolution, 12-hour windows, no grace.
impl Default for GovSettings {
    fn default() -> Self {
        Self {
            quorum_pct: 0,
            supermajority_pct: 60,
            vote_kinds: [VoteKind::SimpleMajorityQuorum; PROPOSAL_KIND_COUNT],
            vote_periods_secs: [MIN_VOTE_PERIOD_SECS; PROPOSAL_KIND_COUNT],
            grace_period_secs: 0,
        }
    }
}
