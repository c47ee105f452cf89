//! Proposals: the closed 13-kind taxonomy, typed actions, and records.

use crate::error::GovernanceError;
use acre_types::{
    GovSettings, MemberAddress, ProposalStatus, Timestamp, VoteKind, PROPOSAL_KIND_COUNT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The closed proposal taxonomy. Wire indices are fixed and exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalKind {
    /// Invoke registered external modules.
    Call,
    /// Set a per-kind voting period (or the grace period, slot 13).
    VotePeriod,
    /// Set the quorum percentage.
    Quorum,
    /// Set the supermajority percentage.
    Supermajority,
    /// Set the vote kind for a proposal kind.
    VoteType,
    /// Toggle extension whitelisting.
    Extension,
    /// Replace the org docs with the proposal description.
    Docs,
    /// Flag intent to sell the held asset; no fund movement.
    Sell,
    /// Release escrowed purchase funds from the treasury to the manager.
    Purchase,
    /// Appoint a new manager.
    Manager,
    /// Direct a whitelisted capital-call extension.
    CapitalCall,
    /// Direct a whitelisted token-sale extension.
    TokenSale,
    /// Remove a stuck sponsored proposal from the processing order.
    Escape,
}

impl ProposalKind {
    pub const COUNT: usize = PROPOSAL_KIND_COUNT;

    pub fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Call),
            1 => Some(Self::VotePeriod),
            2 => Some(Self::Quorum),
            3 => Some(Self::Supermajority),
            4 => Some(Self::VoteType),
            5 => Some(Self::Extension),
            6 => Some(Self::Docs),
            7 => Some(Self::Sell),
            8 => Some(Self::Purchase),
            9 => Some(Self::Manager),
            10 => Some(Self::CapitalCall),
            11 => Some(Self::TokenSale),
            12 => Some(Self::Escape),
            _ => None,
        }
    }

    pub fn wire(&self) -> u8 {
        match self {
            Self::Call => 0,
            Self::VotePeriod => 1,
            Self::Quorum => 2,
            Self::Supermajority => 3,
            Self::VoteType => 4,
            Self::Extension => 5,
            Self::Docs => 6,
            Self::Sell => 7,
            Self::Purchase => 8,
            Self::Manager => 9,
            Self::CapitalCall => 10,
            Self::TokenSale => 11,
            Self::Escape => 12,
        }
    }
}

/// One external invocation carried by a `Call` proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCall {
    pub target: MemberAddress,
    pub amount: u128,
    pub payload: Vec<u8>,
}

/// One whitelist toggle carried by an `Extension` proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionToggle {
    pub target: MemberAddress,
    pub enable: bool,
    /// Forwarded as a one-time setup call when enabling (empty = none).
    pub setup: Vec<u8>,
}

/// Target of a `VotePeriod` proposal: a per-kind voting window, or the
/// grace period (wire slot 13).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodSlot {
    Kind(ProposalKind),
    Grace,
}

/// Wire slot that addresses the grace period in a `VotePeriod` proposal.
pub const GRACE_PERIOD_SLOT: u128 = PROPOSAL_KIND_COUNT as u128;

/// The typed effect of a proposal — one variant per kind, built by
/// validating the generic `(targets, values, payloads)` wire arrays and
/// dispatched with an exhaustive match at processing time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalAction {
    Call { calls: Vec<ExternalCall> },
    VotePeriod { slot: PeriodSlot, secs: u64 },
    Quorum { pct: u8 },
    Supermajority { pct: u8 },
    VoteType { target: ProposalKind, vote_kind: VoteKind },
    Extension { toggles: Vec<ExtensionToggle> },
    Docs,
    Sell { price: u128 },
    Purchase { amount: u128 },
    Manager { new_manager: MemberAddress },
    CapitalCall { extension: MemberAddress, amount: u128, payload: Vec<u8> },
    TokenSale { extension: MemberAddress, amount: u128, payload: Vec<u8> },
    Escape { proposal_id: u64 },
}

fn malformed(kind: ProposalKind, reason: &'static str) -> GovernanceError {
    GovernanceError::MalformedProposal { kind, reason }
}

impl ProposalAction {
    /// Build the typed action from the wire arrays, enforcing the
    /// equal-length invariant and each kind's shape.
    pub fn from_parts(
        kind: ProposalKind,
        targets: &[MemberAddress],
        values: &[u128],
        payloads: &[Vec<u8>],
    ) -> Result<Self, GovernanceError> {
        if targets.len() != values.len() || values.len() != payloads.len() {
            return Err(GovernanceError::ArrayLengthMismatch {
                targets: targets.len(),
                values: values.len(),
                payloads: payloads.len(),
            });
        }
        let rows = targets.len();
        match kind {
            ProposalKind::Call => {
                if rows == 0 {
                    return Err(malformed(kind, "at least one call required"));
                }
                let calls = targets
                    .iter()
                    .zip(values)
                    .zip(payloads)
                    .map(|((target, amount), payload)| ExternalCall {
                        target: target.clone(),
                        amount: *amount,
                        payload: payload.clone(),
                    })
                    .collect();
                Ok(Self::Call { calls })
            }
            ProposalKind::VotePeriod => {
                if rows != 2 {
                    return Err(malformed(kind, "expected [slot, seconds]"));
                }
                let secs =
                    u64::try_from(values[1]).map_err(|_| malformed(kind, "period too large"))?;
                let slot = if values[0] == GRACE_PERIOD_SLOT {
                    GovSettings::check_grace(secs)?;
                    PeriodSlot::Grace
                } else {
                    let idx = u8::try_from(values[0])
                        .ok()
                        .and_then(ProposalKind::from_wire)
                        .ok_or_else(|| malformed(kind, "slot out of range"))?;
                    GovSettings::check_vote_period(idx.wire() as usize, secs)?;
                    PeriodSlot::Kind(idx)
                };
                Ok(Self::VotePeriod { slot, secs })
            }
            ProposalKind::Quorum => {
                if rows != 1 {
                    return Err(malformed(kind, "expected [percent]"));
                }
                let pct =
                    u8::try_from(values[0]).map_err(|_| malformed(kind, "percent too large"))?;
                GovSettings::check_quorum(pct)?;
                Ok(Self::Quorum { pct })
            }
            ProposalKind::Supermajority => {
                if rows != 1 {
                    return Err(malformed(kind, "expected [percent]"));
                }
                let pct =
                    u8::try_from(values[0]).map_err(|_| malformed(kind, "percent too large"))?;
                GovSettings::check_supermajority(pct)?;
                Ok(Self::Supermajority { pct })
            }
            ProposalKind::VoteType => {
                if rows != 2 {
                    return Err(malformed(kind, "expected [kind index, vote kind]"));
                }
                let target = u8::try_from(values[0])
                    .ok()
                    .and_then(ProposalKind::from_wire)
                    .ok_or_else(|| malformed(kind, "kind index out of range"))?;
                let vote_kind = u8::try_from(values[1])
                    .ok()
                    .and_then(VoteKind::from_wire)
                    .ok_or_else(|| malformed(kind, "vote kind out of range"))?;
                Ok(Self::VoteType { target, vote_kind })
            }
            ProposalKind::Extension => {
                if rows == 0 {
                    return Err(malformed(kind, "at least one toggle required"));
                }
                let toggles = targets
                    .iter()
                    .zip(values)
                    .zip(payloads)
                    .map(|((target, enable), setup)| ExtensionToggle {
                        target: target.clone(),
                        enable: *enable != 0,
                        setup: setup.clone(),
                    })
                    .collect();
                Ok(Self::Extension { toggles })
            }
            ProposalKind::Docs => {
                if rows != 0 {
                    return Err(malformed(kind, "takes no targets"));
                }
                Ok(Self::Docs)
            }
            ProposalKind::Sell => {
                if rows != 1 {
                    return Err(malformed(kind, "expected [asking price]"));
                }
                Ok(Self::Sell { price: values[0] })
            }
            ProposalKind::Purchase => {
                if rows != 1 {
                    return Err(malformed(kind, "expected [amount]"));
                }
                if values[0] == 0 {
                    return Err(malformed(kind, "amount must be non-zero"));
                }
                Ok(Self::Purchase { amount: values[0] })
            }
            ProposalKind::Manager => {
                if rows != 1 {
                    return Err(malformed(kind, "expected one target"));
                }
                if !targets[0].is_well_formed() {
                    return Err(malformed(kind, "manager address malformed"));
                }
                Ok(Self::Manager {
                    new_manager: targets[0].clone(),
                })
            }
            ProposalKind::CapitalCall | ProposalKind::TokenSale => {
                if rows != 1 {
                    return Err(malformed(kind, "expected one extension row"));
                }
                let extension = targets[0].clone();
                let amount = values[0];
                let payload = payloads[0].clone();
                Ok(match kind {
                    ProposalKind::CapitalCall => Self::CapitalCall { extension, amount, payload },
                    _ => Self::TokenSale { extension, amount, payload },
                })
            }
            ProposalKind::Escape => {
                if rows != 1 {
                    return Err(malformed(kind, "expected [proposal id]"));
                }
                let proposal_id = u64::try_from(values[0])
                    .map_err(|_| malformed(kind, "proposal id too large"))?;
                if proposal_id == 0 {
                    return Err(malformed(kind, "proposal ids start at 1"));
                }
                Ok(Self::Escape { proposal_id })
            }
        }
    }
}

/// A recorded sell intent (the `Sell` effect: flagged, no funds moved).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleIntent {
    pub price: u128,
    pub listed_at: Timestamp,
}

/// A proposal record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential id, starting at 1.
    pub id: u64,
    pub kind: ProposalKind,
    pub action: ProposalAction,
    pub description: String,
    pub proposer: MemberAddress,
    pub status: ProposalStatus,
    /// Set at sponsorship; the voting clock start.
    pub voting_start: Option<Timestamp>,
    pub voting_end: Option<Timestamp>,
    /// Grace duration snapshotted at sponsorship so later setting changes
    /// never apply retroactively.
    pub grace_period_secs: u64,
    pub yes_weight: u128,
    pub no_weight: u128,
    pub voters: BTreeSet<MemberAddress>,
}

impl Proposal {
    /// Whether votes are currently accepted. The window is half-open:
    /// a vote at exactly `voting_end` is rejected.
    pub fn voting_open(&self, now: Timestamp) -> bool {
        match (self.voting_start, self.voting_end) {
            (Some(start), Some(end)) => now >= start && now < end,
            _ => false,
        }
    }
}
