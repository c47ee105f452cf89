//! State enums for proposals, vote resolution, and the DAO lifecycle.

use serde::{Deserialize, Serialize};

/// How a proposal kind's vote is resolved.
///
/// Wire values 0..=3 match the original interface. Resolution always
/// requires `yes > no` and turnout >= quorum; kinds 2 and 3 additionally
/// require the supermajority ratio on cast votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteKind {
    SimpleMajority,
    SimpleMajorityQuorum,
    Supermajority,
    SupermajorityQuorum,
}

impl VoteKind {
    /// Decode a wire value. Returns `None` for values >= 4.
    pub fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::SimpleMajority),
            1 => Some(Self::SimpleMajorityQuorum),
            2 => Some(Self::Supermajority),
            3 => Some(Self::SupermajorityQuorum),
            _ => None,
        }
    }

    pub fn wire(&self) -> u8 {
        match self {
            Self::SimpleMajority => 0,
            Self::SimpleMajorityQuorum => 1,
            Self::Supermajority => 2,
            Self::SupermajorityQuorum => 3,
        }
    }

    /// Whether passing additionally requires the supermajority threshold.
    pub fn requires_supermajority(&self) -> bool {
        matches!(self, Self::Supermajority | Self::SupermajorityQuorum)
    }
}

/// Lifecycle phase of the DAO itself.
///
/// Transitions are forward-only: `Funding -> Active -> Dissolved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Capital is being raised; dividends distribute by share balance.
    Funding,
    /// The asset is held and producing; dividends distribute by loot balance.
    Active,
    /// The vehicle has been wound down; no further dividends.
    Dissolved,
}

impl LifecycleState {
    fn rank(&self) -> u8 {
        match self {
            Self::Funding => 0,
            Self::Active => 1,
            Self::Dissolved => 2,
        }
    }

    /// Whether a manager-driven transition to `next` is allowed.
    pub fn can_advance_to(&self, next: LifecycleState) -> bool {
        next.rank() > self.rank()
    }

    /// Whether dividend deposits are accepted in this phase.
    pub fn accepts_dividends(&self) -> bool {
        matches!(self, Self::Funding | Self::Active)
    }
}

/// Lifecycle status of a single proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Created but not yet sponsored; the voting clock has not started.
    Draft,
    /// Sponsored; voting and grace windows are in effect.
    Active,
    /// Processed (whether the vote passed or failed). Terminal.
    Processed,
    /// Cancelled by the proposer before sponsorship. Terminal.
    Cancelled,
    /// Removed from the processing order by an escape proposal. Terminal.
    Escaped,
}

impl ProposalStatus {
    /// Terminal records are immutable and never re-enter the queue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Cancelled | Self::Escaped)
    }
}
