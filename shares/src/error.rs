use acre_types::{ErrorKind, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SharesError {
    #[error("share transfers are paused")]
    TransfersPaused,

    #[error("insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("voting-power lookup at {requested} is not in the past (now {now})")]
    FutureLookup { requested: Timestamp, now: Timestamp },

    #[error("share arithmetic overflow")]
    Overflow,
}

impl SharesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransfersPaused => ErrorKind::State,
            Self::InsufficientShares { .. } | Self::InsufficientAllowance { .. } => {
                ErrorKind::InsufficientBalance
            }
            Self::FutureLookup { .. } | Self::Overflow => ErrorKind::Validation,
        }
    }
}
