use acre_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LootError {
    #[error("insufficient loot: need {needed}, have {available}")]
    InsufficientLoot { needed: u128, available: u128 },

    #[error("loot arithmetic overflow")]
    Overflow,
}

impl LootError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLoot { .. } => ErrorKind::InsufficientBalance,
            Self::Overflow => ErrorKind::Validation,
        }
    }
}
