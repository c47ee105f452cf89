//! Historical voting-power checkpoints.
//!
//! Per delegate, an append-only, time-ordered sequence of
//! `(timestamp, voting_power)` entries. A balance change at a timestamp
//! already holding a checkpoint overwrites that entry instead of appending,
//! so lookups see exactly one value per instant.

use crate::error::SharesError;
use acre_types::{MemberAddress, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One voting-power observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub at: Timestamp,
    pub votes: u128,
}

/// Checkpoint table for all delegates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoteCheckpoints {
    by_delegate: HashMap<MemberAddress, Vec<Checkpoint>>,
}

impl VoteCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delegate's new voting power at `now`.
    pub fn record(&mut self, delegate: &MemberAddress, votes: u128, now: Timestamp) {
        let entries = self.by_delegate.entry(delegate.clone()).or_default();
        match entries.last_mut() {
            Some(last) if last.at >= now => last.votes = votes,
            _ => entries.push(Checkpoint { at: now, votes }),
        }
    }

    /// The delegate's latest checkpointed voting power.
    pub fn current(&self, delegate: &MemberAddress) -> u128 {
        self.by_delegate
            .get(delegate)
            .and_then(|entries| entries.last())
            .map(|cp| cp.votes)
            .unwrap_or(0)
    }

    /// The delegate's voting power as of `at`, which must be strictly in
    /// the past. Binary search over the time-ordered entries.
    pub fn prior(
        &self,
        delegate: &MemberAddress,
        at: Timestamp,
        now: Timestamp,
    ) -> Result<u128, SharesError> {
        if at >= now {
            return Err(SharesError::FutureLookup { requested: at, now });
        }
        let Some(entries) = self.by_delegate.get(delegate) else {
            return Ok(0);
        };
        let idx = entries.partition_point(|cp| cp.at <= at);
        Ok(if idx == 0 { 0 } else { entries[idx - 1].votes })
    }

    /// Number of checkpoints recorded for a delegate.
    pub fn len(&self, delegate: &MemberAddress) -> usize {
        self.by_delegate.get(delegate).map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.by_delegate.is_empty()
    }
}
