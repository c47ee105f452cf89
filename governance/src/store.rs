//! The proposal store — an ordered sequence with tombstoned terminal
//! records.
//!
//! Ids are sequential from 1. Terminal records (processed, cancelled,
//! escaped) stay in place as tombstones; the processing cursor still
//! observes strict id ordering across them. Never-sponsored drafts sit
//! outside the processing queue and neither process nor obstruct.

use crate::proposal::Proposal;
use acre_types::ProposalStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalStore {
    proposals: BTreeMap<u64, Proposal>,
    next_id: u64,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Reserve the next sequential id.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, proposal: Proposal) {
        self.proposals.insert(proposal.id, proposal);
    }

    pub fn get(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Proposal> {
        self.proposals.get_mut(&id)
    }

    /// Number of proposals ever created.
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }

    /// The smallest sponsored, non-terminal proposal with an id below
    /// `before` — the one that blocks FIFO processing of `before`.
    pub fn first_blocking(&self, before: u64) -> Option<u64> {
        self.proposals
            .range(..before)
            .find(|(_, p)| p.status == ProposalStatus::Active)
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }
}
