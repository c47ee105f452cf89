//! Loot balances and total.

use crate::error::LootError;
use acre_types::MemberAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The claim ledger.
///
/// Invariant: `sum(balances) == total_loot` after every operation. Loot
/// does not vote, is not transferable between members, and carries no
/// checkpoints — it is minted by governance and burned on redemption or
/// contribution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LootLedger {
    balances: HashMap<MemberAddress, u128>,
    total_loot: u128,
}

impl LootLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, addr: &MemberAddress) -> u128 {
        self.balances.get(addr).copied().unwrap_or(0)
    }

    pub fn total_loot(&self) -> u128 {
        self.total_loot
    }

    /// All accounts holding a non-zero loot balance.
    pub fn holders(&self) -> impl Iterator<Item = (&MemberAddress, u128)> {
        self.balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(addr, amount)| (addr, *amount))
    }

    pub fn mint(&mut self, to: &MemberAddress, amount: u128) -> Result<(), LootError> {
        let new_total = self
            .total_loot
            .checked_add(amount)
            .ok_or(LootError::Overflow)?;
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = balance.checked_add(amount).ok_or(LootError::Overflow)?;
        self.total_loot = new_total;
        Ok(())
    }

    pub fn burn(&mut self, from: &MemberAddress, amount: u128) -> Result<(), LootError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LootError::InsufficientLoot {
                needed: amount,
                available,
            });
        }
        if let Some(balance) = self.balances.get_mut(from) {
            *balance -= amount;
        }
        self.total_loot -= amount;
        Ok(())
    }

    /// Consistency check: the sum of balances equals the tracked total.
    pub fn is_conserved(&self) -> bool {
        let mut sum: u128 = 0;
        for amount in self.balances.values() {
            match sum.checked_add(*amount) {
                Some(s) => sum = s,
                None => return false,
            }
        }
        sum == self.total_loot
    }
}
