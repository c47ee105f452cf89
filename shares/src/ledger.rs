//! Share balances, allowances, and delegation.

use crate::checkpoint::VoteCheckpoints;
use crate::error::SharesError;
use acre_types::{MemberAddress, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-member share state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShareAccount {
    pub balance: u128,
    /// `None` means self-delegated.
    pub delegate: Option<MemberAddress>,
    /// Nonce for signed actions (delegation by signature).
    pub nonce: u64,
    allowances: HashMap<MemberAddress, u128>,
}

/// The voting-power ledger.
///
/// Invariant: `sum(balance over all accounts) == total_supply` after every
/// operation. All mutations use checked arithmetic; a failed operation
/// leaves the ledger untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharesLedger {
    accounts: HashMap<MemberAddress, ShareAccount>,
    total_supply: u128,
    paused: bool,
    checkpoints: VoteCheckpoints,
}

impl SharesLedger {
    pub fn new(paused: bool) -> Self {
        Self {
            accounts: HashMap::new(),
            total_supply: 0,
            paused,
            checkpoints: VoteCheckpoints::new(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn balance_of(&self, addr: &MemberAddress) -> u128 {
        self.accounts.get(addr).map_or(0, |a| a.balance)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Membership means holding a non-zero share balance.
    pub fn is_member(&self, addr: &MemberAddress) -> bool {
        self.balance_of(addr) > 0
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// The delegate a member's voting power is attributed to (self if the
    /// member never delegated).
    pub fn delegate_of<'a>(&'a self, addr: &'a MemberAddress) -> &'a MemberAddress {
        self.accounts
            .get(addr)
            .and_then(|a| a.delegate.as_ref())
            .unwrap_or(addr)
    }

    pub fn allowance(&self, owner: &MemberAddress, spender: &MemberAddress) -> u128 {
        self.accounts
            .get(owner)
            .and_then(|a| a.allowances.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn nonce_of(&self, addr: &MemberAddress) -> u64 {
        self.accounts.get(addr).map_or(0, |a| a.nonce)
    }

    pub fn current_votes(&self, addr: &MemberAddress) -> u128 {
        self.checkpoints.current(addr)
    }

    pub fn prior_votes(
        &self,
        addr: &MemberAddress,
        at: Timestamp,
        now: Timestamp,
    ) -> Result<u128, SharesError> {
        self.checkpoints.prior(addr, at, now)
    }

    /// All accounts holding a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&MemberAddress, u128)> {
        self.accounts
            .iter()
            .filter(|(_, a)| a.balance > 0)
            .map(|(addr, a)| (addr, a.balance))
    }

    /// Consistency check: the sum of balances equals the tracked supply.
    pub fn is_conserved(&self) -> bool {
        let mut sum: u128 = 0;
        for account in self.accounts.values() {
            match sum.checked_add(account.balance) {
                Some(s) => sum = s,
                None => return false,
            }
        }
        sum == self.total_supply
    }

    // ── Governance-path mutations (never pause-gated) ────────────────────

    /// Mint new shares. Only reachable from proposal processing, the
    /// extension gateway, and initialization.
    pub fn mint(
        &mut self,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), SharesError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(SharesError::Overflow)?;
        let account = self.accounts.entry(to.clone()).or_default();
        account.balance = account.balance.checked_add(amount).ok_or(SharesError::Overflow)?;
        self.total_supply = new_supply;
        let to_delegate = self.delegate_of(to).clone();
        self.move_votes(None, Some(to_delegate), amount, now);
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Consume and return the member's current nonce.
    pub fn consume_nonce(&mut self, addr: &MemberAddress) -> u64 {
        let account = self.accounts.entry(addr.clone()).or_default();
        let nonce = account.nonce;
        account.nonce = account.nonce.wrapping_add(1);
        nonce
    }

    // ── Member-path mutations (pause-gated) ──────────────────────────────

    pub fn transfer(
        &mut self,
        from: &MemberAddress,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), SharesError> {
        self.ensure_unpaused()?;
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        let from_delegate = self.delegate_of(from).clone();
        let to_delegate = self.delegate_of(to).clone();
        self.move_votes(Some(from_delegate), Some(to_delegate), amount, now);
        Ok(())
    }

    pub fn approve(&mut self, owner: &MemberAddress, spender: &MemberAddress, amount: u128) {
        let account = self.accounts.entry(owner.clone()).or_default();
        account.allowances.insert(spender.clone(), amount);
    }

    pub fn transfer_from(
        &mut self,
        spender: &MemberAddress,
        from: &MemberAddress,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), SharesError> {
        self.ensure_unpaused()?;
        self.spend_allowance(from, spender, amount)?;
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        let from_delegate = self.delegate_of(from).clone();
        let to_delegate = self.delegate_of(to).clone();
        self.move_votes(Some(from_delegate), Some(to_delegate), amount, now);
        Ok(())
    }

    /// Burn the caller's own shares.
    pub fn burn(
        &mut self,
        from: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), SharesError> {
        self.ensure_unpaused()?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        let from_delegate = self.delegate_of(from).clone();
        self.move_votes(Some(from_delegate), None, amount, now);
        Ok(())
    }

    /// Burn from another account against an allowance.
    pub fn burn_from(
        &mut self,
        spender: &MemberAddress,
        from: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), SharesError> {
        self.ensure_unpaused()?;
        self.spend_allowance(from, spender, amount)?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        let from_delegate = self.delegate_of(from).clone();
        self.move_votes(Some(from_delegate), None, amount, now);
        Ok(())
    }

    /// Reassign the caller's delegate and immediately move their current
    /// voting power from the old delegate to the new one. Delegating to
    /// oneself resets the attribution.
    pub fn delegate_to(
        &mut self,
        from: &MemberAddress,
        to: &MemberAddress,
        now: Timestamp,
    ) {
        let old_delegate = self.delegate_of(from).clone();
        let account = self.accounts.entry(from.clone()).or_default();
        account.delegate = if to == from { None } else { Some(to.clone()) };
        let balance = account.balance;
        let new_delegate = self.delegate_of(from).clone();
        if old_delegate != new_delegate {
            tracing::debug!(%from, %new_delegate, balance, "delegation moved");
            self.move_votes(Some(old_delegate), Some(new_delegate), balance, now);
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn ensure_unpaused(&self) -> Result<(), SharesError> {
        if self.paused {
            return Err(SharesError::TransfersPaused);
        }
        Ok(())
    }

    fn debit(&mut self, from: &MemberAddress, amount: u128) -> Result<(), SharesError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(SharesError::InsufficientShares {
                needed: amount,
                available,
            });
        }
        if let Some(account) = self.accounts.get_mut(from) {
            account.balance -= amount;
        }
        Ok(())
    }

    fn credit(&mut self, to: &MemberAddress, amount: u128) -> Result<(), SharesError> {
        let account = self.accounts.entry(to.clone()).or_default();
        account.balance = account.balance.checked_add(amount).ok_or(SharesError::Overflow)?;
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        owner: &MemberAddress,
        spender: &MemberAddress,
        amount: u128,
    ) -> Result<(), SharesError> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(SharesError::InsufficientAllowance {
                needed: amount,
                available,
            });
        }
        if let Some(account) = self.accounts.get_mut(owner) {
            account.allowances.insert(spender.clone(), available - amount);
        }
        Ok(())
    }

    /// Shift `amount` of checkpointed voting power between delegates.
    /// `None` on either side means power enters or leaves the system
    /// (mint/burn).
    fn move_votes(
        &mut self,
        from: Option<MemberAddress>,
        to: Option<MemberAddress>,
        amount: u128,
        now: Timestamp,
    ) {
        if amount == 0 || from == to {
            return;
        }
        if let Some(from) = from {
            let votes = self.checkpoints.current(&from).saturating_sub(amount);
            self.checkpoints.record(&from, votes, now);
        }
        if let Some(to) = to {
            let votes = self.checkpoints.current(&to).saturating_add(amount);
            self.checkpoints.record(&to, votes, now);
        }
    }
}
