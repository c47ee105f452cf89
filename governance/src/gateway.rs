//! The extension gateway — whitelist, reentrancy lock, and the single
//! callback surface external modules see.
//!
//! Extensions are untrusted code. The gateway is the sole privileged entry
//! point for them: every crossing into a module takes the non-reentrant
//! lock, and the `ExtensionHost` handed to the module is the only way back
//! into the ledgers. Privileged callbacks (mint, fund release) additionally
//! require the module to be whitelisted by governance.

use crate::error::GovernanceError;
use acre_loot::{FundingAsset, LootLedger};
use acre_shares::SharesLedger;
use acre_types::{MemberAddress, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Whitelist and lock state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtensionGateway {
    whitelist: BTreeSet<MemberAddress>,
    /// Setup payloads awaiting module registration (seeded by init or by
    /// an `Extension` proposal toggling an address not yet registered).
    pending_setup: HashMap<MemberAddress, Vec<u8>>,
    /// Reentrancy lock; held for the duration of any module call.
    #[serde(skip)]
    locked: bool,
}

impl ExtensionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_whitelisted(&self, addr: &MemberAddress) -> bool {
        self.whitelist.contains(addr)
    }

    pub fn whitelist(&self) -> impl Iterator<Item = &MemberAddress> {
        self.whitelist.iter()
    }

    /// Add or remove an address from the whitelist.
    pub fn toggle(&mut self, addr: &MemberAddress, enable: bool) {
        if enable {
            self.whitelist.insert(addr.clone());
        } else {
            self.whitelist.remove(addr);
        }
    }

    pub fn schedule_setup(&mut self, addr: &MemberAddress, payload: Vec<u8>) {
        self.pending_setup.insert(addr.clone(), payload);
    }

    pub fn take_pending_setup(&mut self, addr: &MemberAddress) -> Option<Vec<u8>> {
        self.pending_setup.remove(addr)
    }

    /// Take the reentrancy lock; fails fast if already held.
    pub fn acquire(&mut self) -> Result<(), GovernanceError> {
        if self.locked {
            return Err(GovernanceError::Reentrancy);
        }
        self.locked = true;
        Ok(())
    }

    pub fn release(&mut self) {
        self.locked = false;
    }
}

/// The callback surface a module sees while the gateway lock is held.
///
/// Mint and fund-release callbacks require the privileged flag (the module
/// is whitelisted); reads are open. Re-entering the gateway from here
/// always fails — the lock is held for the whole module call.
pub struct ExtensionHost<'a> {
    shares: &'a mut SharesLedger,
    loot: &'a mut LootLedger,
    asset: &'a mut dyn FundingAsset,
    dao_address: &'a MemberAddress,
    privileged: bool,
    now: Timestamp,
}

impl<'a> ExtensionHost<'a> {
    pub(crate) fn new(
        shares: &'a mut SharesLedger,
        loot: &'a mut LootLedger,
        asset: &'a mut dyn FundingAsset,
        dao_address: &'a MemberAddress,
        privileged: bool,
        now: Timestamp,
    ) -> Self {
        Self {
            shares,
            loot,
            asset,
            dao_address,
            privileged,
            now,
        }
    }

    pub fn dao_address(&self) -> &MemberAddress {
        self.dao_address
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn share_balance_of(&self, addr: &MemberAddress) -> u128 {
        self.shares.balance_of(addr)
    }

    pub fn total_shares(&self) -> u128 {
        self.shares.total_supply()
    }

    pub fn loot_balance_of(&self, addr: &MemberAddress) -> u128 {
        self.loot.balance_of(addr)
    }

    pub fn total_loot(&self) -> u128 {
        self.loot.total_loot()
    }

    /// Snapshot of all share holders, for pro-rata computations.
    pub fn share_holders(&self) -> Vec<(MemberAddress, u128)> {
        self.shares
            .holders()
            .map(|(a, b)| (a.clone(), b))
            .collect()
    }

    /// Snapshot of all loot holders, for pro-rata computations.
    pub fn loot_holders(&self) -> Vec<(MemberAddress, u128)> {
        self.loot.holders().map(|(a, b)| (a.clone(), b)).collect()
    }

    pub fn treasury_balance(&self) -> u128 {
        self.asset.balance_of(self.dao_address)
    }

    // ── Privileged callbacks ─────────────────────────────────────────────

    /// Mint shares on behalf of the module's own accounting.
    pub fn mint_shares(
        &mut self,
        to: &MemberAddress,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        self.ensure_privileged()?;
        self.shares.mint(to, amount, self.now)?;
        tracing::debug!(%to, amount, "extension minted shares");
        Ok(())
    }

    /// Mint loot on behalf of the module's own accounting.
    pub fn mint_loot(&mut self, to: &MemberAddress, amount: u128) -> Result<(), GovernanceError> {
        self.ensure_privileged()?;
        self.loot.mint(to, amount)?;
        tracing::debug!(%to, amount, "extension minted loot");
        Ok(())
    }

    /// Release treasury funds to an address.
    pub fn release_funds(
        &mut self,
        to: &MemberAddress,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        self.ensure_privileged()?;
        self.asset.transfer(self.dao_address, to, amount)?;
        tracing::debug!(%to, amount, "extension released treasury funds");
        Ok(())
    }

    /// Nested gateway entry. The lock is held for the duration of the
    /// module call, so this always fails.
    pub fn call_extension(
        &mut self,
        _target: &MemberAddress,
        _amount: u128,
        _payload: &[u8],
    ) -> Result<(), GovernanceError> {
        Err(GovernanceError::Reentrancy)
    }

    fn ensure_privileged(&self) -> Result<(), GovernanceError> {
        if !self.privileged {
            return Err(GovernanceError::UnprivilegedCallback);
        }
        Ok(())
    }
}

/// An external extension module.
///
/// Implementations live outside the governance core (capital raises,
/// capital calls, access whitelists). The core only authorizes and guards
/// them; their internal accounting is their own.
pub trait Extension {
    /// One-time setup, forwarded from init or an `Extension` proposal.
    fn set_up(
        &mut self,
        host: &mut ExtensionHost<'_>,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        let _ = (host, payload);
        Ok(())
    }

    /// Main entry point, reached through `call_extension`, `Call`,
    /// `CapitalCall`, and `TokenSale` dispatch.
    fn handle_call(
        &mut self,
        host: &mut ExtensionHost<'_>,
        caller: &MemberAddress,
        amount: u128,
        payload: &[u8],
    ) -> Result<(), GovernanceError>;

    /// A member contributed loot to this module via `contribute_loot`.
    fn on_loot_contribution(
        &mut self,
        host: &mut ExtensionHost<'_>,
        member: &MemberAddress,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        let _ = (host, member, amount);
        Ok(())
    }
}
