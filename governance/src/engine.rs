//! The governance engine.
//!
//! `Dao` owns both ledgers, the proposal store, the settings, and the
//! extension gateway, and is the only mutation path into any of them.
//! Every operation takes `now` explicitly and is atomic: validation happens
//! before the first ledger write, so a failed call leaves no partial state.
//! The funding asset is an external collaborator and is passed into the
//! operations that touch it.

use crate::error::GovernanceError;
use crate::gateway::{Extension, ExtensionGateway, ExtensionHost};
use crate::proposal::{
    PeriodSlot, Proposal, ProposalAction, ProposalKind, SaleIntent,
};
use crate::store::ProposalStore;
use acre_crypto::{decode_address, delegation_digest, domain_separator, verify_signature, vote_digest};
use acre_loot::{FundingAsset, LootLedger, PermitAuth};
use acre_shares::SharesLedger;
use acre_types::{
    GovSettings, LifecycleState, MemberAddress, ProposalStatus, Signature, Timestamp, VoteKind,
    PROPOSAL_KIND_COUNT,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Shares minted to the founder at initialization.
pub const FOUNDER_SHARES: u128 = 5000;

/// Initialization parameters (spec interface: name, symbol, docs, funding
/// asset is passed per-operation, extension seeds, governance settings).
#[derive(Clone, Debug)]
pub struct InitParams {
    pub name: String,
    pub symbol: String,
    pub docs: String,
    /// Whether share transfers start out paused.
    pub paused: bool,
    /// Extension addresses whitelisted from genesis.
    pub extensions: Vec<MemberAddress>,
    /// One setup payload per seeded extension (empty = no setup call).
    pub extensions_setup: Vec<Vec<u8>>,
    pub quorum_pct: u8,
    pub supermajority_pct: u8,
    /// Wire vote kinds, one per proposal kind, each < 4.
    pub vote_kinds: [u8; PROPOSAL_KIND_COUNT],
    /// Voting periods in seconds, one per proposal kind.
    pub vote_periods_secs: [u64; PROPOSAL_KIND_COUNT],
    pub grace_period_secs: u64,
}

impl InitParams {
    /// Reference configuration: no quorum, 60% supermajority,
    /// simple-majority-with-quorum everywhere, 12-hour windows, no grace.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, docs: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            docs: docs.into(),
            paused: false,
            extensions: Vec::new(),
            extensions_setup: Vec::new(),
            quorum_pct: 0,
            supermajority_pct: 60,
            vote_kinds: [1; PROPOSAL_KIND_COUNT],
            vote_periods_secs: [acre_types::MIN_VOTE_PERIOD_SECS; PROPOSAL_KIND_COUNT],
            grace_period_secs: 0,
        }
    }
}

/// How a processed proposal resolved. A defeated vote is a normal outcome,
/// not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    Passed,
    Defeated,
}

/// The member-governed treasury vehicle.
pub struct Dao {
    name: String,
    symbol: String,
    docs: String,
    /// The DAO's own address — the treasury identity in the funding asset.
    address: MemberAddress,
    /// Domain separator binding signed messages to this DAO.
    domain: [u8; 32],
    settings: GovSettings,
    manager: MemberAddress,
    lifecycle: LifecycleState,
    shares: SharesLedger,
    loot: LootLedger,
    proposals: ProposalStore,
    gateway: ExtensionGateway,
    sale_intent: Option<SaleIntent>,
    /// Runtime registry of extension modules. Not part of the snapshot;
    /// modules re-register after a reload.
    modules: HashMap<MemberAddress, Box<dyn Extension>>,
}

impl std::fmt::Debug for Dao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dao")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("docs", &self.docs)
            .field("address", &self.address)
            .field("domain", &self.domain)
            .field("settings", &self.settings)
            .field("manager", &self.manager)
            .field("lifecycle", &self.lifecycle)
            .field("shares", &self.shares)
            .field("loot", &self.loot)
            .field("proposals", &self.proposals)
            .field("gateway", &self.gateway)
            .field("sale_intent", &self.sale_intent)
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Dao {
    /// One-time initialization. Double initialization is unrepresentable:
    /// this is the only constructor.
    pub fn init(
        params: InitParams,
        dao_address: MemberAddress,
        founder: MemberAddress,
        now: Timestamp,
    ) -> Result<Self, GovernanceError> {
        if params.extensions.len() != params.extensions_setup.len() {
            return Err(GovernanceError::ExtensionSetupMismatch {
                extensions: params.extensions.len(),
                payloads: params.extensions_setup.len(),
            });
        }
        let mut vote_kinds = [VoteKind::SimpleMajority; PROPOSAL_KIND_COUNT];
        for (slot, raw) in params.vote_kinds.iter().enumerate() {
            vote_kinds[slot] =
                VoteKind::from_wire(*raw).ok_or(GovernanceError::UnknownVoteKind(*raw))?;
        }
        let settings = GovSettings::new(
            params.quorum_pct,
            params.supermajority_pct,
            vote_kinds,
            params.vote_periods_secs,
        )?
        .with_grace_period(params.grace_period_secs)?;

        let mut gateway = ExtensionGateway::new();
        for (addr, setup) in params.extensions.iter().zip(&params.extensions_setup) {
            gateway.toggle(addr, true);
            if !setup.is_empty() {
                gateway.schedule_setup(addr, setup.clone());
            }
        }

        let mut shares = SharesLedger::new(params.paused);
        shares.mint(&founder, FOUNDER_SHARES, now)?;

        let domain = domain_separator(&params.name, &dao_address);
        tracing::info!(name = %params.name, %founder, "dao initialized");

        Ok(Self {
            name: params.name,
            symbol: params.symbol,
            docs: params.docs,
            address: dao_address,
            domain,
            settings,
            manager: founder,
            lifecycle: LifecycleState::Funding,
            shares,
            loot: LootLedger::new(),
            proposals: ProposalStore::new(),
            gateway,
            sale_intent: None,
            modules: HashMap::new(),
        })
    }

    /// Register an extension module at an address. If a setup payload is
    /// pending for it (seeded at init or by an `Extension` proposal before
    /// registration), the setup call is delivered through the gateway now.
    pub fn register_extension(
        &mut self,
        addr: &MemberAddress,
        module: Box<dyn Extension>,
        asset: &mut dyn FundingAsset,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.modules.insert(addr.clone(), module);
        if let Some(payload) = self.gateway.take_pending_setup(addr) {
            self.with_module(addr, asset, now, |module, host| {
                module.set_up(host, &payload)
            })?;
        }
        Ok(())
    }

    // ── Proposal lifecycle ───────────────────────────────────────────────

    /// Submit a proposal. Validates the wire arrays and the kind-specific
    /// shape, assigns the next sequential id, and auto-sponsors when the
    /// proposer already holds shares.
    #[allow(clippy::too_many_arguments)]
    pub fn propose(
        &mut self,
        proposer: &MemberAddress,
        kind_wire: u8,
        description: impl Into<String>,
        targets: &[MemberAddress],
        values: &[u128],
        payloads: &[Vec<u8>],
        now: Timestamp,
    ) -> Result<u64, GovernanceError> {
        let kind =
            ProposalKind::from_wire(kind_wire).ok_or(GovernanceError::UnknownKind(kind_wire))?;
        let action = ProposalAction::from_parts(kind, targets, values, payloads)?;
        let id = self.proposals.next_id();
        let mut proposal = Proposal {
            id,
            kind,
            action,
            description: description.into(),
            proposer: proposer.clone(),
            status: ProposalStatus::Draft,
            voting_start: None,
            voting_end: None,
            grace_period_secs: 0,
            yes_weight: 0,
            no_weight: 0,
            voters: BTreeSet::new(),
        };
        if self.shares.is_member(proposer) {
            self.start_voting_clock(&mut proposal, now);
        }
        tracing::info!(id, ?kind, %proposer, sponsored = proposal.status == ProposalStatus::Active, "proposal created");
        self.proposals.insert(proposal);
        Ok(id)
    }

    /// Start a draft proposal's voting clock. The caller must be a member.
    pub fn sponsor_proposal(
        &mut self,
        caller: &MemberAddress,
        id: u64,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.shares.is_member(caller) {
            return Err(GovernanceError::NotMember(caller.clone()));
        }
        let settings = self.settings.clone();
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        match proposal.status {
            ProposalStatus::Draft => {}
            ProposalStatus::Active => return Err(GovernanceError::AlreadySponsored(id)),
            _ => return Err(GovernanceError::ProposalTerminal(id)),
        }
        Self::sponsor_record(proposal, &settings, now);
        tracing::info!(id, %caller, "proposal sponsored");
        Ok(())
    }

    /// Cancel an unsponsored proposal. Only the original proposer may, and
    /// only before sponsorship.
    pub fn cancel_proposal(
        &mut self,
        caller: &MemberAddress,
        id: u64,
    ) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        if proposal.proposer != *caller {
            return Err(GovernanceError::NotProposer);
        }
        match proposal.status {
            ProposalStatus::Draft => {}
            ProposalStatus::Active => return Err(GovernanceError::AlreadySponsored(id)),
            _ => return Err(GovernanceError::ProposalTerminal(id)),
        }
        proposal.status = ProposalStatus::Cancelled;
        tracing::info!(id, "proposal cancelled");
        Ok(())
    }

    /// Cast a vote. Weight is the voter's current delegated voting power.
    pub fn vote(
        &mut self,
        voter: &MemberAddress,
        id: u64,
        approve: bool,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.shares.is_member(voter) {
            return Err(GovernanceError::NotMember(voter.clone()));
        }
        let weight = self.shares.current_votes(voter);
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        match proposal.status {
            ProposalStatus::Active => {}
            ProposalStatus::Draft => return Err(GovernanceError::NotSponsored(id)),
            _ => return Err(GovernanceError::ProposalTerminal(id)),
        }
        if !proposal.voting_open(now) {
            return Err(GovernanceError::VotingClosed(id));
        }
        if proposal.voters.contains(voter) {
            return Err(GovernanceError::AlreadyVoted(id));
        }
        if approve {
            proposal.yes_weight = proposal.yes_weight.saturating_add(weight);
        } else {
            proposal.no_weight = proposal.no_weight.saturating_add(weight);
        }
        proposal.voters.insert(voter.clone());
        tracing::debug!(id, %voter, approve, weight, "vote recorded");
        Ok(())
    }

    /// Cast a vote from an off-chain signed message over
    /// `(signer, proposal_id, approve)`. The signature must verify against
    /// the public key embedded in the signer's address.
    pub fn vote_by_sig(
        &mut self,
        signer: &MemberAddress,
        id: u64,
        approve: bool,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let digest = vote_digest(&self.domain, signer, id, approve);
        let public = decode_address(signer).ok_or(GovernanceError::UnresolvableSigner)?;
        if !verify_signature(&digest, signature, &public) {
            return Err(GovernanceError::InvalidSignature);
        }
        self.vote(signer, id, approve, now)
    }

    /// Process a decided proposal. Callable by anyone once the voting and
    /// grace windows have elapsed, in strict id order (escape proposals are
    /// exempt from the ordering precondition). A defeated vote marks the
    /// proposal processed with no side effect.
    pub fn process_proposal(
        &mut self,
        id: u64,
        asset: &mut dyn FundingAsset,
        now: Timestamp,
    ) -> Result<ProcessOutcome, GovernanceError> {
        let proposal = self
            .proposals
            .get(id)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        match proposal.status {
            ProposalStatus::Active => {}
            ProposalStatus::Draft => return Err(GovernanceError::NotSponsored(id)),
            _ => return Err(GovernanceError::ProposalTerminal(id)),
        }
        let Some(end) = proposal.voting_end else {
            return Err(GovernanceError::NotSponsored(id));
        };
        if now < end {
            return Err(GovernanceError::VotingStillOpen { id, end });
        }
        let grace_until = end.plus(proposal.grace_period_secs);
        if now < grace_until {
            return Err(GovernanceError::GraceNotElapsed {
                id,
                until: grace_until,
            });
        }
        if proposal.kind != ProposalKind::Escape {
            if let Some(blocking) = self.proposals.first_blocking(id) {
                return Err(GovernanceError::OutOfOrder {
                    blocked: id,
                    blocking,
                });
            }
        }

        let kind = proposal.kind;
        let action = proposal.action.clone();
        let description = proposal.description.clone();
        let yes = proposal.yes_weight;
        let no = proposal.no_weight;
        let passed = self.tally_passes(kind, yes, no);

        if passed {
            // A failed dispatch leaves the proposal Active: the queue is
            // stuck until a retry succeeds or an escape clears it.
            self.dispatch(id, action, &description, asset, now)?;
        }
        if let Some(proposal) = self.proposals.get_mut(id) {
            proposal.status = ProposalStatus::Processed;
        }
        let outcome = if passed {
            ProcessOutcome::Passed
        } else {
            ProcessOutcome::Defeated
        };
        tracing::info!(id, ?kind, ?outcome, yes, no, "proposal processed");
        Ok(outcome)
    }

    /// Resolution: yes must beat no, turnout must meet quorum, and
    /// supermajority-designated kinds must clear the supermajority ratio.
    fn tally_passes(&self, kind: ProposalKind, yes: u128, no: u128) -> bool {
        if yes <= no {
            return false;
        }
        let cast = yes.saturating_add(no);
        let total = self.shares.total_supply();
        let turnout_pct = if total == 0 {
            0
        } else {
            cast.saturating_mul(100) / total
        };
        if turnout_pct < self.settings.quorum_pct as u128 {
            return false;
        }
        let vote_kind = self.settings.vote_kinds[kind.wire() as usize];
        if vote_kind.requires_supermajority() {
            // cast > 0 because yes > no >= 0.
            let yes_pct = yes.saturating_mul(100) / cast;
            if yes_pct < self.settings.supermajority_pct as u128 {
                return false;
            }
        }
        true
    }

    fn dispatch(
        &mut self,
        id: u64,
        action: ProposalAction,
        description: &str,
        asset: &mut dyn FundingAsset,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        match action {
            ProposalAction::Call { calls } => {
                for call in &calls {
                    let caller = self.address.clone();
                    self.with_module(&call.target, asset, now, |module, host| {
                        module.handle_call(host, &caller, call.amount, &call.payload)
                    })?;
                }
                Ok(())
            }
            ProposalAction::VotePeriod { slot, secs } => {
                match slot {
                    PeriodSlot::Kind(kind) => {
                        self.settings.vote_periods_secs[kind.wire() as usize] = secs;
                    }
                    PeriodSlot::Grace => self.settings.grace_period_secs = secs,
                }
                Ok(())
            }
            ProposalAction::Quorum { pct } => {
                self.settings.quorum_pct = pct;
                Ok(())
            }
            ProposalAction::Supermajority { pct } => {
                self.settings.supermajority_pct = pct;
                Ok(())
            }
            ProposalAction::VoteType { target, vote_kind } => {
                self.settings.vote_kinds[target.wire() as usize] = vote_kind;
                Ok(())
            }
            ProposalAction::Extension { toggles } => {
                for toggle in &toggles {
                    self.gateway.toggle(&toggle.target, toggle.enable);
                    if toggle.enable && !toggle.setup.is_empty() {
                        if self.modules.contains_key(&toggle.target) {
                            self.with_module(&toggle.target, asset, now, |module, host| {
                                module.set_up(host, &toggle.setup)
                            })?;
                        } else {
                            self.gateway.schedule_setup(&toggle.target, toggle.setup.clone());
                        }
                    }
                }
                Ok(())
            }
            ProposalAction::Docs => {
                self.docs = description.to_string();
                Ok(())
            }
            ProposalAction::Sell { price } => {
                self.sale_intent = Some(SaleIntent {
                    price,
                    listed_at: now,
                });
                Ok(())
            }
            ProposalAction::Purchase { amount } => {
                asset.transfer(&self.address, &self.manager, amount)?;
                Ok(())
            }
            ProposalAction::Manager { new_manager } => {
                self.manager = new_manager;
                Ok(())
            }
            ProposalAction::CapitalCall {
                extension,
                amount,
                payload,
            }
            | ProposalAction::TokenSale {
                extension,
                amount,
                payload,
            } => {
                if !self.gateway.is_whitelisted(&extension) {
                    return Err(GovernanceError::NotWhitelisted(extension));
                }
                let caller = self.address.clone();
                self.with_module(&extension, asset, now, |module, host| {
                    module.handle_call(host, &caller, amount, &payload)
                })
            }
            ProposalAction::Escape { proposal_id } => {
                if proposal_id == id {
                    return Err(GovernanceError::UnknownProposal(proposal_id));
                }
                let target = self
                    .proposals
                    .get_mut(proposal_id)
                    .ok_or(GovernanceError::UnknownProposal(proposal_id))?;
                if !target.status.is_terminal() {
                    target.status = ProposalStatus::Escaped;
                    tracing::warn!(escaped = proposal_id, by = id, "proposal escaped");
                }
                Ok(())
            }
        }
    }

    // ── Extension gateway ────────────────────────────────────────────────

    /// Invoke a whitelisted extension module directly.
    pub fn call_extension(
        &mut self,
        caller: &MemberAddress,
        target: &MemberAddress,
        amount: u128,
        payload: &[u8],
        asset: &mut dyn FundingAsset,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.gateway.is_whitelisted(target) {
            return Err(GovernanceError::NotWhitelisted(target.clone()));
        }
        self.with_module(target, asset, now, |module, host| {
            module.handle_call(host, caller, amount, payload)
        })
    }

    /// Take the gateway lock, hand the module the callback surface, run
    /// `f`, and restore the module whatever the outcome.
    fn with_module<F>(
        &mut self,
        target: &MemberAddress,
        asset: &mut dyn FundingAsset,
        now: Timestamp,
        f: F,
    ) -> Result<(), GovernanceError>
    where
        F: FnOnce(&mut dyn Extension, &mut ExtensionHost<'_>) -> Result<(), GovernanceError>,
    {
        let privileged = self.gateway.is_whitelisted(target);
        self.gateway.acquire()?;
        let Some(mut module) = self.modules.remove(target) else {
            self.gateway.release();
            return Err(GovernanceError::ModuleNotRegistered(target.clone()));
        };
        let result = {
            let mut host = ExtensionHost::new(
                &mut self.shares,
                &mut self.loot,
                asset,
                &self.address,
                privileged,
                now,
            );
            f(module.as_mut(), &mut host)
        };
        self.modules.insert(target.clone(), module);
        self.gateway.release();
        result
    }

    // ── Treasury operations ──────────────────────────────────────────────

    /// Redeem loot for the treasury's funding asset.
    pub fn withdraw(
        &mut self,
        caller: &MemberAddress,
        amount: u128,
        asset: &mut dyn FundingAsset,
    ) -> Result<(), GovernanceError> {
        let available = self.loot.balance_of(caller);
        if available < amount {
            return Err(acre_loot::LootError::InsufficientLoot {
                needed: amount,
                available,
            }
            .into());
        }
        asset.transfer(&self.address, caller, amount)?;
        // Cannot fail: balance was checked above and nothing else ran.
        self.loot.burn(caller, amount)?;
        tracing::info!(%caller, amount, "loot redeemed");
        Ok(())
    }

    /// Pull a dividend from the manager via permit and distribute it as
    /// newly minted loot: pro-rata by share balance while `Funding`, by
    /// loot balance while `Active`. Floor truncation per recipient; the
    /// remainder stays in the treasury.
    pub fn deposit_dividend(
        &mut self,
        amount: u128,
        auth: &PermitAuth,
        asset: &mut dyn FundingAsset,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.lifecycle.accepts_dividends() {
            return Err(GovernanceError::DividendsClosed(self.lifecycle));
        }
        if auth.owner != self.manager {
            return Err(GovernanceError::NotManager);
        }
        let recipients: Vec<(MemberAddress, u128)> = match self.lifecycle {
            LifecycleState::Funding => self
                .shares
                .holders()
                .map(|(a, b)| (a.clone(), b))
                .collect(),
            _ => self.loot.holders().map(|(a, b)| (a.clone(), b)).collect(),
        };
        let base_total: u128 = match self.lifecycle {
            LifecycleState::Funding => self.shares.total_supply(),
            _ => self.loot.total_loot(),
        };
        // Compute every cut before touching any state, so the permit pull
        // is the last fallible step.
        let mut cuts: Vec<(MemberAddress, u128)> = Vec::with_capacity(recipients.len());
        let mut distributed = 0u128;
        for (addr, base) in recipients {
            let cut = mul_div(amount, base, base_total).ok_or(acre_loot::LootError::Overflow)?;
            if cut > 0 {
                distributed = distributed
                    .checked_add(cut)
                    .ok_or(acre_loot::LootError::Overflow)?;
                cuts.push((addr, cut));
            }
        }
        self.loot
            .total_loot()
            .checked_add(distributed)
            .ok_or(acre_loot::LootError::Overflow)?;
        asset.pull_with_permit(auth, &self.address, amount, now)?;
        for (addr, cut) in cuts {
            self.loot.mint(&addr, cut)?;
        }
        tracing::info!(amount, distributed, base = ?self.lifecycle, "dividend distributed");
        Ok(())
    }

    /// Burn loot and notify a whitelisted extension of the contribution.
    pub fn contribute_loot(
        &mut self,
        caller: &MemberAddress,
        amount: u128,
        extension: &MemberAddress,
        asset: &mut dyn FundingAsset,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.gateway.is_whitelisted(extension) {
            return Err(GovernanceError::NotWhitelisted(extension.clone()));
        }
        let available = self.loot.balance_of(caller);
        if available < amount {
            return Err(acre_loot::LootError::InsufficientLoot {
                needed: amount,
                available,
            }
            .into());
        }
        self.with_module(extension, asset, now, |module, host| {
            module.on_loot_contribution(host, caller, amount)
        })?;
        // Cannot fail: balance was checked and the module call is done.
        self.loot.burn(caller, amount)?;
        tracing::info!(%caller, amount, %extension, "loot contributed");
        Ok(())
    }

    /// Advance the lifecycle state. Manager-only, forward-only.
    pub fn set_state(
        &mut self,
        caller: &MemberAddress,
        new_state: LifecycleState,
    ) -> Result<(), GovernanceError> {
        if *caller != self.manager {
            return Err(GovernanceError::NotManager);
        }
        if !self.lifecycle.can_advance_to(new_state) {
            return Err(GovernanceError::LifecycleBackward {
                from: self.lifecycle,
                to: new_state,
            });
        }
        tracing::info!(from = ?self.lifecycle, to = ?new_state, "lifecycle advanced");
        self.lifecycle = new_state;
        Ok(())
    }

    // ── Share surface ────────────────────────────────────────────────────

    pub fn transfer_shares(
        &mut self,
        caller: &MemberAddress,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        Ok(self.shares.transfer(caller, to, amount, now)?)
    }

    pub fn approve_shares(&mut self, caller: &MemberAddress, spender: &MemberAddress, amount: u128) {
        self.shares.approve(caller, spender, amount);
    }

    pub fn transfer_shares_from(
        &mut self,
        caller: &MemberAddress,
        from: &MemberAddress,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        Ok(self.shares.transfer_from(caller, from, to, amount, now)?)
    }

    pub fn burn_shares(
        &mut self,
        caller: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        Ok(self.shares.burn(caller, amount, now)?)
    }

    pub fn burn_shares_from(
        &mut self,
        caller: &MemberAddress,
        from: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        Ok(self.shares.burn_from(caller, from, amount, now)?)
    }

    /// Reassign the caller's delegate.
    pub fn delegate(&mut self, caller: &MemberAddress, to: &MemberAddress, now: Timestamp) {
        self.shares.delegate_to(caller, to, now);
    }

    /// Delegate from an off-chain signed message over
    /// `(delegatee, nonce, expiry)`.
    pub fn delegate_by_sig(
        &mut self,
        signer: &MemberAddress,
        delegatee: &MemberAddress,
        nonce: u64,
        expiry: Timestamp,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if now >= expiry {
            return Err(GovernanceError::SignatureExpired { expiry, now });
        }
        let expected = self.shares.nonce_of(signer);
        if nonce != expected {
            return Err(GovernanceError::NonceMismatch {
                expected,
                got: nonce,
            });
        }
        let digest = delegation_digest(&self.domain, delegatee, nonce, expiry);
        let public = decode_address(signer).ok_or(GovernanceError::UnresolvableSigner)?;
        if !verify_signature(&digest, signature, &public) {
            return Err(GovernanceError::InvalidSignature);
        }
        self.shares.consume_nonce(signer);
        self.shares.delegate_to(signer, delegatee, now);
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn docs(&self) -> &str {
        &self.docs
    }

    /// The DAO's own address (the treasury identity in the funding asset).
    pub fn address(&self) -> &MemberAddress {
        &self.address
    }

    /// The domain separator for off-chain signed messages.
    pub fn domain(&self) -> &[u8; 32] {
        &self.domain
    }

    pub fn quorum(&self) -> u8 {
        self.settings.quorum_pct
    }

    pub fn supermajority(&self) -> u8 {
        self.settings.supermajority_pct
    }

    pub fn vote_kind_for(&self, kind: ProposalKind) -> VoteKind {
        self.settings.vote_kinds[kind.wire() as usize]
    }

    pub fn vote_period_for(&self, kind: ProposalKind) -> u64 {
        self.settings.vote_periods_secs[kind.wire() as usize]
    }

    pub fn grace_period(&self) -> u64 {
        self.settings.grace_period_secs
    }

    pub fn paused(&self) -> bool {
        self.shares.paused()
    }

    pub fn manager(&self) -> &MemberAddress {
        &self.manager
    }

    pub fn current_state(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn is_extension(&self, addr: &MemberAddress) -> bool {
        self.gateway.is_whitelisted(addr)
    }

    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    pub fn proposal_count(&self) -> u64 {
        self.proposals.count()
    }

    pub fn balance_of(&self, addr: &MemberAddress) -> u128 {
        self.shares.balance_of(addr)
    }

    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    pub fn loot_balance_of(&self, addr: &MemberAddress) -> u128 {
        self.loot.balance_of(addr)
    }

    pub fn total_loot(&self) -> u128 {
        self.loot.total_loot()
    }

    pub fn allowance(&self, owner: &MemberAddress, spender: &MemberAddress) -> u128 {
        self.shares.allowance(owner, spender)
    }

    pub fn current_votes(&self, addr: &MemberAddress) -> u128 {
        self.shares.current_votes(addr)
    }

    pub fn prior_votes(
        &self,
        addr: &MemberAddress,
        at: Timestamp,
        now: Timestamp,
    ) -> Result<u128, GovernanceError> {
        Ok(self.shares.prior_votes(addr, at, now)?)
    }

    pub fn delegate_of<'a>(&'a self, addr: &'a MemberAddress) -> &'a MemberAddress {
        self.shares.delegate_of(addr)
    }

    pub fn nonce_of(&self, addr: &MemberAddress) -> u64 {
        self.shares.nonce_of(addr)
    }

    pub fn sale_intent(&self) -> Option<&SaleIntent> {
        self.sale_intent.as_ref()
    }

    /// Consistency check over both ledgers.
    pub fn is_conserved(&self) -> bool {
        self.shares.is_conserved() && self.loot.is_conserved()
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn start_voting_clock(&self, proposal: &mut Proposal, now: Timestamp) {
        Self::sponsor_record(proposal, &self.settings, now);
    }

    fn sponsor_record(proposal: &mut Proposal, settings: &GovSettings, now: Timestamp) {
        let period = settings.vote_periods_secs[proposal.kind.wire() as usize];
        proposal.status = ProposalStatus::Active;
        proposal.voting_start = Some(now);
        proposal.voting_end = Some(now.plus(period));
        proposal.grace_period_secs = settings.grace_period_secs;
    }
}

/// Floor of `a * b / d`. `None` on overflow or `d == 0`.
fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    a.checked_mul(b).map(|p| p / d)
}

// ── Snapshot persistence ─────────────────────────────────────────────────

/// Serializable engine state. The runtime module registry and the funding
/// asset are external and are not captured.
#[derive(Serialize, Deserialize)]
struct DaoSnapshot {
    name: String,
    symbol: String,
    docs: String,
    address: MemberAddress,
    settings: GovSettings,
    manager: MemberAddress,
    lifecycle: LifecycleState,
    shares: SharesLedger,
    loot: LootLedger,
    proposals: ProposalStore,
    gateway: ExtensionGateway,
    sale_intent: Option<SaleIntent>,
}

impl Dao {
    /// Serialize the engine state to bytes.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = DaoSnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            docs: self.docs.clone(),
            address: self.address.clone(),
            settings: self.settings.clone(),
            manager: self.manager.clone(),
            lifecycle: self.lifecycle,
            shares: self.shares.clone(),
            loot: self.loot.clone(),
            proposals: self.proposals.clone(),
            gateway: self.gateway.clone(),
            sale_intent: self.sale_intent.clone(),
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore an engine from serialized bytes. Extension modules must be
    /// re-registered afterwards.
    pub fn load_state(data: &[u8]) -> Result<Self, GovernanceError> {
        let snapshot: DaoSnapshot =
            bincode::deserialize(data).map_err(|_| GovernanceError::SnapshotCorrupt)?;
        let domain = domain_separator(&snapshot.name, &snapshot.address);
        Ok(Self {
            name: snapshot.name,
            symbol: snapshot.symbol,
            docs: snapshot.docs,
            address: snapshot.address,
            domain,
            settings: snapshot.settings,
            manager: snapshot.manager,
            lifecycle: snapshot.lifecycle,
            shares: snapshot.shares,
            loot: snapshot.loot,
            proposals: snapshot.proposals,
            gateway: snapshot.gateway,
            sale_intent: snapshot.sale_intent,
            modules: HashMap::new(),
        })
    }
}
