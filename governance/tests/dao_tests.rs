//! Full lifecycle tests for the governance engine, driven by a
//! deterministic clock and an in-memory funding asset.

use acre_crypto::{delegation_digest, derive_address, keypair_from_seed, sign_message, vote_digest};
use acre_governance::{
    Dao, Extension, ExtensionHost, GovernanceError, InitParams, ProcessOutcome, ProposalKind,
    FOUNDER_SHARES, GRACE_PERIOD_SLOT,
};
use acre_loot::FundingAsset;
use acre_nullables::{NullClock, NullFundingAsset};
use acre_types::{
    ErrorKind, KeyPair, LifecycleState, MemberAddress, ProposalStatus, Timestamp, VoteKind,
    MIN_VOTE_PERIOD_SECS,
};
use std::cell::RefCell;
use std::rc::Rc;

const VOTE: u64 = MIN_VOTE_PERIOD_SECS;

struct Actor {
    keys: KeyPair,
    addr: MemberAddress,
}

fn actor(seed: u8) -> Actor {
    let keys = keypair_from_seed(&[seed; 32]);
    let addr = derive_address(&keys.public);
    Actor { keys, addr }
}

struct Harness {
    dao: Dao,
    dai: NullFundingAsset,
    clock: NullClock,
    founder: Actor,
    alice: Actor,
    bob: Actor,
}

fn setup_with(params: InitParams) -> Harness {
    let clock = NullClock::new(1_000_000);
    let dao_addr = derive_address(&keypair_from_seed(&[100; 32]).public);
    let asset_addr = derive_address(&keypair_from_seed(&[101; 32]).public);
    let mut dai = NullFundingAsset::new("DAI", &asset_addr);
    let founder = actor(1);
    let alice = actor(2);
    let bob = actor(3);
    for a in [&founder, &alice, &bob] {
        dai.credit(&a.addr, 1_000_000);
    }
    let dao = Dao::init(params, dao_addr, founder.addr.clone(), clock.now()).unwrap();
    Harness {
        dao,
        dai,
        clock,
        founder,
        alice,
        bob,
    }
}

fn setup() -> Harness {
    setup_with(InitParams::new("ACRE", "ACRE", "DOCS"))
}

/// Founder votes yes, the windows elapse, and the proposal is processed.
fn yes_and_process(h: &mut Harness, id: u64) -> ProcessOutcome {
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap()
}

fn no_rows() -> (Vec<MemberAddress>, Vec<u128>, Vec<Vec<u8>>) {
    (vec![], vec![], vec![])
}

// ── Test extension modules ──────────────────────────────────────────────

type CallLog = Rc<RefCell<Vec<(MemberAddress, u128, Vec<u8>)>>>;

/// Records every gateway crossing it sees.
#[derive(Default)]
struct RecordingExtension {
    calls: CallLog,
    setups: Rc<RefCell<Vec<Vec<u8>>>>,
    contributions: Rc<RefCell<Vec<(MemberAddress, u128)>>>,
}

impl Extension for RecordingExtension {
    fn set_up(
        &mut self,
        _host: &mut ExtensionHost<'_>,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        self.setups.borrow_mut().push(payload.to_vec());
        Ok(())
    }

    fn handle_call(
        &mut self,
        _host: &mut ExtensionHost<'_>,
        caller: &MemberAddress,
        amount: u128,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        self.calls
            .borrow_mut()
            .push((caller.clone(), amount, payload.to_vec()));
        Ok(())
    }

    fn on_loot_contribution(
        &mut self,
        _host: &mut ExtensionHost<'_>,
        member: &MemberAddress,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        self.contributions.borrow_mut().push((member.clone(), amount));
        Ok(())
    }
}

/// Always fails — the "address that always reverts".
struct RevertingExtension;

impl Extension for RevertingExtension {
    fn handle_call(
        &mut self,
        _host: &mut ExtensionHost<'_>,
        _caller: &MemberAddress,
        _amount: u128,
        _payload: &[u8],
    ) -> Result<(), GovernanceError> {
        Err(GovernanceError::ModuleFailed("always reverts".into()))
    }
}

/// Tries to re-enter the gateway from inside a call.
struct ReentrantExtension {
    observed: Rc<RefCell<Option<GovernanceError>>>,
}

impl Extension for ReentrantExtension {
    fn handle_call(
        &mut self,
        host: &mut ExtensionHost<'_>,
        _caller: &MemberAddress,
        _amount: u128,
        _payload: &[u8],
    ) -> Result<(), GovernanceError> {
        let target = host.dao_address().clone();
        let err = host.call_extension(&target, 0, &[]).unwrap_err();
        *self.observed.borrow_mut() = Some(err);
        Ok(())
    }
}

/// Mints shares to a fixed recipient through the privileged callback.
struct MintingExtension {
    to: MemberAddress,
    amount: u128,
}

impl Extension for MintingExtension {
    fn handle_call(
        &mut self,
        host: &mut ExtensionHost<'_>,
        _caller: &MemberAddress,
        _amount: u128,
        _payload: &[u8],
    ) -> Result<(), GovernanceError> {
        host.mint_shares(&self.to, self.amount)
    }
}

/// A capital-raise module: members contribute toward a goal, and the
/// completion pass mints shares pro-rata to contribution/goal.
#[derive(Default)]
struct CrowdsaleExtension {
    goal: u128,
    share_pool: u128,
    total: u128,
    contributions: Vec<(MemberAddress, u128)>,
    distributed: Rc<RefCell<bool>>,
}

impl Extension for CrowdsaleExtension {
    fn set_up(
        &mut self,
        _host: &mut ExtensionHost<'_>,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        // Payload: goal (16 bytes BE) + share pool (16 bytes BE).
        let goal: [u8; 16] = payload[..16]
            .try_into()
            .map_err(|_| GovernanceError::ModuleFailed("bad setup payload".into()))?;
        let pool: [u8; 16] = payload[16..32]
            .try_into()
            .map_err(|_| GovernanceError::ModuleFailed("bad setup payload".into()))?;
        self.goal = u128::from_be_bytes(goal);
        self.share_pool = u128::from_be_bytes(pool);
        Ok(())
    }

    fn handle_call(
        &mut self,
        host: &mut ExtensionHost<'_>,
        caller: &MemberAddress,
        amount: u128,
        _payload: &[u8],
    ) -> Result<(), GovernanceError> {
        self.contributions.push((caller.clone(), amount));
        self.total += amount;
        if self.total >= self.goal && !*self.distributed.borrow() {
            for (member, contributed) in &self.contributions {
                let minted = self.share_pool * contributed / self.goal;
                host.mint_shares(member, minted)?;
            }
            *self.distributed.borrow_mut() = true;
        }
        Ok(())
    }
}

fn crowdsale_setup_payload(goal: u128, share_pool: u128) -> Vec<u8> {
    let mut payload = goal.to_be_bytes().to_vec();
    payload.extend_from_slice(&share_pool.to_be_bytes());
    payload
}

// ── Initialization ──────────────────────────────────────────────────────

#[test]
fn init_sets_configuration_and_founder_shares() {
    let h = setup();
    assert_eq!(h.dao.name(), "ACRE");
    assert_eq!(h.dao.symbol(), "ACRE");
    assert_eq!(h.dao.docs(), "DOCS");
    assert_eq!(h.dao.quorum(), 0);
    assert_eq!(h.dao.supermajority(), 60);
    assert_eq!(h.dao.balance_of(&h.founder.addr), FOUNDER_SHARES);
    assert_eq!(h.dao.total_supply(), FOUNDER_SHARES);
    assert_eq!(h.dao.manager(), &h.founder.addr);
    assert_eq!(h.dao.current_state(), LifecycleState::Funding);
    assert_eq!(h.dao.vote_kind_for(ProposalKind::Manager), VoteKind::SimpleMajorityQuorum);
    assert_eq!(h.dao.vote_period_for(ProposalKind::Call), VOTE);
    assert_eq!(h.dao.grace_period(), 0);
    assert!(!h.dao.paused());
    assert!(h.dao.is_conserved());
}

#[test]
fn init_rejects_out_of_range_vote_kind() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.vote_kinds[12] = 9;
    let dao_addr = derive_address(&keypair_from_seed(&[100; 32]).public);
    let err = Dao::init(params, dao_addr, actor(1).addr, Timestamp::new(1)).unwrap_err();
    assert!(matches!(err, GovernanceError::UnknownVoteKind(9)));
    assert_eq!(err.category(), ErrorKind::Validation);
}

#[test]
fn init_rejects_out_of_range_periods() {
    let dao_addr = derive_address(&keypair_from_seed(&[100; 32]).public);
    for bad in [0, VOTE - 1, 2_592_001] {
        let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
        params.vote_periods_secs[2] = bad;
        let err = Dao::init(params, dao_addr.clone(), actor(1).addr, Timestamp::new(1)).unwrap_err();
        assert_eq!(err.category(), ErrorKind::Validation);
    }
}

#[test]
fn init_rejects_out_of_range_thresholds() {
    let dao_addr = derive_address(&keypair_from_seed(&[100; 32]).public);
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.quorum_pct = 101;
    assert!(Dao::init(params, dao_addr.clone(), actor(1).addr, Timestamp::new(1)).is_err());
    for bad in [51, 101] {
        let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
        params.supermajority_pct = bad;
        assert!(Dao::init(params, dao_addr.clone(), actor(1).addr, Timestamp::new(1)).is_err());
    }
}

#[test]
fn init_rejects_mismatched_extension_arrays() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.extensions = vec![actor(9).addr];
    params.extensions_setup = vec![];
    let dao_addr = derive_address(&keypair_from_seed(&[100; 32]).public);
    let err = Dao::init(params, dao_addr, actor(1).addr, Timestamp::new(1)).unwrap_err();
    assert!(matches!(err, GovernanceError::ExtensionSetupMismatch { .. }));
}

// ── Sponsorship and cancellation ────────────────────────────────────────

#[test]
fn member_proposal_is_auto_sponsored() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "NEW DOCS", &t, &v, &p, h.clock.now())
        .unwrap();
    assert_eq!(id, 1);
    assert_eq!(h.dao.proposal_count(), 1);
    assert_eq!(h.dao.proposal(id).unwrap().status, ProposalStatus::Active);
}

#[test]
fn nonmember_proposal_waits_for_sponsorship() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.alice.addr, 6, "NEW DOCS", &t, &v, &p, h.clock.now())
        .unwrap();
    assert_eq!(h.dao.proposal(id).unwrap().status, ProposalStatus::Draft);
    // Votes are rejected until the clock starts.
    let err = h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap_err();
    assert!(matches!(err, GovernanceError::NotSponsored(_)));
    // A non-member cannot sponsor.
    let err = h
        .dao
        .sponsor_proposal(&h.bob.addr, id, h.clock.now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorKind::Authorization);
    // A member can.
    h.dao.sponsor_proposal(&h.founder.addr, id, h.clock.now()).unwrap();
    assert_eq!(h.dao.proposal(id).unwrap().status, ProposalStatus::Active);
    // And cannot sponsor twice.
    let err = h
        .dao
        .sponsor_proposal(&h.founder.addr, id, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::AlreadySponsored(_)));
}

#[test]
fn sponsoring_missing_or_processed_proposal_fails() {
    let mut h = setup();
    let err = h
        .dao
        .sponsor_proposal(&h.founder.addr, 42, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::UnknownProposal(42)));

    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    yes_and_process(&mut h, id);
    let err = h
        .dao
        .sponsor_proposal(&h.founder.addr, id, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::ProposalTerminal(_)));
}

#[test]
fn cancellation_rules() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    // Draft proposal by a non-member.
    let id = h
        .dao
        .propose(&h.alice.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    // Only the proposer may cancel.
    let err = h.dao.cancel_proposal(&h.bob.addr, id).unwrap_err();
    assert!(matches!(err, GovernanceError::NotProposer));
    assert_eq!(err.category(), ErrorKind::Authorization);
    // Nonexistent proposal.
    assert!(matches!(
        h.dao.cancel_proposal(&h.alice.addr, 99).unwrap_err(),
        GovernanceError::UnknownProposal(99)
    ));
    // The proposer cancels; the record is terminal.
    h.dao.cancel_proposal(&h.alice.addr, id).unwrap();
    assert_eq!(h.dao.proposal(id).unwrap().status, ProposalStatus::Cancelled);

    // A sponsored proposal can no longer be cancelled.
    let id2 = h
        .dao
        .propose(&h.founder.addr, 6, "Y", &t, &v, &p, h.clock.now())
        .unwrap();
    let err = h.dao.cancel_proposal(&h.founder.addr, id2).unwrap_err();
    assert!(matches!(err, GovernanceError::AlreadySponsored(_)));
}

#[test]
fn cancelled_draft_never_obstructs_processing() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    // Draft #1 (never sponsored), active #2.
    h.dao
        .propose(&h.alice.addr, 6, "DRAFT", &t, &v, &p, h.clock.now())
        .unwrap();
    let id2 = h
        .dao
        .propose(&h.founder.addr, 6, "LIVE", &t, &v, &p, h.clock.now())
        .unwrap();
    assert_eq!(yes_and_process(&mut h, id2), ProcessOutcome::Passed);
}

// ── Voting ──────────────────────────────────────────────────────────────

#[test]
fn double_vote_rejected() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    let err = h.dao.vote(&h.founder.addr, id, false, h.clock.now()).unwrap_err();
    assert!(matches!(err, GovernanceError::AlreadyVoted(_)));
    assert_eq!(err.category(), ErrorKind::State);
}

#[test]
fn vote_window_is_half_open() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    // One second before the close: accepted.
    h.clock.advance(VOTE - 1);
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    // Exactly at voting_end: rejected.
    h.clock.advance(1);
    h.dao.transfer_shares(&h.founder.addr, &h.alice.addr, 100, h.clock.now()).unwrap();
    let err = h.dao.vote(&h.alice.addr, id, true, h.clock.now()).unwrap_err();
    assert!(matches!(err, GovernanceError::VotingClosed(_)));
}

#[test]
fn nonmember_cannot_vote() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    let err = h.dao.vote(&h.alice.addr, id, true, h.clock.now()).unwrap_err();
    assert!(matches!(err, GovernanceError::NotMember(_)));
    assert_eq!(err.category(), ErrorKind::Authorization);
}

#[test]
fn vote_weight_is_current_delegated_power() {
    let mut h = setup();
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 1000, h.clock.now())
        .unwrap();
    h.dao.delegate(&h.alice.addr, &h.founder.addr, h.clock.now());
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    // Founder carries their own 4000 plus alice's delegated 1000.
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    assert_eq!(h.dao.proposal(id).unwrap().yes_weight, 5000);
    // Alice still holds the right to vote, but with zero weight.
    h.dao.vote(&h.alice.addr, id, false, h.clock.now()).unwrap();
    assert_eq!(h.dao.proposal(id).unwrap().no_weight, 0);
    assert!(h.dao.proposal(id).unwrap().voters.contains(&h.alice.addr));
}

// ── Processing ──────────────────────────────────────────────────────────

#[test]
fn processing_boundaries_without_grace() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE - 1);
    let err = h
        .dao
        .process_proposal(id, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::VotingStillOpen { .. }));
    // With zero grace, processing opens exactly at voting_end.
    h.clock.advance(1);
    assert_eq!(
        h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Passed
    );
}

#[test]
fn processing_waits_for_grace_period() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.grace_period_secs = 30;
    let mut h = setup_with(params);
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    // voting_end + grace - 1: still in grace.
    h.clock.advance(VOTE + 29);
    let err = h
        .dao
        .process_proposal(id, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::GraceNotElapsed { .. }));
    assert_eq!(err.category(), ErrorKind::State);
    // voting_end + grace: processable.
    h.clock.advance(1);
    assert_eq!(
        h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Passed
    );
}

#[test]
fn manager_proposal_end_to_end() {
    // Spec scenario: quorum 0, supermajority 60, 12h windows, one yes
    // vote, advance 43201s, process; the manager changes hands.
    let mut h = setup();
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            9,
            "NEW MANAGER",
            &[h.bob.addr.clone()],
            &[0],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    assert_eq!(
        h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Passed
    );
    assert_eq!(h.dao.manager(), &h.bob.addr);
}

#[test]
fn defeated_vote_processes_with_no_side_effect() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "NEW DOCS", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id, false, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    assert_eq!(
        h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Defeated
    );
    assert_eq!(h.dao.docs(), "DOCS");
    assert_eq!(h.dao.proposal(id).unwrap().status, ProposalStatus::Processed);
    // Terminal records cannot be processed again.
    let err = h
        .dao
        .process_proposal(id, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::ProposalTerminal(_)));
}

#[test]
fn processing_missing_proposal_fails() {
    let mut h = setup();
    let err = h
        .dao
        .process_proposal(7, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::UnknownProposal(7)));
}

#[test]
fn quorum_gates_low_turnout() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.quorum_pct = 50;
    let mut h = setup_with(params);
    // Founder keeps 2000 of 5000: a lone yes is 40% turnout.
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 3000, h.clock.now())
        .unwrap();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "NEW DOCS", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    assert_eq!(
        h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Defeated
    );

    // With alice participating, turnout is 100% and the vote carries.
    let id2 = h
        .dao
        .propose(&h.founder.addr, 6, "NEW DOCS", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id2, true, h.clock.now()).unwrap();
    h.dao.vote(&h.alice.addr, id2, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    assert_eq!(
        h.dao.process_proposal(id2, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Passed
    );
    assert_eq!(h.dao.docs(), "NEW DOCS");
}

#[test]
fn supermajority_gates_designated_kinds() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.supermajority_pct = 61;
    params.vote_kinds[9] = 3; // Manager: supermajority + quorum
    let mut h = setup_with(params);
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 2000, h.clock.now())
        .unwrap();
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            9,
            "NEW MANAGER",
            &[h.bob.addr.clone()],
            &[0],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    // 3000 yes / 2000 no = 60% yes, below the 61% bar.
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.dao.vote(&h.alice.addr, id, false, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    assert_eq!(
        h.dao.process_proposal(id, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Defeated
    );
    assert_eq!(h.dao.manager(), &h.founder.addr);
}

#[test]
fn fifo_order_is_enforced() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id1 = h
        .dao
        .propose(&h.founder.addr, 6, "ONE", &t, &v, &p, h.clock.now())
        .unwrap();
    let id2 = h
        .dao
        .propose(&h.founder.addr, 6, "TWO", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id1, true, h.clock.now()).unwrap();
    h.dao.vote(&h.founder.addr, id2, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    let err = h
        .dao
        .process_proposal(id2, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::OutOfOrder { blocked: 2, blocking: 1 }
    ));
    h.dao.process_proposal(id1, &mut h.dai, h.clock.now()).unwrap();
    h.dao.process_proposal(id2, &mut h.dai, h.clock.now()).unwrap();
    assert_eq!(h.dao.docs(), "TWO");
}

#[test]
fn escape_clears_a_stuck_proposal() {
    // Spec scenario: #1 targets a module that always reverts and blocks
    // #2; an escape proposal removes #1 and #2 then processes.
    let mut h = setup();
    let reverting = actor(50);
    h.dao
        .register_extension(&reverting.addr, Box::new(RevertingExtension), &mut h.dai, h.clock.now())
        .unwrap();
    let id1 = h
        .dao
        .propose(
            &h.founder.addr,
            0,
            "STUCK CALL",
            &[reverting.addr.clone()],
            &[0],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    let (t, v, p) = no_rows();
    let id2 = h
        .dao
        .propose(&h.founder.addr, 6, "AFTER", &t, &v, &p, h.clock.now())
        .unwrap();
    h.dao.vote(&h.founder.addr, id1, true, h.clock.now()).unwrap();
    h.dao.vote(&h.founder.addr, id2, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);

    // The stuck proposal fails its dispatch and stays active.
    let err = h
        .dao
        .process_proposal(id1, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::ModuleFailed(_)));
    assert_eq!(h.dao.proposal(id1).unwrap().status, ProposalStatus::Active);
    // It blocks everything behind it.
    let err = h
        .dao
        .process_proposal(id2, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::OutOfOrder { .. }));

    // An escape proposal is exempt from the ordering precondition.
    let id3 = h
        .dao
        .propose(
            &h.founder.addr,
            12,
            "ESCAPE 1",
            &[h.founder.addr.clone()],
            &[id1 as u128],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    h.dao.vote(&h.founder.addr, id3, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    assert_eq!(
        h.dao.process_proposal(id3, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Passed
    );
    assert_eq!(h.dao.proposal(id1).unwrap().status, ProposalStatus::Escaped);

    // The hole is sanctioned; the queue moves again.
    assert_eq!(
        h.dao.process_proposal(id2, &mut h.dai, h.clock.now()).unwrap(),
        ProcessOutcome::Passed
    );
    assert_eq!(h.dao.docs(), "AFTER");
}

// ── Per-kind effects ────────────────────────────────────────────────────

#[test]
fn vote_period_and_grace_slots() {
    let mut h = setup();
    let filler = h.founder.addr.clone();
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            1,
            "PERIOD",
            &[filler.clone(), filler.clone()],
            &[3, 90_000],
            &[vec![], vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(h.dao.vote_period_for(ProposalKind::Supermajority), 90_000);

    let id = h
        .dao
        .propose(
            &h.founder.addr,
            1,
            "GRACE",
            &[filler.clone(), filler],
            &[GRACE_PERIOD_SLOT, 3600],
            &[vec![], vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(h.dao.grace_period(), 3600);
}

#[test]
fn quorum_supermajority_and_vote_type_proposals() {
    let mut h = setup();
    let filler = h.founder.addr.clone();
    let id = h
        .dao
        .propose(&h.founder.addr, 2, "QUORUM", &[filler.clone()], &[20], &[vec![]], h.clock.now())
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(h.dao.quorum(), 20);

    let id = h
        .dao
        .propose(&h.founder.addr, 3, "SUPER", &[filler.clone()], &[80], &[vec![]], h.clock.now())
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(h.dao.supermajority(), 80);

    let id = h
        .dao
        .propose(
            &h.founder.addr,
            4,
            "TYPE",
            &[filler.clone(), filler],
            &[9, 3],
            &[vec![], vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(
        h.dao.vote_kind_for(ProposalKind::Manager),
        VoteKind::SupermajorityQuorum
    );
}

#[test]
fn docs_proposal_replaces_docs() {
    let mut h = setup();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "AMENDED CHARTER", &t, &v, &p, h.clock.now())
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(h.dao.docs(), "AMENDED CHARTER");
}

#[test]
fn extension_proposal_toggles_whitelist_and_delivers_setup() {
    let mut h = setup();
    let ext = actor(60);
    let setups = Rc::new(RefCell::new(Vec::new()));
    let module = RecordingExtension {
        setups: setups.clone(),
        ..Default::default()
    };
    h.dao
        .register_extension(&ext.addr, Box::new(module), &mut h.dai, h.clock.now())
        .unwrap();
    assert!(!h.dao.is_extension(&ext.addr));

    let id = h
        .dao
        .propose(
            &h.founder.addr,
            5,
            "WHITELIST",
            &[ext.addr.clone()],
            &[1],
            &[vec![0xAA, 0xBB]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    assert!(h.dao.is_extension(&ext.addr));
    assert_eq!(setups.borrow().as_slice(), &[vec![0xAA, 0xBB]]);

    // Toggle off.
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            5,
            "REMOVE",
            &[ext.addr.clone()],
            &[0],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    assert!(!h.dao.is_extension(&ext.addr));
}

#[test]
fn sell_records_intent_without_moving_funds() {
    let mut h = setup();
    let dao_addr = h.dao.address().clone();
    h.dai.credit(&dao_addr, 10_000);
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            7,
            "LIST FOR SALE",
            &[h.founder.addr.clone()],
            &[75_000],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    let intent = h.dao.sale_intent().unwrap();
    assert_eq!(intent.price, 75_000);
    assert_eq!(h.dai.balance_of(&dao_addr), 10_000);
}

#[test]
fn purchase_releases_treasury_funds_to_manager() {
    let mut h = setup();
    let dao_addr = h.dao.address().clone();
    h.dai.credit(&dao_addr, 10_000);
    let before = h.dai.balance_of(&h.founder.addr);
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            8,
            "BUY",
            &[h.founder.addr.clone()],
            &[9_000],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    assert_eq!(h.dai.balance_of(&dao_addr), 1_000);
    assert_eq!(h.dai.balance_of(&h.founder.addr), before + 9_000);
}

#[test]
fn purchase_beyond_treasury_sticks() {
    let mut h = setup();
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            8,
            "BUY",
            &[h.founder.addr.clone()],
            &[9_000],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    let err = h
        .dao
        .process_proposal(id, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorKind::InsufficientBalance);
    assert_eq!(h.dao.proposal(id).unwrap().status, ProposalStatus::Active);
}

// ── Extension gateway ───────────────────────────────────────────────────

#[test]
fn call_extension_requires_whitelisting() {
    let mut h = setup();
    let ext = actor(61);
    h.dao
        .register_extension(&ext.addr, Box::new(RecordingExtension::default()), &mut h.dai, h.clock.now())
        .unwrap();
    let err = h
        .dao
        .call_extension(&h.founder.addr, &ext.addr, 0, &[], &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NotWhitelisted(_)));
    assert_eq!(err.category(), ErrorKind::Authorization);
}

#[test]
fn call_extension_reaches_whitelisted_module() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    let ext = actor(62);
    params.extensions = vec![ext.addr.clone()];
    params.extensions_setup = vec![vec![]];
    let mut h = setup_with(params);
    let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
    let module = RecordingExtension {
        calls: calls.clone(),
        ..Default::default()
    };
    h.dao
        .register_extension(&ext.addr, Box::new(module), &mut h.dai, h.clock.now())
        .unwrap();
    h.dao
        .call_extension(&h.alice.addr, &ext.addr, 77, &[1, 2, 3], &mut h.dai, h.clock.now())
        .unwrap();
    assert_eq!(
        calls.borrow().as_slice(),
        &[(h.alice.addr.clone(), 77, vec![1, 2, 3])]
    );
}

#[test]
fn reentrant_gateway_call_fails_fast() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    let ext = actor(63);
    params.extensions = vec![ext.addr.clone()];
    params.extensions_setup = vec![vec![]];
    let mut h = setup_with(params);
    let observed = Rc::new(RefCell::new(None));
    let module = ReentrantExtension {
        observed: observed.clone(),
    };
    h.dao
        .register_extension(&ext.addr, Box::new(module), &mut h.dai, h.clock.now())
        .unwrap();
    // The outer call succeeds; the nested attempt observed a state error.
    h.dao
        .call_extension(&h.founder.addr, &ext.addr, 0, &[], &mut h.dai, h.clock.now())
        .unwrap();
    let err = observed.borrow_mut().take().unwrap();
    assert!(matches!(err, GovernanceError::Reentrancy));
    assert_eq!(err.category(), ErrorKind::State);
    // The gateway is usable again afterwards.
    h.dao
        .call_extension(&h.founder.addr, &ext.addr, 0, &[], &mut h.dai, h.clock.now())
        .unwrap();
}

#[test]
fn unwhitelisted_module_cannot_reach_privileged_callbacks() {
    let mut h = setup();
    let ext = actor(64);
    let module = MintingExtension {
        to: h.alice.addr.clone(),
        amount: 1000,
    };
    h.dao
        .register_extension(&ext.addr, Box::new(module), &mut h.dai, h.clock.now())
        .unwrap();
    // A Call proposal reaches any registered module, but the privileged
    // mint path stays closed without whitelisting.
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            0,
            "CALL",
            &[ext.addr.clone()],
            &[0],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    h.dao.vote(&h.founder.addr, id, true, h.clock.now()).unwrap();
    h.clock.advance(VOTE + 1);
    let err = h
        .dao
        .process_proposal(id, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::UnprivilegedCallback));
    assert_eq!(h.dao.balance_of(&h.alice.addr), 0);
    assert_eq!(h.dao.total_supply(), FOUNDER_SHARES);
}

#[test]
fn crowdsale_mints_pro_rata_with_truncation_artifact() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    let sale = actor(65);
    params.extensions = vec![sale.addr.clone()];
    params.extensions_setup = vec![crowdsale_setup_payload(150_000, 95_000)];
    let mut h = setup_with(params);
    let distributed = Rc::new(RefCell::new(false));
    let module = CrowdsaleExtension {
        distributed: distributed.clone(),
        ..Default::default()
    };
    h.dao
        .register_extension(&sale.addr, Box::new(module), &mut h.dai, h.clock.now())
        .unwrap();

    // Two members contribute until the goal is met.
    h.dao
        .call_extension(&h.alice.addr, &sale.addr, 65_000, &[], &mut h.dai, h.clock.now())
        .unwrap();
    assert!(!*distributed.borrow());
    assert_eq!(h.dao.balance_of(&h.alice.addr), 0);
    h.dao
        .call_extension(&h.bob.addr, &sale.addr, 85_000, &[], &mut h.dai, h.clock.now())
        .unwrap();
    assert!(*distributed.borrow());

    // floor(95000 * 65000 / 150000) = 41166, floor(95000 * 85000 / 150000)
    // = 53833: one unit short of the 95000 pool. The shortfall is an
    // accepted artifact of floor truncation, not a bug.
    assert_eq!(h.dao.balance_of(&h.alice.addr), 41_166);
    assert_eq!(h.dao.balance_of(&h.bob.addr), 53_833);
    assert_eq!(h.dao.total_supply(), FOUNDER_SHARES + 95_000 - 1);
    assert!(h.dao.is_conserved());
}

#[test]
fn capital_call_proposal_and_loot_contributions() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    let capcall = actor(66);
    params.extensions = vec![capcall.addr.clone()];
    params.extensions_setup = vec![vec![]];
    let mut h = setup_with(params);
    let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
    let contributions = Rc::new(RefCell::new(Vec::new()));
    let module = RecordingExtension {
        calls: calls.clone(),
        contributions: contributions.clone(),
        ..Default::default()
    };
    h.dao
        .register_extension(&capcall.addr, Box::new(module), &mut h.dai, h.clock.now())
        .unwrap();

    // A CapitalCall proposal is delegated through the gateway.
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            10,
            "RAISE",
            &[capcall.addr.clone()],
            &[50_000],
            &[vec![7]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    {
        let log = calls.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, h.dao.address().clone());
        assert_eq!(log[0].1, 50_000);
    }

    // Give the founder loot to contribute: a dividend while Funding.
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.founder.keys,
        h.dao.address(),
        10_000,
        h.clock.now().plus(3600),
    );
    h.dao
        .deposit_dividend(10_000, &auth, &mut h.dai, h.clock.now())
        .unwrap();
    assert_eq!(h.dao.loot_balance_of(&h.founder.addr), 10_000);

    // Contributing burns loot and notifies the module.
    h.dao
        .contribute_loot(&h.founder.addr, 4_000, &capcall.addr, &mut h.dai, h.clock.now())
        .unwrap();
    assert_eq!(h.dao.loot_balance_of(&h.founder.addr), 6_000);
    assert_eq!(h.dao.total_loot(), 6_000);
    assert_eq!(
        contributions.borrow().as_slice(),
        &[(h.founder.addr.clone(), 4_000)]
    );

    // Beyond the balance, or to a non-whitelisted target: rejected.
    let err = h
        .dao
        .contribute_loot(&h.founder.addr, 6_001, &capcall.addr, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorKind::InsufficientBalance);
    let err = h
        .dao
        .contribute_loot(&h.founder.addr, 100, &actor(67).addr, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NotWhitelisted(_)));
}

// ── Treasury: dividends and withdrawal ──────────────────────────────────

#[test]
fn dividend_roundtrip_during_funding() {
    let mut h = setup();
    // Share split: founder 2500, alice 1600, bob 900.
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 1600, h.clock.now())
        .unwrap();
    h.dao
        .transfer_shares(&h.founder.addr, &h.bob.addr, 900, h.clock.now())
        .unwrap();
    let dao_addr = h.dao.address().clone();
    let treasury_before = h.dai.balance_of(&dao_addr);

    let dividend = 1_001;
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.founder.keys,
        &dao_addr,
        dividend,
        h.clock.now().plus(3600),
    );
    h.dao
        .deposit_dividend(dividend, &auth, &mut h.dai, h.clock.now())
        .unwrap();

    // Pro-rata by share balance, floor-truncated per recipient.
    assert_eq!(h.dao.loot_balance_of(&h.founder.addr), 500);
    assert_eq!(h.dao.loot_balance_of(&h.alice.addr), 320);
    assert_eq!(h.dao.loot_balance_of(&h.bob.addr), 180);
    assert_eq!(h.dao.total_loot(), dividend - 1);
    assert!(h.dao.is_conserved());

    // Every member redeems in full; the treasury returns to its
    // pre-deposit value plus the truncation dust.
    h.dao.withdraw(&h.founder.addr, 500, &mut h.dai).unwrap();
    h.dao.withdraw(&h.alice.addr, 320, &mut h.dai).unwrap();
    h.dao.withdraw(&h.bob.addr, 180, &mut h.dai).unwrap();
    assert_eq!(h.dao.total_loot(), 0);
    assert_eq!(h.dai.balance_of(&dao_addr), treasury_before + 1);
}

#[test]
fn dividend_uses_loot_base_while_active() {
    let mut h = setup();
    let dao_addr = h.dao.address().clone();
    // Funding-phase dividend seeds loot by share balance (all founder).
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.founder.keys,
        &dao_addr,
        1_000,
        h.clock.now().plus(3600),
    );
    h.dao.deposit_dividend(1_000, &auth, &mut h.dai, h.clock.now()).unwrap();
    assert_eq!(h.dao.loot_balance_of(&h.founder.addr), 1_000);

    // Hand most shares to alice, then go Active: the next dividend must
    // follow loot (all founder), not shares (mostly alice).
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 4_000, h.clock.now())
        .unwrap();
    h.dao.set_state(&h.founder.addr, LifecycleState::Active).unwrap();
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.founder.keys,
        &dao_addr,
        600,
        h.clock.now().plus(3600),
    );
    h.dao.deposit_dividend(600, &auth, &mut h.dai, h.clock.now()).unwrap();
    assert_eq!(h.dao.loot_balance_of(&h.founder.addr), 1_600);
    assert_eq!(h.dao.loot_balance_of(&h.alice.addr), 0);
}

#[test]
fn dividend_requires_manager_permit() {
    let mut h = setup();
    let dao_addr = h.dao.address().clone();
    // Permit signed by a non-manager owner.
    let auth = h.dai.sign_permit(
        &h.alice.addr,
        &h.alice.keys,
        &dao_addr,
        1_000,
        h.clock.now().plus(3600),
    );
    let err = h
        .dao
        .deposit_dividend(1_000, &auth, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NotManager));

    // Manager identity but a forged signature.
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.alice.keys,
        &dao_addr,
        1_000,
        h.clock.now().plus(3600),
    );
    let err = h
        .dao
        .deposit_dividend(1_000, &auth, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorKind::Signature);
    assert_eq!(h.dao.total_loot(), 0);
}

#[test]
fn dividends_close_after_dissolution() {
    let mut h = setup();
    h.dao
        .set_state(&h.founder.addr, LifecycleState::Dissolved)
        .unwrap();
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.founder.keys,
        h.dao.address(),
        100,
        h.clock.now().plus(3600),
    );
    let err = h
        .dao
        .deposit_dividend(100, &auth, &mut h.dai, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::DividendsClosed(_)));
}

#[test]
fn withdraw_rejects_excess_loot() {
    let mut h = setup();
    let err = h.dao.withdraw(&h.founder.addr, 1, &mut h.dai).unwrap_err();
    assert_eq!(err.category(), ErrorKind::InsufficientBalance);
}

#[test]
fn set_state_is_manager_only_and_forward_only() {
    let mut h = setup();
    let err = h
        .dao
        .set_state(&h.alice.addr, LifecycleState::Active)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NotManager));

    h.dao.set_state(&h.founder.addr, LifecycleState::Active).unwrap();
    assert_eq!(h.dao.current_state(), LifecycleState::Active);
    let err = h
        .dao
        .set_state(&h.founder.addr, LifecycleState::Funding)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::LifecycleBackward { .. }));
    assert_eq!(err.category(), ErrorKind::State);
}

// ── Share surface through the engine ────────────────────────────────────

#[test]
fn paused_shares_block_transfers_but_not_governance_mints() {
    let mut params = InitParams::new("ACRE", "ACRE", "DOCS");
    params.paused = true;
    let sale = actor(68);
    params.extensions = vec![sale.addr.clone()];
    params.extensions_setup = vec![crowdsale_setup_payload(1_000, 1_000)];
    let mut h = setup_with(params);
    let err = h
        .dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 1, h.clock.now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorKind::State);

    // The extension mint path ignores the pause flag.
    h.dao
        .register_extension(&sale.addr, Box::new(CrowdsaleExtension::default()), &mut h.dai, h.clock.now())
        .unwrap();
    h.dao
        .call_extension(&h.alice.addr, &sale.addr, 1_000, &[], &mut h.dai, h.clock.now())
        .unwrap();
    assert_eq!(h.dao.balance_of(&h.alice.addr), 1_000);
}

#[test]
fn prior_votes_rejects_non_past_lookups() {
    let h = setup();
    let err = h
        .dao
        .prior_votes(&h.founder.addr, h.clock.now(), h.clock.now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorKind::Validation);
    let earlier = Timestamp::new(h.clock.now().as_secs() - 1);
    assert_eq!(
        h.dao.prior_votes(&h.founder.addr, earlier, h.clock.now()).unwrap(),
        0
    );
}

// ── Signed messages ─────────────────────────────────────────────────────

#[test]
fn vote_by_sig_accepts_a_valid_signature() {
    let mut h = setup();
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 1_000, h.clock.now())
        .unwrap();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    let digest = vote_digest(h.dao.domain(), &h.alice.addr, id, true);
    let sig = sign_message(&digest, &h.alice.keys.private);
    h.dao
        .vote_by_sig(&h.alice.addr, id, true, &sig, h.clock.now())
        .unwrap();
    assert_eq!(h.dao.proposal(id).unwrap().yes_weight, 1_000);

    // Replaying the same signed vote is a double vote.
    let err = h
        .dao
        .vote_by_sig(&h.alice.addr, id, true, &sig, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::AlreadyVoted(_)));
}

#[test]
fn vote_by_sig_rejects_mismatched_signatures() {
    let mut h = setup();
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 1_000, h.clock.now())
        .unwrap();
    let (t, v, p) = no_rows();
    let id = h
        .dao
        .propose(&h.founder.addr, 6, "X", &t, &v, &p, h.clock.now())
        .unwrap();
    // Signed by the wrong key.
    let digest = vote_digest(h.dao.domain(), &h.alice.addr, id, true);
    let sig = sign_message(&digest, &h.bob.keys.private);
    let err = h
        .dao
        .vote_by_sig(&h.alice.addr, id, true, &sig, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidSignature));
    assert_eq!(err.category(), ErrorKind::Signature);

    // Signed over different vote contents.
    let digest = vote_digest(h.dao.domain(), &h.alice.addr, id, false);
    let sig = sign_message(&digest, &h.alice.keys.private);
    let err = h
        .dao
        .vote_by_sig(&h.alice.addr, id, true, &sig, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidSignature));
    assert_eq!(h.dao.proposal(id).unwrap().yes_weight, 0);
}

#[test]
fn delegate_by_sig_verifies_nonce_expiry_and_signature() {
    let mut h = setup();
    h.dao
        .transfer_shares(&h.founder.addr, &h.alice.addr, 1_000, h.clock.now())
        .unwrap();
    let expiry = h.clock.now().plus(3600);
    let digest = delegation_digest(h.dao.domain(), &h.bob.addr, 0, expiry);
    let sig = sign_message(&digest, &h.alice.keys.private);

    // Wrong nonce.
    let err = h
        .dao
        .delegate_by_sig(&h.alice.addr, &h.bob.addr, 1, expiry, &sig, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NonceMismatch { .. }));

    // Expired message.
    let err = h
        .dao
        .delegate_by_sig(&h.alice.addr, &h.bob.addr, 0, h.clock.now(), &sig, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::SignatureExpired { .. }));

    // Valid: delegation applies and the nonce is consumed.
    h.dao
        .delegate_by_sig(&h.alice.addr, &h.bob.addr, 0, expiry, &sig, h.clock.now())
        .unwrap();
    assert_eq!(h.dao.delegate_of(&h.alice.addr), &h.bob.addr);
    assert_eq!(h.dao.current_votes(&h.bob.addr), 1_000);
    assert_eq!(h.dao.nonce_of(&h.alice.addr), 1);

    // The consumed nonce cannot be replayed.
    let err = h
        .dao
        .delegate_by_sig(&h.alice.addr, &h.bob.addr, 0, expiry, &sig, h.clock.now())
        .unwrap_err();
    assert!(matches!(err, GovernanceError::NonceMismatch { .. }));
}

// ── Snapshot ────────────────────────────────────────────────────────────

#[test]
fn snapshot_roundtrip_preserves_engine_state() {
    let mut h = setup();
    let ext = actor(69);
    let id = h
        .dao
        .propose(
            &h.founder.addr,
            5,
            "WHITELIST",
            &[ext.addr.clone()],
            &[1],
            &[vec![]],
            h.clock.now(),
        )
        .unwrap();
    yes_and_process(&mut h, id);
    let auth = h.dai.sign_permit(
        &h.founder.addr,
        &h.founder.keys,
        h.dao.address(),
        2_000,
        h.clock.now().plus(3600),
    );
    h.dao.deposit_dividend(2_000, &auth, &mut h.dai, h.clock.now()).unwrap();

    let bytes = h.dao.save_state();
    let restored = Dao::load_state(&bytes).unwrap();
    assert_eq!(restored.name(), h.dao.name());
    assert_eq!(restored.docs(), h.dao.docs());
    assert_eq!(restored.manager(), h.dao.manager());
    assert_eq!(restored.total_supply(), h.dao.total_supply());
    assert_eq!(restored.balance_of(&h.founder.addr), FOUNDER_SHARES);
    assert_eq!(restored.loot_balance_of(&h.founder.addr), 2_000);
    assert_eq!(restored.proposal_count(), h.dao.proposal_count());
    assert_eq!(
        restored.proposal(id).unwrap().status,
        ProposalStatus::Processed
    );
    assert!(restored.is_extension(&ext.addr));
    assert_eq!(restored.domain(), h.dao.domain());
    assert!(restored.is_conserved());
}

#[test]
fn corrupt_snapshot_is_rejected() {
    let err = Dao::load_state(&[0xFF, 0x01, 0x02]).unwrap_err();
    assert!(matches!(err, GovernanceError::SnapshotCorrupt));
}
