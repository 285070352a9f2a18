//! Council governance: chained proposal and tracking signatures, reviews,
//! withdrawals, appropriation and the exact fee of real withdrawals.

mod common;

use std::collections::BTreeMap;

use common::{ela, sign_tx, Env, Key};
use txcheck::codec::write_var_bytes;
use txcheck::payload::{
    Budget, BudgetType, CrInfo, CrcProposal, CrcProposalReview, CrcProposalTracking,
    CrcProposalWithdraw, ProposalResult, ProposalResultItem, RealWithdraw, ReviewResult,
    TrackingType,
};
use txcheck::state::{
    CrMember, MemberState, PendingWithdrawal, ProposalState, ProposalStatus, WithdrawalKind,
};
use txcheck::{
    check_context, ErrorKind, Fixed64, Payload, ProgramHash, Transaction, TxType, Uint256,
    Verdict,
};

/// Signs the growing buffer link by link; `None` leaves an empty signature.
fn sign_chain(parts: &[(&[u8], Option<&Key>)]) -> Vec<Vec<u8>> {
    let mut buf = Vec::new();
    let mut out = Vec::new();
    for (preamble, key) in parts {
        buf.extend_from_slice(preamble);
        let sig = key.map(|k| k.sign(&buf)).unwrap_or_default();
        write_var_bytes(&mut buf, &sig);
        out.push(sig);
    }
    out
}

fn member(key: &Key, state: MemberState) -> CrMember {
    CrMember {
        info: CrInfo {
            code: key.code(),
            cid: key.cid(),
            did: key.did(),
            nickname: "council".into(),
            ..Default::default()
        },
        state,
        deposit_amount: ela(5000),
        penalty: Fixed64::ZERO,
    }
}

/// Pays for a governance transaction from `payer` and signs it.
fn fund_and_sign(env: &mut Env, tx: &mut Transaction, payer: &Key) {
    env.fund(tx, payer.address(), ela(1));
    env.pay(tx, payer.address(), Fixed64(ela(1).0 - 10_000));
    sign_tx(tx, &[payer]);
}

// -----------------------------------------------------------------------------
// CRCProposal
// -----------------------------------------------------------------------------

const DRAFT: &[u8] = b"# Proposal\n\nFund the explorer rewrite.";

fn unsigned_proposal(owner: &Key, council: &Key) -> CrcProposal {
    CrcProposal {
        proposal_type: 0,
        category_data: "infrastructure".into(),
        owner_key: owner.public.clone(),
        draft_hash: Uint256::hash(DRAFT),
        draft_data: DRAFT.to_vec(),
        budgets: vec![
            Budget {
                budget_type: BudgetType::Imprest,
                stage: 0,
                amount: ela(10),
            },
            Budget {
                budget_type: BudgetType::NormalPayment,
                stage: 1,
                amount: ela(20),
            },
            Budget {
                budget_type: BudgetType::FinalPayment,
                stage: 2,
                amount: ela(10),
            },
        ],
        recipient: owner.address(),
        signature: vec![],
        cr_council_member_did: council.did(),
        cr_council_member_signature: vec![],
    }
}

fn signed_proposal(owner: &Key, council: &Key) -> CrcProposal {
    let mut p = unsigned_proposal(owner, council);
    let unsigned = p.unsigned_bytes(1);
    let did = p.cr_council_member_did;
    let sigs = sign_chain(&[(&unsigned[..], Some(owner)), (&did.as_bytes()[..], Some(council))]);
    p.signature = sigs[0].clone();
    p.cr_council_member_signature = sigs[1].clone();
    p
}

fn proposal_env(council: &Key) -> Env {
    let mut env = Env::new();
    env.state.cr_assets = ela(1000);
    env.state.insert_member(member(council, MemberState::Elected));
    env
}

fn proposal_tx(env: &mut Env, p: CrcProposal, payer: &Key) -> Transaction {
    let mut tx = Transaction::new(TxType::CrcProposal, 1, Payload::CrcProposal(p));
    fund_and_sign(env, &mut tx, payer);
    tx
}

#[test]
fn proposal_signed_by_owner_then_council_member() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let tx = proposal_tx(&mut env, signed_proposal(&owner, &council), &owner);
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));
}

#[test]
fn mutated_owner_signature_breaks_the_chain() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let mut p = signed_proposal(&owner, &council);
    p.signature[10] ^= 0x01;
    let tx = proposal_tx(&mut env, p, &owner);
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Signature);
    assert_eq!(err.message(), "owner signature check failed");
}

#[test]
fn council_signature_must_cover_the_owner_signature() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let mut p = signed_proposal(&owner, &council);
    // council member signs without the owner's signature in the buffer
    let mut buf = p.unsigned_bytes(1);
    buf.extend_from_slice(p.cr_council_member_did.as_bytes());
    p.cr_council_member_signature = council.sign(&buf);
    let tx = proposal_tx(&mut env, p, &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "CR Council Member signature check failed"
    );
}

#[test]
fn proposal_needs_an_elected_council_member() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    env.state
        .insert_member(member(&council, MemberState::Impeached));
    let tx = proposal_tx(&mut env, signed_proposal(&owner, &council), &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "CR Council Member should be an elected CR members"
    );

    let stranger = Key::new(23);
    let tx = proposal_tx(&mut env, signed_proposal(&owner, &stranger), &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "CR Council Member should be one of the CR members"
    );
}

#[test]
fn proposal_budget_ceiling_is_a_share_of_committee_assets() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    env.state.cr_assets = ela(399);
    let tx = proposal_tx(&mut env, signed_proposal(&owner, &council), &owner);
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EconomicInvariant);
    assert_eq!(err.message(), "budgets exceeds 10% of CRC committee balance");
}

#[test]
fn proposal_draft_must_match_its_hash() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let mut p = unsigned_proposal(&owner, &council);
    p.draft_data.push(b'!');
    let tx = proposal_tx(&mut env, p, &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "the draft data and draft hash are inconsistent"
    );
}

#[test]
fn proposal_in_election_period_is_rejected() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    env.state.in_election_period = true;
    let tx = proposal_tx(&mut env, signed_proposal(&owner, &council), &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "cr proposal tx must not during election period"
    );
}

// -----------------------------------------------------------------------------
// Review
// -----------------------------------------------------------------------------

fn registered(owner: &Key, council: &Key, status: ProposalStatus) -> (Uint256, ProposalState) {
    let proposal = signed_proposal(owner, council);
    let hash = proposal.hash(1);
    let state = ProposalState {
        proposal,
        status,
        owner_key: owner.public.clone(),
        register_height: 1,
        withdrawable_budgets: BTreeMap::new(),
        withdrawn_budgets: BTreeMap::new(),
    };
    (hash, state)
}

#[test]
fn elected_member_reviews_registered_proposal() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let (hash, state) = registered(&owner, &council, ProposalStatus::Registered);
    env.state.insert_proposal(hash, state);

    let opinion = b"approve, see notes".to_vec();
    let mut review = CrcProposalReview {
        proposal_hash: hash,
        vote_result: ReviewResult::Approve,
        opinion_hash: Uint256::hash(&opinion),
        opinion_data: opinion,
        did: council.did(),
        signature: vec![],
    };
    review.signature = council.sign(&review.unsigned_bytes(1));
    let mut tx = Transaction::new(
        TxType::CrcProposalReview,
        1,
        Payload::CrcProposalReview(review.clone()),
    );
    fund_and_sign(&mut env, &mut tx, &council);
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));

    review.proposal_hash = Uint256::hash(b"unknown");
    let mut tx = Transaction::new(TxType::CrcProposalReview, 1, Payload::CrcProposalReview(review));
    fund_and_sign(&mut env, &mut tx, &council);
    assert_eq!(env.validate(&tx).unwrap_err().message(), "proposal not exist");
}

// -----------------------------------------------------------------------------
// Tracking
// -----------------------------------------------------------------------------

fn tracking(
    hash: Uint256,
    tracking_type: TrackingType,
    owner: &Key,
    new_owner: Option<&Key>,
) -> CrcProposalTracking {
    let message = b"milestone report".to_vec();
    let opinion = b"accepted".to_vec();
    CrcProposalTracking {
        proposal_hash: hash,
        message_hash: Uint256::hash(&message),
        message_data: message,
        stage: 0,
        owner_key: owner.public.clone(),
        new_owner_key: new_owner.map(|k| k.public.clone()).unwrap_or_default(),
        owner_signature: vec![],
        new_owner_signature: vec![],
        tracking_type,
        secretary_general_opinion_hash: Uint256::hash(&opinion),
        secretary_general_opinion_data: opinion,
        secretary_general_signature: vec![],
    }
}

fn sign_tracking(t: &mut CrcProposalTracking, owner: &Key, new_owner: Option<&Key>, sg: &Key) {
    let unsigned = t.unsigned_bytes(1);
    let preamble = t.secretary_general_preamble(1);
    let sigs = sign_chain(&[
        (&unsigned[..], Some(owner)),
        (&[][..], new_owner),
        (&preamble[..], Some(sg)),
    ]);
    t.owner_signature = sigs[0].clone();
    t.new_owner_signature = sigs[1].clone();
    t.secretary_general_signature = sigs[2].clone();
}

struct Tracked {
    env: Env,
    owner: Key,
    secretary: Key,
    hash: Uint256,
}

fn tracked() -> Tracked {
    let (owner, council, secretary) = (Key::new(21), Key::new(22), Key::new(24));
    let mut env = proposal_env(&council);
    let (hash, state) = registered(&owner, &council, ProposalStatus::VoterAgreed);
    env.state.insert_proposal(hash, state);
    env.state.secretary_general = Some(secretary.public.clone());
    Tracked {
        env,
        owner,
        secretary,
        hash,
    }
}

fn tracking_tx(env: &mut Env, t: CrcProposalTracking, payer: &Key) -> Transaction {
    let mut tx = Transaction::new(TxType::CrcProposalTracking, 1, Payload::CrcProposalTracking(t));
    fund_and_sign(env, &mut tx, payer);
    tx
}

#[test]
fn common_tracking_signed_by_owner_and_secretary() {
    let Tracked {
        mut env,
        owner,
        secretary,
        hash,
    } = tracked();
    let mut t = tracking(hash, TrackingType::Common, &owner, None);
    sign_tracking(&mut t, &owner, None, &secretary);
    let tx = tracking_tx(&mut env, t, &owner);
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));
}

#[test]
fn change_owner_tracking_needs_three_chained_signatures() {
    let Tracked {
        mut env,
        owner,
        secretary,
        hash,
    } = tracked();
    let new_owner = Key::new(25);
    let mut t = tracking(hash, TrackingType::ChangeOwner, &owner, Some(&new_owner));
    sign_tracking(&mut t, &owner, Some(&new_owner), &secretary);
    let tx = tracking_tx(&mut env, t.clone(), &owner);
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));

    let mut tampered = t;
    let last = tampered.new_owner_signature.len() - 1;
    tampered.new_owner_signature[last] ^= 0x80;
    let tx = tracking_tx(&mut env, tampered, &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "new owner signature check failed"
    );
}

#[test]
fn new_owner_key_only_for_change_owner() {
    let Tracked {
        mut env,
        owner,
        secretary,
        hash,
    } = tracked();
    let stray = Key::new(25);
    let mut t = tracking(hash, TrackingType::Common, &owner, Some(&stray));
    sign_tracking(&mut t, &owner, Some(&stray), &secretary);
    let tx = tracking_tx(&mut env, t, &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "the NewOwnerKey need to be empty"
    );
}

#[test]
fn tracking_by_someone_else_is_rejected() {
    let Tracked {
        mut env,
        secretary,
        hash,
        ..
    } = tracked();
    let impostor = Key::new(30);
    let mut t = tracking(hash, TrackingType::Common, &impostor, None);
    sign_tracking(&mut t, &impostor, None, &secretary);
    let tx = tracking_tx(&mut env, t, &impostor);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "the OwnerKey is not owner of proposal"
    );
}

#[test]
fn proposal_results_must_name_known_proposals_once() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let (hash, state) = registered(&owner, &council, ProposalStatus::Registered);
    env.state.insert_proposal(hash, state);

    let result_tx = |hashes: &[Uint256]| {
        let results = hashes
            .iter()
            .map(|h| ProposalResultItem {
                proposal_hash: *h,
                proposal_type: 0,
                result: true,
            })
            .collect();
        Transaction::new(
            TxType::ProposalResult,
            0,
            Payload::ProposalResult(ProposalResult { results }),
        )
    };

    assert_eq!(env.validate(&result_tx(&[hash])), Ok(Verdict::Final));
    assert_eq!(
        env.validate(&result_tx(&[hash, hash])).unwrap_err().message(),
        "duplicated proposal result"
    );
    let unknown = Uint256::hash(b"unknown");
    assert_eq!(
        env.validate(&result_tx(&[unknown])).unwrap_err().message(),
        format!("invalid proposal hash {}", unknown)
    );
}

// -----------------------------------------------------------------------------
// Withdraw & appropriation
// -----------------------------------------------------------------------------

#[test]
fn withdraw_must_take_exactly_the_unlocked_amount() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let (hash, mut state) = registered(&owner, &council, ProposalStatus::VoterAgreed);
    state.withdrawable_budgets = BTreeMap::from([(0, ela(10)), (1, ela(20))]);
    state.withdrawn_budgets = BTreeMap::from([(0, ela(10))]);
    env.state.insert_proposal(hash, state);

    let withdraw = |amount: Fixed64| {
        let mut p = CrcProposalWithdraw {
            proposal_hash: hash,
            owner_key: owner.public.clone(),
            recipient: owner.address(),
            amount,
            signature: vec![],
        };
        p.signature = owner.sign(&p.unsigned_bytes(1));
        Transaction::new(TxType::CrcProposalWithdraw, 1, Payload::CrcProposalWithdraw(p))
    };

    assert_eq!(env.validate(&withdraw(ela(20))), Ok(Verdict::Final));
    let err = env.validate(&withdraw(ela(30))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EconomicInvariant);
    assert_eq!(err.message(), "withdrawal amount 30 need to be 20");
}

#[test]
fn legacy_withdraw_without_outputs_is_structural() {
    let (owner, council) = (Key::new(21), Key::new(22));
    let mut env = proposal_env(&council);
    let (hash, mut state) = registered(&owner, &council, ProposalStatus::VoterAgreed);
    state.withdrawable_budgets = BTreeMap::from([(0, ela(10))]);
    env.state.insert_proposal(hash, state);

    let mut p = CrcProposalWithdraw {
        proposal_hash: hash,
        owner_key: owner.public.clone(),
        recipient: owner.address(),
        amount: Fixed64::ZERO,
        signature: vec![],
    };
    p.signature = owner.sign(&p.unsigned_bytes(0));
    let tx = Transaction::new(TxType::CrcProposalWithdraw, 0, Payload::CrcProposalWithdraw(p));
    let err = check_context(&tx, &env.params()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.message(), "withdrawal has no outputs");
}

#[test]
fn appropriation_moves_exact_amount_without_fee() {
    let mut env = Env::new();
    env.state.appropriation = Some(ela(50));
    let (assets, expenses) = (env.config.cr_assets_address, env.config.cr_expenses_address);

    let build = |env: &mut Env, to_expenses: Fixed64| {
        let mut tx = Transaction::new(TxType::CrcAppropriation, 0, Payload::CrcAppropriation);
        env.fund(&mut tx, assets, ela(1000));
        env.pay(&mut tx, expenses, to_expenses);
        env.pay(&mut tx, assets, Fixed64(ela(1000).0 - to_expenses.0));
        tx
    };

    let tx = build(&mut env, ela(50));
    assert_eq!(env.validate(&tx), Ok(Verdict::Final));

    let tx = build(&mut env, ela(49));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "invalid appropriation amount 49, need to be 50"
    );

    env.state.appropriation = None;
    let tx = build(&mut env, ela(50));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "should not have appropriation transaction"
    );
}

// -----------------------------------------------------------------------------
// Real withdraw
// -----------------------------------------------------------------------------

struct Settlement {
    env: Env,
    hashes: Vec<Uint256>,
    recipients: Vec<(ProgramHash, Fixed64)>,
}

/// Two pending proposal payouts of 10 and 5 ELA.
fn settlement() -> Settlement {
    let mut env = Env::new();
    let recipients = vec![(Key::new(41).address(), ela(10)), (Key::new(42).address(), ela(5))];
    let mut hashes = Vec::new();
    for (i, (recipient, amount)) in recipients.iter().enumerate() {
        let hash = Uint256::hash(&[i as u8]);
        env.state.pending_withdrawals.insert(
            (WithdrawalKind::CrcProposal, hash),
            PendingWithdrawal {
                recipient: *recipient,
                amount: *amount,
            },
        );
        hashes.push(hash);
    }
    Settlement {
        env,
        hashes,
        recipients,
    }
}

/// Pays every recipient its amount less the single fee and returns
/// `change` to CR expenses out of a 100 ELA input.
fn real_withdraw_tx(s: &mut Settlement, hashes: Vec<Uint256>, change: Fixed64) -> Transaction {
    let expenses = s.env.config.cr_expenses_address;
    let fee = s.env.config.real_withdraw_single_fee;
    let p = RealWithdraw {
        withdraw_tx_hashes: hashes,
    };
    let mut tx = Transaction::new(
        TxType::CrcProposalRealWithdraw,
        0,
        Payload::CrcProposalRealWithdraw(p),
    );
    s.env.fund(&mut tx, expenses, ela(100));
    for (recipient, amount) in &s.recipients {
        s.env.pay(&mut tx, *recipient, Fixed64(amount.0 - fee.0));
    }
    s.env.pay(&mut tx, expenses, change);
    tx
}

#[test]
fn real_withdraw_fee_is_exactly_one_single_fee_per_entry() {
    let mut s = settlement();
    let hashes = s.hashes.clone();
    let tx = real_withdraw_tx(&mut s, hashes.clone(), ela(85));
    assert_eq!(s.env.validate(&tx), Ok(Verdict::Final));

    // one satoshi less change makes the fee one satoshi too high
    let tx = real_withdraw_tx(&mut s, hashes, Fixed64(ela(85).0 - 1));
    let err = s.env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EconomicInvariant);
    assert_eq!(
        err.message(),
        "invalid real withdraw transaction fee:0.00020001, need to be:0.0002, txsCount:2"
    );
}

#[test]
fn real_withdraw_output_amount_is_checked_per_entry() {
    let mut s = settlement();
    let hashes = s.hashes.clone();
    let mut tx = real_withdraw_tx(&mut s, hashes, ela(85));
    tx.outputs[0].value = ela(10);
    assert_eq!(
        s.env.validate(&tx).unwrap_err().message(),
        "invalid real withdraw output amount:10, need to be:9.9999"
    );
}

#[test]
fn real_withdraw_rejects_duplicates_and_unknown_hashes() {
    let mut s = settlement();
    let first = s.hashes[0];
    let tx = real_withdraw_tx(&mut s, vec![first, first], ela(85));
    assert_eq!(
        s.env.validate(&tx).unwrap_err().message(),
        "duplicated withdraw transaction hash"
    );

    let tx = real_withdraw_tx(&mut s, vec![first, Uint256::hash(b"nope")], ela(85));
    let err = s.env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConsistency);
    assert_eq!(err.message(), "invalid withdraw transaction hash");
}

#[test]
fn real_withdraw_must_spend_from_cr_expenses() {
    let mut s = settlement();
    let hashes = s.hashes.clone();
    let mut tx = real_withdraw_tx(&mut s, hashes, ela(85));
    let elsewhere = Key::new(50).address();
    s.env.fund(&mut tx, elsewhere, ela(1));
    let expenses = s.env.config.cr_expenses_address;
    assert_eq!(
        s.env.validate(&tx).unwrap_err().message(),
        format!("real withdraw inputs must spend from {}", expenses)
    );
}
