//! Producer lifecycle through the full pipeline: register, cancel, activate
//! and deposit return, each against an in-memory chain.

mod common;

use common::{ela, producer, schnorr_sign_tx, sign_tx, Env, Key, HEIGHT};
use txcheck::crypto;
use txcheck::payload::{ActivateProducer, ProcessProducer, ProducerInfo};
use txcheck::state::{Producer, ProducerIdentity, ProducerState};
use txcheck::{ErrorKind, Fixed64, Payload, Transaction, TxType, Verdict};

fn info(owner: &Key, node: &Key, nickname: &str) -> ProducerInfo {
    ProducerInfo {
        owner_key: owner.public.clone(),
        node_key: node.public.clone(),
        nickname: nickname.into(),
        url: "https://producer.example".into(),
        location: 86,
        net_address: "127.0.0.1:20338".into(),
        ..Default::default()
    }
}

/// Version 0 registration: payload signed by the owner, deposit in outputs,
/// inputs funded and signed by the owner's standard address.
fn register_tx(env: &mut Env, owner: &Key, node: &Key, deposit: i64) -> Transaction {
    let mut info = info(owner, node, "alpha");
    info.signature = owner.sign(&info.unsigned_bytes(0));
    let mut tx = Transaction::new(TxType::RegisterProducer, 0, Payload::RegisterProducer(info));
    env.fund(&mut tx, owner.address(), ela(deposit + 1));
    env.pay(&mut tx, owner.deposit(), ela(deposit));
    tx
}

// -----------------------------------------------------------------------------
// RegisterProducer
// -----------------------------------------------------------------------------

#[test]
fn register_with_full_deposit_continues_through_common_stage() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut tx = register_tx(&mut env, &owner, &node, 5000);
    sign_tx(&mut tx, &[&owner]);

    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));
}

#[test]
fn register_with_short_deposit_is_economic() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut tx = register_tx(&mut env, &owner, &node, 4000);
    sign_tx(&mut tx, &[&owner]);

    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EconomicInvariant);
    assert_eq!(err.message(), "producer deposit amount is insufficient");
}

#[test]
fn register_with_two_deposit_outputs_is_rejected() {
    let mut env = Env::new();
    let (owner, node, other) = (Key::new(1), Key::new(2), Key::new(3));
    let mut tx = register_tx(&mut env, &owner, &node, 5000);
    env.fund(&mut tx, owner.address(), ela(1));
    env.pay(&mut tx, other.deposit(), ela(1));
    sign_tx(&mut tx, &[&owner]);

    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.message(), "there must be only one deposit address in outputs");
}

#[test]
fn register_deposit_to_foreign_address_is_rejected() {
    let mut env = Env::new();
    let (owner, node, other) = (Key::new(1), Key::new(2), Key::new(3));
    let mut tx = register_tx(&mut env, &owner, &node, 5000);
    tx.outputs[0].program_hash = other.deposit();
    sign_tx(&mut tx, &[&owner]);

    let err = env.validate(&tx).unwrap_err();
    assert_eq!(
        err.message(),
        "deposit address does not match the public key in payload"
    );
}

#[test]
fn register_rejects_taken_nickname_and_node_key() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let (other_owner, other_node) = (Key::new(3), Key::new(4));
    env.state.insert_producer(producer(
        &other_owner,
        &other_node,
        "alpha",
        ProducerState::Active,
    ));

    let mut tx = register_tx(&mut env, &owner, &node, 5000);
    sign_tx(&mut tx, &[&owner]);
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConsistency);
    assert_eq!(err.message(), "nick name alpha already inuse");

    let mut tx = register_tx(&mut env, &owner, &other_node, 5000);
    sign_tx(&mut tx, &[&owner]);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "producer already registered"
    );
}

#[test]
fn register_with_tampered_payload_signature_fails() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut tx = register_tx(&mut env, &owner, &node, 5000);
    if let Payload::RegisterProducer(info) = &mut tx.payload {
        info.url = "https://elsewhere.example".into();
    }
    sign_tx(&mut tx, &[&owner]);

    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Signature);
    assert_eq!(err.message(), "invalid signature in payload");
}

/// Schnorr version: no payload signature, the owner's Schnorr program signs
/// the transaction and funds come from that program's address.
#[test]
fn register_schnorr_version_signs_through_program() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut info = info(&owner, &node, "alpha");
    info.stake_until = HEIGHT + 10_000;
    let mut tx = Transaction::new(TxType::RegisterProducer, 2, Payload::RegisterProducer(info));
    let schnorr_address = crypto::program_hash(&owner.schnorr_code()).expect("schnorr address");
    env.fund(&mut tx, schnorr_address, ela(5001));
    env.pay(&mut tx, owner.deposit(), ela(5000));
    schnorr_sign_tx(&mut tx, &owner);

    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));

    // a program for any other key is refused before signatures are checked
    let stranger = Key::new(9);
    tx.programs.clear();
    schnorr_sign_tx(&mut tx, &stranger);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "the program code does not match the owner key"
    );
}

#[test]
fn register_stake_until_must_fall_in_lock_window() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut info = info(&owner, &node, "alpha");
    info.stake_until = HEIGHT + 10;
    info.signature = owner.sign(&info.unsigned_bytes(1));
    let mut tx = Transaction::new(TxType::RegisterProducer, 1, Payload::RegisterProducer(info));
    env.fund(&mut tx, owner.address(), ela(5001));
    env.pay(&mut tx, owner.deposit(), ela(5000));
    sign_tx(&mut tx, &[&owner]);

    let err = env.validate(&tx).unwrap_err();
    assert_eq!(
        err.message(),
        format!(
            "stake until {} is out of range [{}, {}]",
            HEIGHT + 10,
            HEIGHT + 7200,
            HEIGHT + 720_000
        )
    );
}

// -----------------------------------------------------------------------------
// CancelProducer
// -----------------------------------------------------------------------------

fn cancel_tx(env: &mut Env, owner: &Key) -> Transaction {
    let mut p = ProcessProducer {
        owner_key: owner.public.clone(),
        signature: vec![],
    };
    p.signature = owner.sign(&p.unsigned_bytes());
    let mut tx = Transaction::new(TxType::CancelProducer, 0, Payload::CancelProducer(p));
    env.fund(&mut tx, owner.address(), ela(1));
    env.pay(&mut tx, owner.address(), Fixed64(ela(1).0 - 10_000));
    sign_tx(&mut tx, &[owner]);
    tx
}

#[test]
fn cancel_only_from_active_or_inactive() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Active));
    let tx = cancel_tx(&mut env, &owner);
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));

    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Canceled));
    let tx = cancel_tx(&mut env, &owner);
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "can not cancel this producer"
    );
}

#[test]
fn cancel_unknown_producer() {
    let mut env = Env::new();
    let tx = cancel_tx(&mut env, &Key::new(1));
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConsistency);
    assert_eq!(err.message(), "getting unknown producer");
}

// -----------------------------------------------------------------------------
// ActivateProducer
// -----------------------------------------------------------------------------

fn activate_tx(node: &Key) -> Transaction {
    let mut p = ActivateProducer {
        node_key: node.public.clone(),
        signature: vec![],
    };
    p.signature = node.sign(&p.unsigned_bytes());
    Transaction::new(TxType::ActivateProducer, 0, Payload::ActivateProducer(p))
}

#[test]
fn activate_inactive_producer_is_final() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Inactive));

    assert_eq!(env.validate(&activate_tx(&node)), Ok(Verdict::Final));
}

#[test]
fn activate_rejects_active_and_v1_canceled_producers() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    for state in [ProducerState::Active, ProducerState::Canceled, ProducerState::Pending] {
        env.state
            .insert_producer(producer(&owner, &node, "alpha", state));
        assert_eq!(
            env.validate(&activate_tx(&node)).unwrap_err().message(),
            "can not activate this producer",
            "state {:?}",
            state
        );
    }
}

#[test]
fn activate_canceled_v2_producer_with_stake_left() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut p = producer(&owner, &node, "alpha", ProducerState::Canceled);
    p.identity = ProducerIdentity::DposV2;
    p.stake_until = HEIGHT + 100;
    env.state.insert_producer(p.clone());
    assert_eq!(env.validate(&activate_tx(&node)), Ok(Verdict::Final));

    p.stake_until = HEIGHT;
    env.state.insert_producer(p);
    assert_eq!(
        env.validate(&activate_tx(&node)).unwrap_err().message(),
        "can not activate this producer"
    );
}

#[test]
fn activate_twice_within_duration_is_rejected() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut p = producer(&owner, &node, "alpha", ProducerState::Inactive);
    p.activate_request_height = Some(HEIGHT - env.config.activate_duration);
    env.state.insert_producer(p.clone());
    assert_eq!(
        env.validate(&activate_tx(&node)).unwrap_err().message(),
        "can only activate once during inactive state"
    );

    p.activate_request_height = Some(HEIGHT - env.config.activate_duration - 1);
    env.state.insert_producer(p);
    assert_eq!(env.validate(&activate_tx(&node)), Ok(Verdict::Final));
}

#[test]
fn activate_needs_deposit_after_penalty() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut p = producer(&owner, &node, "alpha", ProducerState::Inactive);
    p.penalty = ela(1);
    env.state.insert_producer(p);

    let err = env.validate(&activate_tx(&node)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EconomicInvariant);
    assert_eq!(err.message(), "insufficient deposit amount");
}

#[test]
fn activate_signed_by_owner_instead_of_node_fails() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Inactive));
    let mut tx = activate_tx(&node);
    if let Payload::ActivateProducer(p) = &mut tx.payload {
        p.signature = owner.sign(&p.unsigned_bytes());
    }
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "invalid signature in payload"
    );
}

// -----------------------------------------------------------------------------
// ReturnDepositCoin
// -----------------------------------------------------------------------------

/// Spends the whole deposit back to the owner, less `fee`.
fn return_deposit_tx(env: &mut Env, owner: &Key, fee: Fixed64) -> Transaction {
    let mut tx = Transaction::new(TxType::ReturnDepositCoin, 0, Payload::ReturnDepositCoin);
    env.fund(&mut tx, owner.deposit(), ela(5000));
    env.pay(&mut tx, owner.address(), Fixed64(ela(5000).0 - fee.0));
    sign_tx(&mut tx, &[owner]);
    tx
}

fn canceled(owner: &Key, node: &Key, env: &Env) -> Producer {
    let mut p = producer(owner, node, "alpha", ProducerState::Canceled);
    p.cancel_height = HEIGHT - env.config.deposit_lockup_blocks;
    p
}

#[test]
fn return_deposit_after_lockup_continues() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state.insert_producer(canceled(&owner, &node, &env));

    let tx = return_deposit_tx(&mut env, &owner, Fixed64(10_000));
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));
}

#[test]
fn schnorr_owner_returns_the_same_deposit() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state.insert_producer(canceled(&owner, &node, &env));

    let mut tx = Transaction::new(TxType::ReturnDepositCoin, 0, Payload::ReturnDepositCoin);
    env.fund(&mut tx, owner.deposit(), ela(5000));
    env.pay(&mut tx, owner.address(), Fixed64(ela(5000).0 - 10_000));
    schnorr_sign_tx(&mut tx, &owner);
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));
}

#[test]
fn return_deposit_before_lockup_is_rejected() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut p = canceled(&owner, &node, &env);
    p.cancel_height += 1;
    env.state.insert_producer(p);

    let tx = return_deposit_tx(&mut env, &owner, Fixed64(10_000));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "can not return deposit before lock-up period"
    );
}

#[test]
fn return_deposit_cannot_take_penalized_amount() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let mut p = canceled(&owner, &node, &env);
    p.penalty = ela(100);
    env.state.insert_producer(p);

    let tx = return_deposit_tx(&mut env, &owner, Fixed64(10_000));
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EconomicInvariant);
    assert_eq!(err.message(), "overspend deposit");
}

#[test]
fn return_deposit_of_active_producer_is_rejected() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Active));

    let tx = return_deposit_tx(&mut env, &owner, Fixed64(10_000));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "producer must be canceled before return"
    );
}

// -----------------------------------------------------------------------------
// UpdateProducer
// -----------------------------------------------------------------------------

fn update_tx(env: &mut Env, owner: &Key, mut info: ProducerInfo) -> Transaction {
    info.signature = owner.sign(&info.unsigned_bytes(0));
    let mut tx = Transaction::new(TxType::UpdateProducer, 0, Payload::UpdateProducer(info));
    env.fund(&mut tx, owner.address(), ela(1));
    env.pay(&mut tx, owner.address(), Fixed64(ela(1).0 - 10_000));
    sign_tx(&mut tx, &[owner]);
    tx
}

#[test]
fn update_renames_a_live_producer() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Active));
    env.state.insert_producer(producer(
        &Key::new(3),
        &Key::new(4),
        "beta",
        ProducerState::Active,
    ));

    let tx = update_tx(&mut env, &owner, info(&owner, &node, "gamma"));
    assert_eq!(env.validate(&tx), Ok(Verdict::Continue));

    let tx = update_tx(&mut env, &owner, info(&owner, &node, "beta"));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "nick name beta already inuse"
    );

    let tx = update_tx(&mut env, &owner, info(&owner, &Key::new(4), "alpha"));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "producer already registered"
    );
}

#[test]
fn update_needs_a_live_registration() {
    let mut env = Env::new();
    let (owner, node) = (Key::new(1), Key::new(2));
    let tx = update_tx(&mut env, &owner, info(&owner, &node, "alpha"));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "updating unknown producer"
    );

    env.state
        .insert_producer(producer(&owner, &node, "alpha", ProducerState::Canceled));
    let tx = update_tx(&mut env, &owner, info(&owner, &node, "alpha"));
    assert_eq!(
        env.validate(&tx).unwrap_err().message(),
        "updating canceled or returned producer"
    );
}
