//! Height gating through the public pipeline, plus ladder monotonicity.

mod common;

use common::Env;
use proptest::prelude::*;
use txcheck::height::{active_step, check_version};
use txcheck::payload::ProducerInfo;
use txcheck::{ChainParams, ErrorKind, Payload, Transaction, TxType};

/// Highest version accepted at `height`, if the kind is supported at all.
fn max_version(t: TxType, params: &ChainParams, height: u32) -> Option<u8> {
    (0..=3u8)
        .rev()
        .find(|v| check_version(t, *v, params, height).is_ok())
}

#[test]
fn schnorr_producer_rejected_before_its_height() {
    let mut env = Env::new();
    env.height = env.config.producer_schnorr_start_height - 1;
    let tx = Transaction::new(
        TxType::RegisterProducer,
        2,
        Payload::RegisterProducer(ProducerInfo::default()),
    );
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeightVersion);
    assert_eq!(
        err.message(),
        "payload version 2 of RegisterProducer transaction is not supported at height 1499999"
    );
}

#[test]
fn staking_kinds_rejected_before_dpos_v2() {
    let mut env = Env::new();
    env.height = env.config.dpos_v2_start_height - 1;
    let tx = Transaction::new(TxType::DposV2ClaimReward, 0, Payload::DposV2ClaimReward(Default::default()));
    let err = env.validate(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeightVersion);
    assert_eq!(
        err.message(),
        "not support DposV2ClaimReward transaction before DPoSV2StartHeight"
    );
}

#[test]
fn legacy_proposal_payload_retired_by_v1() {
    let params = ChainParams::default();
    let h = params.crc_proposal_v1_height;
    assert!(check_version(TxType::CrcProposal, 0, &params, h - 1).is_ok());
    assert!(check_version(TxType::CrcProposal, 0, &params, h).is_err());
    assert!(check_version(TxType::CrcProposal, 1, &params, h).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Once supported, a kind stays supported, and its newest accepted
    /// version never goes back down.
    #[test]
    fn ladders_only_move_forward(
        kind in 0..TxType::ALL.len(),
        a in 0u32..2_500_000,
        b in 0u32..2_500_000,
    ) {
        let t = TxType::ALL[kind];
        let params = ChainParams::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if active_step(t, &params, lo).is_some() {
            prop_assert!(active_step(t, &params, hi).is_some());
        }
        prop_assert!(max_version(t, &params, lo) <= max_version(t, &params, hi));
    }
}
