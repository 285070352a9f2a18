//! Height gating of payload versions.
//!
//! Each transaction kind has a ladder of steps. A step names the feature
//! whose activation height opens it and the payload versions accepted while
//! it is the active step. The active step is the last one whose activation
//! height is ≤ the current height.

use core::fmt;

use crate::config::ChainParams;
use crate::error::ValidationError;
use crate::payload::TxType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Genesis,
    PublicDpos,
    EnableActivateIllegal,
    CrVotingStart,
    CrCommitteeStart,
    RegisterCrByDid,
    CrcProposalV1,
    CrcProposalWithdrawPayloadV1,
    DposV2Start,
    ProducerSchnorrStart,
    CrSchnorrStart,
    VotesSchnorrStart,
    SchnorrWithdrawStart,
    CrossChainSupermajority,
}

impl Feature {
    pub fn activation_height(self, params: &ChainParams) -> u32 {
        match self {
            Feature::Genesis => 0,
            Feature::PublicDpos => params.public_dpos_height,
            Feature::EnableActivateIllegal => params.enable_activate_illegal_height,
            Feature::CrVotingStart => params.cr_voting_start_height,
            Feature::CrCommitteeStart => params.cr_committee_start_height,
            Feature::RegisterCrByDid => params.register_cr_by_did_height,
            Feature::CrcProposalV1 => params.crc_proposal_v1_height,
            Feature::CrcProposalWithdrawPayloadV1 => params.crc_proposal_withdraw_payload_v1_height,
            Feature::DposV2Start => params.dpos_v2_start_height,
            Feature::ProducerSchnorrStart => params.producer_schnorr_start_height,
            Feature::CrSchnorrStart => params.cr_schnorr_start_height,
            Feature::VotesSchnorrStart => params.votes_schnorr_start_height,
            Feature::SchnorrWithdrawStart => params.schnorr_withdraw_start_height,
            Feature::CrossChainSupermajority => params.cross_chain_supermajority_height,
        }
    }

    pub fn is_active(self, params: &ChainParams, height: u32) -> bool {
        height >= self.activation_height(params)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feature::Genesis => "Genesis",
            Feature::PublicDpos => "PublicDPOSHeight",
            Feature::EnableActivateIllegal => "EnableActivateIllegalHeight",
            Feature::CrVotingStart => "CRVotingStartHeight",
            Feature::CrCommitteeStart => "CRCommitteeStartHeight",
            Feature::RegisterCrByDid => "RegisterCRByDIDHeight",
            Feature::CrcProposalV1 => "CRCProposalV1Height",
            Feature::CrcProposalWithdrawPayloadV1 => "CRCProposalWithdrawPayloadV1Height",
            Feature::DposV2Start => "DPoSV2StartHeight",
            Feature::ProducerSchnorrStart => "ProducerSchnorrStartHeight",
            Feature::CrSchnorrStart => "CRSchnorrStartHeight",
            Feature::VotesSchnorrStart => "VotesSchnorrStartHeight",
            Feature::SchnorrWithdrawStart => "SchnorrWithdrawStartHeight",
            Feature::CrossChainSupermajority => "CrossChainSupermajorityHeight",
        })
    }
}

/// One rung of a ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub feature: Feature,
    pub versions: &'static [u8],
}

const fn step(feature: Feature, versions: &'static [u8]) -> Step {
    Step { feature, versions }
}

const GENESIS_ONLY: &[Step] = &[step(Feature::Genesis, &[0])];

const PRODUCER_INFO: &[Step] = &[
    step(Feature::Genesis, &[0]),
    step(Feature::DposV2Start, &[0, 1]),
    step(Feature::ProducerSchnorrStart, &[0, 1, 2]),
];

const CR_INFO: &[Step] = &[
    step(Feature::CrVotingStart, &[0]),
    step(Feature::RegisterCrByDid, &[0, 1]),
    step(Feature::CrSchnorrStart, &[0, 1, 2]),
];

const CR_ONLY: &[Step] = &[step(Feature::CrVotingStart, &[0])];

const PROPOSAL_DATA: &[Step] = &[
    step(Feature::CrCommitteeStart, &[0]),
    step(Feature::CrcProposalV1, &[1]),
];

const PROPOSAL_WITHDRAW: &[Step] = &[
    step(Feature::CrCommitteeStart, &[0]),
    step(Feature::CrcProposalWithdrawPayloadV1, &[1]),
];

const COMMITTEE_ONLY: &[Step] = &[step(Feature::CrCommitteeStart, &[0])];

const SIDE_CHAIN_WITHDRAW: &[Step] = &[
    step(Feature::Genesis, &[0]),
    step(Feature::SchnorrWithdrawStart, &[0, 1]),
];

const RETURN_VOTES: &[Step] = &[
    step(Feature::DposV2Start, &[0]),
    step(Feature::VotesSchnorrStart, &[0, 1]),
];

const DPOS_V2_ONLY: &[Step] = &[step(Feature::DposV2Start, &[0])];

/// The ladder for `tx_type`. Kinds without their own ladder accept version 0 from genesis.
pub fn ladder(tx_type: TxType) -> &'static [Step] {
    match tx_type {
        TxType::RegisterProducer | TxType::UpdateProducer => PRODUCER_INFO,
        TxType::RegisterCr | TxType::UpdateCr => CR_INFO,
        TxType::UnregisterCr | TxType::ReturnCrDepositCoin => CR_ONLY,
        TxType::CrcProposal | TxType::CrcProposalReview | TxType::CrcProposalTracking => {
            PROPOSAL_DATA
        }
        TxType::CrcProposalWithdraw => PROPOSAL_WITHDRAW,
        TxType::CrcProposalRealWithdraw | TxType::CrcAppropriation | TxType::ProposalResult => {
            COMMITTEE_ONLY
        }
        TxType::WithdrawFromSideChain => SIDE_CHAIN_WITHDRAW,
        TxType::ReturnVotes => RETURN_VOTES,
        TxType::ExchangeVotes
        | TxType::Voting
        | TxType::VotesRealWithdraw
        | TxType::DposV2ClaimReward
        | TxType::DposV2ClaimRewardRealWithdraw => DPOS_V2_ONLY,
        TxType::CoinBase
        | TxType::TransferAsset
        | TxType::CancelProducer
        | TxType::ReturnDepositCoin
        | TxType::ActivateProducer
        | TxType::IllegalProposalEvidence
        | TxType::IllegalVoteEvidence
        | TxType::IllegalBlockEvidence
        | TxType::NextTurnDposInfo => GENESIS_ONLY,
    }
}

/// The step in force at `height`, if any.
pub fn active_step(tx_type: TxType, params: &ChainParams, height: u32) -> Option<Step> {
    ladder(tx_type)
        .iter()
        .rev()
        .find(|s| s.feature.is_active(params, height))
        .copied()
}

/// Rejects a payload version that is not accepted at `height`.
pub fn check_version(
    tx_type: TxType,
    version: u8,
    params: &ChainParams,
    height: u32,
) -> Result<(), ValidationError> {
    let Some(active) = active_step(tx_type, params, height) else {
        let first = ladder(tx_type)
            .first()
            .map(|s| s.feature)
            .unwrap_or(Feature::Genesis);
        return Err(ValidationError::height_version(format!(
            "not support {} transaction before {}",
            tx_type, first
        )));
    };
    if !active.versions.contains(&version) {
        return Err(ValidationError::height_version(format!(
            "payload version {} of {} transaction is not supported at height {}",
            version, tx_type, height
        )));
    }
    Ok(())
}
