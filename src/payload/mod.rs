//! Payload registry: transaction type tags, payload variants and their
//! canonical encodings.
//!
//! Wire tag is a `u8`; internal logic matches on [`TxType`] exhaustively.
//! Every payload writes two forms: the *unsigned* form (what its own
//! signatures commit to) and the full form (unsigned + signatures), which is
//! embedded in the transaction's unsigned bytes.

use core::fmt;

use crate::error::ValidationError;

pub mod cr;
pub mod crosschain;
pub mod evidence;
pub mod producer;
pub mod proposal;
pub mod staking;
pub mod system;

pub use cr::{CrInfo, UnregisterCr};
pub use crosschain::WithdrawFromSideChain;
pub use evidence::{
    BlockEvidence, BlockHeader, Confirm, DposProposal, DposProposalVote, IllegalBlocks,
    IllegalProposals, IllegalVotes, ProposalEvidence, VoteEvidence,
};
pub use producer::{ActivateProducer, ProcessProducer, ProducerInfo};
pub use proposal::{
    Budget, BudgetType, CrcProposal, CrcProposalReview, CrcProposalTracking, CrcProposalWithdraw,
    ProposalResult, ProposalResultItem, RealWithdraw, ReviewResult, TrackingType,
};
pub use staking::{
    DposV2ClaimReward, ReturnVotes, VoteCategory, VotesContent, VotesRealWithdraw,
    VotesRealWithdrawItem, VotesWithLockTime, Voting,
};
pub use system::{CoinBase, NextTurnDposInfo};

// -----------------------------------------------------------------------------
// TxType
// -----------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxType {
    CoinBase = 0x00,
    TransferAsset = 0x02,
    WithdrawFromSideChain = 0x07,
    RegisterProducer = 0x09,
    CancelProducer = 0x0a,
    UpdateProducer = 0x0b,
    ReturnDepositCoin = 0x0c,
    ActivateProducer = 0x0d,
    IllegalProposalEvidence = 0x0e,
    IllegalVoteEvidence = 0x0f,
    IllegalBlockEvidence = 0x10,
    NextTurnDposInfo = 0x14,
    ProposalResult = 0x15,
    RegisterCr = 0x21,
    UnregisterCr = 0x22,
    UpdateCr = 0x23,
    ReturnCrDepositCoin = 0x24,
    CrcProposal = 0x25,
    CrcProposalReview = 0x26,
    CrcProposalTracking = 0x27,
    CrcAppropriation = 0x28,
    CrcProposalWithdraw = 0x29,
    CrcProposalRealWithdraw = 0x2a,
    DposV2ClaimReward = 0x60,
    DposV2ClaimRewardRealWithdraw = 0x61,
    ExchangeVotes = 0x62,
    Voting = 0x63,
    ReturnVotes = 0x64,
    VotesRealWithdraw = 0x65,
}

impl TxType {
    pub const ALL: [TxType; 29] = [
        TxType::CoinBase,
        TxType::TransferAsset,
        TxType::WithdrawFromSideChain,
        TxType::RegisterProducer,
        TxType::CancelProducer,
        TxType::UpdateProducer,
        TxType::ReturnDepositCoin,
        TxType::ActivateProducer,
        TxType::IllegalProposalEvidence,
        TxType::IllegalVoteEvidence,
        TxType::IllegalBlockEvidence,
        TxType::NextTurnDposInfo,
        TxType::ProposalResult,
        TxType::RegisterCr,
        TxType::UnregisterCr,
        TxType::UpdateCr,
        TxType::ReturnCrDepositCoin,
        TxType::CrcProposal,
        TxType::CrcProposalReview,
        TxType::CrcProposalTracking,
        TxType::CrcAppropriation,
        TxType::CrcProposalWithdraw,
        TxType::CrcProposalRealWithdraw,
        TxType::DposV2ClaimReward,
        TxType::DposV2ClaimRewardRealWithdraw,
        TxType::ExchangeVotes,
        TxType::Voting,
        TxType::ReturnVotes,
        TxType::VotesRealWithdraw,
    ];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Name used in protocol messages.
    pub const fn name(self) -> &'static str {
        match self {
            TxType::CoinBase => "CoinBase",
            TxType::TransferAsset => "TransferAsset",
            TxType::WithdrawFromSideChain => "WithdrawFromSideChain",
            TxType::RegisterProducer => "RegisterProducer",
            TxType::CancelProducer => "CancelProducer",
            TxType::UpdateProducer => "UpdateProducer",
            TxType::ReturnDepositCoin => "ReturnDepositCoin",
            TxType::ActivateProducer => "ActivateProducer",
            TxType::IllegalProposalEvidence => "IllegalProposalEvidence",
            TxType::IllegalVoteEvidence => "IllegalVoteEvidence",
            TxType::IllegalBlockEvidence => "IllegalBlockEvidence",
            TxType::NextTurnDposInfo => "NextTurnDPOSInfo",
            TxType::ProposalResult => "ProposalResult",
            TxType::RegisterCr => "RegisterCR",
            TxType::UnregisterCr => "UnregisterCR",
            TxType::UpdateCr => "UpdateCR",
            TxType::ReturnCrDepositCoin => "ReturnCRDepositCoin",
            TxType::CrcProposal => "CRCProposal",
            TxType::CrcProposalReview => "CRCProposalReview",
            TxType::CrcProposalTracking => "CRCProposalTracking",
            TxType::CrcAppropriation => "CRCAppropriation",
            TxType::CrcProposalWithdraw => "CRCProposalWithdraw",
            TxType::CrcProposalRealWithdraw => "CRCProposalRealWithdraw",
            TxType::DposV2ClaimReward => "DposV2ClaimReward",
            TxType::DposV2ClaimRewardRealWithdraw => "DposV2ClaimRewardRealWithdraw",
            TxType::ExchangeVotes => "ExchangeVotes",
            TxType::Voting => "Voting",
            TxType::ReturnVotes => "ReturnVotes",
            TxType::VotesRealWithdraw => "VotesRealWithdraw",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for TxType {
    type Error = ValidationError;

    fn try_from(byte: u8) -> Result<Self, ValidationError> {
        TxType::ALL
            .iter()
            .copied()
            .find(|t| t.as_u8() == byte)
            .ok_or_else(|| ValidationError::payload_type(format!("invalid transaction type {:#04x}", byte)))
    }
}

// -----------------------------------------------------------------------------
// Payload
// -----------------------------------------------------------------------------

/// One variant per transaction kind. Kinds without a body use unit variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    CoinBase(CoinBase),
    TransferAsset,
    WithdrawFromSideChain(WithdrawFromSideChain),
    RegisterProducer(ProducerInfo),
    CancelProducer(ProcessProducer),
    UpdateProducer(ProducerInfo),
    ReturnDepositCoin,
    ActivateProducer(ActivateProducer),
    IllegalProposalEvidence(IllegalProposals),
    IllegalVoteEvidence(IllegalVotes),
    IllegalBlockEvidence(IllegalBlocks),
    NextTurnDposInfo(NextTurnDposInfo),
    ProposalResult(ProposalResult),
    RegisterCr(CrInfo),
    UnregisterCr(UnregisterCr),
    UpdateCr(CrInfo),
    ReturnCrDepositCoin,
    CrcProposal(CrcProposal),
    CrcProposalReview(CrcProposalReview),
    CrcProposalTracking(CrcProposalTracking),
    CrcAppropriation,
    CrcProposalWithdraw(CrcProposalWithdraw),
    CrcProposalRealWithdraw(RealWithdraw),
    DposV2ClaimReward(DposV2ClaimReward),
    DposV2ClaimRewardRealWithdraw(RealWithdraw),
    ExchangeVotes,
    Voting(Voting),
    ReturnVotes(ReturnVotes),
    VotesRealWithdraw(VotesRealWithdraw),
}

impl Payload {
    /// The type tag this payload variant belongs to.
    pub fn tx_type(&self) -> TxType {
        match self {
            Payload::CoinBase(_) => TxType::CoinBase,
            Payload::TransferAsset => TxType::TransferAsset,
            Payload::WithdrawFromSideChain(_) => TxType::WithdrawFromSideChain,
            Payload::RegisterProducer(_) => TxType::RegisterProducer,
            Payload::CancelProducer(_) => TxType::CancelProducer,
            Payload::UpdateProducer(_) => TxType::UpdateProducer,
            Payload::ReturnDepositCoin => TxType::ReturnDepositCoin,
            Payload::ActivateProducer(_) => TxType::ActivateProducer,
            Payload::IllegalProposalEvidence(_) => TxType::IllegalProposalEvidence,
            Payload::IllegalVoteEvidence(_) => TxType::IllegalVoteEvidence,
            Payload::IllegalBlockEvidence(_) => TxType::IllegalBlockEvidence,
            Payload::NextTurnDposInfo(_) => TxType::NextTurnDposInfo,
            Payload::ProposalResult(_) => TxType::ProposalResult,
            Payload::RegisterCr(_) => TxType::RegisterCr,
            Payload::UnregisterCr(_) => TxType::UnregisterCr,
            Payload::UpdateCr(_) => TxType::UpdateCr,
            Payload::ReturnCrDepositCoin => TxType::ReturnCrDepositCoin,
            Payload::CrcProposal(_) => TxType::CrcProposal,
            Payload::CrcProposalReview(_) => TxType::CrcProposalReview,
            Payload::CrcProposalTracking(_) => TxType::CrcProposalTracking,
            Payload::CrcAppropriation => TxType::CrcAppropriation,
            Payload::CrcProposalWithdraw(_) => TxType::CrcProposalWithdraw,
            Payload::CrcProposalRealWithdraw(_) => TxType::CrcProposalRealWithdraw,
            Payload::DposV2ClaimReward(_) => TxType::DposV2ClaimReward,
            Payload::DposV2ClaimRewardRealWithdraw(_) => TxType::DposV2ClaimRewardRealWithdraw,
            Payload::ExchangeVotes => TxType::ExchangeVotes,
            Payload::Voting(_) => TxType::Voting,
            Payload::ReturnVotes(_) => TxType::ReturnVotes,
            Payload::VotesRealWithdraw(_) => TxType::VotesRealWithdraw,
        }
    }

    /// Full payload encoding for `version`, as embedded in the transaction.
    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        match self {
            Payload::TransferAsset
            | Payload::ReturnDepositCoin
            | Payload::ReturnCrDepositCoin
            | Payload::CrcAppropriation
            | Payload::ExchangeVotes => {}
            Payload::CoinBase(p) => p.serialize(buf),
            Payload::WithdrawFromSideChain(p) => p.serialize(buf, version),
            Payload::RegisterProducer(p) | Payload::UpdateProducer(p) => p.serialize(buf, version),
            Payload::CancelProducer(p) => p.serialize(buf),
            Payload::ActivateProducer(p) => p.serialize(buf),
            Payload::IllegalProposalEvidence(p) => p.serialize(buf),
            Payload::IllegalVoteEvidence(p) => p.serialize(buf),
            Payload::IllegalBlockEvidence(p) => p.serialize(buf),
            Payload::NextTurnDposInfo(p) => p.serialize(buf),
            Payload::ProposalResult(p) => p.serialize(buf),
            Payload::RegisterCr(p) | Payload::UpdateCr(p) => p.serialize(buf, version),
            Payload::UnregisterCr(p) => p.serialize(buf),
            Payload::CrcProposal(p) => p.serialize(buf, version),
            Payload::CrcProposalReview(p) => p.serialize(buf, version),
            Payload::CrcProposalTracking(p) => p.serialize(buf, version),
            Payload::CrcProposalWithdraw(p) => p.serialize(buf, version),
            Payload::CrcProposalRealWithdraw(p) | Payload::DposV2ClaimRewardRealWithdraw(p) => {
                p.serialize(buf)
            }
            Payload::DposV2ClaimReward(p) => p.serialize(buf, version),
            Payload::Voting(p) => p.serialize(buf),
            Payload::ReturnVotes(p) => p.serialize(buf, version),
            Payload::VotesRealWithdraw(p) => p.serialize(buf),
        }
    }
}
