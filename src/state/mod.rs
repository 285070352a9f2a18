//! Read-only chain state consumed by validation.
//!
//! The engine never mutates state and never resolves UTXOs. Block
//! application (outside this crate) owns the entities below and must not
//! mutate them while a validation call holds a view.

use std::collections::BTreeMap;

use crate::payload::{CrInfo, CrcProposal, ProducerInfo, VoteCategory};
use crate::types::{Fixed64, ProgramHash, Uint256};

pub mod memory;

pub use memory::MemoryState;

// -----------------------------------------------------------------------------
// Producers
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerState {
    Pending,
    Active,
    Inactive,
    Canceled,
    Illegal,
    Returned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerIdentity {
    DposV1,
    DposV2,
    DposV1V2,
}

impl ProducerIdentity {
    pub fn accepts_v2_votes(self) -> bool {
        matches!(self, ProducerIdentity::DposV2 | ProducerIdentity::DposV1V2)
    }

    pub fn accepts_v1_votes(self) -> bool {
        matches!(self, ProducerIdentity::DposV1 | ProducerIdentity::DposV1V2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    pub info: ProducerInfo,
    pub state: ProducerState,
    pub identity: ProducerIdentity,
    pub register_height: u32,
    pub cancel_height: u32,
    /// Height of the last accepted activation request.
    pub activate_request_height: Option<u32>,
    /// DPoS v2 stake lock; the producer keeps stake until this height.
    pub stake_until: u32,
    pub deposit_amount: Fixed64,
    pub penalty: Fixed64,
}

impl Producer {
    pub fn owner_key(&self) -> &[u8] {
        &self.info.owner_key
    }

    pub fn node_key(&self) -> &[u8] {
        &self.info.node_key
    }

    /// Deposit left after penalties; `None` on overflow.
    pub fn available_deposit(&self) -> Option<Fixed64> {
        self.deposit_amount.checked_sub(self.penalty)
    }
}

// -----------------------------------------------------------------------------
// Council
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateState {
    Pending,
    Active,
    Canceled,
    Returned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrCandidate {
    pub info: CrInfo,
    pub state: CandidateState,
    pub register_height: u32,
    pub cancel_height: u32,
    pub deposit_amount: Fixed64,
    pub penalty: Fixed64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberState {
    Elected,
    Impeached,
    Returned,
    Terminated,
    Inactive,
    Illegal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrMember {
    pub info: CrInfo,
    pub state: MemberState,
    pub deposit_amount: Fixed64,
    pub penalty: Fixed64,
}

// -----------------------------------------------------------------------------
// Proposals
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalStatus {
    Registered,
    CrAgreed,
    VoterAgreed,
    Finished,
    CrCanceled,
    VoterCanceled,
    Aborted,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalState {
    pub proposal: CrcProposal,
    pub status: ProposalStatus,
    /// Current owner key; changes through change-owner tracking.
    pub owner_key: Vec<u8>,
    pub register_height: u32,
    /// Budget amounts unlocked for withdrawal, by stage.
    pub withdrawable_budgets: BTreeMap<u8, Fixed64>,
    /// Budget amounts already withdrawn, by stage.
    pub withdrawn_budgets: BTreeMap<u8, Fixed64>,
}

impl ProposalState {
    /// Unlocked but not yet withdrawn; `None` on overflow.
    pub fn available_withdrawal_amount(&self) -> Option<Fixed64> {
        Fixed64::checked_sum(
            self.withdrawable_budgets
                .iter()
                .filter(|(stage, _)| !self.withdrawn_budgets.contains_key(stage))
                .map(|(_, amount)| *amount),
        )
    }
}

// -----------------------------------------------------------------------------
// Settlement
// -----------------------------------------------------------------------------

/// The three pending-withdrawal ledgers settled by real-withdraw transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WithdrawalKind {
    CrcProposal,
    Votes,
    DposV2Reward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWithdrawal {
    pub recipient: ProgramHash,
    pub amount: Fixed64,
}

/// Arbitrators expected for the next turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NextArbitrators {
    pub cr_public_keys: Vec<Vec<u8>>,
    pub dpos_public_keys: Vec<Vec<u8>>,
}

// -----------------------------------------------------------------------------
// StateView
// -----------------------------------------------------------------------------

/// Read-only view of chain state, injected per validation call.
///
/// `evidence_exists` must be answered atomically with respect to the
/// caller's commit of accepted evidence.
pub trait StateView: Send + Sync {
    // --- producers ---
    fn producer_by_owner(&self, owner_key: &[u8]) -> Option<Producer>;
    fn producer_by_node(&self, node_key: &[u8]) -> Option<Producer>;
    /// Nickname taken by any producer or CR candidate.
    fn nickname_exists(&self, nickname: &str) -> bool;

    // --- council ---
    fn cr_candidate(&self, cid: &ProgramHash) -> Option<CrCandidate>;
    fn cr_member(&self, did: &ProgramHash) -> Option<CrMember>;
    /// `key` appears in the code of any CR candidate or member.
    fn cr_code_key_exists(&self, key: &[u8]) -> bool;
    fn is_in_voting_period(&self, height: u32) -> bool;
    fn is_in_election_period(&self) -> bool;
    fn proposal(&self, hash: &Uint256) -> Option<ProposalState>;
    fn secretary_general_key(&self) -> Option<Vec<u8>>;
    fn cr_assets_amount(&self) -> Fixed64;
    fn need_appropriation(&self) -> bool;
    fn appropriation_amount(&self) -> Fixed64;

    // --- stake & votes ---
    fn vote_rights(&self, stake: &ProgramHash) -> Fixed64;
    fn used_votes(&self, stake: &ProgramHash, category: VoteCategory) -> Fixed64;
    fn dpos_v2_reward(&self, stake: &ProgramHash) -> Fixed64;
    fn pending_withdrawal(&self, kind: WithdrawalKind, tx_hash: &Uint256)
        -> Option<PendingWithdrawal>;

    // --- arbitrators ---
    /// Non-suspended arbitrators of the current turn, in order.
    fn live_arbitrators(&self) -> Vec<Vec<u8>>;
    /// Arbitrator set in force at a past `height`.
    fn arbitrators_at(&self, height: u32) -> Option<Vec<Vec<u8>>>;
    fn next_arbitrators(&self) -> NextArbitrators;

    // --- idempotency ---
    fn evidence_exists(&self, hash: &Uint256) -> bool;
    fn side_chain_tx_withdrawn(&self, hash: &Uint256) -> bool;
}
