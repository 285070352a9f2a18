//! In-memory [`StateView`] for tests and light callers.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{
    CandidateState, CrCandidate, CrMember, NextArbitrators, PendingWithdrawal, Producer,
    ProducerState, ProposalState, StateView, WithdrawalKind,
};
use crate::crypto::ProgramCode;
use crate::payload::VoteCategory;
use crate::types::{Fixed64, ProgramHash, Uint256};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub producers: Vec<Producer>,
    pub cr_candidates: HashMap<ProgramHash, CrCandidate>,
    /// Keyed by DID.
    pub cr_members: HashMap<ProgramHash, CrMember>,
    pub proposals: HashMap<Uint256, ProposalState>,
    pub secretary_general: Option<Vec<u8>>,
    /// Half-open `[start, end)` voting window.
    pub voting_period: Option<(u32, u32)>,
    pub in_election_period: bool,
    pub cr_assets: Fixed64,
    /// `Some` when an appropriation is due, with its exact amount.
    pub appropriation: Option<Fixed64>,
    pub vote_rights: HashMap<ProgramHash, Fixed64>,
    pub used_votes: HashMap<(ProgramHash, VoteCategory), Fixed64>,
    pub rewards: HashMap<ProgramHash, Fixed64>,
    pub pending_withdrawals: HashMap<(WithdrawalKind, Uint256), PendingWithdrawal>,
    pub live_arbitrators: Vec<Vec<u8>>,
    /// Arbitrator set in force from each height on.
    pub arbitrator_history: BTreeMap<u32, Vec<Vec<u8>>>,
    pub next_arbitrators: NextArbitrators,
    pub evidences: HashSet<Uint256>,
    pub withdrawn_side_chain_txs: HashSet<Uint256>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_producer(&mut self, producer: Producer) {
        self.producers
            .retain(|p| p.owner_key() != producer.owner_key());
        self.producers.push(producer);
    }

    pub fn insert_candidate(&mut self, candidate: CrCandidate) {
        self.cr_candidates.insert(candidate.info.cid, candidate);
    }

    pub fn insert_member(&mut self, member: CrMember) {
        self.cr_members.insert(member.info.did, member);
    }

    pub fn insert_proposal(&mut self, hash: Uint256, proposal: ProposalState) {
        self.proposals.insert(hash, proposal);
    }

    pub fn set_used_votes(&mut self, stake: ProgramHash, category: VoteCategory, used: Fixed64) {
        self.used_votes.insert((stake, category), used);
    }

    fn code_key(code: &[u8]) -> Option<&[u8]> {
        match ProgramCode::classify(code).ok()? {
            ProgramCode::Standard { key } | ProgramCode::Schnorr { key } => Some(key),
            ProgramCode::Multisig { .. } => None,
        }
    }
}

impl StateView for MemoryState {
    fn producer_by_owner(&self, owner_key: &[u8]) -> Option<Producer> {
        self.producers
            .iter()
            .find(|p| p.owner_key() == owner_key)
            .cloned()
    }

    fn producer_by_node(&self, node_key: &[u8]) -> Option<Producer> {
        self.producers
            .iter()
            .find(|p| p.node_key() == node_key)
            .cloned()
    }

    fn nickname_exists(&self, nickname: &str) -> bool {
        let producers = self.producers.iter().any(|p| {
            p.info.nickname == nickname
                && !matches!(p.state, ProducerState::Canceled | ProducerState::Returned)
        });
        let candidates = self.cr_candidates.values().any(|c| {
            c.info.nickname == nickname
                && matches!(c.state, CandidateState::Pending | CandidateState::Active)
        });
        producers || candidates
    }

    fn cr_candidate(&self, cid: &ProgramHash) -> Option<CrCandidate> {
        self.cr_candidates.get(cid).cloned()
    }

    fn cr_member(&self, did: &ProgramHash) -> Option<CrMember> {
        self.cr_members.get(did).cloned()
    }

    fn cr_code_key_exists(&self, key: &[u8]) -> bool {
        self.cr_candidates
            .values()
            .map(|c| &c.info.code)
            .chain(self.cr_members.values().map(|m| &m.info.code))
            .any(|code| Self::code_key(code) == Some(key))
    }

    fn is_in_voting_period(&self, height: u32) -> bool {
        self.voting_period
            .map(|(start, end)| (start..end).contains(&height))
            .unwrap_or(false)
    }

    fn is_in_election_period(&self) -> bool {
        self.in_election_period
    }

    fn proposal(&self, hash: &Uint256) -> Option<ProposalState> {
        self.proposals.get(hash).cloned()
    }

    fn secretary_general_key(&self) -> Option<Vec<u8>> {
        self.secretary_general.clone()
    }

    fn cr_assets_amount(&self) -> Fixed64 {
        self.cr_assets
    }

    fn need_appropriation(&self) -> bool {
        self.appropriation.is_some()
    }

    fn appropriation_amount(&self) -> Fixed64 {
        self.appropriation.unwrap_or(Fixed64::ZERO)
    }

    fn vote_rights(&self, stake: &ProgramHash) -> Fixed64 {
        self.vote_rights.get(stake).copied().unwrap_or(Fixed64::ZERO)
    }

    fn used_votes(&self, stake: &ProgramHash, category: VoteCategory) -> Fixed64 {
        self.used_votes
            .get(&(*stake, category))
            .copied()
            .unwrap_or(Fixed64::ZERO)
    }

    fn dpos_v2_reward(&self, stake: &ProgramHash) -> Fixed64 {
        self.rewards.get(stake).copied().unwrap_or(Fixed64::ZERO)
    }

    fn pending_withdrawal(
        &self,
        kind: WithdrawalKind,
        tx_hash: &Uint256,
    ) -> Option<PendingWithdrawal> {
        self.pending_withdrawals.get(&(kind, *tx_hash)).copied()
    }

    fn live_arbitrators(&self) -> Vec<Vec<u8>> {
        self.live_arbitrators.clone()
    }

    fn arbitrators_at(&self, height: u32) -> Option<Vec<Vec<u8>>> {
        self.arbitrator_history
            .range(..=height)
            .next_back()
            .map(|(_, set)| set.clone())
    }

    fn next_arbitrators(&self) -> NextArbitrators {
        self.next_arbitrators.clone()
    }

    fn evidence_exists(&self, hash: &Uint256) -> bool {
        self.evidences.contains(hash)
    }

    fn side_chain_tx_withdrawn(&self, hash: &Uint256) -> bool {
        self.withdrawn_side_chain_txs.contains(hash)
    }
}
