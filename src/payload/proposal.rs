//! Governance payloads: proposals, reviews, tracking, withdrawals and results.
//!
//! Proposals and tracking records are signed by several parties in sequence;
//! the pieces each party appends are exposed here so the chained verifier can
//! rebuild the exact buffers (see [`crate::crypto::chain`]).

use crate::codec::{write_bool, write_u16, write_var_bytes, write_var_string, write_var_uint};
use crate::types::{Fixed64, ProgramHash, Uint256};

/// Version carrying the raw draft / opinion / message bytes next to their hash.
pub const PROPOSAL_DATA_VERSION: u8 = 1;
/// Withdraw version declaring recipient and amount explicitly.
pub const WITHDRAW_RECIPIENT_VERSION: u8 = 1;

/// Normal proposal type; the only one carrying budgets.
pub const PROPOSAL_TYPE_NORMAL: u16 = 0x0000;
/// ELIP proposal type (no payout, no budgets beyond a single final entry).
pub const PROPOSAL_TYPE_ELIP: u16 = 0x0100;

// -----------------------------------------------------------------------------
// Budgets
// -----------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetType {
    Imprest = 0x00,
    NormalPayment = 0x01,
    FinalPayment = 0x02,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub budget_type: BudgetType,
    pub stage: u8,
    pub amount: Fixed64,
}

impl Budget {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.push(self.budget_type as u8);
        buf.push(self.stage);
        self.amount.write(buf);
    }
}

// -----------------------------------------------------------------------------
// CRCProposal
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcProposal {
    pub proposal_type: u16,
    pub category_data: String,
    pub owner_key: Vec<u8>,
    pub draft_hash: Uint256,
    pub draft_data: Vec<u8>,
    pub budgets: Vec<Budget>,
    pub recipient: ProgramHash,
    pub signature: Vec<u8>,
    pub cr_council_member_did: ProgramHash,
    pub cr_council_member_signature: Vec<u8>,
}

impl CrcProposal {
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        write_u16(buf, self.proposal_type);
        write_var_string(buf, &self.category_data);
        write_var_bytes(buf, &self.owner_key);
        buf.extend_from_slice(self.draft_hash.as_bytes());
        if version >= PROPOSAL_DATA_VERSION {
            write_var_bytes(buf, &self.draft_data);
        }
        write_var_uint(buf, self.budgets.len() as u64);
        for b in &self.budgets {
            b.write(buf);
        }
        buf.extend_from_slice(self.recipient.as_bytes());
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        write_var_bytes(buf, &self.signature);
        buf.extend_from_slice(self.cr_council_member_did.as_bytes());
        write_var_bytes(buf, &self.cr_council_member_signature);
    }

    /// Proposal id: hash of the complete payload.
    pub fn hash(&self, version: u8) -> Uint256 {
        let mut buf = Vec::new();
        self.serialize(&mut buf, version);
        Uint256::hash(&buf)
    }

    /// Sum of all budget amounts; `None` on overflow.
    pub fn total_budget(&self) -> Option<Fixed64> {
        Fixed64::checked_sum(self.budgets.iter().map(|b| b.amount))
    }
}

// -----------------------------------------------------------------------------
// CRCProposalReview
// -----------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewResult {
    Approve = 0x00,
    Reject = 0x01,
    Abstain = 0x02,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcProposalReview {
    pub proposal_hash: Uint256,
    pub vote_result: ReviewResult,
    pub opinion_hash: Uint256,
    pub opinion_data: Vec<u8>,
    pub did: ProgramHash,
    pub signature: Vec<u8>,
}

impl CrcProposalReview {
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        buf.extend_from_slice(self.proposal_hash.as_bytes());
        buf.push(self.vote_result as u8);
        buf.extend_from_slice(self.opinion_hash.as_bytes());
        if version >= PROPOSAL_DATA_VERSION {
            write_var_bytes(buf, &self.opinion_data);
        }
        buf.extend_from_slice(self.did.as_bytes());
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        write_var_bytes(buf, &self.signature);
    }
}

// -----------------------------------------------------------------------------
// CRCProposalTracking
// -----------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingType {
    Common = 0x00,
    Progress = 0x01,
    Rejected = 0x02,
    Terminated = 0x03,
    ChangeOwner = 0x04,
    Finalized = 0x05,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcProposalTracking {
    pub proposal_hash: Uint256,
    pub message_hash: Uint256,
    pub message_data: Vec<u8>,
    pub stage: u8,
    pub owner_key: Vec<u8>,
    /// Empty unless the tracking changes the owner.
    pub new_owner_key: Vec<u8>,
    pub owner_signature: Vec<u8>,
    pub new_owner_signature: Vec<u8>,
    pub tracking_type: TrackingType,
    pub secretary_general_opinion_hash: Uint256,
    pub secretary_general_opinion_data: Vec<u8>,
    pub secretary_general_signature: Vec<u8>,
}

impl CrcProposalTracking {
    /// What the owner signs.
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        buf.extend_from_slice(self.proposal_hash.as_bytes());
        buf.extend_from_slice(self.message_hash.as_bytes());
        if version >= PROPOSAL_DATA_VERSION {
            write_var_bytes(buf, &self.message_data);
        }
        buf.push(self.stage);
        write_var_bytes(buf, &self.owner_key);
        write_var_bytes(buf, &self.new_owner_key);
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    /// Bytes the secretary general appends after both owner signatures.
    pub fn secretary_general_preamble(&self, version: u8) -> Vec<u8> {
        let mut buf = vec![self.tracking_type as u8];
        buf.extend_from_slice(self.secretary_general_opinion_hash.as_bytes());
        if version >= PROPOSAL_DATA_VERSION {
            write_var_bytes(&mut buf, &self.secretary_general_opinion_data);
        }
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        write_var_bytes(buf, &self.owner_signature);
        write_var_bytes(buf, &self.new_owner_signature);
        buf.extend_from_slice(&self.secretary_general_preamble(version));
        write_var_bytes(buf, &self.secretary_general_signature);
    }
}

// -----------------------------------------------------------------------------
// CRCProposalWithdraw
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcProposalWithdraw {
    pub proposal_hash: Uint256,
    pub owner_key: Vec<u8>,
    pub recipient: ProgramHash,
    pub amount: Fixed64,
    pub signature: Vec<u8>,
}

impl CrcProposalWithdraw {
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        buf.extend_from_slice(self.proposal_hash.as_bytes());
        write_var_bytes(buf, &self.owner_key);
        if version >= WITHDRAW_RECIPIENT_VERSION {
            buf.extend_from_slice(self.recipient.as_bytes());
            self.amount.write(buf);
        }
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        write_var_bytes(buf, &self.signature);
    }
}

// -----------------------------------------------------------------------------
// Settlement & results
// -----------------------------------------------------------------------------

/// Batch settlement of pending withdrawals, identified by the hashes of the
/// transactions that requested them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RealWithdraw {
    pub withdraw_tx_hashes: Vec<Uint256>,
}

impl RealWithdraw {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_uint(buf, self.withdraw_tx_hashes.len() as u64);
        for h in &self.withdraw_tx_hashes {
            buf.extend_from_slice(h.as_bytes());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalResultItem {
    pub proposal_hash: Uint256,
    pub proposal_type: u16,
    pub result: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposalResult {
    pub results: Vec<ProposalResultItem>,
}

impl ProposalResult {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_uint(buf, self.results.len() as u64);
        for r in &self.results {
            buf.extend_from_slice(r.proposal_hash.as_bytes());
            write_u16(buf, r.proposal_type);
            write_bool(buf, r.result);
        }
    }
}
