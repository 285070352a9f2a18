//! Staking and voting payloads (DPoS v2 era).

use core::fmt;

use crate::codec::{write_u32, write_var_bytes, write_var_uint};
use crate::types::{Fixed64, ProgramHash, Uint256};

/// Version signed through the transaction's single program.
pub const RETURN_VOTES_PROGRAM_VERSION: u8 = 1;

/// The five independently tracked vote-rights categories.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoteCategory {
    Delegate = 0x00,
    Crc = 0x01,
    CrcProposal = 0x02,
    CrcImpeachment = 0x03,
    DposV2 = 0x04,
}

impl VoteCategory {
    pub const ALL: [VoteCategory; 5] = [
        VoteCategory::Delegate,
        VoteCategory::Crc,
        VoteCategory::CrcProposal,
        VoteCategory::CrcImpeachment,
        VoteCategory::DposV2,
    ];
}

impl fmt::Display for VoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VoteCategory::Delegate => "Delegate",
            VoteCategory::Crc => "CRC",
            VoteCategory::CrcProposal => "CRCProposal",
            VoteCategory::CrcImpeachment => "CRCImpeachment",
            VoteCategory::DposV2 => "DposV2",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotesWithLockTime {
    /// Producer owner key, CR CID, or proposal hash depending on the category.
    pub candidate: Vec<u8>,
    pub votes: Fixed64,
    /// Only meaningful for DPoS v2 votes.
    pub lock_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotesContent {
    pub category: VoteCategory,
    pub votes: Vec<VotesWithLockTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Voting {
    pub contents: Vec<VotesContent>,
}

impl Voting {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_uint(buf, self.contents.len() as u64);
        for content in &self.contents {
            buf.push(content.category as u8);
            write_var_uint(buf, content.votes.len() as u64);
            for v in &content.votes {
                write_var_bytes(buf, &v.candidate);
                v.votes.write(buf);
                write_u32(buf, v.lock_time);
            }
        }
    }
}

/// Unstake request: move `value` of vote rights back to `to_addr`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReturnVotes {
    pub to_addr: ProgramHash,
    /// Signer's redeem code (version 0 only).
    pub code: Vec<u8>,
    pub value: Fixed64,
    pub signature: Vec<u8>,
}

impl ReturnVotes {
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        buf.extend_from_slice(self.to_addr.as_bytes());
        if version < RETURN_VOTES_PROGRAM_VERSION {
            write_var_bytes(buf, &self.code);
        }
        self.value.write(buf);
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        if version < RETURN_VOTES_PROGRAM_VERSION {
            write_var_bytes(buf, &self.signature);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotesRealWithdrawItem {
    pub return_votes_tx_hash: Uint256,
    pub stake_address: ProgramHash,
    pub value: Fixed64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VotesRealWithdraw {
    pub items: Vec<VotesRealWithdrawItem>,
}

impl VotesRealWithdraw {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_uint(buf, self.items.len() as u64);
        for item in &self.items {
            buf.extend_from_slice(item.return_votes_tx_hash.as_bytes());
            buf.extend_from_slice(item.stake_address.as_bytes());
            item.value.write(buf);
        }
    }
}

/// Claim of accrued DPoS v2 rewards, signed by the claimant's code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DposV2ClaimReward {
    pub to_addr: ProgramHash,
    pub code: Vec<u8>,
    pub value: Fixed64,
    pub signature: Vec<u8>,
}

impl DposV2ClaimReward {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.to_addr.as_bytes());
        write_var_bytes(&mut buf, &self.code);
        self.value.write(&mut buf);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, _version: u8) {
        buf.extend_from_slice(&self.unsigned_bytes());
        write_var_bytes(buf, &self.signature);
    }
}
