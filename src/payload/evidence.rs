//! Misbehavior evidence payloads and the signed consensus artifacts they embed.
//!
//! Evidence carries the artifacts as raw bytes. Nothing inside is trusted:
//! every artifact is decoded with the bounded [`Reader`] and its hash is
//! recomputed from those bytes.

use crate::codec::{write_bool, write_u32, write_var_bytes, write_var_uint, Reader};
use crate::error::CodecError;
use crate::types::Uint256;

// -----------------------------------------------------------------------------
// Consensus artifacts
// -----------------------------------------------------------------------------

/// Fixed-size block header (84 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeader {
    pub version: u32,
    pub previous: Uint256,
    pub merkle_root: Uint256,
    pub timestamp: u32,
    pub bits: u32,
    pub height: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(84);
        write_u32(&mut buf, self.version);
        buf.extend_from_slice(self.previous.as_bytes());
        buf.extend_from_slice(self.merkle_root.as_bytes());
        write_u32(&mut buf, self.timestamp);
        write_u32(&mut buf, self.bits);
        write_u32(&mut buf, self.height);
        write_u32(&mut buf, self.nonce);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let header = Self {
            version: r.read_u32()?,
            previous: Uint256::read(&mut r)?,
            merkle_root: Uint256::read(&mut r)?,
            timestamp: r.read_u32()?,
            bits: r.read_u32()?,
            height: r.read_u32()?,
            nonce: r.read_u32()?,
        };
        r.finish()?;
        Ok(header)
    }

    pub fn hash(&self) -> Uint256 {
        Uint256::hash(&self.to_bytes())
    }
}

/// A sponsor's proposal to append `block_hash`, signed by the sponsor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DposProposal {
    pub sponsor: Vec<u8>,
    pub block_hash: Uint256,
    pub view_offset: u32,
    pub sign: Vec<u8>,
}

impl DposProposal {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, &self.sponsor);
        buf.extend_from_slice(self.block_hash.as_bytes());
        write_u32(&mut buf, self.view_offset);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.unsigned_bytes());
        write_var_bytes(buf, &self.sign);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        buf
    }

    pub fn hash(&self) -> Uint256 {
        Uint256::hash(&self.unsigned_bytes())
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            sponsor: r.read_var_bytes()?.to_vec(),
            block_hash: Uint256::read(r)?,
            view_offset: r.read_u32()?,
            sign: r.read_var_bytes()?.to_vec(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let p = Self::read(&mut r)?;
        r.finish()?;
        Ok(p)
    }
}

/// An arbitrator's vote on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DposProposalVote {
    pub proposal_hash: Uint256,
    pub signer: Vec<u8>,
    pub accept: bool,
    pub sign: Vec<u8>,
}

impl DposProposalVote {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.proposal_hash.as_bytes());
        write_var_bytes(&mut buf, &self.signer);
        write_bool(&mut buf, self.accept);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.unsigned_bytes());
        write_var_bytes(buf, &self.sign);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        buf
    }

    pub fn hash(&self) -> Uint256 {
        Uint256::hash(&self.unsigned_bytes())
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            proposal_hash: Uint256::read(r)?,
            signer: r.read_var_bytes()?.to_vec(),
            accept: r.read_bool()?,
            sign: r.read_var_bytes()?.to_vec(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let v = Self::read(&mut r)?;
        r.finish()?;
        Ok(v)
    }
}

/// Block confirmation: the proposal plus the votes collected for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Confirm {
    pub proposal: DposProposal,
    pub votes: Vec<DposProposalVote>,
}

impl Confirm {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.proposal.serialize(&mut buf);
        write_var_uint(&mut buf, self.votes.len() as u64);
        for v in &self.votes {
            v.serialize(&mut buf);
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let proposal = DposProposal::read(&mut r)?;
        let n = r.read_count()?;
        let mut votes = Vec::with_capacity(n);
        for _ in 0..n {
            votes.push(DposProposalVote::read(&mut r)?);
        }
        r.finish()?;
        Ok(Self { proposal, votes })
    }
}

// -----------------------------------------------------------------------------
// Evidence payloads
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockEvidence {
    pub header: Vec<u8>,
    pub block_confirm: Vec<u8>,
    pub signers: Vec<Vec<u8>>,
}

impl BlockEvidence {
    fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_bytes(buf, &self.header);
        write_var_bytes(buf, &self.block_confirm);
        write_var_uint(buf, self.signers.len() as u64);
        for s in &self.signers {
            write_var_bytes(buf, s);
        }
    }
}

/// Two different blocks confirmed at the same height.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IllegalBlocks {
    pub coin_type: u32,
    pub block_height: u32,
    pub evidence: BlockEvidence,
    pub compare_evidence: BlockEvidence,
}

impl IllegalBlocks {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_u32(buf, self.coin_type);
        write_u32(buf, self.block_height);
        self.evidence.serialize(buf);
        self.compare_evidence.serialize(buf);
    }

    pub fn hash(&self) -> Uint256 {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        Uint256::hash(&buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposalEvidence {
    pub proposal: Vec<u8>,
    pub block_height: u32,
    pub block_header: Vec<u8>,
}

impl ProposalEvidence {
    fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_bytes(buf, &self.proposal);
        write_u32(buf, self.block_height);
        write_var_bytes(buf, &self.block_header);
    }
}

/// One sponsor proposing two different blocks in the same view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IllegalProposals {
    pub evidence: ProposalEvidence,
    pub compare_evidence: ProposalEvidence,
}

impl IllegalProposals {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        self.evidence.serialize(buf);
        self.compare_evidence.serialize(buf);
    }

    pub fn hash(&self) -> Uint256 {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        Uint256::hash(&buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoteEvidence {
    pub proposal_evidence: ProposalEvidence,
    pub vote: Vec<u8>,
}

impl VoteEvidence {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.proposal_evidence.serialize(buf);
        write_var_bytes(buf, &self.vote);
    }
}

/// One arbitrator voting for two different proposals in the same view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IllegalVotes {
    pub evidence: VoteEvidence,
    pub compare_evidence: VoteEvidence,
}

impl IllegalVotes {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        self.evidence.serialize(buf);
        self.compare_evidence.serialize(buf);
    }

    pub fn hash(&self) -> Uint256 {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        Uint256::hash(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_decode_rejects_short_and_long_input() {
        let header = BlockHeader {
            height: 42,
            ..Default::default()
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 84);
        assert_eq!(BlockHeader::from_bytes(&bytes).expect("decode"), header);
        assert_eq!(
            BlockHeader::from_bytes(&bytes[..83]),
            Err(CodecError::IncompleteData)
        );
        let mut long = bytes.clone();
        long.push(0);
        assert_eq!(BlockHeader::from_bytes(&long), Err(CodecError::TrailingData(1)));
    }

    #[test]
    fn proposal_hash_ignores_signature() {
        let mut p = DposProposal {
            sponsor: vec![2; 33],
            view_offset: 3,
            ..Default::default()
        };
        let h = p.hash();
        p.sign = vec![9; 64];
        assert_eq!(p.hash(), h);
        assert_eq!(DposProposal::from_bytes(&p.to_bytes()).expect("decode"), p);
    }

    #[test]
    fn confirm_with_huge_vote_count_is_rejected() {
        let mut bytes = DposProposal::default().to_bytes();
        write_var_uint(&mut bytes, u64::MAX);
        assert!(matches!(
            Confirm::from_bytes(&bytes),
            Err(CodecError::LengthTooLarge(_))
        ));
    }
}
