//! Misbehavior evidence: two conflicting artifacts signed by the same
//! arbitrator in the same view and height.
//!
//! Evidence fields carry raw bytes; everything is parsed with the bounded
//! reader and must consume its input exactly. Each pair must be submitted in
//! canonical order (first < second), so the same misbehavior has a single
//! transaction hash.

use std::collections::HashSet;

use tracing::trace;

use crate::crypto;
use crate::error::ValidationError;
use crate::payload::{
    BlockEvidence, BlockHeader, Confirm, DposProposal, DposProposalVote, IllegalBlocks,
    IllegalProposals, IllegalVotes, ProposalEvidence,
};
use crate::state::StateView;

/// Coin type of main-chain block evidence.
pub const ELA_COIN_TYPE: u32 = 0;

/// Checks evidence pairs against the arbitrator history.
#[derive(Clone, Copy)]
pub struct EvidenceComparator<'a> {
    state: &'a dyn StateView,
}

impl<'a> EvidenceComparator<'a> {
    pub fn new(state: &'a dyn StateView) -> Self {
        Self { state }
    }

    fn arbitrators_at(&self, height: u32) -> Result<Vec<Vec<u8>>, ValidationError> {
        self.state.arbitrators_at(height).ok_or_else(|| {
            ValidationError::state(format!("can not get arbitrators at height {}", height))
        })
    }

    // -------------------------------------------------------------------------
    // Blocks
    // -------------------------------------------------------------------------

    /// Two different blocks at one height, each confirmed by a sponsor in the same view.
    pub fn compare_blocks(&self, p: &IllegalBlocks) -> Result<(), ValidationError> {
        if p.coin_type != ELA_COIN_TYPE {
            return Err(ValidationError::structural("unknown evidence coin type"));
        }
        let header = BlockHeader::from_bytes(&p.evidence.header)?;
        let compare_header = BlockHeader::from_bytes(&p.compare_evidence.header)?;
        if header.height != compare_header.height {
            return Err(ValidationError::structural("should be in same height"));
        }
        if header.height != p.block_height {
            return Err(ValidationError::structural("evidence height does not match block"));
        }
        if header.hash() == compare_header.hash() {
            return Err(ValidationError::structural("blocks can not be same"));
        }
        if p.evidence.header > p.compare_evidence.header {
            return Err(ValidationError::structural("evidence order error"));
        }

        let confirm = Confirm::from_bytes(&p.evidence.block_confirm)?;
        let compare_confirm = Confirm::from_bytes(&p.compare_evidence.block_confirm)?;
        if confirm.proposal.block_hash != header.hash()
            || compare_confirm.proposal.block_hash != compare_header.hash()
        {
            return Err(ValidationError::structural("block and confirm do not match"));
        }
        if confirm.proposal.sponsor != compare_confirm.proposal.sponsor {
            return Err(ValidationError::structural("should be same sponsor"));
        }
        if confirm.proposal.view_offset != compare_confirm.proposal.view_offset {
            return Err(ValidationError::structural("should in same view"));
        }

        let arbiters = self.arbitrators_at(p.block_height)?;
        Self::check_confirm(&confirm, &p.evidence, &arbiters)?;
        Self::check_confirm(&compare_confirm, &p.compare_evidence, &arbiters)?;
        Ok(())
    }

    /// A confirm must carry a signed proposal plus more than two thirds of
    /// accepting arbitrator votes, and its signer list must equal the voters.
    fn check_confirm(
        confirm: &Confirm,
        evidence: &BlockEvidence,
        arbiters: &[Vec<u8>],
    ) -> Result<(), ValidationError> {
        Self::check_proposal_signature(&confirm.proposal, arbiters)?;
        let proposal_hash = confirm.proposal.hash();
        let mut voters = HashSet::with_capacity(confirm.votes.len());
        for vote in &confirm.votes {
            if vote.proposal_hash != proposal_hash {
                return Err(ValidationError::structural("vote does not belong to proposal"));
            }
            if !vote.accept {
                continue;
            }
            Self::check_vote_signature(vote, arbiters)?;
            if !voters.insert(vote.signer.as_slice()) {
                return Err(ValidationError::structural("duplicated confirm vote signer"));
            }
        }
        if voters.len() * 3 <= arbiters.len() * 2 {
            return Err(ValidationError::signature("confirm votes are not enough"));
        }
        let signers: HashSet<&[u8]> = evidence.signers.iter().map(Vec::as_slice).collect();
        if signers.len() != evidence.signers.len() || signers != voters {
            return Err(ValidationError::structural(
                "signers and confirm votes do not match",
            ));
        }
        trace!(votes = voters.len(), arbiters = arbiters.len(), "confirm checked");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Proposals
    // -------------------------------------------------------------------------

    /// One sponsor proposing two different blocks in the same view and height.
    pub fn compare_proposals(&self, p: &IllegalProposals) -> Result<(), ValidationError> {
        let (proposal, _) = Self::parse_proposal_evidence(&p.evidence)?;
        let (compare, _) = Self::parse_proposal_evidence(&p.compare_evidence)?;
        if p.evidence.block_height != p.compare_evidence.block_height {
            return Err(ValidationError::structural("should be in same height"));
        }
        let hash = proposal.hash();
        let compare_hash = compare.hash();
        if hash == compare_hash {
            return Err(ValidationError::structural("proposals can not be same"));
        }
        if hash > compare_hash {
            return Err(ValidationError::structural("evidence order error"));
        }
        if proposal.sponsor != compare.sponsor {
            return Err(ValidationError::structural("should be same sponsor"));
        }
        if proposal.view_offset != compare.view_offset {
            return Err(ValidationError::structural("should in same view"));
        }

        let arbiters = self.arbitrators_at(p.evidence.block_height)?;
        Self::check_proposal_signature(&proposal, &arbiters)?;
        Self::check_proposal_signature(&compare, &arbiters)?;
        Ok(())
    }

    /// Parses a proposal and the header it proposes; both must agree.
    fn parse_proposal_evidence(
        evidence: &ProposalEvidence,
    ) -> Result<(DposProposal, BlockHeader), ValidationError> {
        let proposal = DposProposal::from_bytes(&evidence.proposal)?;
        let header = BlockHeader::from_bytes(&evidence.block_header)?;
        if header.height != evidence.block_height {
            return Err(ValidationError::structural(
                "evidence height and block header height do not match",
            ));
        }
        if proposal.block_hash != header.hash() {
            return Err(ValidationError::structural(
                "proposal and block header do not match",
            ));
        }
        Ok((proposal, header))
    }

    fn check_proposal_signature(
        proposal: &DposProposal,
        arbiters: &[Vec<u8>],
    ) -> Result<(), ValidationError> {
        if !arbiters.iter().any(|a| *a == proposal.sponsor) {
            return Err(ValidationError::state("proposal sponsor is not an arbitrator"));
        }
        crypto::verify_standard(&proposal.sponsor, &proposal.unsigned_bytes(), &proposal.sign)
            .map_err(|_| ValidationError::signature("invalid proposal signature"))
    }

    // -------------------------------------------------------------------------
    // Votes
    // -------------------------------------------------------------------------

    /// One arbitrator voting on two different proposals in the same view and height.
    pub fn compare_votes(&self, p: &IllegalVotes) -> Result<(), ValidationError> {
        let (proposal, _) = Self::parse_proposal_evidence(&p.evidence.proposal_evidence)?;
        let (compare_proposal, _) =
            Self::parse_proposal_evidence(&p.compare_evidence.proposal_evidence)?;
        let vote = DposProposalVote::from_bytes(&p.evidence.vote)?;
        let compare = DposProposalVote::from_bytes(&p.compare_evidence.vote)?;

        if p.evidence.proposal_evidence.block_height
            != p.compare_evidence.proposal_evidence.block_height
        {
            return Err(ValidationError::structural("should be in same height"));
        }
        if proposal.view_offset != compare_proposal.view_offset {
            return Err(ValidationError::structural("should in same view"));
        }
        let hash = vote.hash();
        let compare_hash = compare.hash();
        if hash == compare_hash {
            return Err(ValidationError::structural("votes can not be same"));
        }
        if hash > compare_hash {
            return Err(ValidationError::structural("evidence order error"));
        }
        if vote.signer != compare.signer {
            return Err(ValidationError::structural("should be same signer"));
        }
        if vote.proposal_hash != proposal.hash() || compare.proposal_hash != compare_proposal.hash()
        {
            return Err(ValidationError::structural("vote and proposal do not match"));
        }

        let arbiters = self.arbitrators_at(p.evidence.proposal_evidence.block_height)?;
        Self::check_proposal_signature(&proposal, &arbiters)?;
        Self::check_proposal_signature(&compare_proposal, &arbiters)?;
        Self::check_vote_signature(&vote, &arbiters)?;
        Self::check_vote_signature(&compare, &arbiters)?;
        Ok(())
    }

    fn check_vote_signature(
        vote: &DposProposalVote,
        arbiters: &[Vec<u8>],
    ) -> Result<(), ValidationError> {
        if !arbiters.iter().any(|a| *a == vote.signer) {
            return Err(ValidationError::state("vote signer is not an arbitrator"));
        }
        crypto::verify_standard(&vote.signer, &vote.unsigned_bytes(), &vote.sign)
            .map_err(|_| ValidationError::signature("invalid vote signature"))
    }
}

impl core::fmt::Debug for EvidenceComparator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EvidenceComparator").finish_non_exhaustive()
    }
}
