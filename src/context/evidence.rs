//! Evidence transactions. Each is accepted once; the pair itself is judged
//! by [`EvidenceComparator`].

use super::common::payload_mismatch;
use super::{ContextValidator, Verdict};
use crate::error::ValidationError;
use crate::evidence::EvidenceComparator;
use crate::params::ValidationParameters;
use crate::payload::{Payload, TxType};
use crate::transaction::Transaction;
use crate::types::Uint256;

fn check_fresh(hash: Uint256, params: &ValidationParameters<'_>) -> Result<(), ValidationError> {
    if params.state.evidence_exists(&hash) {
        return Err(ValidationError::state("tx already exists"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct IllegalProposalEvidence;

impl ContextValidator for IllegalProposalEvidence {
    fn tx_type(&self) -> TxType {
        TxType::IllegalProposalEvidence
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::IllegalProposalEvidence(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_fresh(p.hash(), params)?;
        EvidenceComparator::new(params.state).compare_proposals(p)?;
        Ok(Verdict::Final)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IllegalVoteEvidence;

impl ContextValidator for IllegalVoteEvidence {
    fn tx_type(&self) -> TxType {
        TxType::IllegalVoteEvidence
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::IllegalVoteEvidence(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_fresh(p.hash(), params)?;
        EvidenceComparator::new(params.state).compare_votes(p)?;
        Ok(Verdict::Final)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IllegalBlockEvidence;

impl ContextValidator for IllegalBlockEvidence {
    fn tx_type(&self) -> TxType {
        TxType::IllegalBlockEvidence
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::IllegalBlockEvidence(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_fresh(p.hash(), params)?;
        EvidenceComparator::new(params.state).compare_blocks(p)?;
        Ok(Verdict::Final)
    }
}
