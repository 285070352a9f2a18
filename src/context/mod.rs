//! Per-kind context rules.
//!
//! Each transaction kind has one [`ContextValidator`], looked up by
//! [`validator`]. A validator checks the payload against chain state and
//! returns a [`Verdict`]: kinds whose acceptance is fully decided here
//! (system payouts, evidence, zero-cost kinds) return `Final`; ordinary
//! spends return `Continue` so the pipeline runs the common stage.

use crate::error::ValidationError;
use crate::params::ValidationParameters;
use crate::payload::TxType;
use crate::transaction::Transaction;

pub(crate) mod common;
pub mod cr;
pub mod crosschain;
pub mod evidence;
pub mod producer;
pub mod proposal;
pub mod record;
pub mod staking;

// -----------------------------------------------------------------------------
// Verdict
// -----------------------------------------------------------------------------

/// Outcome of a successful context check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Accept now; skip the common stage.
    Final,
    /// Run references, program hashes, program signatures and fee next.
    Continue,
}

// -----------------------------------------------------------------------------
// ContextValidator
// -----------------------------------------------------------------------------

/// State-dependent rules for one transaction kind.
pub trait ContextValidator: Sync {
    /// Kind this validator is registered for.
    fn tx_type(&self) -> TxType;

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError>;

    /// Rejects a transaction whose tag names another kind, then runs [`check`](Self::check).
    fn check_kind(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if tx.tx_type != self.tx_type() {
            return Err(ValidationError::payload_type(format!(
                "{} rules applied to {} transaction",
                self.tx_type(),
                tx.tx_type
            )));
        }
        self.check(tx, params)
    }
}

/// Dispatch table keyed by type tag.
static VALIDATORS: [&dyn ContextValidator; 29] = [
    &record::CoinBase,
    &record::TransferAsset,
    &crosschain::WithdrawFromSideChain,
    &producer::RegisterProducer,
    &producer::CancelProducer,
    &producer::UpdateProducer,
    &producer::ReturnDepositCoin,
    &producer::ActivateProducer,
    &evidence::IllegalProposalEvidence,
    &evidence::IllegalVoteEvidence,
    &evidence::IllegalBlockEvidence,
    &record::NextTurnDposInfo,
    &proposal::ProposalResult,
    &cr::RegisterCr,
    &cr::UnregisterCr,
    &cr::UpdateCr,
    &cr::ReturnCrDepositCoin,
    &proposal::CrcProposal,
    &proposal::CrcProposalReview,
    &proposal::CrcProposalTracking,
    &proposal::CrcAppropriation,
    &proposal::CrcProposalWithdraw,
    &proposal::CrcProposalRealWithdraw,
    &staking::DposV2ClaimReward,
    &staking::DposV2ClaimRewardRealWithdraw,
    &staking::ExchangeVotes,
    &staking::Voting,
    &staking::ReturnVotes,
    &staking::VotesRealWithdraw,
];

/// The validator registered for `tx_type`.
pub fn validator(tx_type: TxType) -> &'static dyn ContextValidator {
    let index = TxType::ALL
        .iter()
        .position(|t| *t == tx_type)
        .unwrap_or_default();
    VALIDATORS[index]
}
