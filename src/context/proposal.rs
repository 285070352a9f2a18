//! Council proposals: submission, review, tracking, withdrawal, settlement
//! and the committee's periodic appropriation.

use std::collections::HashSet;

use tracing::trace;

use super::common::{
    check_data, check_payload_signature, check_public_key, check_real_withdraw, code_key,
    payload_mismatch,
};
use super::{ContextValidator, Verdict};
use crate::crypto::{verify_chain, ChainLink};
use crate::error::ValidationError;
use crate::params::ValidationParameters;
use crate::payload::proposal::{
    PROPOSAL_DATA_VERSION, PROPOSAL_TYPE_ELIP, PROPOSAL_TYPE_NORMAL, WITHDRAW_RECIPIENT_VERSION,
};
use crate::payload::{Budget, BudgetType, Payload, TrackingType, TxType};
use crate::state::{MemberState, ProposalState, ProposalStatus, WithdrawalKind};
use crate::transaction::Transaction;
use crate::types::{prefix, Fixed64, Uint256};

/// Cap on draft and review opinion data.
pub const MAX_DRAFT_DATA_SIZE: usize = 1024 * 1024;
/// Cap on tracking message data.
pub const MAX_MESSAGE_DATA_SIZE: usize = 800 * 1024;
/// Cap on the secretary general's tracking opinion.
pub const MAX_SECRETARY_GENERAL_OPINION_DATA_SIZE: usize = 200 * 1024;
pub const MAX_CATEGORY_DATA_LEN: usize = 4096;

fn lookup_proposal(
    hash: &Uint256,
    params: &ValidationParameters<'_>,
) -> Result<ProposalState, ValidationError> {
    params
        .state
        .proposal(hash)
        .ok_or_else(|| ValidationError::state("proposal not exist"))
}

/// Stages run 0, 1, 2, ... in order; an imprest may only open the list and
/// exactly one final payment closes it.
fn check_budgets(budgets: &[Budget], proposal_type: u16) -> Result<(), ValidationError> {
    if budgets.is_empty() {
        if proposal_type == PROPOSAL_TYPE_ELIP {
            return Ok(());
        }
        return Err(ValidationError::structural("budgets can not be empty"));
    }
    let last = budgets.len() - 1;
    for (i, budget) in budgets.iter().enumerate() {
        if usize::from(budget.stage) != i {
            return Err(ValidationError::structural("budget stage must be in order"));
        }
        if budget.amount.is_negative() {
            return Err(ValidationError::structural("invalid budget amount"));
        }
        match budget.budget_type {
            BudgetType::Imprest if i != 0 => {
                return Err(ValidationError::structural(
                    "imprest payment must be the first stage",
                ))
            }
            BudgetType::FinalPayment if i != last => {
                return Err(ValidationError::structural(
                    "final payment must be the last stage",
                ))
            }
            _ => {}
        }
    }
    if budgets[last].budget_type != BudgetType::FinalPayment {
        return Err(ValidationError::structural("proposal must have a final payment"));
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// CRCProposal
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CrcProposal;

impl ContextValidator for CrcProposal {
    fn tx_type(&self) -> TxType {
        TxType::CrcProposal
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::CrcProposal(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let version = tx.payload_version;
        if params.state.is_in_election_period() {
            return Err(ValidationError::state(
                "cr proposal tx must not during election period",
            ));
        }
        if p.proposal_type != PROPOSAL_TYPE_NORMAL && p.proposal_type != PROPOSAL_TYPE_ELIP {
            return Err(ValidationError::structural("type of proposal should be known"));
        }
        if p.category_data.len() > MAX_CATEGORY_DATA_LEN {
            return Err(ValidationError::structural(format!(
                "the categoryData cannot be more than {} characters",
                MAX_CATEGORY_DATA_LEN
            )));
        }
        check_public_key(&p.owner_key, "owner")?;
        if version >= PROPOSAL_DATA_VERSION {
            check_data(&p.draft_data, &p.draft_hash, MAX_DRAFT_DATA_SIZE, "draft")?;
        }
        if !matches!(p.recipient.prefix(), prefix::STANDARD | prefix::MULTISIG) {
            return Err(ValidationError::structural("invalid recipient prefix"));
        }

        check_budgets(&p.budgets, p.proposal_type)?;
        let total = p
            .total_budget()
            .ok_or_else(|| ValidationError::economic("budget amount overflow"))?;
        let ceiling =
            i128::from(params.state.cr_assets_amount().0) * i128::from(params.config.proposal_budgets_percentage);
        if i128::from(total.0) * 100 > ceiling {
            return Err(ValidationError::economic(format!(
                "budgets exceeds {}% of CRC committee balance",
                params.config.proposal_budgets_percentage
            )));
        }

        if params.state.proposal(&p.hash(version)).is_some() {
            return Err(ValidationError::state("duplicated proposal"));
        }
        let Some(member) = params.state.cr_member(&p.cr_council_member_did) else {
            return Err(ValidationError::state(
                "CR Council Member should be one of the CR members",
            ));
        };
        if member.state != MemberState::Elected {
            return Err(ValidationError::state(
                "CR Council Member should be an elected CR members",
            ));
        }
        let member_key = code_key(&member.info.code)?;

        let unsigned = p.unsigned_bytes(version);
        verify_chain(&[
            ChainLink::new("owner", &unsigned, &p.owner_key, &p.signature),
            ChainLink::new(
                "CR Council Member",
                p.cr_council_member_did.as_bytes(),
                member_key,
                &p.cr_council_member_signature,
            ),
        ])?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// CRCProposalReview
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CrcProposalReview;

impl ContextValidator for CrcProposalReview {
    fn tx_type(&self) -> TxType {
        TxType::CrcProposalReview
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::CrcProposalReview(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let proposal = lookup_proposal(&p.proposal_hash, params)?;
        if proposal.status != ProposalStatus::Registered {
            return Err(ValidationError::state("should not review this proposal"));
        }
        let Some(member) = params.state.cr_member(&p.did) else {
            return Err(ValidationError::state("did correspond crMember not exists"));
        };
        if member.state != MemberState::Elected {
            return Err(ValidationError::state("should be an elected CR member"));
        }
        if tx.payload_version >= PROPOSAL_DATA_VERSION {
            check_data(&p.opinion_data, &p.opinion_hash, MAX_DRAFT_DATA_SIZE, "opinion")?;
        }
        let key = code_key(&member.info.code)?;
        check_payload_signature(key, &p.unsigned_bytes(tx.payload_version), &p.signature)?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// CRCProposalTracking
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CrcProposalTracking;

impl CrcProposalTracking {
    /// Stage of a budget of `budget_type` that is not yet withdrawn.
    fn is_open_stage(proposal: &ProposalState, stage: u8, budget_type: BudgetType) -> bool {
        proposal
            .proposal
            .budgets
            .iter()
            .any(|b| b.stage == stage && b.budget_type == budget_type)
            && !proposal.withdrawn_budgets.contains_key(&stage)
    }
}

impl ContextValidator for CrcProposalTracking {
    fn tx_type(&self) -> TxType {
        TxType::CrcProposalTracking
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::CrcProposalTracking(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let version = tx.payload_version;
        let proposal = lookup_proposal(&p.proposal_hash, params)?;
        if proposal.status != ProposalStatus::VoterAgreed {
            return Err(ValidationError::state("proposal status should be VoterAgreed"));
        }
        if version >= PROPOSAL_DATA_VERSION {
            check_data(&p.message_data, &p.message_hash, MAX_MESSAGE_DATA_SIZE, "message")?;
            check_data(
                &p.secretary_general_opinion_data,
                &p.secretary_general_opinion_hash,
                MAX_SECRETARY_GENERAL_OPINION_DATA_SIZE,
                "opinion",
            )?;
        }
        if p.owner_key != proposal.owner_key {
            return Err(ValidationError::state("the OwnerKey is not owner of proposal"));
        }

        let stage_ok = match p.tracking_type {
            TrackingType::Common | TrackingType::Terminated | TrackingType::ChangeOwner => {
                p.stage == 0
            }
            TrackingType::Progress | TrackingType::Rejected => {
                Self::is_open_stage(&proposal, p.stage, BudgetType::NormalPayment)
            }
            TrackingType::Finalized => {
                Self::is_open_stage(&proposal, p.stage, BudgetType::FinalPayment)
            }
        };
        if !stage_ok {
            return Err(ValidationError::structural("invalid tracking stage"));
        }
        if p.tracking_type == TrackingType::ChangeOwner {
            check_public_key(&p.new_owner_key, "new owner")?;
            if p.new_owner_key == p.owner_key {
                return Err(ValidationError::structural(
                    "new owner should be different from the owner",
                ));
            }
        } else if !p.new_owner_key.is_empty() {
            return Err(ValidationError::structural("the NewOwnerKey need to be empty"));
        }

        let Some(secretary) = params.state.secretary_general_key() else {
            return Err(ValidationError::state("secretary general not found"));
        };
        let unsigned = p.unsigned_bytes(version);
        let preamble = p.secretary_general_preamble(version);
        verify_chain(&[
            ChainLink::new("owner", &unsigned, &p.owner_key, &p.owner_signature),
            ChainLink::optional("new owner", &[], &p.new_owner_key, &p.new_owner_signature),
            ChainLink::new(
                "secretary general",
                &preamble,
                &secretary,
                &p.secretary_general_signature,
            ),
        ])?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// CRCProposalWithdraw
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CrcProposalWithdraw;

impl ContextValidator for CrcProposalWithdraw {
    fn tx_type(&self) -> TxType {
        TxType::CrcProposalWithdraw
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::CrcProposalWithdraw(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let proposal = lookup_proposal(&p.proposal_hash, params)?;
        if !matches!(
            proposal.status,
            ProposalStatus::VoterAgreed
                | ProposalStatus::Finished
                | ProposalStatus::Aborted
                | ProposalStatus::Terminated
        ) {
            return Err(ValidationError::state(
                "proposal status is not VoterAgreed , Finished, Aborted or Terminated",
            ));
        }
        if p.owner_key != proposal.owner_key {
            return Err(ValidationError::state("the OwnerKey is not owner of proposal"));
        }
        let available = proposal
            .available_withdrawal_amount()
            .ok_or_else(|| ValidationError::economic("withdrawal amount overflow"))?;
        if available <= Fixed64::ZERO {
            return Err(ValidationError::economic("no need to withdraw"));
        }

        if tx.payload_version >= WITHDRAW_RECIPIENT_VERSION {
            if p.recipient != proposal.proposal.recipient {
                return Err(ValidationError::structural("invalid withdrawal recipient"));
            }
            if p.amount != available {
                return Err(ValidationError::economic(format!(
                    "withdrawal amount {} need to be {}",
                    p.amount, available
                )));
            }
        } else {
            let cr_expenses = params.config.cr_expenses_address;
            let Some((payout, change)) = tx.outputs.split_first() else {
                return Err(ValidationError::structural("withdrawal has no outputs"));
            };
            if payout.program_hash != proposal.proposal.recipient {
                return Err(ValidationError::structural("invalid withdrawal recipient"));
            }
            if change.iter().any(|o| o.program_hash != cr_expenses) {
                return Err(ValidationError::structural("change must return to CR expenses"));
            }
            if !params.inputs_all_from(tx, &cr_expenses)? {
                return Err(ValidationError::structural(
                    "withdrawal inputs must spend from CR expenses",
                ));
            }
            let fee = params.fee(tx)?;
            let paid = payout
                .value
                .checked_add(fee)
                .ok_or_else(|| ValidationError::economic("withdrawal amount overflow"))?;
            if paid != available {
                return Err(ValidationError::economic(format!(
                    "withdrawal amount {} plus fee {} need to be {}",
                    payout.value, fee, available
                )));
            }
        }

        check_payload_signature(
            &p.owner_key,
            &p.unsigned_bytes(tx.payload_version),
            &p.signature,
        )?;
        Ok(Verdict::Final)
    }
}

// -----------------------------------------------------------------------------
// CRCProposalRealWithdraw
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CrcProposalRealWithdraw;

impl ContextValidator for CrcProposalRealWithdraw {
    fn tx_type(&self) -> TxType {
        TxType::CrcProposalRealWithdraw
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::CrcProposalRealWithdraw(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_real_withdraw(
            tx,
            params,
            WithdrawalKind::CrcProposal,
            &p.withdraw_tx_hashes,
            &params.config.cr_expenses_address,
        )
    }
}

// -----------------------------------------------------------------------------
// CRCAppropriation
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CrcAppropriation;

impl ContextValidator for CrcAppropriation {
    fn tx_type(&self) -> TxType {
        TxType::CrcAppropriation
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if !matches!(tx.payload, Payload::CrcAppropriation) {
            return Err(payload_mismatch(tx));
        }
        if !params.state.need_appropriation() {
            return Err(ValidationError::state(
                "should not have appropriation transaction",
            ));
        }
        let config = params.config;
        let [expenses, assets] = tx.outputs.as_slice() else {
            return Err(ValidationError::structural(
                "appropriation transaction should have 2 outputs",
            ));
        };
        if expenses.program_hash != config.cr_expenses_address {
            return Err(ValidationError::structural(
                "first output address should be CR expenses address",
            ));
        }
        if assets.program_hash != config.cr_assets_address {
            return Err(ValidationError::structural(
                "second output address should be CR assets address",
            ));
        }
        if !params.inputs_all_from(tx, &config.cr_assets_address)? {
            return Err(ValidationError::structural(
                "appropriation inputs must spend from CR assets",
            ));
        }
        let expected = params.state.appropriation_amount();
        if expenses.value != expected {
            return Err(ValidationError::economic(format!(
                "invalid appropriation amount {}, need to be {}",
                expenses.value, expected
            )));
        }
        let fee = params.fee(tx)?;
        trace!(%fee, amount = %expenses.value, "appropriation");
        if fee != Fixed64::ZERO {
            return Err(ValidationError::economic(
                "appropriation transaction should have no fee",
            ));
        }
        Ok(Verdict::Final)
    }
}

// -----------------------------------------------------------------------------
// ProposalResult
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ProposalResult;

impl ContextValidator for ProposalResult {
    fn tx_type(&self) -> TxType {
        TxType::ProposalResult
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::ProposalResult(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let mut seen = HashSet::with_capacity(p.results.len());
        for item in &p.results {
            if !seen.insert(item.proposal_hash) {
                return Err(ValidationError::structural("duplicated proposal result"));
            }
            if params.state.proposal(&item.proposal_hash).is_none() {
                return Err(ValidationError::state(format!(
                    "invalid proposal hash {}",
                    item.proposal_hash
                )));
            }
        }
        Ok(Verdict::Final)
    }
}
