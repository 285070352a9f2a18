//! DPoS v2 staking: vote rights, voting, returning rights and rewards.
//!
//! Vote rights are tracked per stake address. Each vote category spends
//! from the same rights independently, so the headroom for a category is
//! `rights − used(category)`.

use std::collections::HashSet;

use tracing::trace;

use super::common::{
    check_payload_signature, check_real_withdraw, code_key, payload_mismatch, program_hash_from,
    single_program_code, uint256_from,
};
use super::{ContextValidator, Verdict};
use crate::crypto;
use crate::error::ValidationError;
use crate::params::ValidationParameters;
use crate::payload::staking::RETURN_VOTES_PROGRAM_VERSION;
use crate::payload::{Payload, TxType, VoteCategory, VotesContent};
use crate::state::{CandidateState, MemberState, ProducerState, ProposalStatus, WithdrawalKind};
use crate::transaction::{OutputPayload, Transaction};
use crate::types::{Fixed64, ProgramHash};

fn not_enough(category: VoteCategory) -> ValidationError {
    ValidationError::economic(format!("vote rights not enough for {} votes", category))
}

fn overflow() -> ValidationError {
    ValidationError::economic("vote amount overflow")
}

// -----------------------------------------------------------------------------
// ExchangeVotes
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ExchangeVotes;

impl ContextValidator for ExchangeVotes {
    fn tx_type(&self) -> TxType {
        TxType::ExchangeVotes
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if !matches!(tx.payload, Payload::ExchangeVotes) {
            return Err(payload_mismatch(tx));
        }
        let code = single_program_code(tx)?;
        let sender = crypto::program_hash(code)?;
        if !params.inputs_all_from(tx, &sender)? {
            return Err(ValidationError::structural(
                "all inputs must spend from the signer address",
            ));
        }

        let Some((stake, rest)) = tx.outputs.split_first() else {
            return Err(ValidationError::structural("exchange votes transaction has no output"));
        };
        let OutputPayload::Stake { stake_address, .. } = &stake.payload else {
            return Err(ValidationError::structural("first output should be a stake output"));
        };
        if stake.program_hash != params.config.stake_pool_address {
            return Err(ValidationError::structural(
                "first output address should be stake pool",
            ));
        }
        if *stake_address != crypto::stake_hash(code) {
            return Err(ValidationError::structural("invalid stake address"));
        }
        if stake.value < params.config.min_stake_amount {
            return Err(ValidationError::economic(format!(
                "exchange votes amount should be at least {}",
                params.config.min_stake_amount
            )));
        }
        if rest.iter().any(|o| o.program_hash != sender) {
            return Err(ValidationError::structural("change must return to the signer address"));
        }
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// Voting
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Voting;

impl Voting {
    fn check_content(
        content: &VotesContent,
        stake: &ProgramHash,
        rights: Fixed64,
        params: &ValidationParameters<'_>,
    ) -> Result<(), ValidationError> {
        let category = content.category;
        let mut candidates = HashSet::with_capacity(content.votes.len());
        for vote in &content.votes {
            if !candidates.insert(vote.candidate.as_slice()) {
                return Err(ValidationError::structural("duplicate candidate"));
            }
            if vote.votes <= Fixed64::ZERO {
                return Err(ValidationError::structural("invalid vote amount"));
            }
        }
        let total = Fixed64::checked_sum(content.votes.iter().map(|v| v.votes)).ok_or_else(overflow)?;
        let max_each = content
            .votes
            .iter()
            .map(|v| v.votes)
            .max()
            .unwrap_or(Fixed64::ZERO);
        let state = params.state;

        match category {
            VoteCategory::Delegate => {
                if content.votes.len() > params.config.max_vote_candidates {
                    return Err(ValidationError::structural("number of candidates over max"));
                }
                for vote in &content.votes {
                    let valid = state.producer_by_owner(&vote.candidate).is_some_and(|p| {
                        p.state == ProducerState::Active && p.identity.accepts_v1_votes()
                    });
                    if !valid {
                        return Err(ValidationError::state("invalid vote producer"));
                    }
                }
                if max_each > rights {
                    return Err(not_enough(category));
                }
            }
            VoteCategory::Crc => {
                if !state.is_in_voting_period(params.height) {
                    return Err(ValidationError::state("cr votes tx must during voting period"));
                }
                for vote in &content.votes {
                    let valid = program_hash_from(&vote.candidate)
                        .and_then(|cid| state.cr_candidate(&cid))
                        .is_some_and(|c| c.state == CandidateState::Active);
                    if !valid {
                        return Err(ValidationError::state("invalid vote CR candidate"));
                    }
                }
                if total > rights {
                    return Err(not_enough(category));
                }
            }
            VoteCategory::CrcProposal => {
                for vote in &content.votes {
                    let valid = uint256_from(&vote.candidate)
                        .and_then(|hash| state.proposal(&hash))
                        .is_some_and(|p| p.status == ProposalStatus::CrAgreed);
                    if !valid {
                        return Err(ValidationError::state("invalid vote proposal"));
                    }
                }
                if max_each > rights {
                    return Err(not_enough(category));
                }
            }
            VoteCategory::CrcImpeachment => {
                for vote in &content.votes {
                    let valid = program_hash_from(&vote.candidate)
                        .and_then(|did| state.cr_member(&did))
                        .is_some_and(|m| m.state == MemberState::Elected);
                    if !valid {
                        return Err(ValidationError::state("invalid impeachment target"));
                    }
                }
                if total > rights {
                    return Err(not_enough(category));
                }
            }
            VoteCategory::DposV2 => {
                let min_lock = params.height.saturating_add(params.config.dpos_v2_min_lock_time);
                let max_lock = params.height.saturating_add(params.config.dpos_v2_max_lock_time);
                for vote in &content.votes {
                    let Some(producer) = state.producer_by_owner(&vote.candidate).filter(|p| {
                        p.state == ProducerState::Active && p.identity.accepts_v2_votes()
                    }) else {
                        return Err(ValidationError::state("invalid DPoS 2.0 vote producer"));
                    };
                    if vote.lock_time < min_lock
                        || vote.lock_time > max_lock
                        || vote.lock_time > producer.stake_until
                    {
                        return Err(ValidationError::structural("invalid DPoS 2.0 votes lock time"));
                    }
                }
                let used = state.used_votes(stake, category);
                let needed = used.checked_add(total).ok_or_else(overflow)?;
                if needed > rights {
                    return Err(not_enough(category));
                }
            }
        }
        Ok(())
    }
}

impl ContextValidator for Voting {
    fn tx_type(&self) -> TxType {
        TxType::Voting
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::Voting(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let stake = crypto::stake_hash(single_program_code(tx)?);
        let rights = params.state.vote_rights(&stake);
        trace!(%stake, %rights, contents = p.contents.len(), "voting");

        let mut categories = HashSet::with_capacity(p.contents.len());
        for content in &p.contents {
            if !categories.insert(content.category) {
                return Err(ValidationError::structural("duplicate vote type"));
            }
            Self::check_content(content, &stake, rights, params)?;
        }
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// ReturnVotes
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ReturnVotes;

impl ContextValidator for ReturnVotes {
    fn tx_type(&self) -> TxType {
        TxType::ReturnVotes
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::ReturnVotes(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        if p.value <= Fixed64::ZERO {
            return Err(ValidationError::structural("invalid return votes value"));
        }
        let code = if tx.payload_version >= RETURN_VOTES_PROGRAM_VERSION {
            single_program_code(tx)?
        } else {
            p.code.as_slice()
        };

        let stake = crypto::stake_hash(code);
        let rights = params.state.vote_rights(&stake);
        for category in VoteCategory::ALL {
            let used = params.state.used_votes(&stake, category);
            let headroom = rights.checked_sub(used).ok_or_else(overflow)?;
            if p.value > headroom {
                return Err(not_enough(category));
            }
        }

        if tx.payload_version >= RETURN_VOTES_PROGRAM_VERSION {
            let program = &tx.programs[0];
            crypto::verify_program(&program.code, &program.parameter, &tx.serialize_unsigned())
                .map_err(|_| ValidationError::signature("invalid signature in program"))?;
        } else {
            check_payload_signature(
                code_key(code)?,
                &p.unsigned_bytes(tx.payload_version),
                &p.signature,
            )?;
        }
        Ok(Verdict::Final)
    }
}

// -----------------------------------------------------------------------------
// DposV2ClaimReward
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct DposV2ClaimReward;

impl ContextValidator for DposV2ClaimReward {
    fn tx_type(&self) -> TxType {
        TxType::DposV2ClaimReward
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::DposV2ClaimReward(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let key = code_key(&p.code)?;
        let reward = params.state.dpos_v2_reward(&crypto::stake_hash(&p.code));
        if p.value > reward {
            return Err(ValidationError::economic(format!(
                "claim reward exceeded, max claim reward {}",
                reward
            )));
        }
        if p.value <= params.config.real_withdraw_single_fee {
            return Err(ValidationError::economic(
                "claim reward should be bigger than real withdraw fee",
            ));
        }
        check_payload_signature(key, &p.unsigned_bytes(), &p.signature)?;
        Ok(Verdict::Final)
    }
}

// -----------------------------------------------------------------------------
// Settlements
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct DposV2ClaimRewardRealWithdraw;

impl ContextValidator for DposV2ClaimRewardRealWithdraw {
    fn tx_type(&self) -> TxType {
        TxType::DposV2ClaimRewardRealWithdraw
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::DposV2ClaimRewardRealWithdraw(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_real_withdraw(
            tx,
            params,
            WithdrawalKind::DposV2Reward,
            &p.withdraw_tx_hashes,
            &params.config.dpos_v2_reward_address,
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VotesRealWithdraw;

impl ContextValidator for VotesRealWithdraw {
    fn tx_type(&self) -> TxType {
        TxType::VotesRealWithdraw
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::VotesRealWithdraw(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        for item in &p.items {
            let matches = params
                .state
                .pending_withdrawal(WithdrawalKind::Votes, &item.return_votes_tx_hash)
                .is_some_and(|w| w.recipient == item.stake_address && w.amount == item.value);
            if !matches {
                return Err(ValidationError::state("invalid withdraw transaction hash"));
            }
        }
        let hashes: Vec<_> = p.items.iter().map(|i| i.return_votes_tx_hash).collect();
        check_real_withdraw(
            tx,
            params,
            WithdrawalKind::Votes,
            &hashes,
            &params.config.stake_pool_address,
        )
    }
}
