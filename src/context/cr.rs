//! Council candidates: register, update, unregister and deposit return.

use super::common::{
    check_deposit_output, check_payload_signature, check_string_length, code_key,
    deposit_withdrawn, payload_mismatch, single_program_code,
};
use super::{ContextValidator, Verdict};
use crate::crypto::{self, ProgramCode};
use crate::error::ValidationError;
use crate::params::ValidationParameters;
use crate::payload::cr::{CR_INFO_DID_VERSION, CR_INFO_SCHNORR_VERSION};
use crate::payload::{CrInfo, Payload, TxType};
use crate::state::{CandidateState, MemberState};
use crate::transaction::Transaction;
use crate::types::Fixed64;

fn check_voting_period(params: &ValidationParameters<'_>) -> Result<(), ValidationError> {
    if !params.state.is_in_voting_period(params.height) {
        return Err(ValidationError::state("should create tx during voting period"));
    }
    Ok(())
}

fn check_info_fields(info: &CrInfo, params: &ValidationParameters<'_>) -> Result<(), ValidationError> {
    check_string_length(&info.nickname, 1, params.config.max_nickname_length, "NickName")?;
    check_string_length(&info.url, 0, params.config.max_url_length, "Url")?;
    Ok(())
}

/// Code shape, derived CID and (from the DID version on) derived DID.
fn check_identity(info: &CrInfo, version: u8) -> Result<(), ValidationError> {
    match ProgramCode::classify(&info.code)? {
        ProgramCode::Standard { .. } | ProgramCode::Schnorr { .. } => {}
        ProgramCode::Multisig { .. } => {
            return Err(ValidationError::signature("CR code must be a single key code"))
        }
    }
    if info.cid != crypto::cid(&info.code) {
        return Err(ValidationError::structural("invalid cid address"));
    }
    if version >= CR_INFO_DID_VERSION && info.did != crypto::did(&info.code) {
        return Err(ValidationError::structural("invalid did address"));
    }
    Ok(())
}

fn check_info_signature(tx: &Transaction, info: &CrInfo) -> Result<(), ValidationError> {
    if tx.payload_version >= CR_INFO_SCHNORR_VERSION {
        if single_program_code(tx)? != info.code.as_slice() {
            return Err(ValidationError::signature(
                "the program code does not match the CR code",
            ));
        }
        return Ok(());
    }
    let key = code_key(&info.code)?;
    check_payload_signature(key, &info.unsigned_bytes(tx.payload_version), &info.signature)
}

// -----------------------------------------------------------------------------
// RegisterCR
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RegisterCr;

impl ContextValidator for RegisterCr {
    fn tx_type(&self) -> TxType {
        TxType::RegisterCr
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::RegisterCr(info) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_voting_period(params)?;
        check_info_fields(info, params)?;
        check_identity(info, tx.payload_version)?;

        if params.state.cr_candidate(&info.cid).is_some() {
            return Err(ValidationError::state(format!("cid {} already exist", info.cid)));
        }
        if params.state.nickname_exists(&info.nickname) {
            return Err(ValidationError::state(format!(
                "nick name {} already inuse",
                info.nickname
            )));
        }
        let key = code_key(&info.code)?;
        if params.state.producer_by_owner(key).is_some()
            || params.state.producer_by_node(key).is_some()
        {
            return Err(ValidationError::state(
                "public key already inuse in producer list",
            ));
        }

        check_info_signature(tx, info)?;

        let deposit = crypto::deposit_hash(key)?;
        check_deposit_output(
            tx,
            &deposit,
            params.config.min_cr_deposit_amount,
            "CR deposit amount is insufficient",
        )?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// UpdateCR
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct UpdateCr;

impl ContextValidator for UpdateCr {
    fn tx_type(&self) -> TxType {
        TxType::UpdateCr
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::UpdateCr(info) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_voting_period(params)?;
        check_info_fields(info, params)?;
        check_identity(info, tx.payload_version)?;

        let Some(candidate) = params.state.cr_candidate(&info.cid) else {
            return Err(ValidationError::state("updating unknown CR"));
        };
        if !matches!(candidate.state, CandidateState::Pending | CandidateState::Active) {
            return Err(ValidationError::state("updating canceled or returned CR"));
        }
        if candidate.info.code != info.code {
            return Err(ValidationError::state("CR code can not be changed"));
        }
        if info.nickname != candidate.info.nickname && params.state.nickname_exists(&info.nickname)
        {
            return Err(ValidationError::state(format!(
                "nick name {} already inuse",
                info.nickname
            )));
        }

        check_info_signature(tx, info)?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// UnregisterCR
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct UnregisterCr;

impl ContextValidator for UnregisterCr {
    fn tx_type(&self) -> TxType {
        TxType::UnregisterCr
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::UnregisterCr(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_voting_period(params)?;
        let Some(candidate) = params.state.cr_candidate(&p.cid) else {
            return Err(ValidationError::state("unregister unknown CR"));
        };
        if !matches!(candidate.state, CandidateState::Pending | CandidateState::Active) {
            return Err(ValidationError::state("unregister canceled or returned CR"));
        }
        let key = code_key(&candidate.info.code)?;
        check_payload_signature(key, &p.unsigned_bytes(), &p.signature)?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// ReturnCRDepositCoin
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ReturnCrDepositCoin;

impl ReturnCrDepositCoin {
    /// Deposit a signer may take back, from its candidate or member record.
    fn available(
        code: &[u8],
        params: &ValidationParameters<'_>,
    ) -> Result<Fixed64, ValidationError> {
        let overflow = || ValidationError::economic("deposit amount overflow");
        if let Some(candidate) = params.state.cr_candidate(&crypto::cid(code)) {
            if candidate.state != CandidateState::Canceled {
                return Err(ValidationError::state("candidate must be canceled before return"));
            }
            let unlock = candidate
                .cancel_height
                .saturating_add(params.config.deposit_lockup_blocks);
            if params.height < unlock {
                return Err(ValidationError::state(
                    "can not return deposit before lock-up period",
                ));
            }
            return candidate
                .deposit_amount
                .checked_sub(candidate.penalty)
                .ok_or_else(overflow);
        }
        if let Some(member) = params.state.cr_member(&crypto::did(code)) {
            if !matches!(member.state, MemberState::Impeached | MemberState::Terminated) {
                return Err(ValidationError::state("CR member is still in office"));
            }
            return member
                .deposit_amount
                .checked_sub(member.penalty)
                .ok_or_else(overflow);
        }
        Err(ValidationError::state("signer must be candidate or member"))
    }
}

impl ContextValidator for ReturnCrDepositCoin {
    fn tx_type(&self) -> TxType {
        TxType::ReturnCrDepositCoin
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if !matches!(tx.payload, Payload::ReturnCrDepositCoin) {
            return Err(payload_mismatch(tx));
        }
        for program in &tx.programs {
            let key = code_key(&program.code)?;
            let available = Self::available(&crypto::standard_code(key)?, params)?;
            let returned = deposit_withdrawn(tx, params, &crypto::deposit_hash(key)?)?;
            if returned > available {
                return Err(ValidationError::economic("overspend deposit"));
            }
        }
        Ok(Verdict::Continue)
    }
}
