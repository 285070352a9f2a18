//! Validation pipeline.
//!
//! Stages run in a fixed order and stop at the first failure:
//!
//! 1. height/version gating
//! 2. structure (no state)
//! 3. payload type matches the tag
//! 4. per-kind context rules, returning a [`Verdict`]
//! 5. on [`Verdict::Continue`] only: references, program hashes, program
//!    signatures and minimum fee
//!
//! Every stage is public so callers can run a prefix of the pipeline.

use std::collections::HashSet;

use tracing::{debug, debug_span, trace};

use crate::context::{self, Verdict};
use crate::crypto::{self, ProgramCode};
use crate::error::ValidationError;
use crate::height;
use crate::params::ValidationParameters;
use crate::payload::TxType;
use crate::structure;
use crate::transaction::Transaction;
use crate::types::{prefix, ProgramHash};

/// Runs every stage; the first failure is returned.
pub fn validate(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
) -> Result<Verdict, ValidationError> {
    let span = debug_span!(
        "validate",
        tx_type = %tx.tx_type,
        payload_version = tx.payload_version,
        height = params.height
    );
    let _guard = span.enter();

    let result = run(tx, params);
    match &result {
        Ok(verdict) => debug!(?verdict, "transaction accepted"),
        Err(e) => debug!(kind = ?e.kind(), error = %e, "transaction rejected"),
    }
    result
}

fn run(tx: &Transaction, params: &ValidationParameters<'_>) -> Result<Verdict, ValidationError> {
    check_height_version(tx, params)?;
    check_structure(tx, params)?;
    check_payload_type(tx)?;
    match check_context(tx, params)? {
        Verdict::Final => Ok(Verdict::Final),
        Verdict::Continue => {
            check_common(tx, params)?;
            Ok(Verdict::Continue)
        }
    }
}

/// Stage 1: the payload version must be accepted at `params.height`.
pub fn check_height_version(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
) -> Result<(), ValidationError> {
    height::check_version(tx.tx_type, tx.payload_version, params.config, params.height)
}

/// Stage 2: state-free shape rules.
pub fn check_structure(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
) -> Result<(), ValidationError> {
    structure::check(tx, params.config)
}

/// Stage 3: the payload variant must belong to the declared tag.
pub fn check_payload_type(tx: &Transaction) -> Result<(), ValidationError> {
    let actual = tx.payload.tx_type();
    if actual != tx.tx_type {
        return Err(ValidationError::payload_type(format!(
            "invalid payload type {} for {} transaction",
            actual, tx.tx_type
        )));
    }
    Ok(())
}

/// Stage 4: per-kind rules against chain state.
pub fn check_context(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
) -> Result<Verdict, ValidationError> {
    let validator = context::validator(tx.tx_type);
    trace!(tx_type = %validator.tx_type(), "dispatching context check");
    validator.check_kind(tx, params)
}

/// Deposits are keyed by the owner's standard address whichever code signs
/// the return, so a Schnorr owner reaches the same deposit.
fn signer_deposit_address(code: &[u8]) -> Result<ProgramHash, ValidationError> {
    match ProgramCode::classify(code)? {
        ProgramCode::Standard { key } | ProgramCode::Schnorr { key } => {
            Ok(crypto::deposit_hash(key)?)
        }
        ProgramCode::Multisig { .. } => {
            Ok(crypto::program_hash(code)?.with_prefix(prefix::DEPOSIT))
        }
    }
}

/// Stage 5: references resolve, programs hash to exactly the spent
/// addresses and sign the unsigned bytes, and the fee meets the minimum.
pub fn check_common(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
) -> Result<(), ValidationError> {
    let mut spent = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        spent.insert(params.reference(input)?.program_hash);
    }

    // Deposit returns sign with the owner's code but spend from its deposit address.
    let deposit_return = matches!(
        tx.tx_type,
        TxType::ReturnDepositCoin | TxType::ReturnCrDepositCoin
    );
    let mut signed = HashSet::with_capacity(tx.programs.len());
    for program in &tx.programs {
        let hash = if deposit_return {
            signer_deposit_address(&program.code)?
        } else {
            crypto::program_hash(&program.code)?
        };
        if !signed.insert(hash) {
            return Err(ValidationError::signature("duplicated program"));
        }
    }
    if signed != spent {
        return Err(ValidationError::signature(
            "the program hashes do not match the referenced addresses",
        ));
    }

    let msg = tx.serialize_unsigned();
    for program in &tx.programs {
        crypto::verify_program(&program.code, &program.parameter, &msg)?;
    }

    let fee = params.fee(tx)?;
    if fee < params.config.min_transaction_fee {
        return Err(ValidationError::economic(format!(
            "transaction fee {} is lower than the minimum {}",
            fee, params.config.min_transaction_fee
        )));
    }
    Ok(())
}
