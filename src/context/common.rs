//! Helpers shared by several rule sets.

use std::collections::HashSet;

use tracing::trace;

use super::Verdict;
use crate::crypto::{self, ProgramCode};
use crate::error::ValidationError;
use crate::params::ValidationParameters;
use crate::state::WithdrawalKind;
use crate::transaction::Transaction;
use crate::types::{prefix, Fixed64, ProgramHash, Uint256, PROGRAM_HASH_LEN};

pub(crate) fn payload_mismatch(tx: &Transaction) -> ValidationError {
    ValidationError::payload_type(format!("invalid payload for {} transaction", tx.tx_type))
}

/// Byte length of `s` must lie in `[min, max]`.
pub(crate) fn check_string_length(
    s: &str,
    min: usize,
    max: usize,
    field: &str,
) -> Result<(), ValidationError> {
    if s.len() < min || s.len() > max {
        return Err(ValidationError::structural(format!(
            "field {} has invalid string length",
            field
        )));
    }
    Ok(())
}

pub(crate) fn check_public_key(key: &[u8], what: &str) -> Result<(), ValidationError> {
    if !crypto::is_valid_public_key(key) {
        return Err(ValidationError::signature(format!(
            "invalid {} public key in payload",
            what
        )));
    }
    Ok(())
}

/// ECDSA signature carried inside a payload.
pub(crate) fn check_payload_signature(
    key: &[u8],
    unsigned: &[u8],
    signature: &[u8],
) -> Result<(), ValidationError> {
    crypto::verify_standard(key, unsigned, signature)
        .map_err(|_| ValidationError::signature("invalid signature in payload"))
}

/// Public key embedded in a single-key (standard or Schnorr) code.
pub(crate) fn code_key(code: &[u8]) -> Result<&[u8], ValidationError> {
    match ProgramCode::classify(code)? {
        ProgramCode::Standard { key } | ProgramCode::Schnorr { key } => Ok(key),
        ProgramCode::Multisig { .. } => Err(ValidationError::signature(
            "multi sign code is not allowed here",
        )),
    }
}

/// The transaction must carry exactly one program; returns its code.
pub(crate) fn single_program_code(tx: &Transaction) -> Result<&[u8], ValidationError> {
    match tx.programs.as_slice() {
        [p] => Ok(&p.code),
        _ => Err(ValidationError::structural(format!(
            "{} transaction should have only one program",
            tx.tx_type
        ))),
    }
}

/// Schnorr-signed payload versions move the owner signature into the
/// transaction's only program, which must be the owner's Schnorr code.
pub(crate) fn check_schnorr_owner_program(
    tx: &Transaction,
    owner_key: &[u8],
) -> Result<(), ValidationError> {
    let code = single_program_code(tx)?;
    if code != crypto::schnorr_code(owner_key)?.as_slice() {
        return Err(ValidationError::signature(
            "the program code does not match the owner key",
        ));
    }
    Ok(())
}

/// Exactly one output goes to a deposit-prefixed address; it must be
/// `expected` and carry at least `min`.
pub(crate) fn check_deposit_output(
    tx: &Transaction,
    expected: &ProgramHash,
    min: Fixed64,
    insufficient: &str,
) -> Result<(), ValidationError> {
    let mut deposits = tx
        .outputs
        .iter()
        .filter(|o| o.program_hash.prefix() == prefix::DEPOSIT);
    let (Some(deposit), None) = (deposits.next(), deposits.next()) else {
        return Err(ValidationError::structural(
            "there must be only one deposit address in outputs",
        ));
    };
    if deposit.program_hash != *expected {
        return Err(ValidationError::structural(
            "deposit address does not match the public key in payload",
        ));
    }
    if deposit.value < min {
        return Err(ValidationError::economic(insufficient));
    }
    Ok(())
}

/// Net amount a return-deposit transaction takes out of `deposit_address`:
/// what its inputs spend from it minus change paid back to it.
pub(crate) fn deposit_withdrawn(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
    deposit_address: &ProgramHash,
) -> Result<Fixed64, ValidationError> {
    let overflow = || ValidationError::economic("deposit amount overflow");
    let mut spent = Fixed64::ZERO;
    for input in &tx.inputs {
        let output = params.reference(input)?;
        if output.program_hash == *deposit_address {
            spent = spent.checked_add(output.value).ok_or_else(overflow)?;
        }
    }
    let change = Fixed64::checked_sum(
        tx.outputs
            .iter()
            .filter(|o| o.program_hash == *deposit_address)
            .map(|o| o.value),
    )
    .ok_or_else(overflow)?;
    spent.checked_sub(change).ok_or_else(overflow)
}

/// Attached data must fit `cap` bytes and hash to `hash`.
pub(crate) fn check_data(
    data: &[u8],
    hash: &Uint256,
    cap: usize,
    field: &str,
) -> Result<(), ValidationError> {
    if data.len() > cap {
        return Err(ValidationError::structural(format!(
            "the {} data cannot be more than {} bytes",
            field, cap
        )));
    }
    if Uint256::hash(data) != *hash {
        return Err(ValidationError::structural(format!(
            "the {} data and {} hash are inconsistent",
            field, field
        )));
    }
    Ok(())
}

pub(crate) fn program_hash_from(bytes: &[u8]) -> Option<ProgramHash> {
    let arr: [u8; PROGRAM_HASH_LEN] = bytes.try_into().ok()?;
    Some(ProgramHash(arr))
}

pub(crate) fn uint256_from(bytes: &[u8]) -> Option<Uint256> {
    let arr: [u8; 32] = bytes.try_into().ok()?;
    Some(Uint256(arr))
}

/// Minimum signer count out of `n` arbitrators: a simple majority, or more
/// than two thirds once the supermajority rule is active.
pub(crate) fn min_signers(n: usize, supermajority: bool) -> usize {
    if supermajority {
        n * 2 / 3 + 1
    } else {
        n / 2 + 1
    }
}

/// Settles pending withdrawals of one ledger.
///
/// Output `i` pays entry `i` its amount less the single fee; an optional
/// last output returns change to `source`. Every input spends from
/// `source` and the fee is exactly `N × single fee`.
pub(crate) fn check_real_withdraw(
    tx: &Transaction,
    params: &ValidationParameters<'_>,
    kind: WithdrawalKind,
    hashes: &[Uint256],
    source: &ProgramHash,
) -> Result<Verdict, ValidationError> {
    let n = hashes.len();
    if n == 0 || (tx.outputs.len() != n && tx.outputs.len() != n + 1) {
        return Err(ValidationError::structural(
            "invalid real withdraw transaction hashes count",
        ));
    }
    let mut seen = HashSet::with_capacity(n);
    if !hashes.iter().all(|h| seen.insert(*h)) {
        return Err(ValidationError::structural("duplicated withdraw transaction hash"));
    }

    let single_fee = params.config.real_withdraw_single_fee;
    for (hash, output) in hashes.iter().zip(&tx.outputs) {
        let Some(pending) = params.state.pending_withdrawal(kind, hash) else {
            return Err(ValidationError::state("invalid withdraw transaction hash"));
        };
        if output.program_hash != pending.recipient {
            return Err(ValidationError::economic("invalid real withdraw output address"));
        }
        let expected = pending
            .amount
            .checked_sub(single_fee)
            .ok_or_else(|| ValidationError::economic("withdraw amount overflow"))?;
        if output.value != expected {
            return Err(ValidationError::economic(format!(
                "invalid real withdraw output amount:{}, need to be:{}",
                output.value, expected
            )));
        }
    }
    if let Some(change) = tx.outputs.get(n) {
        if change.program_hash != *source {
            return Err(ValidationError::structural("last output is invalid"));
        }
    }
    if !params.inputs_all_from(tx, source)? {
        return Err(ValidationError::structural(format!(
            "real withdraw inputs must spend from {}",
            source
        )));
    }

    let fee = params.fee(tx)?;
    let expected_fee = i64::try_from(n)
        .ok()
        .and_then(|n| single_fee.checked_mul(n))
        .ok_or_else(|| ValidationError::economic("withdraw fee overflow"))?;
    trace!(?kind, %fee, %expected_fee, "real withdraw fee");
    if fee != expected_fee {
        return Err(ValidationError::economic(format!(
            "invalid real withdraw transaction fee:{}, need to be:{}, txsCount:{}",
            fee, expected_fee, n
        )));
    }
    Ok(Verdict::Final)
}
