//! Withdrawals from side chains, signed by the live arbitrators.
//!
//! Version 0 carries an M-of-N cross-chain multisig program over the
//! arbitrator keys. Version 1 names signers by arbitrator index; their keys
//! are summed into one aggregate key that must reproduce the program's
//! Schnorr code byte for byte.

use std::collections::HashSet;

use tracing::debug;

use super::common::{min_signers, payload_mismatch};
use super::{ContextValidator, Verdict};
use crate::crypto::{self, ProgramCode};
use crate::error::ValidationError;
use crate::height::Feature;
use crate::params::ValidationParameters;
use crate::payload::crosschain::WITHDRAW_SCHNORR_VERSION;
use crate::payload::{self, Payload, TxType};
use crate::transaction::{OutputPayload, Program, Transaction};
use crate::types::{prefix, Uint256};

#[derive(Debug, Clone, Copy)]
pub struct WithdrawFromSideChain;

impl WithdrawFromSideChain {
    /// Side-chain transaction hashes this withdrawal settles.
    fn side_chain_hashes(
        tx: &Transaction,
        p: &payload::WithdrawFromSideChain,
    ) -> Result<Vec<Uint256>, ValidationError> {
        if tx.payload_version < WITHDRAW_SCHNORR_VERSION {
            return Ok(p.side_chain_tx_hashes.clone());
        }
        let mut hashes = Vec::new();
        for output in &tx.outputs {
            match &output.payload {
                OutputPayload::Withdraw {
                    side_chain_tx_hash,
                    target_amount,
                } => {
                    if *target_amount != output.value {
                        return Err(ValidationError::economic(
                            "withdraw output target amount does not match its value",
                        ));
                    }
                    hashes.push(*side_chain_tx_hash);
                }
                _ if output.program_hash.prefix() == prefix::CROSS_CHAIN => {}
                _ => {
                    return Err(ValidationError::structural(
                        "change output must return to the cross chain address",
                    ))
                }
            }
        }
        Ok(hashes)
    }

    fn check_multisig(
        program: &Program,
        arbiters: &[Vec<u8>],
        supermajority: bool,
        msg: &[u8],
    ) -> Result<(), ValidationError> {
        let invalid = || ValidationError::signature("invalid multi sign script code");
        let ProgramCode::Multisig {
            m,
            keys,
            cross_chain: true,
        } = ProgramCode::classify(&program.code).map_err(|_| invalid())?
        else {
            return Err(invalid());
        };
        if keys.len() != arbiters.len() {
            return Err(invalid());
        }
        let mut listed = HashSet::with_capacity(keys.len());
        if !keys.iter().all(|k| listed.insert(*k)) {
            return Err(ValidationError::signature(
                "duplicated public key in multi sign script code",
            ));
        }
        if keys.iter().any(|k| !arbiters.iter().any(|a| a.as_slice() == *k)) {
            return Err(ValidationError::signature(
                "multi sign public key is not an arbitrator",
            ));
        }
        let min = min_signers(arbiters.len(), supermajority);
        if m < min {
            return Err(ValidationError::signature(format!(
                "invalid M in multi sign script code, need at least {}",
                min
            )));
        }
        crypto::verify_multisig(m, &keys, msg, &program.parameter)?;
        Ok(())
    }

    /// The legacy program must hash to the address every input spends from.
    fn check_spends_own_address(
        tx: &Transaction,
        params: &ValidationParameters<'_>,
        program: &Program,
    ) -> Result<(), ValidationError> {
        let address = crypto::program_hash(&program.code)?;
        for input in &tx.inputs {
            if params.reference(input)?.program_hash != address {
                return Err(ValidationError::signature(
                    "the program hashes do not match the referenced addresses",
                ));
            }
        }
        Ok(())
    }

    fn check_schnorr(
        program: &Program,
        signers: &[u32],
        arbiters: &[Vec<u8>],
        msg: &[u8],
    ) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(signers.len());
        let mut keys = Vec::with_capacity(signers.len());
        for &index in signers {
            let key = usize::try_from(index)
                .ok()
                .and_then(|i| arbiters.get(i))
                .ok_or_else(|| ValidationError::signature("invalid signer index"))?;
            if !seen.insert(index) {
                return Err(ValidationError::signature("duplicated signer index"));
            }
            keys.push(key.as_slice());
        }
        let min = min_signers(arbiters.len(), true);
        if keys.len() < min {
            return Err(ValidationError::signature(format!(
                "not enough signers: {} of {}",
                keys.len(),
                min
            )));
        }
        let aggregate = crypto::aggregate_public_keys(&keys)?;
        if program.code != crypto::schnorr_code(&aggregate)? {
            return Err(ValidationError::signature(
                "program code does not match the aggregate public key",
            ));
        }
        crypto::verify_program(&program.code, &program.parameter, msg)?;
        Ok(())
    }
}

impl ContextValidator for WithdrawFromSideChain {
    fn tx_type(&self) -> TxType {
        TxType::WithdrawFromSideChain
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::WithdrawFromSideChain(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        for input in &tx.inputs {
            if params.reference(input)?.program_hash.prefix() != prefix::CROSS_CHAIN {
                return Err(ValidationError::structural(
                    "Invalid transaction inputs address, without \"X\" at beginning",
                ));
            }
        }

        let hashes = Self::side_chain_hashes(tx, p)?;
        if hashes.is_empty() {
            return Err(ValidationError::structural("no side chain transaction to withdraw"));
        }
        let mut seen = HashSet::with_capacity(hashes.len());
        for hash in &hashes {
            if !seen.insert(*hash) {
                return Err(ValidationError::structural("duplicated side chain transaction hash"));
            }
            if params.state.side_chain_tx_withdrawn(hash) {
                return Err(ValidationError::state(format!(
                    "side chain transaction {} has been withdrawn",
                    hash
                )));
            }
        }

        let fee = params.fee(tx)?;
        if fee < params.config.min_cross_chain_tx_fee {
            return Err(ValidationError::economic(format!(
                "cross chain transaction fee {} is lower than {}",
                fee, params.config.min_cross_chain_tx_fee
            )));
        }

        let [program] = tx.programs.as_slice() else {
            return Err(ValidationError::structural(format!(
                "{} transaction should have only one program",
                tx.tx_type
            )));
        };
        let arbiters = params.state.live_arbitrators();
        let msg = tx.serialize_unsigned();
        debug!(
            version = tx.payload_version,
            arbiters = arbiters.len(),
            withdrawals = hashes.len(),
            "cross chain withdrawal"
        );
        if tx.payload_version >= WITHDRAW_SCHNORR_VERSION {
            Self::check_schnorr(program, &p.signers, &arbiters, &msg)?;
        } else {
            let supermajority =
                Feature::CrossChainSupermajority.is_active(params.config, params.height);
            Self::check_multisig(program, &arbiters, supermajority, &msg)?;
            Self::check_spends_own_address(tx, params, program)?;
        }
        Ok(Verdict::Final)
    }
}
