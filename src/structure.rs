//! Shape rules that need no chain state: cardinalities, output types,
//! attribute usages, amounts and size.

use std::collections::HashSet;

use crate::config::ChainParams;
use crate::error::ValidationError;
use crate::payload::crosschain::WITHDRAW_SCHNORR_VERSION;
use crate::payload::proposal::WITHDRAW_RECIPIENT_VERSION;
use crate::payload::staking::RETURN_VOTES_PROGRAM_VERSION;
use crate::payload::TxType;
use crate::transaction::{AttributeUsage, OutputType, Transaction, TX_VERSION_09};

/// Index used by the single coinbase input.
pub const COINBASE_INPUT_INDEX: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Zero,
    Exactly(usize),
    AtLeast(usize),
    Any,
}

impl Count {
    fn admits(self, n: usize) -> bool {
        match self {
            Count::Zero => n == 0,
            Count::Exactly(k) => n == k,
            Count::AtLeast(k) => n >= k,
            Count::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub inputs: Count,
    pub outputs: Count,
    pub attributes: Count,
    pub programs: Count,
}

const ZERO_COST: Shape = Shape {
    inputs: Count::Zero,
    outputs: Count::Zero,
    attributes: Count::Zero,
    programs: Count::Zero,
};

const SYSTEM_PAYOUT: Shape = Shape {
    inputs: Count::AtLeast(1),
    outputs: Count::AtLeast(1),
    attributes: Count::Any,
    programs: Count::Zero,
};

const SIGNED_SPEND: Shape = Shape {
    inputs: Count::AtLeast(1),
    outputs: Count::Any,
    attributes: Count::Any,
    programs: Count::AtLeast(1),
};

/// Cardinality rules for a `(type, payload version)` pair.
pub fn shape(tx_type: TxType, payload_version: u8) -> Shape {
    match tx_type {
        TxType::CoinBase => Shape {
            inputs: Count::Exactly(1),
            outputs: Count::AtLeast(1),
            attributes: Count::Any,
            programs: Count::Zero,
        },
        TxType::IllegalProposalEvidence
        | TxType::IllegalVoteEvidence
        | TxType::IllegalBlockEvidence
        | TxType::NextTurnDposInfo
        | TxType::ProposalResult
        | TxType::ActivateProducer
        | TxType::DposV2ClaimReward => ZERO_COST,
        TxType::ReturnVotes if payload_version >= RETURN_VOTES_PROGRAM_VERSION => Shape {
            programs: Count::Exactly(1),
            ..ZERO_COST
        },
        TxType::ReturnVotes => ZERO_COST,
        TxType::CrcProposalWithdraw if payload_version >= WITHDRAW_RECIPIENT_VERSION => ZERO_COST,
        TxType::CrcProposalWithdraw
        | TxType::CrcProposalRealWithdraw
        | TxType::VotesRealWithdraw
        | TxType::DposV2ClaimRewardRealWithdraw
        | TxType::CrcAppropriation => SYSTEM_PAYOUT,
        TxType::WithdrawFromSideChain => Shape {
            outputs: Count::AtLeast(1),
            programs: Count::Exactly(1),
            ..SIGNED_SPEND
        },
        _ => SIGNED_SPEND,
    }
}

/// `true` for kinds that move no value and carry no programs.
pub fn is_zero_cost(tx_type: TxType, payload_version: u8) -> bool {
    shape(tx_type, payload_version) == ZERO_COST
}

fn check_count(
    tx_type: TxType,
    field: &str,
    rule: Count,
    n: usize,
) -> Result<(), ValidationError> {
    if rule.admits(n) {
        return Ok(());
    }
    Err(ValidationError::structural(match rule {
        Count::Zero => format!("{} transaction should have no {}", tx_type, field),
        _ => format!("invalid {} count {} for {} transaction", field, n, tx_type),
    }))
}

pub fn check(tx: &Transaction, config: &ChainParams) -> Result<(), ValidationError> {
    if tx.version != TX_VERSION_09 {
        return Err(ValidationError::structural("invalid transaction version"));
    }
    let size = tx.serialize_unsigned().len();
    if size > config.max_tx_size {
        return Err(ValidationError::structural(format!(
            "transaction size {} exceeds limit",
            size
        )));
    }

    let s = shape(tx.tx_type, tx.payload_version);
    check_count(tx.tx_type, "inputs", s.inputs, tx.inputs.len())?;
    check_count(tx.tx_type, "outputs", s.outputs, tx.outputs.len())?;
    check_count(tx.tx_type, "attributes", s.attributes, tx.attributes.len())?;
    check_count(tx.tx_type, "programs", s.programs, tx.programs.len())?;

    check_inputs(tx)?;
    check_outputs(tx, config)?;
    check_attributes(tx)?;

    if tx.programs.iter().any(|p| p.code.is_empty() || p.parameter.is_empty()) {
        return Err(ValidationError::structural("invalid program"));
    }
    Ok(())
}

fn check_inputs(tx: &Transaction) -> Result<(), ValidationError> {
    if tx.tx_type == TxType::CoinBase {
        let input = &tx.inputs[0];
        if !input.previous.tx_id.is_zero() || input.previous.index != COINBASE_INPUT_INDEX {
            return Err(ValidationError::structural("invalid coinbase input"));
        }
        return Ok(());
    }
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if input.previous.tx_id.is_zero() && input.previous.index == COINBASE_INPUT_INDEX {
            return Err(ValidationError::structural("invalid transaction input"));
        }
        if !seen.insert(input.previous) {
            return Err(ValidationError::structural("duplicated inputs"));
        }
    }
    Ok(())
}

fn check_outputs(tx: &Transaction, config: &ChainParams) -> Result<(), ValidationError> {
    for output in &tx.outputs {
        if output.asset_id != config.ela_asset_id {
            return Err(ValidationError::structural("asset ID in output is invalid"));
        }
        if output.value.is_negative() {
            return Err(ValidationError::structural("invalid transaction UTXO output"));
        }
        let allowed = match output.payload.output_type() {
            OutputType::None => true,
            OutputType::Stake => tx.tx_type == TxType::ExchangeVotes,
            OutputType::Withdraw => {
                tx.tx_type == TxType::WithdrawFromSideChain
                    && tx.payload_version >= WITHDRAW_SCHNORR_VERSION
            }
        };
        if !allowed {
            return Err(ValidationError::structural(format!(
                "invalid output type for {} transaction",
                tx.tx_type
            )));
        }
    }
    if tx.output_total().is_none() {
        return Err(ValidationError::structural("output amount overflow"));
    }
    Ok(())
}

fn check_attributes(tx: &Transaction) -> Result<(), ValidationError> {
    for attr in &tx.attributes {
        AttributeUsage::try_from(attr.usage).map_err(|usage| {
            ValidationError::structural(format!("invalid attribute usage {:#04x}", usage))
        })?;
    }
    Ok(())
}
