//! Per-call validation inputs.

use std::collections::HashMap;

use crate::config::ChainParams;
use crate::error::ValidationError;
use crate::state::StateView;
use crate::transaction::{Input, Output, Transaction};
use crate::types::{Fixed64, ProgramHash};

/// Inputs resolved to the outputs they spend. Supplied by the caller.
pub type References = HashMap<Input, Output>;

/// Everything a validation call reads. Immutable for the duration of the call.
#[derive(Clone, Copy)]
pub struct ValidationParameters<'a> {
    pub height: u32,
    pub timestamp: u32,
    pub config: &'a ChainParams,
    pub state: &'a dyn StateView,
    pub references: &'a References,
}

impl<'a> ValidationParameters<'a> {
    pub fn new(
        height: u32,
        config: &'a ChainParams,
        state: &'a dyn StateView,
        references: &'a References,
    ) -> Self {
        Self {
            height,
            timestamp: 0,
            config,
            state,
            references,
        }
    }

    /// The output spent by `input`.
    pub fn reference(&self, input: &Input) -> Result<&'a Output, ValidationError> {
        self.references.get(input).ok_or_else(|| {
            ValidationError::state(format!(
                "reference not found for input {}:{}",
                input.previous.tx_id, input.previous.index
            ))
        })
    }

    /// Sum of the values spent by `tx`.
    pub fn input_total(&self, tx: &Transaction) -> Result<Fixed64, ValidationError> {
        let mut total = Fixed64::ZERO;
        for input in &tx.inputs {
            total = total
                .checked_add(self.reference(input)?.value)
                .ok_or_else(|| ValidationError::economic("input amount overflow"))?;
        }
        Ok(total)
    }

    /// `true` when every input of `tx` spends from `address`.
    pub fn inputs_all_from(
        &self,
        tx: &Transaction,
        address: &ProgramHash,
    ) -> Result<bool, ValidationError> {
        for input in &tx.inputs {
            if self.reference(input)?.program_hash != *address {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `inputs − outputs`; fails on overflow.
    pub fn fee(&self, tx: &Transaction) -> Result<Fixed64, ValidationError> {
        let inputs = self.input_total(tx)?;
        let outputs = tx
            .output_total()
            .ok_or_else(|| ValidationError::economic("output amount overflow"))?;
        inputs
            .checked_sub(outputs)
            .ok_or_else(|| ValidationError::economic("fee amount overflow"))
    }
}

impl core::fmt::Debug for ValidationParameters<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValidationParameters")
            .field("height", &self.height)
            .field("timestamp", &self.timestamp)
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}
