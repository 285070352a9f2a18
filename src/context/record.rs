//! Kinds with little or no payload logic of their own.

use super::common::payload_mismatch;
use super::{ContextValidator, Verdict};
use crate::error::ValidationError;
use crate::params::ValidationParameters;
use crate::payload::{Payload, TxType};
use crate::transaction::Transaction;

/// Plain value transfer; everything is decided by the common stage.
#[derive(Debug, Clone, Copy)]
pub struct TransferAsset;

impl ContextValidator for TransferAsset {
    fn tx_type(&self) -> TxType {
        TxType::TransferAsset
    }

    fn check(
        &self,
        tx: &Transaction,
        _params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if !matches!(tx.payload, Payload::TransferAsset) {
            return Err(payload_mismatch(tx));
        }
        Ok(Verdict::Continue)
    }
}

/// Block reward. Reward split is checked at block level.
#[derive(Debug, Clone, Copy)]
pub struct CoinBase;

impl ContextValidator for CoinBase {
    fn tx_type(&self) -> TxType {
        TxType::CoinBase
    }

    fn check(
        &self,
        tx: &Transaction,
        _params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if !matches!(tx.payload, Payload::CoinBase(_)) {
            return Err(payload_mismatch(tx));
        }
        Ok(Verdict::Final)
    }
}

/// Announces the arbitrators of the next turn; must match what state expects.
#[derive(Debug, Clone, Copy)]
pub struct NextTurnDposInfo;

impl ContextValidator for NextTurnDposInfo {
    fn tx_type(&self) -> TxType {
        TxType::NextTurnDposInfo
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::NextTurnDposInfo(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        if p.working_height <= params.height {
            return Err(ValidationError::state(format!(
                "invalid working height {}",
                p.working_height
            )));
        }
        let next = params.state.next_arbitrators();
        if p.cr_public_keys != next.cr_public_keys || p.dpos_public_keys != next.dpos_public_keys {
            return Err(ValidationError::state("next turn arbitrators do not match"));
        }
        Ok(Verdict::Final)
    }
}
