//! Block producer lifecycle: register, update, cancel, activate and deposit return.

use tracing::trace;

use super::common::{
    check_deposit_output, check_payload_signature, check_public_key, check_schnorr_owner_program,
    check_string_length, code_key, deposit_withdrawn, payload_mismatch,
};
use super::{ContextValidator, Verdict};
use crate::crypto;
use crate::error::ValidationError;
use crate::height::Feature;
use crate::params::ValidationParameters;
use crate::payload::producer::{PRODUCER_DPOS_V2_VERSION, PRODUCER_SCHNORR_VERSION};
use crate::payload::{Payload, ProducerInfo, TxType};
use crate::state::{ProducerState, ProducerIdentity};
use crate::transaction::Transaction;

fn check_info_fields(
    info: &ProducerInfo,
    params: &ValidationParameters<'_>,
) -> Result<(), ValidationError> {
    check_string_length(&info.nickname, 1, params.config.max_nickname_length, "NickName")?;
    check_string_length(&info.url, 0, params.config.max_url_length, "Url")?;
    check_public_key(&info.owner_key, "owner")?;
    check_public_key(&info.node_key, "node")?;
    Ok(())
}

/// Owner signature: in the payload before the Schnorr version, in the
/// transaction program from it on.
fn check_owner_signature(
    tx: &Transaction,
    info: &ProducerInfo,
) -> Result<(), ValidationError> {
    if tx.payload_version >= PRODUCER_SCHNORR_VERSION {
        return check_schnorr_owner_program(tx, &info.owner_key);
    }
    check_payload_signature(
        &info.owner_key,
        &info.unsigned_bytes(tx.payload_version),
        &info.signature,
    )
}

fn check_stake_until(
    info: &ProducerInfo,
    version: u8,
    params: &ValidationParameters<'_>,
) -> Result<(), ValidationError> {
    if version < PRODUCER_DPOS_V2_VERSION {
        return Ok(());
    }
    let min = params.height.saturating_add(params.config.dpos_v2_min_lock_time);
    let max = params.height.saturating_add(params.config.dpos_v2_max_lock_time);
    if info.stake_until < min || info.stake_until > max {
        return Err(ValidationError::structural(format!(
            "stake until {} is out of range [{}, {}]",
            info.stake_until, min, max
        )));
    }
    Ok(())
}

fn check_node_key_free(
    node_key: &[u8],
    params: &ValidationParameters<'_>,
) -> Result<(), ValidationError> {
    if params.state.producer_by_node(node_key).is_some()
        || params.state.producer_by_owner(node_key).is_some()
    {
        return Err(ValidationError::state("producer already registered"));
    }
    if params.state.cr_code_key_exists(node_key) {
        return Err(ValidationError::state(
            "node public key can't equal with CR member code",
        ));
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// RegisterProducer
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RegisterProducer;

impl ContextValidator for RegisterProducer {
    fn tx_type(&self) -> TxType {
        TxType::RegisterProducer
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::RegisterProducer(info) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_info_fields(info, params)?;

        if params.state.producer_by_owner(&info.owner_key).is_some() {
            return Err(ValidationError::state("producer owner already registered"));
        }
        check_node_key_free(&info.node_key, params)?;
        if params.state.nickname_exists(&info.nickname) {
            return Err(ValidationError::state(format!(
                "nick name {} already inuse",
                info.nickname
            )));
        }

        check_stake_until(info, tx.payload_version, params)?;
        check_owner_signature(tx, info)?;

        let deposit = crypto::deposit_hash(&info.owner_key)?;
        check_deposit_output(
            tx,
            &deposit,
            params.config.min_deposit_amount,
            "producer deposit amount is insufficient",
        )?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// UpdateProducer
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct UpdateProducer;

impl ContextValidator for UpdateProducer {
    fn tx_type(&self) -> TxType {
        TxType::UpdateProducer
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::UpdateProducer(info) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        check_info_fields(info, params)?;

        let Some(producer) = params.state.producer_by_owner(&info.owner_key) else {
            return Err(ValidationError::state("updating unknown producer"));
        };
        if matches!(
            producer.state,
            ProducerState::Canceled | ProducerState::Illegal | ProducerState::Returned
        ) {
            return Err(ValidationError::state("updating canceled or returned producer"));
        }
        if info.nickname != producer.info.nickname && params.state.nickname_exists(&info.nickname)
        {
            return Err(ValidationError::state(format!(
                "nick name {} already inuse",
                info.nickname
            )));
        }
        if info.node_key != producer.info.node_key {
            check_node_key_free(&info.node_key, params)?;
        }
        if tx.payload_version >= PRODUCER_DPOS_V2_VERSION {
            if info.stake_until < producer.stake_until {
                return Err(ValidationError::state("stake time is smaller than before"));
            }
            if info.stake_until != producer.stake_until {
                check_stake_until(info, tx.payload_version, params)?;
            }
        }

        check_owner_signature(tx, info)?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// CancelProducer
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CancelProducer;

impl ContextValidator for CancelProducer {
    fn tx_type(&self) -> TxType {
        TxType::CancelProducer
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::CancelProducer(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let Some(producer) = params.state.producer_by_owner(&p.owner_key) else {
            return Err(ValidationError::state("getting unknown producer"));
        };
        if !matches!(producer.state, ProducerState::Active | ProducerState::Inactive) {
            return Err(ValidationError::state("can not cancel this producer"));
        }
        check_payload_signature(&p.owner_key, &p.unsigned_bytes(), &p.signature)?;
        Ok(Verdict::Continue)
    }
}

// -----------------------------------------------------------------------------
// ActivateProducer
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ActivateProducer;

impl ContextValidator for ActivateProducer {
    fn tx_type(&self) -> TxType {
        TxType::ActivateProducer
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        let Payload::ActivateProducer(p) = &tx.payload else {
            return Err(payload_mismatch(tx));
        };
        let Some(producer) = params.state.producer_by_node(&p.node_key) else {
            return Err(ValidationError::state("getting unknown producer"));
        };

        let config = params.config;
        let height = params.height;
        let allowed = match producer.state {
            ProducerState::Inactive => true,
            ProducerState::Illegal => Feature::EnableActivateIllegal.is_active(config, height),
            ProducerState::Canceled => {
                Feature::DposV2Start.is_active(config, height)
                    && producer.identity != ProducerIdentity::DposV1
                    && producer.stake_until > height
            }
            _ => false,
        };
        if !allowed {
            return Err(ValidationError::state("can not activate this producer"));
        }
        if let Some(requested) = producer.activate_request_height {
            if height <= requested.saturating_add(config.activate_duration) {
                return Err(ValidationError::state(
                    "can only activate once during inactive state",
                ));
            }
        }

        let available = producer
            .available_deposit()
            .ok_or_else(|| ValidationError::economic("deposit amount overflow"))?;
        if available < config.min_deposit_amount {
            return Err(ValidationError::economic("insufficient deposit amount"));
        }

        check_payload_signature(&p.node_key, &p.unsigned_bytes(), &p.signature)?;
        Ok(Verdict::Final)
    }
}

// -----------------------------------------------------------------------------
// ReturnDepositCoin
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ReturnDepositCoin;

impl ContextValidator for ReturnDepositCoin {
    fn tx_type(&self) -> TxType {
        TxType::ReturnDepositCoin
    }

    fn check(
        &self,
        tx: &Transaction,
        params: &ValidationParameters<'_>,
    ) -> Result<Verdict, ValidationError> {
        if !matches!(tx.payload, Payload::ReturnDepositCoin) {
            return Err(payload_mismatch(tx));
        }
        for program in &tx.programs {
            let key = code_key(&program.code)?;
            let Some(producer) = params.state.producer_by_owner(key) else {
                return Err(ValidationError::state("signer must be producer"));
            };
            if producer.state != ProducerState::Canceled {
                return Err(ValidationError::state("producer must be canceled before return"));
            }
            let unlock = producer
                .cancel_height
                .saturating_add(params.config.deposit_lockup_blocks);
            if params.height < unlock {
                return Err(ValidationError::state(
                    "can not return deposit before lock-up period",
                ));
            }

            let available = producer
                .available_deposit()
                .ok_or_else(|| ValidationError::economic("deposit amount overflow"))?;
            let deposit = crypto::deposit_hash(key)?;
            let returned = deposit_withdrawn(tx, params, &deposit)?;
            trace!(%deposit, %returned, %available, "return deposit");
            if returned > available {
                return Err(ValidationError::economic("overspend deposit"));
            }
        }
        Ok(Verdict::Continue)
    }
}
