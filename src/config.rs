//! Protocol constants and activation heights.
//!
//! Loaded from JSON; every field is optional and falls back to the
//! mainnet-like default, so a fixture only lists what it overrides.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{prefix, Fixed64, ProgramHash, Uint256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    // --- activation heights ---
    pub public_dpos_height: u32,
    pub enable_activate_illegal_height: u32,
    pub cr_voting_start_height: u32,
    pub cr_committee_start_height: u32,
    pub register_cr_by_did_height: u32,
    pub crc_proposal_v1_height: u32,
    pub crc_proposal_withdraw_payload_v1_height: u32,
    pub dpos_v2_start_height: u32,
    pub producer_schnorr_start_height: u32,
    pub cr_schnorr_start_height: u32,
    pub votes_schnorr_start_height: u32,
    pub schnorr_withdraw_start_height: u32,
    pub cross_chain_supermajority_height: u32,

    // --- amounts ---
    pub ela_asset_id: Uint256,
    pub min_deposit_amount: Fixed64,
    pub min_cr_deposit_amount: Fixed64,
    pub min_transaction_fee: Fixed64,
    pub real_withdraw_single_fee: Fixed64,
    pub min_cross_chain_tx_fee: Fixed64,
    pub min_stake_amount: Fixed64,
    /// Ceiling of a proposal's total budget, in percent of the CR assets.
    pub proposal_budgets_percentage: i64,

    // --- durations & limits ---
    pub deposit_lockup_blocks: u32,
    /// Blocks after an activation request during which another one is rejected.
    pub activate_duration: u32,
    pub dpos_v2_min_lock_time: u32,
    pub dpos_v2_max_lock_time: u32,
    pub max_vote_candidates: usize,
    pub max_tx_size: usize,
    pub max_nickname_length: usize,
    pub max_url_length: usize,

    // --- system addresses ---
    pub cr_assets_address: ProgramHash,
    pub cr_expenses_address: ProgramHash,
    pub stake_pool_address: ProgramHash,
    pub dpos_v2_reward_address: ProgramHash,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            public_dpos_height: 402_680,
            enable_activate_illegal_height: 439_000,
            cr_voting_start_height: 537_670,
            cr_committee_start_height: 658_930,
            register_cr_by_did_height: 598_000,
            crc_proposal_v1_height: 751_400,
            crc_proposal_withdraw_payload_v1_height: 751_400,
            dpos_v2_start_height: 1_405_000,
            producer_schnorr_start_height: 1_500_000,
            cr_schnorr_start_height: 1_500_000,
            votes_schnorr_start_height: 1_500_000,
            schnorr_withdraw_start_height: 1_500_000,
            cross_chain_supermajority_height: 1_032_840,

            ela_asset_id: Uint256::ZERO,
            min_deposit_amount: Fixed64::from_ela(5000),
            min_cr_deposit_amount: Fixed64::from_ela(5000),
            min_transaction_fee: Fixed64(100),
            real_withdraw_single_fee: Fixed64(10_000),
            min_cross_chain_tx_fee: Fixed64(10_000),
            min_stake_amount: Fixed64::from_ela(1),
            proposal_budgets_percentage: 10,

            deposit_lockup_blocks: 2160,
            activate_duration: 6,
            dpos_v2_min_lock_time: 7200,
            dpos_v2_max_lock_time: 720_000,
            max_vote_candidates: 36,
            max_tx_size: 8_000_000,
            max_nickname_length: 100,
            max_url_length: 100,

            cr_assets_address: ProgramHash::system(prefix::CR_EXPENSES, b"CRASSETS"),
            cr_expenses_address: ProgramHash::system(prefix::CR_EXPENSES, b"CREXPENSES"),
            stake_pool_address: ProgramHash::system(prefix::DPOS_V2, b"STAKEPOOL"),
            dpos_v2_reward_address: ProgramHash::system(prefix::DPOS_V2, b"STAKEREWARD"),
        }
    }
}

impl ChainParams {
    /// Parses a (partial) JSON document and checks cross-field consistency.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: ChainParams = serde_json::from_str(json)?;
        params.check()?;
        Ok(params)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.dpos_v2_min_lock_time > self.dpos_v2_max_lock_time {
            return Err(ConfigError::Invalid(
                "dpos_v2_min_lock_time exceeds dpos_v2_max_lock_time".into(),
            ));
        }
        if self.crc_proposal_v1_height < self.cr_committee_start_height {
            return Err(ConfigError::Invalid(
                "crc_proposal_v1_height precedes cr_committee_start_height".into(),
            ));
        }
        for (name, v) in [
            ("min_deposit_amount", self.min_deposit_amount),
            ("min_cr_deposit_amount", self.min_cr_deposit_amount),
            ("min_transaction_fee", self.min_transaction_fee),
            ("real_withdraw_single_fee", self.real_withdraw_single_fee),
            ("min_cross_chain_tx_fee", self.min_cross_chain_tx_fee),
        ] {
            if v.is_negative() {
                return Err(ConfigError::Invalid(format!("{} is negative", name)));
            }
        }
        if !(0..=100).contains(&self.proposal_budgets_percentage) {
            return Err(ConfigError::Invalid(
                "proposal_budgets_percentage out of range".into(),
            ));
        }
        Ok(())
    }
}
