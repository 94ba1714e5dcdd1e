//! Bridge configuration
//!
//! One [`CounterpartyChainParams`] per hyperion id. Times are in milliseconds.

use super::value_objects::{Coin, HyperionId, SlashFraction};
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum transactions per batch built from a `RequestBatch` message.
pub const OUTGOING_TX_BATCH_SIZE: usize = 100;

/// Parameters of one counterparty chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyChainParams {
    pub hyperion_id: HyperionId,
    pub bridge_chain_id: u64,
    /// End-of-block processing is skipped while paused.
    pub paused: bool,
    /// Blocks a validator has to confirm a valset before being slashed.
    pub signed_valsets_window: u64,
    /// Blocks a validator has to confirm a batch before being slashed.
    pub signed_batches_window: u64,
    pub target_batch_timeout: u64,
    pub target_outgoing_tx_timeout: u64,
    pub average_block_time: u64,
    pub average_counterparty_block_time: u64,
    pub slash_fraction_valset: SlashFraction,
    pub slash_fraction_batch: SlashFraction,
    pub slash_fraction_bad_eth_signature: SlashFraction,
    /// Paid by the contract to the relayer of each valset update.
    pub valset_reward: Option<Coin>,
    /// Power shift (basis points) that triggers a new valset request.
    pub valset_power_change_bps: u64,
}

impl Default for CounterpartyChainParams {
    fn default() -> Self {
        Self {
            hyperion_id: 0,
            bridge_chain_id: 0,
            paused: false,
            signed_valsets_window: 25_000,
            signed_batches_window: 25_000,
            target_batch_timeout: 43_200_000,
            target_outgoing_tx_timeout: 43_200_000,
            average_block_time: 2_000,
            average_counterparty_block_time: 2_000,
            slash_fraction_valset: SlashFraction::from_ppm(1_000),
            slash_fraction_batch: SlashFraction::from_ppm(1_000),
            slash_fraction_bad_eth_signature: SlashFraction::from_ppm(1_000),
            valset_reward: None,
            valset_power_change_bps: 500,
        }
    }
}

impl CounterpartyChainParams {
    pub fn with_hyperion_id(hyperion_id: HyperionId) -> Self {
        Self {
            hyperion_id,
            ..Self::default()
        }
    }

    /// Counterparty blocks covered by the batch timeout.
    pub fn batch_timeout_blocks(&self) -> u64 {
        self.target_batch_timeout / self.average_counterparty_block_time.max(1)
    }

    /// Counterparty blocks covered by the pool tx timeout.
    pub fn outgoing_tx_timeout_blocks(&self) -> u64 {
        self.target_outgoing_tx_timeout / self.average_counterparty_block_time.max(1)
    }
}

/// Module-wide parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeParams {
    /// Denom bridge fees must be paid in.
    pub fee_denom: String,
    pub counterparty_chains: BTreeMap<HyperionId, CounterpartyChainParams>,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            fee_denom: "ahelios".to_string(),
            counterparty_chains: BTreeMap::new(),
        }
    }
}

impl BridgeParams {
    /// Adds or replaces the params of one chain, keyed by its hyperion id.
    pub fn with_chain(mut self, chain: CounterpartyChainParams) -> Self {
        self.counterparty_chains.insert(chain.hyperion_id, chain);
        self
    }

    pub fn chain(&self, hyperion_id: HyperionId) -> BridgeResult<&CounterpartyChainParams> {
        self.counterparty_chains
            .get(&hyperion_id)
            .ok_or_else(|| BridgeError::unknown(format!("hyperion id {hyperion_id}")))
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.fee_denom.is_empty() {
            return Err(BridgeError::invalid("fee denom is empty"));
        }
        for (id, chain) in &self.counterparty_chains {
            if *id != chain.hyperion_id {
                return Err(BridgeError::invalid(format!(
                    "params keyed under {id} carry hyperion id {}",
                    chain.hyperion_id
                )));
            }
            if chain.average_block_time == 0 || chain.average_counterparty_block_time == 0 {
                return Err(BridgeError::invalid(format!(
                    "hyperion id {id}: block times must be non-zero"
                )));
            }
        }
        Ok(())
    }
}
