//! # Outbound Ports
//!
//! Dependencies of the bridge: its own storage namespaces and the host
//! modules it drives (staking, bank, distribution, event bus).
//!
//! Store traits are split per namespace so that each component is bound
//! only by the state it actually touches. Reads return owned values, and
//! ordered collections come back in key order.

use crate::algorithms::FeeKey;
use crate::domain::{
    AccAddress, Attestation, BatchConfirm, Coin, DenomMetadata, EquivocationRecord, EthAddress,
    Hash, HyperionId, LastObservedEthHeight, OutgoingTx, OutgoingTxBatch, PostObservationError,
    SlashFraction, TokenPair, TransferRecord, ValAddress, Valset, ValsetConfirm,
};
use crate::error::BridgeResult;
use crate::events::BridgeEvent;
use primitive_types::U256;
use std::collections::BTreeMap;

/// Attestations, event-nonce bookkeeping and their audit trails.
pub trait AttestationStore: Send + Sync {
    fn attestation(&self, hyperion_id: HyperionId, nonce: u64, claim_hash: &Hash)
        -> Option<Attestation>;
    fn set_attestation(&self, attestation: Attestation);
    fn delete_attestation(&self, hyperion_id: HyperionId, nonce: u64, claim_hash: &Hash);
    /// All attestations of one hyperion id, grouped by nonce, ordered by claim hash.
    fn attestations(&self, hyperion_id: HyperionId) -> BTreeMap<u64, Vec<Attestation>>;
    /// Attestations at one nonce, ordered by claim hash.
    fn attestations_at_nonce(&self, hyperion_id: HyperionId, nonce: u64) -> Vec<Attestation>;

    fn last_observed_event_nonce(&self, hyperion_id: HyperionId) -> u64;
    fn set_last_observed_event_nonce(&self, hyperion_id: HyperionId, nonce: u64);
    fn last_observed_eth_height(&self, hyperion_id: HyperionId) -> LastObservedEthHeight;
    fn set_last_observed_eth_height(&self, hyperion_id: HyperionId, heights: LastObservedEthHeight);

    fn push_post_observation_error(&self, record: PostObservationError);
    fn post_observation_errors(&self, hyperion_id: HyperionId) -> Vec<PostObservationError>;
    fn push_equivocation(&self, record: EquivocationRecord);
    fn equivocations(&self, hyperion_id: HyperionId) -> Vec<EquivocationRecord>;
}

/// Delegate keys and validator set snapshots.
pub trait ValsetStore: Send + Sync {
    fn set_orchestrator_validator(
        &self,
        hyperion_id: HyperionId,
        orchestrator: &AccAddress,
        validator: &ValAddress,
    );
    fn orchestrator_validator(
        &self,
        hyperion_id: HyperionId,
        orchestrator: &AccAddress,
    ) -> Option<ValAddress>;
    fn orchestrator_by_validator(
        &self,
        hyperion_id: HyperionId,
        validator: &ValAddress,
    ) -> Option<AccAddress>;

    fn set_eth_address(&self, hyperion_id: HyperionId, validator: &ValAddress, eth: EthAddress);
    fn eth_address(&self, hyperion_id: HyperionId, validator: &ValAddress) -> Option<EthAddress>;
    fn validator_by_eth_address(
        &self,
        hyperion_id: HyperionId,
        eth: &EthAddress,
    ) -> Option<ValAddress>;

    fn store_valset(&self, valset: Valset);
    fn valset(&self, hyperion_id: HyperionId, nonce: u64) -> Option<Valset>;
    /// Ascending by nonce.
    fn valsets(&self, hyperion_id: HyperionId) -> Vec<Valset>;
    fn latest_valset_nonce(&self, hyperion_id: HyperionId) -> u64;
    fn delete_valset(&self, hyperion_id: HyperionId, nonce: u64);

    fn last_observed_valset(&self, hyperion_id: HyperionId) -> Option<Valset>;
    fn set_last_observed_valset(&self, valset: Valset);
    fn last_slashed_valset_nonce(&self, hyperion_id: HyperionId) -> u64;
    fn set_last_slashed_valset_nonce(&self, hyperion_id: HyperionId, nonce: u64);
    /// Host height at which a validator last began unbonding.
    fn last_unbonding_height(&self) -> u64;
    fn set_last_unbonding_height(&self, height: u64);
}

/// Orchestrator signatures.
pub trait ConfirmStore: Send + Sync {
    fn valset_confirm(
        &self,
        hyperion_id: HyperionId,
        nonce: u64,
        orchestrator: &AccAddress,
    ) -> Option<ValsetConfirm>;
    fn set_valset_confirm(&self, confirm: ValsetConfirm);
    fn valset_confirms(&self, hyperion_id: HyperionId, nonce: u64) -> Vec<ValsetConfirm>;
    fn delete_valset_confirms(&self, hyperion_id: HyperionId, nonce: u64);

    fn batch_confirm(
        &self,
        hyperion_id: HyperionId,
        nonce: u64,
        token_contract: &EthAddress,
        orchestrator: &AccAddress,
    ) -> Option<BatchConfirm>;
    fn set_batch_confirm(&self, confirm: BatchConfirm);
    fn batch_confirms(
        &self,
        hyperion_id: HyperionId,
        nonce: u64,
        token_contract: &EthAddress,
    ) -> Vec<BatchConfirm>;
    fn delete_batch_confirms(&self, hyperion_id: HyperionId, nonce: u64, token_contract: &EthAddress);
}

/// Unbatched withdrawals and the archive of finished ones.
pub trait PoolStore: Send + Sync {
    /// Auto-increment, starting at 1.
    fn next_tx_id(&self) -> u64;
    /// Inserts the tx and indexes it by fee under its token.
    fn insert_pool_tx(&self, tx: OutgoingTx);
    fn pool_tx(&self, hyperion_id: HyperionId, id: u64) -> Option<OutgoingTx>;
    fn remove_pool_tx(&self, hyperion_id: HyperionId, id: u64) -> Option<OutgoingTx>;
    /// Ascending by id.
    fn pool_txs(&self, hyperion_id: HyperionId) -> Vec<OutgoingTx>;
    /// Fee index of one token, highest fee first.
    fn unbatched_fee_keys(&self, hyperion_id: HyperionId, token_contract: &EthAddress)
        -> Vec<FeeKey>;

    fn record_transfer(&self, record: TransferRecord);
    fn transfers(&self, hyperion_id: HyperionId) -> Vec<TransferRecord>;
}

/// Outgoing batches.
pub trait BatchStore: Send + Sync {
    /// Auto-increment per hyperion id, starting at 1.
    fn next_batch_nonce(&self, hyperion_id: HyperionId) -> u64;
    fn store_batch(&self, batch: OutgoingTxBatch);
    fn batch(
        &self,
        hyperion_id: HyperionId,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Option<OutgoingTxBatch>;
    /// Ordered by token, then nonce.
    fn batches(&self, hyperion_id: HyperionId) -> Vec<OutgoingTxBatch>;
    fn delete_batch(&self, hyperion_id: HyperionId, token_contract: &EthAddress, nonce: u64);
    fn last_batch_by_token(
        &self,
        hyperion_id: HyperionId,
        token_contract: &EthAddress,
    ) -> Option<OutgoingTxBatch>;

    fn archive_executed_batch(&self, batch: OutgoingTxBatch);
    fn executed_batches(&self, hyperion_id: HyperionId) -> Vec<OutgoingTxBatch>;
    fn last_slashed_batch_block(&self, hyperion_id: HyperionId) -> u64;
    fn set_last_slashed_batch_block(&self, hyperion_id: HyperionId, block: u64);
}

/// Every checkpoint this chain ever asked validators to sign.
pub trait CheckpointStore: Send + Sync {
    fn set_past_checkpoint(&self, hyperion_id: HyperionId, checkpoint: Hash);
    fn has_past_checkpoint(&self, hyperion_id: HyperionId, checkpoint: &Hash) -> bool;
    /// Bad-signature evidence already acted upon, keyed by checkpoint and signer.
    fn record_evidence(&self, hyperion_id: HyperionId, checkpoint: Hash, signer: EthAddress);
    fn has_evidence(&self, hyperion_id: HyperionId, checkpoint: &Hash, signer: &EthAddress) -> bool;
}

/// Denom / contract registry, locked balances and the destination blacklist.
pub trait TokenStore: Send + Sync {
    fn token_by_contract(
        &self,
        hyperion_id: HyperionId,
        token_contract: &EthAddress,
    ) -> Option<TokenPair>;
    fn token_by_denom(&self, hyperion_id: HyperionId, denom: &str) -> Option<TokenPair>;
    fn set_token(&self, pair: TokenPair);

    /// Amount of a cosmos-originated token held by the counterparty contract.
    fn contract_balance(&self, hyperion_id: HyperionId, token_contract: &EthAddress) -> U256;
    fn set_contract_balance(&self, hyperion_id: HyperionId, token_contract: &EthAddress, balance: U256);

    fn is_blacklisted(&self, address: &EthAddress) -> bool;
    fn set_blacklisted(&self, address: EthAddress, blacklisted: bool);
}

/// Every namespace at once, for hosts that back them with a single store.
pub trait BridgeStore:
    AttestationStore + ValsetStore + ConfirmStore + PoolStore + BatchStore + CheckpointStore + TokenStore
{
}

impl<T> BridgeStore for T where
    T: AttestationStore
        + ValsetStore
        + ConfirmStore
        + PoolStore
        + BatchStore
        + CheckpointStore
        + TokenStore
{
}

/// Staking view of a validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorInfo {
    pub operator: ValAddress,
    /// Consensus power at the last end block.
    pub power: u64,
    pub bonded: bool,
    pub jailed: bool,
    /// Host height the validator started signing at.
    pub start_height: u64,
}

/// Staking module - outbound port.
pub trait StakingKeeper: Send + Sync {
    fn validator(&self, operator: &ValAddress) -> Option<ValidatorInfo>;
    /// Bonded validators, highest power first, ties by operator address.
    fn bonded_validators(&self) -> Vec<ValidatorInfo>;
    /// Slashes a fraction of the validator's power; returns the amount removed.
    fn slash(&self, operator: &ValAddress, height: u64, fraction: SlashFraction) -> BridgeResult<u64>;
}

/// Bank module - outbound port. The bridge module account is implicit.
pub trait BankKeeper: Send + Sync {
    fn balance(&self, account: &AccAddress, denom: &str) -> U256;
    fn supply(&self, denom: &str) -> U256;
    fn mint(&self, coin: &Coin) -> BridgeResult<()>;
    fn burn(&self, coin: &Coin) -> BridgeResult<()>;
    fn send_to_module(&self, from: &AccAddress, coin: &Coin) -> BridgeResult<()>;
    fn send_from_module(&self, to: &AccAddress, coin: &Coin) -> BridgeResult<()>;
    fn denom_metadata(&self, denom: &str) -> Option<DenomMetadata>;
    fn set_denom_metadata(&self, metadata: DenomMetadata);
}

/// Distribution module - outbound port.
pub trait DistributionKeeper: Send + Sync {
    /// Moves coins held by the bridge module into the community pool.
    fn fund_community_pool(&self, coin: &Coin) -> BridgeResult<()>;
}

/// Typed event sink for relayers and indexers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BridgeEvent);
}
