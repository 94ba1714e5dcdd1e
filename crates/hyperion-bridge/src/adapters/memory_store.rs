//! In-memory bridge store
//!
//! Implements every store namespace over ordered maps behind one
//! `parking_lot::RwLock`. Used by tests and by hosts that snapshot state
//! themselves.

use crate::algorithms::FeeKey;
use crate::domain::{
    AccAddress, Attestation, BatchConfirm, EquivocationRecord, EthAddress, Hash, HyperionId,
    LastObservedEthHeight, OutgoingTx, OutgoingTxBatch, PostObservationError, TokenPair,
    TransferRecord, ValAddress, Valset, ValsetConfirm,
};
use crate::ports::{
    AttestationStore, BatchStore, CheckpointStore, ConfirmStore, PoolStore, TokenStore,
    ValsetStore,
};
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct StoreState {
    // attestations
    attestations: BTreeMap<HyperionId, BTreeMap<u64, BTreeMap<Hash, Attestation>>>,
    last_event_nonce: BTreeMap<HyperionId, u64>,
    last_eth_height: BTreeMap<HyperionId, LastObservedEthHeight>,
    post_observation_errors: Vec<PostObservationError>,
    equivocations: Vec<EquivocationRecord>,

    // delegate keys and valsets
    orchestrator_to_validator: BTreeMap<(HyperionId, AccAddress), ValAddress>,
    validator_to_orchestrator: BTreeMap<(HyperionId, ValAddress), AccAddress>,
    validator_to_eth: BTreeMap<(HyperionId, ValAddress), EthAddress>,
    eth_to_validator: BTreeMap<(HyperionId, EthAddress), ValAddress>,
    valsets: BTreeMap<HyperionId, BTreeMap<u64, Valset>>,
    latest_valset_nonce: BTreeMap<HyperionId, u64>,
    last_observed_valset: BTreeMap<HyperionId, Valset>,
    last_slashed_valset_nonce: BTreeMap<HyperionId, u64>,
    last_unbonding_height: u64,

    // confirmations
    valset_confirms: BTreeMap<(HyperionId, u64), BTreeMap<AccAddress, ValsetConfirm>>,
    batch_confirms: BTreeMap<(HyperionId, EthAddress, u64), BTreeMap<AccAddress, BatchConfirm>>,

    // pool
    last_tx_id: u64,
    pool: BTreeMap<HyperionId, BTreeMap<u64, OutgoingTx>>,
    fee_index: BTreeMap<(HyperionId, EthAddress), BTreeSet<FeeKey>>,
    transfers: Vec<TransferRecord>,

    // batches
    last_batch_nonce: BTreeMap<HyperionId, u64>,
    batches: BTreeMap<HyperionId, BTreeMap<(EthAddress, u64), OutgoingTxBatch>>,
    executed_batches: Vec<OutgoingTxBatch>,
    last_slashed_batch_block: BTreeMap<HyperionId, u64>,
    past_checkpoints: BTreeSet<(HyperionId, Hash)>,
    evidence: BTreeSet<(HyperionId, Hash, EthAddress)>,

    // registry
    tokens: BTreeMap<(HyperionId, EthAddress), TokenPair>,
    denom_to_contract: BTreeMap<(HyperionId, String), EthAddress>,
    contract_balances: BTreeMap<(HyperionId, EthAddress), U256>,
    blacklist: BTreeSet<EthAddress>,
}

/// Ordered in-memory implementation of every store namespace.
#[derive(Default)]
pub struct InMemoryBridgeStore {
    state: RwLock<StoreState>,
}

impl InMemoryBridgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttestationStore for InMemoryBridgeStore {
    fn attestation(&self, hyperion_id: HyperionId, nonce: u64, claim_hash: &Hash) -> Option<Attestation> {
        self.state
            .read()
            .attestations
            .get(&hyperion_id)?
            .get(&nonce)?
            .get(claim_hash)
            .cloned()
    }

    fn set_attestation(&self, attestation: Attestation) {
        self.state
            .write()
            .attestations
            .entry(attestation.hyperion_id)
            .or_default()
            .entry(attestation.event_nonce)
            .or_default()
            .insert(attestation.claim_hash, attestation);
    }

    fn delete_attestation(&self, hyperion_id: HyperionId, nonce: u64, claim_hash: &Hash) {
        let mut state = self.state.write();
        if let Some(by_nonce) = state.attestations.get_mut(&hyperion_id) {
            if let Some(by_hash) = by_nonce.get_mut(&nonce) {
                by_hash.remove(claim_hash);
                if by_hash.is_empty() {
                    by_nonce.remove(&nonce);
                }
            }
        }
    }

    fn attestations(&self, hyperion_id: HyperionId) -> BTreeMap<u64, Vec<Attestation>> {
        self.state
            .read()
            .attestations
            .get(&hyperion_id)
            .map(|by_nonce| {
                by_nonce
                    .iter()
                    .map(|(nonce, by_hash)| (*nonce, by_hash.values().cloned().collect()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attestations_at_nonce(&self, hyperion_id: HyperionId, nonce: u64) -> Vec<Attestation> {
        self.state
            .read()
            .attestations
            .get(&hyperion_id)
            .and_then(|by_nonce| by_nonce.get(&nonce))
            .map(|by_hash| by_hash.values().cloned().collect())
            .unwrap_or_default()
    }

    fn last_observed_event_nonce(&self, hyperion_id: HyperionId) -> u64 {
        self.state
            .read()
            .last_event_nonce
            .get(&hyperion_id)
            .copied()
            .unwrap_or(0)
    }

    fn set_last_observed_event_nonce(&self, hyperion_id: HyperionId, nonce: u64) {
        self.state.write().last_event_nonce.insert(hyperion_id, nonce);
    }

    fn last_observed_eth_height(&self, hyperion_id: HyperionId) -> LastObservedEthHeight {
        self.state
            .read()
            .last_eth_height
            .get(&hyperion_id)
            .copied()
            .unwrap_or_default()
    }

    fn set_last_observed_eth_height(&self, hyperion_id: HyperionId, heights: LastObservedEthHeight) {
        self.state.write().last_eth_height.insert(hyperion_id, heights);
    }

    fn push_post_observation_error(&self, record: PostObservationError) {
        self.state.write().post_observation_errors.push(record);
    }

    fn post_observation_errors(&self, hyperion_id: HyperionId) -> Vec<PostObservationError> {
        self.state
            .read()
            .post_observation_errors
            .iter()
            .filter(|r| r.hyperion_id == hyperion_id)
            .cloned()
            .collect()
    }

    fn push_equivocation(&self, record: EquivocationRecord) {
        self.state.write().equivocations.push(record);
    }

    fn equivocations(&self, hyperion_id: HyperionId) -> Vec<EquivocationRecord> {
        self.state
            .read()
            .equivocations
            .iter()
            .filter(|r| r.hyperion_id == hyperion_id)
            .cloned()
            .collect()
    }
}

impl ValsetStore for InMemoryBridgeStore {
    fn set_orchestrator_validator(
        &self,
        hyperion_id: HyperionId,
        orchestrator: &AccAddress,
        validator: &ValAddress,
    ) {
        let mut state = self.state.write();
        state
            .orchestrator_to_validator
            .insert((hyperion_id, orchestrator.clone()), validator.clone());
        state
            .validator_to_orchestrator
            .insert((hyperion_id, validator.clone()), orchestrator.clone());
    }

    fn orchestrator_validator(&self, hyperion_id: HyperionId, orchestrator: &AccAddress) -> Option<ValAddress> {
        self.state
            .read()
            .orchestrator_to_validator
            .get(&(hyperion_id, orchestrator.clone()))
            .cloned()
    }

    fn orchestrator_by_validator(&self, hyperion_id: HyperionId, validator: &ValAddress) -> Option<AccAddress> {
        self.state
            .read()
            .validator_to_orchestrator
            .get(&(hyperion_id, validator.clone()))
            .cloned()
    }

    fn set_eth_address(&self, hyperion_id: HyperionId, validator: &ValAddress, eth: EthAddress) {
        let mut state = self.state.write();
        state
            .validator_to_eth
            .insert((hyperion_id, validator.clone()), eth);
        state
            .eth_to_validator
            .insert((hyperion_id, eth), validator.clone());
    }

    fn eth_address(&self, hyperion_id: HyperionId, validator: &ValAddress) -> Option<EthAddress> {
        self.state
            .read()
            .validator_to_eth
            .get(&(hyperion_id, validator.clone()))
            .copied()
    }

    fn validator_by_eth_address(&self, hyperion_id: HyperionId, eth: &EthAddress) -> Option<ValAddress> {
        self.state
            .read()
            .eth_to_validator
            .get(&(hyperion_id, *eth))
            .cloned()
    }

    fn store_valset(&self, valset: Valset) {
        let mut state = self.state.write();
        let latest = state.latest_valset_nonce.entry(valset.hyperion_id).or_insert(0);
        *latest = (*latest).max(valset.nonce);
        state
            .valsets
            .entry(valset.hyperion_id)
            .or_default()
            .insert(valset.nonce, valset);
    }

    fn valset(&self, hyperion_id: HyperionId, nonce: u64) -> Option<Valset> {
        self.state.read().valsets.get(&hyperion_id)?.get(&nonce).cloned()
    }

    fn valsets(&self, hyperion_id: HyperionId) -> Vec<Valset> {
        self.state
            .read()
            .valsets
            .get(&hyperion_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn latest_valset_nonce(&self, hyperion_id: HyperionId) -> u64 {
        self.state
            .read()
            .latest_valset_nonce
            .get(&hyperion_id)
            .copied()
            .unwrap_or(0)
    }

    fn delete_valset(&self, hyperion_id: HyperionId, nonce: u64) {
        if let Some(m) = self.state.write().valsets.get_mut(&hyperion_id) {
            m.remove(&nonce);
        }
    }

    fn last_observed_valset(&self, hyperion_id: HyperionId) -> Option<Valset> {
        self.state.read().last_observed_valset.get(&hyperion_id).cloned()
    }

    fn set_last_observed_valset(&self, valset: Valset) {
        self.state
            .write()
            .last_observed_valset
            .insert(valset.hyperion_id, valset);
    }

    fn last_slashed_valset_nonce(&self, hyperion_id: HyperionId) -> u64 {
        self.state
            .read()
            .last_slashed_valset_nonce
            .get(&hyperion_id)
            .copied()
            .unwrap_or(0)
    }

    fn set_last_slashed_valset_nonce(&self, hyperion_id: HyperionId, nonce: u64) {
        self.state
            .write()
            .last_slashed_valset_nonce
            .insert(hyperion_id, nonce);
    }

    fn last_unbonding_height(&self) -> u64 {
        self.state.read().last_unbonding_height
    }

    fn set_last_unbonding_height(&self, height: u64) {
        self.state.write().last_unbonding_height = height;
    }
}

impl ConfirmStore for InMemoryBridgeStore {
    fn valset_confirm(&self, hyperion_id: HyperionId, nonce: u64, orchestrator: &AccAddress) -> Option<ValsetConfirm> {
        self.state
            .read()
            .valset_confirms
            .get(&(hyperion_id, nonce))?
            .get(orchestrator)
            .cloned()
    }

    fn set_valset_confirm(&self, confirm: ValsetConfirm) {
        self.state
            .write()
            .valset_confirms
            .entry((confirm.hyperion_id, confirm.nonce))
            .or_default()
            .insert(confirm.orchestrator.clone(), confirm);
    }

    fn valset_confirms(&self, hyperion_id: HyperionId, nonce: u64) -> Vec<ValsetConfirm> {
        self.state
            .read()
            .valset_confirms
            .get(&(hyperion_id, nonce))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn delete_valset_confirms(&self, hyperion_id: HyperionId, nonce: u64) {
        self.state.write().valset_confirms.remove(&(hyperion_id, nonce));
    }

    fn batch_confirm(
        &self,
        hyperion_id: HyperionId,
        nonce: u64,
        token_contract: &EthAddress,
        orchestrator: &AccAddress,
    ) -> Option<BatchConfirm> {
        self.state
            .read()
            .batch_confirms
            .get(&(hyperion_id, *token_contract, nonce))?
            .get(orchestrator)
            .cloned()
    }

    fn set_batch_confirm(&self, confirm: BatchConfirm) {
        self.state
            .write()
            .batch_confirms
            .entry((confirm.hyperion_id, confirm.token_contract, confirm.nonce))
            .or_default()
            .insert(confirm.orchestrator.clone(), confirm);
    }

    fn batch_confirms(&self, hyperion_id: HyperionId, nonce: u64, token_contract: &EthAddress) -> Vec<BatchConfirm> {
        self.state
            .read()
            .batch_confirms
            .get(&(hyperion_id, *token_contract, nonce))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn delete_batch_confirms(&self, hyperion_id: HyperionId, nonce: u64, token_contract: &EthAddress) {
        self.state
            .write()
            .batch_confirms
            .remove(&(hyperion_id, *token_contract, nonce));
    }
}

impl PoolStore for InMemoryBridgeStore {
    fn next_tx_id(&self) -> u64 {
        let mut state = self.state.write();
        state.last_tx_id += 1;
        state.last_tx_id
    }

    fn insert_pool_tx(&self, tx: OutgoingTx) {
        let mut state = self.state.write();
        state
            .fee_index
            .entry((tx.hyperion_id, tx.token_contract))
            .or_default()
            .insert(FeeKey::new(tx.fee, tx.id));
        state
            .pool
            .entry(tx.hyperion_id)
            .or_default()
            .insert(tx.id, tx);
    }

    fn pool_tx(&self, hyperion_id: HyperionId, id: u64) -> Option<OutgoingTx> {
        self.state.read().pool.get(&hyperion_id)?.get(&id).cloned()
    }

    fn remove_pool_tx(&self, hyperion_id: HyperionId, id: u64) -> Option<OutgoingTx> {
        let mut state = self.state.write();
        let tx = state.pool.get_mut(&hyperion_id)?.remove(&id)?;
        if let Some(index) = state.fee_index.get_mut(&(hyperion_id, tx.token_contract)) {
            index.remove(&FeeKey::new(tx.fee, tx.id));
        }
        Some(tx)
    }

    fn pool_txs(&self, hyperion_id: HyperionId) -> Vec<OutgoingTx> {
        self.state
            .read()
            .pool
            .get(&hyperion_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn unbatched_fee_keys(&self, hyperion_id: HyperionId, token_contract: &EthAddress) -> Vec<FeeKey> {
        self.state
            .read()
            .fee_index
            .get(&(hyperion_id, *token_contract))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn record_transfer(&self, record: TransferRecord) {
        self.state.write().transfers.push(record);
    }

    fn transfers(&self, hyperion_id: HyperionId) -> Vec<TransferRecord> {
        self.state
            .read()
            .transfers
            .iter()
            .filter(|r| r.hyperion_id == hyperion_id)
            .cloned()
            .collect()
    }
}

impl BatchStore for InMemoryBridgeStore {
    fn next_batch_nonce(&self, hyperion_id: HyperionId) -> u64 {
        let mut state = self.state.write();
        let nonce = state.last_batch_nonce.entry(hyperion_id).or_insert(0);
        *nonce += 1;
        *nonce
    }

    fn store_batch(&self, batch: OutgoingTxBatch) {
        self.state
            .write()
            .batches
            .entry(batch.hyperion_id)
            .or_default()
            .insert((batch.token_contract, batch.batch_nonce), batch);
    }

    fn batch(&self, hyperion_id: HyperionId, token_contract: &EthAddress, nonce: u64) -> Option<OutgoingTxBatch> {
        self.state
            .read()
            .batches
            .get(&hyperion_id)?
            .get(&(*token_contract, nonce))
            .cloned()
    }

    fn batches(&self, hyperion_id: HyperionId) -> Vec<OutgoingTxBatch> {
        self.state
            .read()
            .batches
            .get(&hyperion_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn delete_batch(&self, hyperion_id: HyperionId, token_contract: &EthAddress, nonce: u64) {
        if let Some(m) = self.state.write().batches.get_mut(&hyperion_id) {
            m.remove(&(*token_contract, nonce));
        }
    }

    fn last_batch_by_token(&self, hyperion_id: HyperionId, token_contract: &EthAddress) -> Option<OutgoingTxBatch> {
        self.state
            .read()
            .batches
            .get(&hyperion_id)?
            .range((*token_contract, 0)..=(*token_contract, u64::MAX))
            .next_back()
            .map(|(_, batch)| batch.clone())
    }

    fn archive_executed_batch(&self, batch: OutgoingTxBatch) {
        self.state.write().executed_batches.push(batch);
    }

    fn executed_batches(&self, hyperion_id: HyperionId) -> Vec<OutgoingTxBatch> {
        self.state
            .read()
            .executed_batches
            .iter()
            .filter(|b| b.hyperion_id == hyperion_id)
            .cloned()
            .collect()
    }

    fn last_slashed_batch_block(&self, hyperion_id: HyperionId) -> u64 {
        self.state
            .read()
            .last_slashed_batch_block
            .get(&hyperion_id)
            .copied()
            .unwrap_or(0)
    }

    fn set_last_slashed_batch_block(&self, hyperion_id: HyperionId, block: u64) {
        self.state
            .write()
            .last_slashed_batch_block
            .insert(hyperion_id, block);
    }
}

impl CheckpointStore for InMemoryBridgeStore {
    fn set_past_checkpoint(&self, hyperion_id: HyperionId, checkpoint: Hash) {
        self.state
            .write()
            .past_checkpoints
            .insert((hyperion_id, checkpoint));
    }

    fn has_past_checkpoint(&self, hyperion_id: HyperionId, checkpoint: &Hash) -> bool {
        self.state
            .read()
            .past_checkpoints
            .contains(&(hyperion_id, *checkpoint))
    }

    fn record_evidence(&self, hyperion_id: HyperionId, checkpoint: Hash, signer: EthAddress) {
        self.state
            .write()
            .evidence
            .insert((hyperion_id, checkpoint, signer));
    }

    fn has_evidence(&self, hyperion_id: HyperionId, checkpoint: &Hash, signer: &EthAddress) -> bool {
        self.state
            .read()
            .evidence
            .contains(&(hyperion_id, *checkpoint, *signer))
    }
}

impl TokenStore for InMemoryBridgeStore {
    fn token_by_contract(&self, hyperion_id: HyperionId, token_contract: &EthAddress) -> Option<TokenPair> {
        self.state
            .read()
            .tokens
            .get(&(hyperion_id, *token_contract))
            .cloned()
    }

    fn token_by_denom(&self, hyperion_id: HyperionId, denom: &str) -> Option<TokenPair> {
        let state = self.state.read();
        let contract = state
            .denom_to_contract
            .get(&(hyperion_id, denom.to_string()))?;
        state.tokens.get(&(hyperion_id, *contract)).cloned()
    }

    fn set_token(&self, pair: TokenPair) {
        let mut state = self.state.write();
        state
            .denom_to_contract
            .insert((pair.hyperion_id, pair.denom.clone()), pair.token_contract);
        state
            .tokens
            .insert((pair.hyperion_id, pair.token_contract), pair);
    }

    fn contract_balance(&self, hyperion_id: HyperionId, token_contract: &EthAddress) -> U256 {
        self.state
            .read()
            .contract_balances
            .get(&(hyperion_id, *token_contract))
            .copied()
            .unwrap_or_default()
    }

    fn set_contract_balance(&self, hyperion_id: HyperionId, token_contract: &EthAddress, balance: U256) {
        self.state
            .write()
            .contract_balances
            .insert((hyperion_id, *token_contract), balance);
    }

    fn is_blacklisted(&self, address: &EthAddress) -> bool {
        self.state.read().blacklist.contains(address)
    }

    fn set_blacklisted(&self, address: EthAddress, blacklisted: bool) {
        let mut state = self.state.write();
        if blacklisted {
            state.blacklist.insert(address);
        } else {
            state.blacklist.remove(&address);
        }
    }
}
