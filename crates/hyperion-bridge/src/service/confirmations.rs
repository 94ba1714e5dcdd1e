//! Orchestrator signatures over valset and batch checkpoints

use crate::algorithms::{batch_checkpoint, valset_checkpoint, validate_checkpoint_signature};
use crate::domain::{
    AccAddress, BatchConfirm, EthAddress, EthSignature, HyperionId, ValAddress, ValsetConfirm,
};
use crate::error::{BridgeError, BridgeResult};
use crate::events::BridgeEvent;
use crate::metrics;
use crate::ports::{BatchStore, ConfirmStore, EventSink, MsgConfirmBatch, MsgValsetConfirm, ValsetStore};
use std::sync::Arc;
use tracing::debug;

pub struct ConfirmationStore<S, E> {
    store: Arc<S>,
    events: Arc<E>,
}

impl<S, E> ConfirmationStore<S, E>
where
    S: ValsetStore + ConfirmStore + BatchStore,
    E: EventSink,
{
    pub fn new(store: Arc<S>, events: Arc<E>) -> Self {
        Self { store, events }
    }

    /// Resolves the orchestrator to its validator and registered eth address.
    fn signer_keys(
        &self,
        hyperion_id: HyperionId,
        orchestrator: &AccAddress,
    ) -> BridgeResult<(ValAddress, EthAddress)> {
        let validator = self
            .store
            .orchestrator_validator(hyperion_id, orchestrator)
            .ok_or_else(|| BridgeError::unknown(format!("validator for orchestrator {orchestrator}")))?;
        let eth_address = self
            .store
            .eth_address(hyperion_id, &validator)
            .ok_or_else(|| BridgeError::Empty {
                reason: format!("no eth address registered for {validator}"),
            })?;
        Ok((validator, eth_address))
    }

    /// Stores an orchestrator's signature over a stored valset.
    pub fn confirm_valset(&self, msg: MsgValsetConfirm) -> BridgeResult<()> {
        let hyperion_id = msg.hyperion_id;
        let valset = self
            .store
            .valset(hyperion_id, msg.nonce)
            .ok_or_else(|| BridgeError::invalid(format!("couldn't find valset {}", msg.nonce)))?;
        let checkpoint = valset_checkpoint(&valset, hyperion_id);
        let signature = EthSignature::from_hex(&msg.signature)?;
        let (_, eth_address) = self.signer_keys(hyperion_id, &msg.orchestrator)?;
        validate_checkpoint_signature(&checkpoint, &signature, &eth_address)?;

        if self
            .store
            .valset_confirm(hyperion_id, msg.nonce, &msg.orchestrator)
            .is_some()
        {
            return Err(BridgeError::Duplicate {
                reason: format!("valset {} already confirmed by {}", msg.nonce, msg.orchestrator),
            });
        }

        self.store.set_valset_confirm(ValsetConfirm {
            hyperion_id,
            nonce: msg.nonce,
            orchestrator: msg.orchestrator.clone(),
            eth_address,
            signature,
        });
        debug!(hyperion_id, nonce = msg.nonce, orchestrator = %msg.orchestrator, "[hyperion] valset confirm stored");
        metrics::record_confirm_stored("valset");
        self.events.emit(BridgeEvent::ValsetConfirmed {
            hyperion_id,
            valset_nonce: msg.nonce,
            orchestrator: msg.orchestrator,
        });
        Ok(())
    }

    /// Stores an orchestrator's signature over a pending batch.
    pub fn confirm_batch(&self, msg: MsgConfirmBatch) -> BridgeResult<()> {
        let hyperion_id = msg.hyperion_id;
        let batch = self
            .store
            .batch(hyperion_id, &msg.token_contract, msg.nonce)
            .ok_or_else(|| {
                BridgeError::invalid(format!(
                    "couldn't find batch {} for {}",
                    msg.nonce, msg.token_contract
                ))
            })?;
        let checkpoint = batch_checkpoint(&batch, hyperion_id);
        let signature = EthSignature::from_hex(&msg.signature)?;
        let (_, eth_address) = self.signer_keys(hyperion_id, &msg.orchestrator)?;
        validate_checkpoint_signature(&checkpoint, &signature, &eth_address)?;

        if self
            .store
            .batch_confirm(hyperion_id, msg.nonce, &msg.token_contract, &msg.orchestrator)
            .is_some()
        {
            return Err(BridgeError::Duplicate {
                reason: format!("batch {} already confirmed by {}", msg.nonce, msg.orchestrator),
            });
        }

        self.store.set_batch_confirm(BatchConfirm {
            hyperion_id,
            nonce: msg.nonce,
            token_contract: msg.token_contract,
            orchestrator: msg.orchestrator.clone(),
            eth_address,
            signature,
        });
        debug!(hyperion_id, nonce = msg.nonce, orchestrator = %msg.orchestrator, "[hyperion] batch confirm stored");
        metrics::record_confirm_stored("batch");
        self.events.emit(BridgeEvent::BatchConfirmed {
            hyperion_id,
            batch_nonce: msg.nonce,
            token_contract: msg.token_contract,
            orchestrator: msg.orchestrator,
        });
        Ok(())
    }

    pub fn valset_confirms(&self, hyperion_id: HyperionId, nonce: u64) -> Vec<ValsetConfirm> {
        self.store.valset_confirms(hyperion_id, nonce)
    }

    pub fn batch_confirms(
        &self,
        hyperion_id: HyperionId,
        nonce: u64,
        token_contract: &EthAddress,
    ) -> Vec<BatchConfirm> {
        self.store.batch_confirms(hyperion_id, nonce, token_contract)
    }
}
