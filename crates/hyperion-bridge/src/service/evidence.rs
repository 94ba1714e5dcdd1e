//! Bad signature evidence
//!
//! A validator that signs a checkpoint this chain never produced can be
//! slashed by anyone holding the signature and the forged subject.

use super::slashing::apply_slash;
use crate::algorithms::{batch_checkpoint, recover_checkpoint_signer, valset_checkpoint};
use crate::domain::{BlockContext, BridgeParams, EthSignature, HyperionId};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{BridgeEvent, SlashReason};
use crate::ports::{CheckpointStore, EventSink, EvidenceSubject, StakingKeeper, ValsetStore};
use std::sync::Arc;

pub struct SlashingEvidenceChecker<S, K, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    staking: Arc<K>,
    events: Arc<E>,
}

impl<S, K, E> SlashingEvidenceChecker<S, K, E>
where
    S: ValsetStore + CheckpointStore,
    K: StakingKeeper,
    E: EventSink,
{
    pub fn new(params: Arc<BridgeParams>, store: Arc<S>, staking: Arc<K>, events: Arc<E>) -> Self {
        Self {
            params,
            store,
            staking,
            events,
        }
    }

    pub fn check_bad_signature_evidence(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        subject: &EvidenceSubject,
        signature: &str,
    ) -> BridgeResult<()> {
        let chain = self.params.chain(hyperion_id)?;
        let checkpoint = match subject {
            EvidenceSubject::Valset(valset) => valset_checkpoint(valset, hyperion_id),
            EvidenceSubject::Batch(batch) => batch_checkpoint(batch, hyperion_id),
        };
        if self.store.has_past_checkpoint(hyperion_id, &checkpoint) {
            return Err(BridgeError::invalid("checkpoint exists, cannot slash"));
        }

        let signature = EthSignature::from_hex(signature)?;
        let signer = recover_checkpoint_signer(&checkpoint, &signature)?;
        if self.store.has_evidence(hyperion_id, &checkpoint, &signer) {
            return Err(BridgeError::Duplicate {
                reason: format!("evidence against {signer} already handled"),
            });
        }
        let validator = self
            .store
            .validator_by_eth_address(hyperion_id, &signer)
            .ok_or_else(|| BridgeError::invalid(format!("no validator for eth address {signer}")))?;

        apply_slash(
            self.staking.as_ref(),
            self.events.as_ref(),
            hyperion_id,
            &validator,
            ctx.height,
            chain.slash_fraction_bad_eth_signature,
            SlashReason::BadEthSignature,
        )?;
        self.store.record_evidence(hyperion_id, checkpoint, signer);
        self.events.emit(BridgeEvent::BadSignatureEvidence {
            hyperion_id,
            checkpoint,
            signer,
            validator,
        });
        Ok(())
    }
}
