//! Slashing of validators that did not sign in time

use crate::domain::{BlockContext, BridgeParams, HyperionId, SlashFraction, ValAddress};
use crate::error::BridgeResult;
use crate::events::{BridgeEvent, SlashReason};
use crate::metrics;
use crate::ports::{BatchStore, ConfirmStore, EventSink, StakingKeeper, ValsetStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, warn};

/// Slashes through the staking port and reports it.
pub(crate) fn apply_slash<K: StakingKeeper, E: EventSink>(
    staking: &K,
    events: &E,
    hyperion_id: HyperionId,
    validator: &ValAddress,
    height: u64,
    fraction: SlashFraction,
    reason: SlashReason,
) -> BridgeResult<u64> {
    let slashed = staking.slash(validator, height, fraction)?;
    warn!(
        hyperion_id,
        %validator,
        reason = reason.as_str(),
        ppm = fraction.parts_per_million,
        slashed,
        "[hyperion] validator slashed"
    );
    metrics::record_slash(reason.as_str());
    events.emit(BridgeEvent::ValidatorSlashed {
        hyperion_id,
        validator: validator.clone(),
        reason,
        fraction,
        slashed,
    });
    Ok(slashed)
}

/// Walks valsets and batches past their signing window and slashes every
/// validator that should have confirmed them but did not.
pub struct ConfirmSlasher<S, K, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    staking: Arc<K>,
    events: Arc<E>,
}

impl<S, K, E> ConfirmSlasher<S, K, E>
where
    S: ValsetStore + ConfirmStore + BatchStore,
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

    fn slash_logged(
        &self,
        hyperion_id: HyperionId,
        validator: &ValAddress,
        height: u64,
        fraction: SlashFraction,
        reason: SlashReason,
    ) -> bool {
        match apply_slash(
            self.staking.as_ref(),
            self.events.as_ref(),
            hyperion_id,
            validator,
            height,
            fraction,
            reason,
        ) {
            Ok(_) => true,
            Err(e) => {
                error!(hyperion_id, %validator, error = %e, "[hyperion] slash failed");
                false
            }
        }
    }

    /// Returns the number of validators slashed.
    pub fn slash_unconfirmed_valsets(&self, ctx: BlockContext, hyperion_id: HyperionId) -> BridgeResult<usize> {
        let chain = self.params.chain(hyperion_id)?;
        if ctx.height <= chain.signed_valsets_window {
            return Ok(0);
        }
        let max_height = ctx.height - chain.signed_valsets_window;
        let last_slashed = self.store.last_slashed_valset_nonce(hyperion_id);

        let mut slashed = 0;
        for valset in self
            .store
            .valsets(hyperion_id)
            .into_iter()
            .filter(|vs| vs.nonce > last_slashed && vs.height < max_height)
        {
            let signed: BTreeSet<_> = self
                .store
                .valset_confirms(hyperion_id, valset.nonce)
                .into_iter()
                .map(|c| c.eth_address)
                .collect();

            for validator in self.staking.bonded_validators() {
                if validator.jailed || validator.start_height >= valset.height {
                    continue;
                }
                if self
                    .store
                    .orchestrator_by_validator(hyperion_id, &validator.operator)
                    .is_none()
                {
                    continue;
                }
                let Some(eth) = self.store.eth_address(hyperion_id, &validator.operator) else {
                    continue;
                };
                if !signed.contains(&eth)
                    && self.slash_logged(
                        hyperion_id,
                        &validator.operator,
                        ctx.height,
                        chain.slash_fraction_valset,
                        SlashReason::MissingValsetConfirm,
                    )
                {
                    slashed += 1;
                }
            }
            self.store
                .set_last_slashed_valset_nonce(hyperion_id, valset.nonce);
        }
        Ok(slashed)
    }

    /// Returns the number of validators slashed.
    pub fn slash_unconfirmed_batches(&self, ctx: BlockContext, hyperion_id: HyperionId) -> BridgeResult<usize> {
        let chain = self.params.chain(hyperion_id)?;
        if ctx.height <= chain.signed_batches_window {
            return Ok(0);
        }
        let max_height = ctx.height - chain.signed_batches_window;
        let last_slashed = self.store.last_slashed_batch_block(hyperion_id);

        let mut due: Vec<_> = self
            .store
            .batches(hyperion_id)
            .into_iter()
            .filter(|b| b.block < max_height && b.block > last_slashed)
            .collect();
        due.sort_by_key(|b| (b.block, b.batch_nonce));

        let mut slashed = 0;
        for batch in due {
            let signed: BTreeSet<ValAddress> = self
                .store
                .batch_confirms(hyperion_id, batch.batch_nonce, &batch.token_contract)
                .into_iter()
                .filter_map(|c| self.store.orchestrator_validator(hyperion_id, &c.orchestrator))
                .collect();

            for validator in self.staking.bonded_validators() {
                if validator.jailed || validator.start_height > batch.block {
                    continue;
                }
                if self
                    .store
                    .orchestrator_by_validator(hyperion_id, &validator.operator)
                    .is_none()
                {
                    continue;
                }
                if !signed.contains(&validator.operator)
                    && self.slash_logged(
                        hyperion_id,
                        &validator.operator,
                        ctx.height,
                        chain.slash_fraction_batch,
                        SlashReason::MissingBatchConfirm,
                    )
                {
                    slashed += 1;
                }
            }
            self.store
                .set_last_slashed_batch_block(hyperion_id, batch.block);
        }
        Ok(slashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBridgeStore, InMemoryStaking, RecordingEventSink};
    use crate::domain::{
        BatchConfirm, BridgeValidator, CounterpartyChainParams, EthAddress, EthSignature,
        OutgoingTxBatch, Valset, ValsetConfirm,
    };
    use crate::service::test_support::*;
    use primitive_types::U256;

    type Slasher = ConfirmSlasher<InMemoryBridgeStore, InMemoryStaking, RecordingEventSink>;

    fn fixture() -> Fixture {
        let mut chain = CounterpartyChainParams::with_hyperion_id(HID);
        chain.signed_valsets_window = 10;
        chain.signed_batches_window = 10;
        let f = Fixture::with_chain(chain);
        f.add_validator(1, 1_000);
        f.add_validator(2, 1_000);
        f
    }

    fn slasher(f: &Fixture) -> Slasher {
        ConfirmSlasher::new(f.params.clone(), f.store.clone(), f.staking.clone(), f.events.clone())
    }

    fn valset(nonce: u64, height: u64) -> Valset {
        Valset::new(
            HID,
            nonce,
            height,
            vec![BridgeValidator {
                eth_address: eth_of(1),
                power: 1,
            }],
            U256::zero(),
            EthAddress::ZERO,
        )
    }

    #[test]
    fn test_missing_valset_confirm_slashed_once() {
        let f = fixture();
        f.store.store_valset(valset(1, 5));
        f.store.set_valset_confirm(ValsetConfirm {
            hyperion_id: HID,
            nonce: 1,
            orchestrator: orch_addr(1),
            eth_address: eth_of(1),
            signature: EthSignature([0; 65]),
        });
        let s = slasher(&f);

        // still inside the window
        assert_eq!(s.slash_unconfirmed_valsets(BlockContext::new(15), HID).unwrap(), 0);

        assert_eq!(s.slash_unconfirmed_valsets(BlockContext::new(16), HID).unwrap(), 1);
        let slashes = f.staking.slashes();
        assert_eq!(slashes[0].operator, val_addr(2));
        assert_eq!(f.store.last_slashed_valset_nonce(HID), 1);

        assert_eq!(s.slash_unconfirmed_valsets(BlockContext::new(17), HID).unwrap(), 0);
    }

    #[test]
    fn test_valset_slashing_skips_jailed_and_late_joiners() {
        let f = fixture();
        f.staking.set_jailed(&val_addr(1), true);
        f.staking.add_validator(val_addr(3), 1_000, 5);
        f.store
            .set_orchestrator_validator(HID, &orch_addr(3), &val_addr(3));
        f.store.set_eth_address(HID, &val_addr(3), eth_of(3));
        f.store.store_valset(valset(1, 5));

        assert_eq!(
            slasher(&f)
                .slash_unconfirmed_valsets(BlockContext::new(100), HID)
                .unwrap(),
            1
        );
        assert_eq!(f.staking.slashes()[0].operator, val_addr(2));
    }

    #[test]
    fn test_missing_batch_confirm() {
        let f = fixture();
        let batch = OutgoingTxBatch {
            hyperion_id: HID,
            batch_nonce: 1,
            batch_timeout: 1_000,
            token_contract: token(0xd0),
            transactions: vec![],
            block: 3,
            executed: false,
        };
        f.store.store_batch(batch);
        f.store.set_batch_confirm(BatchConfirm {
            hyperion_id: HID,
            nonce: 1,
            token_contract: token(0xd0),
            orchestrator: orch_addr(2),
            eth_address: eth_of(2),
            signature: EthSignature([0; 65]),
        });

        let s = slasher(&f);
        assert_eq!(s.slash_unconfirmed_batches(BlockContext::new(20), HID).unwrap(), 1);
        assert_eq!(f.staking.slashes()[0].operator, val_addr(1));
        assert_eq!(f.store.last_slashed_batch_block(HID), 3);
        assert_eq!(s.slash_unconfirmed_batches(BlockContext::new(21), HID).unwrap(), 0);
        assert_eq!(f.events.count("validator_slashed"), 1);
    }
}
