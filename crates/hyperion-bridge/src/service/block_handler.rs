//! End-of-block processing
//!
//! Runs once per host block for every configured chain that is not paused.
//! A failing chain is logged and does not hold back the others:
//!
//! ```text
//! slash unconfirmed valsets/batches
//!   -> tally pending attestations
//!   -> cancel timed out batches
//!   -> refund timed out pool txs
//!   -> request a new valset if needed
//!   -> prune valsets, then attestations
//! ```

use super::attestation_tally::AttestationTally;
use super::batch_builder::BatchBuilder;
use super::pool::OutgoingTxPool;
use super::slashing::ConfirmSlasher;
use super::valset_registry::ValsetRegistry;
use crate::domain::{BlockContext, BridgeParams, CounterpartyChainParams, HyperionId};
use crate::error::{BridgeError, BridgeResult};
use crate::ports::{BankKeeper, BridgeStore, DistributionKeeper, EventSink, StakingKeeper};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct BlockHandler<S, K, B, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    slasher: ConfirmSlasher<S, K, E>,
    tally: AttestationTally<S, K, B, E>,
    batches: BatchBuilder<S, E>,
    pool: OutgoingTxPool<S, B, E>,
    registry: ValsetRegistry<S, K, E>,
}

impl<S, K, B, E> BlockHandler<S, K, B, E>
where
    S: BridgeStore,
    K: StakingKeeper,
    B: BankKeeper + DistributionKeeper,
    E: EventSink,
{
    pub fn new(
        params: Arc<BridgeParams>,
        store: Arc<S>,
        staking: Arc<K>,
        bank: Arc<B>,
        events: Arc<E>,
    ) -> Self {
        Self {
            slasher: ConfirmSlasher::new(params.clone(), store.clone(), staking.clone(), events.clone()),
            tally: AttestationTally::new(
                params.clone(),
                store.clone(),
                staking.clone(),
                bank.clone(),
                events.clone(),
            ),
            batches: BatchBuilder::new(params.clone(), store.clone(), events.clone()),
            pool: OutgoingTxPool::new(params.clone(), store.clone(), bank, events.clone()),
            registry: ValsetRegistry::new(params.clone(), store.clone(), staking, events),
            params,
            store,
        }
    }

    pub fn end_block(&self, ctx: BlockContext) -> BridgeResult<()> {
        for (hyperion_id, chain) in &self.params.counterparty_chains {
            if chain.paused {
                debug!(hyperion_id, "[hyperion] chain paused, skipping end block");
                continue;
            }
            if let Err(e) = self.end_block_for_chain(ctx, *hyperion_id, chain) {
                error!(hyperion_id, height = ctx.height, error = %e, "[hyperion] end block failed for chain");
            }
        }
        Ok(())
    }

    fn end_block_for_chain(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        chain: &CounterpartyChainParams,
    ) -> BridgeResult<()> {
        self.slasher.slash_unconfirmed_valsets(ctx, hyperion_id)?;
        self.slasher.slash_unconfirmed_batches(ctx, hyperion_id)?;
        self.tally.tally_pending(ctx, hyperion_id)?;
        self.batches.cancel_timed_out(hyperion_id);
        self.pool.refund_timed_out(ctx, hyperion_id)?;
        self.create_valset_if_needed(ctx, hyperion_id, chain)?;
        self.prune_valsets(ctx, hyperion_id, chain);
        self.prune_attestations(hyperion_id);
        Ok(())
    }

    /// A new valset is requested when there is none yet, a validator began
    /// unbonding this block, or power moved beyond the configured threshold.
    fn create_valset_if_needed(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        chain: &CounterpartyChainParams,
    ) -> BridgeResult<()> {
        let needed = match self.registry.latest_valset(hyperion_id) {
            None => true,
            Some(latest) => {
                self.store.last_unbonding_height() == ctx.height || {
                    let current = self.registry.current_valset(ctx, hyperion_id)?;
                    latest.power_diff_bps(&current) > chain.valset_power_change_bps
                }
            }
        };
        if !needed {
            return Ok(());
        }
        match self.registry.set_valset_request(ctx, hyperion_id) {
            Ok(_) => Ok(()),
            Err(BridgeError::Empty { reason }) => {
                debug!(hyperion_id, %reason, "[hyperion] no valset to request");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn prune_valsets(&self, ctx: BlockContext, hyperion_id: HyperionId, chain: &CounterpartyChainParams) {
        if ctx.height < chain.signed_valsets_window {
            return;
        }
        let Some(observed) = self.store.last_observed_valset(hyperion_id) else {
            return;
        };
        let cutoff = ctx.height - chain.signed_valsets_window;
        let mut pruned = 0;
        for valset in self.store.valsets(hyperion_id) {
            if valset.nonce < observed.nonce && valset.height < cutoff {
                self.store.delete_valset(hyperion_id, valset.nonce);
                self.store.delete_valset_confirms(hyperion_id, valset.nonce);
                pruned += 1;
            }
        }
        if pruned > 0 {
            info!(hyperion_id, pruned, "[hyperion] pruned valsets");
        }
    }

    fn prune_attestations(&self, hyperion_id: HyperionId) {
        let last = self.store.last_observed_event_nonce(hyperion_id);
        for (nonce, attestations) in self.store.attestations(hyperion_id).range(..last) {
            for attestation in attestations {
                self.store
                    .delete_attestation(hyperion_id, *nonce, &attestation.claim_hash);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBank, InMemoryBridgeStore, InMemoryStaking, RecordingEventSink};
    use crate::domain::{BridgeValidator, EthAddress, OutgoingTx, Valset};
    use crate::ports::{AttestationStore, BatchStore, PoolStore, ValsetStore};
    use crate::service::test_support::*;
    use primitive_types::U256;

    type Handler = BlockHandler<InMemoryBridgeStore, InMemoryStaking, InMemoryBank, RecordingEventSink>;

    fn handler(f: &Fixture) -> Handler {
        BlockHandler::new(
            f.params.clone(),
            f.store.clone(),
            f.staking.clone(),
            f.bank.clone(),
            f.events.clone(),
        )
    }

    #[test]
    fn test_first_block_requests_valset() {
        let f = Fixture::new();
        f.add_validator(1, 60);
        f.add_validator(2, 40);
        let h = handler(&f);

        h.end_block(BlockContext::new(1)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 1);

        // unchanged power, no new request
        h.end_block(BlockContext::new(2)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 1);
    }

    #[test]
    fn test_power_change_requests_valset() {
        let f = Fixture::new();
        f.add_validator(1, 50);
        f.add_validator(2, 50);
        let h = handler(&f);
        h.end_block(BlockContext::new(1)).unwrap();

        // 50/50 -> 52/48 moves 2%
        f.staking.set_power(&val_addr(1), 52);
        f.staking.set_power(&val_addr(2), 48);
        h.end_block(BlockContext::new(2)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 1);

        // 50/50 -> 60/40 moves 10%
        f.staking.set_power(&val_addr(1), 60);
        f.staking.set_power(&val_addr(2), 40);
        h.end_block(BlockContext::new(3)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 2);
    }

    #[test]
    fn test_unbonding_requests_valset() {
        let f = Fixture::new();
        f.add_validator(1, 50);
        let h = handler(&f);
        h.end_block(BlockContext::new(1)).unwrap();

        f.store.set_last_unbonding_height(5);
        h.end_block(BlockContext::new(5)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 2);
    }

    #[test]
    fn test_empty_bridge_set_is_not_an_error() {
        let f = Fixture::new();
        handler(&f).end_block(BlockContext::new(1)).unwrap();
        assert!(f.store.valsets(HID).is_empty());
    }

    #[test]
    fn test_every_chain_processed() {
        let f = Fixture::new();
        let params = (*f.params)
            .clone()
            .with_chain(CounterpartyChainParams::with_hyperion_id(HID + 1));
        f.add_validator(1, 50);
        f.store.set_eth_address(HID + 1, &val_addr(1), eth_of(1));
        let h = BlockHandler::new(
            Arc::new(params),
            f.store.clone(),
            f.staking.clone(),
            f.bank.clone(),
            f.events.clone(),
        );

        h.end_block(BlockContext::new(1)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 1);
        assert_eq!(f.store.latest_valset_nonce(HID + 1), 1);
    }

    #[test]
    fn test_paused_chain_skipped() {
        let mut chain = crate::domain::CounterpartyChainParams::with_hyperion_id(HID);
        chain.paused = true;
        let f = Fixture::with_chain(chain);
        f.add_validator(1, 50);
        handler(&f).end_block(BlockContext::new(1)).unwrap();
        assert_eq!(f.store.latest_valset_nonce(HID), 0);
    }

    #[test]
    fn test_prunes_old_valsets_and_attestations() {
        let mut chain = crate::domain::CounterpartyChainParams::with_hyperion_id(HID);
        chain.signed_valsets_window = 10;
        let f = Fixture::with_chain(chain);
        f.add_validator(1, 100);
        let member = vec![BridgeValidator {
            eth_address: eth_of(1),
            power: u32::MAX as u64,
        }];
        for nonce in 1..=3 {
            f.store.store_valset(Valset::new(
                HID,
                nonce,
                nonce,
                member.clone(),
                U256::zero(),
                EthAddress::ZERO,
            ));
        }
        f.store.set_last_observed_valset(f.store.valset(HID, 3).unwrap());

        let tally = AttestationTally::new(
            f.params.clone(),
            f.store.clone(),
            f.staking.clone(),
            f.bank.clone(),
            f.events.clone(),
        );
        for nonce in 1..=3 {
            tally
                .submit(BlockContext::new(1), deposit_claim(1, nonce, 1, &user(9)))
                .unwrap();
        }
        assert_eq!(f.store.last_observed_event_nonce(HID), 3);

        handler(&f).end_block(BlockContext::new(30)).unwrap();
        let nonces: Vec<u64> = f.store.valsets(HID).iter().map(|v| v.nonce).collect();
        assert_eq!(nonces, vec![3]);
        let left: Vec<u64> = f.store.attestations(HID).keys().copied().collect();
        assert_eq!(left, vec![3]);
    }

    #[test]
    fn test_timeouts_cancel_and_refund() {
        let f = Fixture::new();
        f.add_validator(1, 100);
        f.register_token("voucher", token(0xd0), false);
        for (id, timeout) in [(1u64, 5u64), (2, 50_000)] {
            f.store.insert_pool_tx(OutgoingTx {
                id,
                hyperion_id: HID,
                sender: user(id as u8),
                dest_address: token(0xde),
                token_contract: token(0xd0),
                amount: U256::from(10),
                fee: U256::zero(),
                tx_timeout: timeout,
            });
        }
        let batch = BatchBuilder::new(f.params.clone(), f.store.clone(), f.events.clone())
            .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 1)
            .unwrap();
        assert_eq!(batch.tx_ids(), vec![1]);

        f.store.set_last_observed_eth_height(
            HID,
            crate::domain::LastObservedEthHeight {
                cosmos_height: 2,
                eth_height: batch.batch_timeout + 1,
            },
        );
        handler(&f).end_block(BlockContext::new(2)).unwrap();

        // the batch timed out, and its tx was past its own timeout once back in the pool
        assert!(f.store.batches(HID).is_empty());
        let left: Vec<u64> = f.store.pool_txs(HID).iter().map(|t| t.id).collect();
        assert_eq!(left, vec![2]);
        assert_eq!(f.bank.balance(&user(1), "voucher"), U256::from(10));
    }
}
