//! Outgoing batch lifecycle: build, cancel, execute, time out

use crate::algorithms::{
    batch_checkpoint, projected_counterparty_height, select_by_fee, total_fees,
};
use crate::domain::{
    BlockContext, BridgeParams, EthAddress, HyperionId, OutgoingTxBatch, TransferRecord,
    TransferStatus, OUTGOING_TX_BATCH_SIZE,
};
use crate::error::{BridgeError, BridgeResult};
use crate::events::BridgeEvent;
use crate::metrics;
use crate::ports::{
    AttestationStore, BatchStore, CheckpointStore, ConfirmStore, EventSink, PoolStore, TokenStore,
};
use primitive_types::U256;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct BatchBuilder<S, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    events: Arc<E>,
}

impl<S, E> BatchBuilder<S, E>
where
    S: PoolStore + BatchStore + ConfirmStore + CheckpointStore + TokenStore + AttestationStore,
    E: EventSink,
{
    pub fn new(params: Arc<BridgeParams>, store: Arc<S>, events: Arc<E>) -> Self {
        Self {
            params,
            store,
            events,
        }
    }

    /// Moves up to `max_size` of the best paying txs of one token into a new batch.
    pub fn build_outgoing_tx_batch(
        &self,
        ctx: BlockContext,
        token_contract: &EthAddress,
        hyperion_id: HyperionId,
        max_size: usize,
    ) -> BridgeResult<OutgoingTxBatch> {
        let chain = self.params.chain(hyperion_id)?;
        if max_size == 0 {
            return Err(BridgeError::invalid("max elements value must be positive"));
        }

        let keys = self.store.unbatched_fee_keys(hyperion_id, token_contract);
        let selected = select_by_fee(&keys, max_size);
        if let Some(last) = self.store.last_batch_by_token(hyperion_id, token_contract) {
            if last.total_fees() > total_fees(&selected) {
                return Err(BridgeError::invalid(format!(
                    "new batch would not be more profitable than batch {}",
                    last.batch_nonce
                )));
            }
        }
        if selected.is_empty() {
            return Err(BridgeError::NoUnbatchedTxsFound {
                token_contract: token_contract.to_string(),
            });
        }

        let mut transactions = Vec::with_capacity(selected.len());
        for key in &selected {
            let tx = self
                .store
                .pool_tx(hyperion_id, key.id)
                .ok_or_else(|| BridgeError::Internal {
                    reason: format!("fee index points at missing tx {}", key.id),
                })?;
            transactions.push(tx);
        }
        for tx in &transactions {
            self.store.remove_pool_tx(hyperion_id, tx.id);
        }

        let projected = projected_counterparty_height(
            &self.store.last_observed_eth_height(hyperion_id),
            ctx.height,
            chain,
        );
        let batch = OutgoingTxBatch {
            hyperion_id,
            batch_nonce: self.store.next_batch_nonce(hyperion_id),
            batch_timeout: projected + chain.batch_timeout_blocks(),
            token_contract: *token_contract,
            transactions,
            block: ctx.height,
            executed: false,
        };
        let checkpoint = batch_checkpoint(&batch, hyperion_id);
        self.store.store_batch(batch.clone());
        self.store.set_past_checkpoint(hyperion_id, checkpoint);

        debug!(
            hyperion_id,
            batch_nonce = batch.batch_nonce,
            %token_contract,
            txs = batch.transactions.len(),
            fees = %batch.total_fees(),
            "[hyperion] batch created"
        );
        metrics::record_batch_built();
        self.events.emit(BridgeEvent::BatchCreated {
            hyperion_id,
            batch_nonce: batch.batch_nonce,
            token_contract: *token_contract,
            tx_ids: batch.tx_ids(),
            batch_timeout: batch.batch_timeout,
            checkpoint,
        });
        Ok(batch)
    }

    /// Builds a full-size batch for the token registered under `denom`.
    pub fn request_batch(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        denom: &str,
    ) -> BridgeResult<OutgoingTxBatch> {
        let pair = self
            .store
            .token_by_denom(hyperion_id, denom)
            .ok_or_else(|| BridgeError::invalid(format!("token not found for {denom}")))?;
        self.build_outgoing_tx_batch(ctx, &pair.token_contract, hyperion_id, OUTGOING_TX_BATCH_SIZE)
    }

    /// Returns the txs of a pending batch to the pool and drops the batch.
    pub fn cancel_outgoing_tx_batch(
        &self,
        hyperion_id: HyperionId,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> BridgeResult<()> {
        let batch = self
            .store
            .batch(hyperion_id, token_contract, nonce)
            .ok_or_else(|| BridgeError::unknown(format!("batch {nonce} for {token_contract}")))?;

        for tx in batch.transactions {
            self.store.insert_pool_tx(tx);
        }
        self.store.delete_batch(hyperion_id, token_contract, nonce);
        self.store
            .delete_batch_confirms(hyperion_id, nonce, token_contract);

        info!(hyperion_id, batch_nonce = nonce, %token_contract, "[hyperion] batch canceled");
        metrics::record_batch_canceled();
        self.events.emit(BridgeEvent::BatchCanceled {
            hyperion_id,
            batch_nonce: nonce,
            token_contract: *token_contract,
        });
        Ok(())
    }

    /// Finalizes a batch the counterparty executed.
    ///
    /// Earlier batches of the same token can never execute any more, so their
    /// txs go back to the pool. Returns false for an unknown batch.
    pub fn outgoing_tx_batch_executed(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> BridgeResult<bool> {
        let Some(mut batch) = self.store.batch(hyperion_id, token_contract, nonce) else {
            warn!(hyperion_id, batch_nonce = nonce, %token_contract, "[hyperion] executed batch not found");
            return Ok(false);
        };

        let stale: Vec<u64> = self
            .store
            .batches(hyperion_id)
            .into_iter()
            .filter(|b| &b.token_contract == token_contract && b.batch_nonce < nonce)
            .map(|b| b.batch_nonce)
            .collect();
        for stale_nonce in stale {
            self.cancel_outgoing_tx_batch(hyperion_id, token_contract, stale_nonce)?;
        }

        for tx in &batch.transactions {
            self.store
                .record_transfer(TransferRecord::from_tx(tx, TransferStatus::Bridged, ctx.height));
        }
        self.store.delete_batch(hyperion_id, token_contract, nonce);
        self.store
            .delete_batch_confirms(hyperion_id, nonce, token_contract);
        batch.executed = true;
        self.store.archive_executed_batch(batch);

        info!(hyperion_id, batch_nonce = nonce, %token_contract, "[hyperion] batch executed");
        self.events.emit(BridgeEvent::BatchExecuted {
            hyperion_id,
            batch_nonce: nonce,
            token_contract: *token_contract,
        });
        Ok(true)
    }

    /// Cancels batches whose timeout the counterparty chain has passed.
    pub fn cancel_timed_out(&self, hyperion_id: HyperionId) -> usize {
        let eth_height = self.store.last_observed_eth_height(hyperion_id).eth_height;
        let mut canceled = 0;
        for batch in self.store.batches(hyperion_id) {
            if batch.batch_timeout >= eth_height {
                continue;
            }
            match self.cancel_outgoing_tx_batch(hyperion_id, &batch.token_contract, batch.batch_nonce) {
                Ok(()) => canceled += 1,
                Err(e) => error!(
                    hyperion_id,
                    batch_nonce = batch.batch_nonce,
                    error = %e,
                    "[hyperion] timed out batch cancel failed"
                ),
            }
        }
        canceled
    }

    /// Fees a full-size batch would collect right now, per token with pending txs.
    pub fn batch_fees(&self, hyperion_id: HyperionId) -> BTreeMap<EthAddress, U256> {
        let mut tokens: Vec<EthAddress> = self
            .store
            .pool_txs(hyperion_id)
            .into_iter()
            .map(|tx| tx.token_contract)
            .collect();
        tokens.sort();
        tokens.dedup();
        tokens
            .into_iter()
            .map(|token| {
                let keys = self.store.unbatched_fee_keys(hyperion_id, &token);
                (token, total_fees(keys.iter().take(OUTGOING_TX_BATCH_SIZE)))
            })
            .collect()
    }

    pub fn batch(
        &self,
        hyperion_id: HyperionId,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Option<OutgoingTxBatch> {
        self.store.batch(hyperion_id, token_contract, nonce)
    }

    pub fn batches(&self, hyperion_id: HyperionId) -> Vec<OutgoingTxBatch> {
        self.store.batches(hyperion_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBridgeStore, RecordingEventSink};
    use crate::domain::{LastObservedEthHeight, OutgoingTx};
    use crate::service::test_support::*;
    use proptest::prelude::*;

    fn builder(f: &Fixture) -> BatchBuilder<InMemoryBridgeStore, RecordingEventSink> {
        BatchBuilder::new(f.params.clone(), f.store.clone(), f.events.clone())
    }

    fn seed(f: &Fixture, id: u64, fee: u64, token_byte: u8) {
        f.store.insert_pool_tx(OutgoingTx {
            id,
            hyperion_id: HID,
            sender: user(id as u8),
            dest_address: token(0xde),
            token_contract: token(token_byte),
            amount: U256::from(100),
            fee: U256::from(fee),
            tx_timeout: 1_000_000,
        });
    }

    #[test]
    fn test_build_picks_highest_fees() {
        let f = Fixture::new();
        seed(&f, 1, 5, 0xd0);
        seed(&f, 2, 9, 0xd0);
        seed(&f, 3, 9, 0xd0);
        seed(&f, 4, 1, 0xd0);
        seed(&f, 5, 50, 0xd1);

        let batch = builder(&f)
            .build_outgoing_tx_batch(BlockContext::new(8), &token(0xd0), HID, 3)
            .unwrap();
        assert_eq!(batch.batch_nonce, 1);
        assert_eq!(batch.block, 8);
        assert_eq!(batch.tx_ids(), vec![2, 3, 1]);
        assert_eq!(batch.total_fees(), U256::from(23));

        let left: Vec<u64> = f.store.pool_txs(HID).iter().map(|t| t.id).collect();
        assert_eq!(left, vec![4, 5]);
        assert!(f.store.has_past_checkpoint(HID, &batch_checkpoint(&batch, HID)));
        assert_eq!(f.events.count("batch_created"), 1);
    }

    #[test]
    fn test_build_rejects_zero_and_empty() {
        let f = Fixture::new();
        let b = builder(&f);
        let zero = b
            .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 0)
            .unwrap_err();
        assert!(matches!(zero, BridgeError::Invalid { .. }));

        let empty = b
            .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 10)
            .unwrap_err();
        assert_eq!(empty.code(), 10);
    }

    #[test]
    fn test_build_must_beat_last_batch() {
        let f = Fixture::new();
        seed(&f, 1, 10, 0xd0);
        let b = builder(&f);
        b.build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 10)
            .unwrap();

        seed(&f, 2, 4, 0xd0);
        let err = b
            .build_outgoing_tx_batch(BlockContext::new(2), &token(0xd0), HID, 10)
            .unwrap_err();
        assert!(err.to_string().contains("not be more profitable"));
        assert_eq!(f.store.pool_txs(HID).len(), 1);

        seed(&f, 3, 6, 0xd0);
        let second = b
            .build_outgoing_tx_batch(BlockContext::new(3), &token(0xd0), HID, 10)
            .unwrap();
        assert_eq!(second.batch_nonce, 2);
    }

    #[test]
    fn test_cancel_returns_txs() {
        let f = Fixture::new();
        seed(&f, 1, 10, 0xd0);
        seed(&f, 2, 20, 0xd0);
        let b = builder(&f);
        let batch = b
            .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 10)
            .unwrap();
        assert!(f.store.pool_txs(HID).is_empty());

        b.cancel_outgoing_tx_batch(HID, &token(0xd0), batch.batch_nonce)
            .unwrap();
        assert_eq!(f.store.pool_txs(HID).len(), 2);
        assert_eq!(f.store.unbatched_fee_keys(HID, &token(0xd0))[0].id, 2);
        assert!(b.batches(HID).is_empty());

        let again = b
            .cancel_outgoing_tx_batch(HID, &token(0xd0), batch.batch_nonce)
            .unwrap_err();
        assert!(matches!(again, BridgeError::Unknown { .. }));
    }

    #[test]
    fn test_execute_cancels_earlier_batches() {
        let f = Fixture::new();
        let b = builder(&f);
        seed(&f, 1, 10, 0xd0);
        let first = b
            .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 10)
            .unwrap();
        seed(&f, 2, 20, 0xd0);
        let second = b
            .build_outgoing_tx_batch(BlockContext::new(2), &token(0xd0), HID, 10)
            .unwrap();
        seed(&f, 3, 30, 0xd1);
        let other = b
            .build_outgoing_tx_batch(BlockContext::new(3), &token(0xd1), HID, 10)
            .unwrap();

        assert!(b
            .outgoing_tx_batch_executed(BlockContext::new(9), HID, &token(0xd0), second.batch_nonce)
            .unwrap());
        assert!(b.batch(HID, &token(0xd0), first.batch_nonce).is_none());
        assert!(b.batch(HID, &token(0xd1), other.batch_nonce).is_some());
        assert_eq!(f.store.pool_txs(HID).iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);

        let executed = f.store.executed_batches(HID);
        assert_eq!(executed.len(), 1);
        assert!(executed[0].executed);
        let transfers = f.store.transfers(HID);
        assert_eq!(transfers.len(), 1);
        assert_eq!((transfers[0].tx_id, transfers[0].status), (2, TransferStatus::Bridged));
    }

    #[test]
    fn test_execute_unknown_batch_is_noop() {
        let f = Fixture::new();
        assert!(!builder(&f)
            .outgoing_tx_batch_executed(BlockContext::new(1), HID, &token(0xd0), 7)
            .unwrap());
        assert_eq!(f.events.count("batch_executed"), 0);
    }

    #[test]
    fn test_cancel_timed_out() {
        let f = Fixture::new();
        seed(&f, 1, 10, 0xd0);
        let b = builder(&f);
        let batch = b
            .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, 10)
            .unwrap();

        let observe = |eth_height| {
            f.store.set_last_observed_eth_height(
                HID,
                LastObservedEthHeight {
                    cosmos_height: 1,
                    eth_height,
                },
            )
        };
        observe(batch.batch_timeout);
        assert_eq!(b.cancel_timed_out(HID), 0);
        observe(batch.batch_timeout + 1);
        assert_eq!(b.cancel_timed_out(HID), 1);
        assert_eq!(f.store.pool_txs(HID).len(), 1);
    }

    #[test]
    fn test_batch_fees_per_token() {
        let f = Fixture::new();
        seed(&f, 1, 10, 0xd0);
        seed(&f, 2, 5, 0xd0);
        seed(&f, 3, 7, 0xd1);
        let fees = builder(&f).batch_fees(HID);
        assert_eq!(fees.get(&token(0xd0)), Some(&U256::from(15)));
        assert_eq!(fees.get(&token(0xd1)), Some(&U256::from(7)));
    }

    proptest! {
        #[test]
        fn prop_batch_is_bounded_ordered_and_partitions_pool(
            fees in proptest::collection::vec(0u64..50, 1..40),
            max in 1usize..20,
        ) {
            let f = Fixture::new();
            for (i, fee) in fees.iter().enumerate() {
                seed(&f, i as u64 + 1, *fee, 0xd0);
            }
            let batch = builder(&f)
                .build_outgoing_tx_batch(BlockContext::new(1), &token(0xd0), HID, max)
                .unwrap();

            prop_assert_eq!(batch.transactions.len(), max.min(fees.len()));
            for pair in batch.transactions.windows(2) {
                prop_assert!(
                    pair[0].fee > pair[1].fee
                        || (pair[0].fee == pair[1].fee && pair[0].id < pair[1].id)
                );
            }
            let left = f.store.pool_txs(HID);
            prop_assert_eq!(left.len() + batch.transactions.len(), fees.len());
            let lowest_batched = batch.transactions.last().map(|t| t.fee).unwrap_or_default();
            prop_assert!(left.iter().all(|t| t.fee <= lowest_batched));
        }
    }
}
