//! Outgoing transaction pool
//!
//! Withdrawals wait here until a batch picks them up. Amounts are burned on
//! entry and re-minted on refund; fees stay escrowed in the module account.

use crate::algorithms::projected_counterparty_height;
use crate::domain::{
    AccAddress, BlockContext, BridgeParams, Coin, EthAddress, HyperionId, OutgoingTx, TokenPair,
    TransferRecord, TransferStatus,
};
use crate::error::{BridgeError, BridgeResult};
use crate::events::BridgeEvent;
use crate::ports::{AttestationStore, BankKeeper, BatchStore, EventSink, PoolStore, TokenStore};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct OutgoingTxPool<S, B, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    bank: Arc<B>,
    events: Arc<E>,
}

impl<S, B, E> OutgoingTxPool<S, B, E>
where
    S: PoolStore + BatchStore + TokenStore + AttestationStore,
    B: BankKeeper,
    E: EventSink,
{
    pub fn new(params: Arc<BridgeParams>, store: Arc<S>, bank: Arc<B>, events: Arc<E>) -> Self {
        Self {
            params,
            store,
            bank,
            events,
        }
    }

    fn has_pending_tx(&self, hyperion_id: HyperionId, sender: &AccAddress) -> bool {
        if self
            .store
            .pool_txs(hyperion_id)
            .iter()
            .any(|tx| &tx.sender == sender)
        {
            return true;
        }
        self.store
            .batches(hyperion_id)
            .iter()
            .any(|batch| batch.transactions.iter().any(|tx| &tx.sender == sender))
    }

    /// Queues a withdrawal of `amount` to `dest`, paying `fee` to the relayer.
    pub fn add_to_outgoing_pool(
        &self,
        ctx: BlockContext,
        sender: &AccAddress,
        dest: EthAddress,
        amount: Coin,
        fee: Coin,
        hyperion_id: HyperionId,
    ) -> BridgeResult<u64> {
        let chain = self.params.chain(hyperion_id)?;
        if dest.is_zero() || self.store.is_blacklisted(&dest) {
            return Err(BridgeError::InvalidEthDestination {
                destination: dest.to_string(),
            });
        }
        if fee.denom != self.params.fee_denom {
            return Err(BridgeError::invalid(format!(
                "fee must be paid in {}, got {}",
                self.params.fee_denom, fee.denom
            )));
        }
        if amount.is_zero() {
            return Err(BridgeError::invalid("amount is zero"));
        }
        let pair = self
            .store
            .token_by_denom(hyperion_id, &amount.denom)
            .ok_or_else(|| BridgeError::invalid(format!("token not found for {}", amount.denom)))?;
        if self.has_pending_tx(hyperion_id, sender) {
            return Err(BridgeError::invalid(format!(
                "sender {sender} already has a pending tx"
            )));
        }

        let needed = if amount.denom == fee.denom {
            amount.amount.checked_add(fee.amount)
        } else {
            Some(amount.amount)
        };
        let available = self.bank.balance(sender, &amount.denom);
        if needed.map_or(true, |n| available < n)
            || (amount.denom != fee.denom && self.bank.balance(sender, &fee.denom) < fee.amount)
        {
            return Err(BridgeError::Bank(format!(
                "insufficient funds: {sender} cannot cover {amount} plus fee {fee}"
            )));
        }
        let new_contract_balance = if pair.cosmos_originated {
            let current = self.store.contract_balance(hyperion_id, &pair.token_contract);
            Some(current.checked_add(amount.amount).ok_or_else(|| BridgeError::SupplyOverflow {
                denom: pair.denom.clone(),
                reason: "counterparty balance overflow".into(),
            })?)
        } else {
            None
        };

        self.bank.send_to_module(sender, &amount)?;
        self.bank.burn(&amount)?;
        if !fee.is_zero() {
            self.bank.send_to_module(sender, &fee)?;
        }
        if let Some(balance) = new_contract_balance {
            self.store
                .set_contract_balance(hyperion_id, &pair.token_contract, balance);
        }

        let projected = projected_counterparty_height(
            &self.store.last_observed_eth_height(hyperion_id),
            ctx.height,
            chain,
        );
        let tx = OutgoingTx {
            id: self.store.next_tx_id(),
            hyperion_id,
            sender: sender.clone(),
            dest_address: dest,
            token_contract: pair.token_contract,
            amount: amount.amount,
            fee: fee.amount,
            tx_timeout: projected + chain.outgoing_tx_timeout_blocks(),
        };
        let id = tx.id;
        self.store.insert_pool_tx(tx.clone());

        debug!(hyperion_id, tx_id = id, %sender, %dest, "[hyperion] tx added to pool");
        self.events.emit(BridgeEvent::SendToChain {
            hyperion_id,
            tx_id: id,
            sender: tx.sender,
            dest_address: dest,
            token_contract: tx.token_contract,
            amount: tx.amount,
            fee: tx.fee,
        });
        Ok(id)
    }

    /// Cancels an unbatched withdrawal on behalf of its sender.
    pub fn remove_from_outgoing_pool_and_refund(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        tx_id: u64,
        sender: &AccAddress,
    ) -> BridgeResult<()> {
        self.params.chain(hyperion_id)?;
        let tx = self
            .store
            .pool_tx(hyperion_id, tx_id)
            .ok_or_else(|| BridgeError::invalid(format!("tx {tx_id} is not in the pool")))?;
        if &tx.sender != sender {
            return Err(BridgeError::invalid(format!(
                "tx {tx_id} was not sent by {sender}"
            )));
        }
        self.refund(ctx, &tx)
    }

    fn token_pair(&self, tx: &OutgoingTx) -> BridgeResult<TokenPair> {
        self.store
            .token_by_contract(tx.hyperion_id, &tx.token_contract)
            .ok_or_else(|| BridgeError::Internal {
                reason: format!("pool tx {} references unregistered token {}", tx.id, tx.token_contract),
            })
    }

    fn refund(&self, ctx: BlockContext, tx: &OutgoingTx) -> BridgeResult<()> {
        let pair = self.token_pair(tx)?;
        let new_contract_balance = if pair.cosmos_originated {
            let current = self.store.contract_balance(tx.hyperion_id, &pair.token_contract);
            Some(current.checked_sub(tx.amount).ok_or_else(|| BridgeError::SupplyOverflow {
                denom: pair.denom.clone(),
                reason: format!("counterparty balance {current} below refund {}", tx.amount),
            })?)
        } else {
            None
        };

        let amount = Coin::new(pair.denom.clone(), tx.amount);
        self.bank.mint(&amount)?;
        if let Err(e) = self.bank.send_from_module(&tx.sender, &amount) {
            self.unmint(tx, &amount);
            return Err(e);
        }
        if !tx.fee.is_zero() {
            let fee = Coin::new(self.params.fee_denom.clone(), tx.fee);
            if let Err(e) = self.bank.send_from_module(&tx.sender, &fee) {
                match self.bank.send_to_module(&tx.sender, &amount) {
                    Ok(()) => self.unmint(tx, &amount),
                    Err(take_back) => {
                        error!(tx_id = tx.id, %amount, error = %take_back, "[hyperion] failed to reclaim refunded amount");
                    }
                }
                return Err(e);
            }
        }

        self.store.remove_pool_tx(tx.hyperion_id, tx.id);
        if let Some(balance) = new_contract_balance {
            self.store
                .set_contract_balance(tx.hyperion_id, &pair.token_contract, balance);
        }
        self.store
            .record_transfer(TransferRecord::from_tx(tx, TransferStatus::Refunded, ctx.height));

        debug!(hyperion_id = tx.hyperion_id, tx_id = tx.id, "[hyperion] tx refunded");
        self.events.emit(BridgeEvent::SendToChainCanceled {
            hyperion_id: tx.hyperion_id,
            tx_id: tx.id,
            sender: tx.sender.clone(),
        });
        Ok(())
    }

    fn unmint(&self, tx: &OutgoingTx, amount: &Coin) {
        if let Err(e) = self.bank.burn(amount) {
            error!(tx_id = tx.id, %amount, error = %e, "[hyperion] failed to burn undelivered refund");
        }
    }

    /// Refunds every pool tx whose timeout lies behind the projected
    /// counterparty height. Failures are logged and skipped.
    pub fn refund_timed_out(&self, ctx: BlockContext, hyperion_id: HyperionId) -> BridgeResult<usize> {
        let chain = self.params.chain(hyperion_id)?;
        let projected = projected_counterparty_height(
            &self.store.last_observed_eth_height(hyperion_id),
            ctx.height,
            chain,
        );
        let mut refunded = 0;
        for tx in self.store.pool_txs(hyperion_id) {
            if tx.tx_timeout >= projected {
                continue;
            }
            match self.refund(ctx, &tx) {
                Ok(()) => refunded += 1,
                Err(e) => error!(hyperion_id, tx_id = tx.id, error = %e, "[hyperion] timed out tx refund failed"),
            }
        }
        if refunded > 0 {
            info!(hyperion_id, refunded, projected, "[hyperion] refunded timed out txs");
        }
        Ok(refunded)
    }

    pub fn pool_txs(&self, hyperion_id: HyperionId) -> Vec<OutgoingTx> {
        self.store.pool_txs(hyperion_id)
    }
}
