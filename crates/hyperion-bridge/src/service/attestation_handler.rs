//! Side effects of observed claims
//!
//! Runs exactly once per observed attestation. Errors returned here never
//! undo the observation; the tally records them instead.

use super::batch_builder::BatchBuilder;
use crate::domain::{
    voucher_denom, AccAddress, BlockContext, BridgeParams, Claim, ClaimPayload, Coin, DenomMetadata,
    DepositClaim, Erc20DeployedClaim, EthAddress, HyperionId, TokenMetadata, TokenPair, Valset,
    ValsetUpdatedClaim,
};
use crate::error::{BridgeError, BridgeResult};
use crate::events::BridgeEvent;
use crate::ports::{BankKeeper, BridgeStore, DistributionKeeper, EventSink};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct AttestationHandler<S, B, E> {
    store: Arc<S>,
    bank: Arc<B>,
    events: Arc<E>,
    batches: BatchBuilder<S, E>,
}

impl<S, B, E> AttestationHandler<S, B, E>
where
    S: BridgeStore,
    B: BankKeeper + DistributionKeeper,
    E: EventSink,
{
    pub fn new(params: Arc<BridgeParams>, store: Arc<S>, bank: Arc<B>, events: Arc<E>) -> Self {
        let batches = BatchBuilder::new(params, store.clone(), events.clone());
        Self {
            store,
            bank,
            events,
            batches,
        }
    }

    pub fn handle(&self, ctx: BlockContext, claim: &Claim) -> BridgeResult<()> {
        let hyperion_id = claim.hyperion_id;
        match &claim.payload {
            ClaimPayload::Deposit(deposit) => {
                self.handle_deposit(hyperion_id, claim.event_nonce, deposit)
            }
            ClaimPayload::Withdraw(withdraw) => self
                .batches
                .outgoing_tx_batch_executed(
                    ctx,
                    hyperion_id,
                    &withdraw.token_contract,
                    withdraw.batch_nonce,
                )
                .map(|_| ()),
            ClaimPayload::Erc20Deployed(deployed) => self.handle_erc20_deployed(hyperion_id, deployed),
            ClaimPayload::ValsetUpdated(updated) => {
                self.handle_valset_updated(ctx, hyperion_id, updated);
                Ok(())
            }
        }
    }

    /// Validates and mints before touching the store. Registry writes only
    /// happen once the coins reached the receiver or the community pool.
    fn handle_deposit(
        &self,
        hyperion_id: HyperionId,
        event_nonce: u64,
        deposit: &DepositClaim,
    ) -> BridgeResult<()> {
        let sender: EthAddress =
            deposit
                .ethereum_sender
                .parse()
                .map_err(|_| BridgeError::InvalidEthSender {
                    sender: deposit.ethereum_sender.clone(),
                })?;

        let (pair, new_voucher) = match self
            .store
            .token_by_contract(hyperion_id, &deposit.token_contract)
        {
            Some(pair) => (pair, None),
            None => {
                let denom = voucher_denom(hyperion_id, &deposit.token_contract);
                let metadata = deposit
                    .token_metadata
                    .clone()
                    .filter(TokenMetadata::is_valid)
                    .unwrap_or_else(|| TokenMetadata::voucher_default(&denom));
                let pair = TokenPair {
                    hyperion_id,
                    denom,
                    token_contract: deposit.token_contract,
                    cosmos_originated: false,
                    decimals: metadata.decimals,
                };
                (pair, Some(metadata))
            }
        };

        if self
            .bank
            .supply(&pair.denom)
            .checked_add(deposit.amount)
            .is_none()
        {
            return Err(BridgeError::SupplyOverflow {
                denom: pair.denom.clone(),
                reason: "supply would exceed 256 bits".into(),
            });
        }
        let new_contract_balance = if pair.cosmos_originated {
            let current = self
                .store
                .contract_balance(hyperion_id, &pair.token_contract);
            Some(
                current
                    .checked_sub(deposit.amount)
                    .ok_or_else(|| BridgeError::SupplyOverflow {
                        denom: pair.denom.clone(),
                        reason: format!(
                            "counterparty holds {current}, deposit claims {}",
                            deposit.amount
                        ),
                    })?,
            )
        } else {
            None
        };

        let coin = Coin::new(pair.denom.clone(), deposit.amount);
        self.bank.mint(&coin)?;

        let receiver = match AccAddress::parse(&deposit.cosmos_receiver) {
            Ok(_) if self.store.is_blacklisted(&sender) => {
                Err(format!("sender {sender} is blacklisted"))
            }
            Ok(receiver) => Ok(receiver),
            Err(e) => Err(e.to_string()),
        };
        let delivered = receiver.and_then(|receiver| {
            self.bank
                .send_from_module(&receiver, &coin)
                .map(|_| receiver)
                .map_err(|e| e.to_string())
        });
        if delivered.is_err() {
            if let Err(e) = self.bank.fund_community_pool(&coin) {
                self.burn_back(hyperion_id, &coin);
                return Err(e);
            }
        }

        if let Some(metadata) = new_voucher {
            self.store.set_token(pair.clone());
            if self.bank.denom_metadata(&pair.denom).is_none() {
                self.bank
                    .set_denom_metadata(DenomMetadata::voucher(&pair.denom, &metadata));
            }
            info!(
                hyperion_id,
                denom = %pair.denom,
                token_contract = %pair.token_contract,
                symbol = %metadata.symbol,
                decimals = metadata.decimals,
                "[hyperion] voucher denom registered"
            );
            self.events.emit(BridgeEvent::Erc20Registered {
                hyperion_id,
                denom: pair.denom.clone(),
                token_contract: pair.token_contract,
                cosmos_originated: false,
            });
        }
        if let Some(balance) = new_contract_balance {
            self.store
                .set_contract_balance(hyperion_id, &pair.token_contract, balance);
        }

        match delivered {
            Ok(receiver) => {
                debug!(hyperion_id, event_nonce, %receiver, %coin, "[hyperion] deposit credited");
                self.events.emit(BridgeEvent::DepositProcessed {
                    hyperion_id,
                    event_nonce,
                    receiver,
                    coin,
                });
            }
            Err(reason) => {
                warn!(hyperion_id, event_nonce, %coin, %reason, "[hyperion] deposit sent to community pool");
                self.events.emit(BridgeEvent::DepositToCommunityPool {
                    hyperion_id,
                    event_nonce,
                    coin,
                    reason,
                });
            }
        }
        Ok(())
    }

    fn burn_back(&self, hyperion_id: HyperionId, coin: &Coin) {
        if let Err(e) = self.bank.burn(coin) {
            error!(hyperion_id, %coin, error = %e, "[hyperion] failed to burn undelivered deposit");
        }
    }

    fn handle_erc20_deployed(
        &self,
        hyperion_id: HyperionId,
        deployed: &Erc20DeployedClaim,
    ) -> BridgeResult<()> {
        if self
            .store
            .token_by_denom(hyperion_id, &deployed.cosmos_denom)
            .is_some()
        {
            return Err(BridgeError::invalid(format!(
                "denom {} is already mapped",
                deployed.cosmos_denom
            )));
        }
        if self
            .store
            .token_by_contract(hyperion_id, &deployed.token_contract)
            .is_some()
        {
            return Err(BridgeError::invalid(format!(
                "contract {} is already mapped",
                deployed.token_contract
            )));
        }
        let metadata = self
            .bank
            .denom_metadata(&deployed.cosmos_denom)
            .ok_or_else(|| BridgeError::unknown(format!("metadata for {}", deployed.cosmos_denom)))?;

        if deployed.name != metadata.name {
            return Err(BridgeError::invalid(format!(
                "erc20 name {} does not match denom name {}",
                deployed.name, metadata.name
            )));
        }
        if deployed.symbol != metadata.display {
            return Err(BridgeError::invalid(format!(
                "erc20 symbol {} does not match denom display {}",
                deployed.symbol, metadata.display
            )));
        }
        let exponent = metadata.display_exponent().unwrap_or(0);
        if u32::from(deployed.decimals) != exponent {
            return Err(BridgeError::invalid(format!(
                "erc20 decimals {} do not match display exponent {exponent}",
                deployed.decimals
            )));
        }

        self.store.set_token(TokenPair {
            hyperion_id,
            denom: deployed.cosmos_denom.clone(),
            token_contract: deployed.token_contract,
            cosmos_originated: true,
            decimals: deployed.decimals,
        });
        info!(
            hyperion_id,
            denom = %deployed.cosmos_denom,
            token_contract = %deployed.token_contract,
            "[hyperion] erc20 representation registered"
        );
        self.events.emit(BridgeEvent::Erc20Registered {
            hyperion_id,
            denom: deployed.cosmos_denom.clone(),
            token_contract: deployed.token_contract,
            cosmos_originated: true,
        });
        Ok(())
    }

    fn handle_valset_updated(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        updated: &ValsetUpdatedClaim,
    ) {
        let valset = Valset::new(
            hyperion_id,
            updated.valset_nonce,
            ctx.height,
            updated.members.clone(),
            updated.reward_amount,
            updated.reward_token,
        );
        self.store.set_last_observed_valset(valset);
        info!(hyperion_id, valset_nonce = updated.valset_nonce, "[hyperion] valset observed");
        self.events.emit(BridgeEvent::ValsetObserved {
            hyperion_id,
            valset_nonce: updated.valset_nonce,
        });
    }
}
