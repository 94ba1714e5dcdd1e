//! Hyperion Service - message facade
//!
//! Routes every bridge message to the component that owns it. All
//! components share one store handle and hold no state of their own.

use super::attestation_tally::AttestationTally;
use super::batch_builder::BatchBuilder;
use super::block_handler::BlockHandler;
use super::confirmations::ConfirmationStore;
use super::evidence::SlashingEvidenceChecker;
use super::pool::OutgoingTxPool;
use super::valset_registry::ValsetRegistry;
use crate::domain::{
    AccAddress, BlockContext, BridgeParams, Claim, ClaimPayload, Coin, DepositClaim,
    Erc20DeployedClaim, EthAddress, HyperionId, OutgoingTxBatch, ValAddress, ValsetUpdatedClaim,
    WithdrawClaim,
};
use crate::error::{BridgeError, BridgeResult};
use crate::ports::{
    BankKeeper, BridgeStore, ClaimHeader, DistributionKeeper, EventSink, EvidenceSubject,
    HyperionApi, MsgConfirmBatch, MsgValsetConfirm, StakingKeeper,
};
use std::sync::Arc;

/// Hyperion bridge service
pub struct HyperionService<S, K, B, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    registry: ValsetRegistry<S, K, E>,
    confirmations: ConfirmationStore<S, E>,
    pool: OutgoingTxPool<S, B, E>,
    batches: BatchBuilder<S, E>,
    tally: AttestationTally<S, K, B, E>,
    evidence: SlashingEvidenceChecker<S, K, E>,
    block_handler: BlockHandler<S, K, B, E>,
}

impl<S, K, B, E> HyperionService<S, K, B, E>
where
    S: BridgeStore,
    K: StakingKeeper,
    B: BankKeeper + DistributionKeeper,
    E: EventSink,
{
    /// Create a new service; fails on inconsistent params.
    pub fn new(
        params: BridgeParams,
        store: Arc<S>,
        staking: Arc<K>,
        bank: Arc<B>,
        events: Arc<E>,
    ) -> BridgeResult<Self> {
        params.validate()?;
        let params = Arc::new(params);
        Ok(Self {
            registry: ValsetRegistry::new(params.clone(), store.clone(), staking.clone(), events.clone()),
            confirmations: ConfirmationStore::new(store.clone(), events.clone()),
            pool: OutgoingTxPool::new(params.clone(), store.clone(), bank.clone(), events.clone()),
            batches: BatchBuilder::new(params.clone(), store.clone(), events.clone()),
            tally: AttestationTally::new(
                params.clone(),
                store.clone(),
                staking.clone(),
                bank.clone(),
                events.clone(),
            ),
            evidence: SlashingEvidenceChecker::new(
                params.clone(),
                store.clone(),
                staking.clone(),
                events.clone(),
            ),
            block_handler: BlockHandler::new(params.clone(), store.clone(), staking, bank, events),
            params,
            store,
        })
    }

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &ValsetRegistry<S, K, E> {
        &self.registry
    }

    pub fn confirmations(&self) -> &ConfirmationStore<S, E> {
        &self.confirmations
    }

    pub fn pool(&self) -> &OutgoingTxPool<S, B, E> {
        &self.pool
    }

    pub fn batches(&self) -> &BatchBuilder<S, E> {
        &self.batches
    }

    pub fn tally(&self) -> &AttestationTally<S, K, B, E> {
        &self.tally
    }

    /// Staking hook: a validator began unbonding in this block.
    pub fn after_validator_begin_unbonding(&self, ctx: BlockContext) {
        self.registry.record_unbonding(ctx.height);
    }

    fn submit_claim(&self, ctx: BlockContext, header: ClaimHeader, payload: ClaimPayload) -> BridgeResult<()> {
        let claim = Claim {
            hyperion_id: header.hyperion_id,
            event_nonce: header.event_nonce,
            block_height: header.block_height,
            orchestrator: header.orchestrator,
            payload,
        };
        self.tally.submit(ctx, claim).map(|_| ())
    }
}

impl<S, K, B, E> HyperionApi for HyperionService<S, K, B, E>
where
    S: BridgeStore,
    K: StakingKeeper,
    B: BankKeeper + DistributionKeeper,
    E: EventSink,
{
    fn deposit_claim(&self, ctx: BlockContext, header: ClaimHeader, claim: DepositClaim) -> BridgeResult<()> {
        self.submit_claim(ctx, header, ClaimPayload::Deposit(claim))
    }

    fn withdraw_claim(&self, ctx: BlockContext, header: ClaimHeader, claim: WithdrawClaim) -> BridgeResult<()> {
        self.submit_claim(ctx, header, ClaimPayload::Withdraw(claim))
    }

    fn erc20_deployed_claim(
        &self,
        ctx: BlockContext,
        header: ClaimHeader,
        claim: Erc20DeployedClaim,
    ) -> BridgeResult<()> {
        self.submit_claim(ctx, header, ClaimPayload::Erc20Deployed(claim))
    }

    fn valset_updated_claim(
        &self,
        ctx: BlockContext,
        header: ClaimHeader,
        claim: ValsetUpdatedClaim,
    ) -> BridgeResult<()> {
        self.submit_claim(ctx, header, ClaimPayload::ValsetUpdated(claim))
    }

    fn send_to_chain(
        &self,
        ctx: BlockContext,
        sender: AccAddress,
        hyperion_id: HyperionId,
        dest: EthAddress,
        amount: Coin,
        fee: Coin,
    ) -> BridgeResult<u64> {
        self.pool
            .add_to_outgoing_pool(ctx, &sender, dest, amount, fee, hyperion_id)
    }

    fn cancel_send_to_chain(
        &self,
        ctx: BlockContext,
        sender: AccAddress,
        hyperion_id: HyperionId,
        tx_id: u64,
    ) -> BridgeResult<()> {
        self.pool
            .remove_from_outgoing_pool_and_refund(ctx, hyperion_id, tx_id, &sender)
    }

    fn request_batch(
        &self,
        ctx: BlockContext,
        orchestrator: AccAddress,
        hyperion_id: HyperionId,
        denom: &str,
    ) -> BridgeResult<OutgoingTxBatch> {
        if self
            .store
            .orchestrator_validator(hyperion_id, &orchestrator)
            .is_none()
        {
            return Err(BridgeError::unknown(format!(
                "validator for orchestrator {orchestrator}"
            )));
        }
        self.batches.request_batch(ctx, hyperion_id, denom)
    }

    fn confirm_batch(&self, _ctx: BlockContext, msg: MsgConfirmBatch) -> BridgeResult<()> {
        self.params.chain(msg.hyperion_id)?;
        self.confirmations.confirm_batch(msg)
    }

    fn valset_confirm(&self, _ctx: BlockContext, msg: MsgValsetConfirm) -> BridgeResult<()> {
        self.params.chain(msg.hyperion_id)?;
        self.confirmations.confirm_valset(msg)
    }

    fn set_orchestrator_addresses(
        &self,
        _ctx: BlockContext,
        validator: ValAddress,
        orchestrator: AccAddress,
        eth_address: EthAddress,
        hyperion_id: HyperionId,
    ) -> BridgeResult<()> {
        self.registry
            .set_orchestrator_addresses(&validator, &orchestrator, eth_address, hyperion_id)
    }

    fn submit_bad_signature_evidence(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        subject: EvidenceSubject,
        signature: String,
    ) -> BridgeResult<()> {
        self.evidence
            .check_bad_signature_evidence(ctx, hyperion_id, &subject, &signature)
    }

    fn end_block(&self, ctx: BlockContext) -> BridgeResult<()> {
        self.block_handler.end_block(ctx)
    }
}
