//! Validator set registry
//!
//! Owns delegate key registration and the valset snapshots that the
//! counterparty contract is asked to adopt.

use crate::algorithms::{normalize_power, valset_checkpoint};
use crate::domain::{
    AccAddress, BlockContext, BridgeParams, BridgeValidator, EthAddress, Hash, HyperionId,
    ValAddress, Valset,
};
use crate::error::{BridgeError, BridgeResult};
use crate::events::BridgeEvent;
use crate::ports::{CheckpointStore, EventSink, StakingKeeper, TokenStore, ValsetStore};
use primitive_types::U256;
use std::sync::Arc;
use tracing::info;

pub struct ValsetRegistry<S, K, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    staking: Arc<K>,
    events: Arc<E>,
}

impl<S, K, E> ValsetRegistry<S, K, E>
where
    S: ValsetStore + TokenStore + CheckpointStore,
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

    /// Registers the orchestrator and eth address of a validator.
    ///
    /// Delegate keys are write-once: any existing mapping on either side
    /// fails with `ResetDelegateKeys`.
    pub fn set_orchestrator_addresses(
        &self,
        validator: &ValAddress,
        orchestrator: &AccAddress,
        eth_address: EthAddress,
        hyperion_id: HyperionId,
    ) -> BridgeResult<()> {
        self.params.chain(hyperion_id)?;
        if self.staking.validator(validator).is_none() {
            return Err(BridgeError::unknown(format!("no validator {validator}")));
        }
        if eth_address.is_zero() {
            return Err(BridgeError::invalid("eth address is zero"));
        }

        let taken = self.store.orchestrator_by_validator(hyperion_id, validator).is_some()
            || self.store.eth_address(hyperion_id, validator).is_some()
            || self.store.orchestrator_validator(hyperion_id, orchestrator).is_some()
            || self
                .store
                .validator_by_eth_address(hyperion_id, &eth_address)
                .is_some();
        if taken {
            return Err(BridgeError::ResetDelegateKeys {
                validator: validator.to_string(),
            });
        }

        self.store
            .set_orchestrator_validator(hyperion_id, orchestrator, validator);
        self.store.set_eth_address(hyperion_id, validator, eth_address);

        info!(
            hyperion_id,
            %validator,
            %orchestrator,
            %eth_address,
            "[hyperion] orchestrator registered"
        );
        self.events.emit(BridgeEvent::OrchestratorRegistered {
            hyperion_id,
            validator: validator.clone(),
            orchestrator: orchestrator.clone(),
            eth_address,
        });
        Ok(())
    }

    /// Snapshot of the bonded validators that registered an eth address.
    ///
    /// Powers are normalized to `u32::MAX`; the nonce is the next free one.
    pub fn current_valset(&self, ctx: BlockContext, hyperion_id: HyperionId) -> BridgeResult<Valset> {
        let chain = self.params.chain(hyperion_id)?;

        let mut raw = Vec::new();
        let mut total: u64 = 0;
        for validator in self.staking.bonded_validators() {
            if let Some(eth) = self.store.eth_address(hyperion_id, &validator.operator) {
                total = total.saturating_add(validator.power);
                raw.push((eth, validator.power));
            }
        }
        let members = raw
            .into_iter()
            .map(|(eth_address, power)| BridgeValidator {
                eth_address,
                power: normalize_power(power, total),
            })
            .collect();

        let (reward_amount, reward_token) = match &chain.valset_reward {
            Some(coin) if !coin.is_zero() => self
                .store
                .token_by_denom(hyperion_id, &coin.denom)
                .map(|pair| (coin.amount, pair.token_contract))
                .unwrap_or((U256::zero(), EthAddress::ZERO)),
            _ => (U256::zero(), EthAddress::ZERO),
        };

        let nonce = self.store.latest_valset_nonce(hyperion_id) + 1;
        Ok(Valset::new(
            hyperion_id,
            nonce,
            ctx.height,
            members,
            reward_amount,
            reward_token,
        ))
    }

    pub fn checkpoint(&self, valset: &Valset) -> Hash {
        valset_checkpoint(valset, valset.hyperion_id)
    }

    /// Stores the current valset as a new request for orchestrators to sign.
    pub fn set_valset_request(&self, ctx: BlockContext, hyperion_id: HyperionId) -> BridgeResult<Valset> {
        let valset = self.current_valset(ctx, hyperion_id)?;
        if valset.members.is_empty() {
            return Err(BridgeError::Empty {
                reason: "no bonded validator has registered an eth address".into(),
            });
        }

        let checkpoint = self.checkpoint(&valset);
        self.store.store_valset(valset.clone());
        self.store.set_past_checkpoint(hyperion_id, checkpoint);

        info!(
            hyperion_id,
            nonce = valset.nonce,
            members = valset.members.len(),
            "[hyperion] valset requested"
        );
        self.events.emit(BridgeEvent::ValsetRequested {
            hyperion_id,
            valset_nonce: valset.nonce,
            checkpoint,
            members: valset.members.len(),
        });
        Ok(valset)
    }

    pub fn valset(&self, hyperion_id: HyperionId, nonce: u64) -> Option<Valset> {
        self.store.valset(hyperion_id, nonce)
    }

    pub fn valsets(&self, hyperion_id: HyperionId) -> Vec<Valset> {
        self.store.valsets(hyperion_id)
    }

    /// Most recent valset request, if any.
    pub fn latest_valset(&self, hyperion_id: HyperionId) -> Option<Valset> {
        self.store
            .valset(hyperion_id, self.store.latest_valset_nonce(hyperion_id))
    }

    pub fn last_observed_valset(&self, hyperion_id: HyperionId) -> Option<Valset> {
        self.store.last_observed_valset(hyperion_id)
    }

    /// Notes that a validator began unbonding at `height`.
    pub fn record_unbonding(&self, height: u64) {
        self.store.set_last_unbonding_height(height);
    }
}
