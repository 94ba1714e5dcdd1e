//! Attestation voting and observation
//!
//! Claims are voted on per `(event nonce, claim hash)`. The first
//! attestation at `last observed nonce + 1` to gather two thirds of the
//! bridge power is observed and handed to the [`AttestationHandler`].
//!
//! ## Nonce rules
//!
//! | claim nonce      | outcome                                       |
//! |------------------|-----------------------------------------------|
//! | `last + 1`       | creates or joins the attestation              |
//! | `<= last`        | joins an unobserved attestation, else invalid |
//! | `> last + 1`     | invalid, never buffered                       |

use super::attestation_handler::AttestationHandler;
use crate::algorithms::has_supermajority;
use crate::domain::{
    Attestation, BlockContext, BridgeParams, Claim, EquivocationRecord, Hash, HyperionId,
    LastObservedEthHeight, PostObservationError, ValAddress,
};
use crate::error::{BridgeError, BridgeResult};
use crate::events::BridgeEvent;
use crate::metrics;
use crate::ports::{BankKeeper, BridgeStore, DistributionKeeper, EventSink, StakingKeeper};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct AttestationTally<S, K, B, E> {
    params: Arc<BridgeParams>,
    store: Arc<S>,
    staking: Arc<K>,
    events: Arc<E>,
    handler: AttestationHandler<S, B, E>,
}

impl<S, K, B, E> AttestationTally<S, K, B, E>
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
        let handler = AttestationHandler::new(params.clone(), store.clone(), bank, events.clone());
        Self {
            params,
            store,
            staking,
            events,
            handler,
        }
    }

    /// Records the orchestrator's vote for `claim`.
    ///
    /// Returns true when the vote created a new attestation.
    pub fn submit(&self, ctx: BlockContext, claim: Claim) -> BridgeResult<bool> {
        let hyperion_id = claim.hyperion_id;
        self.params.chain(hyperion_id)?;
        let validator = self
            .store
            .orchestrator_validator(hyperion_id, &claim.orchestrator)
            .ok_or_else(|| {
                BridgeError::unknown(format!("validator for orchestrator {}", claim.orchestrator))
            })?;
        match self.staking.validator(&validator) {
            Some(info) if info.bonded && !info.jailed => {}
            _ => {
                return Err(BridgeError::InvalidSigner {
                    reason: format!("{validator} is not an active bonded validator"),
                })
            }
        }

        let nonce = claim.event_nonce;
        let last = self.store.last_observed_event_nonce(hyperion_id);
        if nonce > last + 1 {
            return Err(BridgeError::invalid(format!(
                "non contiguous event nonce: expected {}, got {nonce}",
                last + 1
            )));
        }

        let claim_hash = claim.claim_hash()?;
        let claim_type = claim.claim_type();
        let (mut attestation, created) =
            match self.store.attestation(hyperion_id, nonce, &claim_hash) {
                Some(existing) if existing.observed => {
                    return Err(BridgeError::invalid(format!(
                        "event nonce {nonce} is already observed"
                    )))
                }
                Some(existing) => (existing, false),
                None if nonce == last + 1 => (Attestation::new(claim, claim_hash, ctx.height), true),
                None => {
                    return Err(BridgeError::invalid(format!(
                        "event nonce {nonce} already observed and no attestation matches the claim"
                    )))
                }
            };

        if attestation.has_voted(&validator) {
            return Ok(false);
        }
        self.check_equivocation(ctx, hyperion_id, nonce, &claim_hash, &validator);

        attestation.add_vote(validator.clone());
        self.store.set_attestation(attestation.clone());

        debug!(hyperion_id, event_nonce = nonce, %validator, claim_type = %claim_type, "[hyperion] claim submitted");
        metrics::record_claim_submitted(claim_type.as_str());
        self.events.emit(BridgeEvent::ClaimSubmitted {
            hyperion_id,
            event_nonce: nonce,
            claim_type,
            claim_hash,
            validator,
        });

        self.try_attestation(ctx, attestation)?;
        Ok(created)
    }

    fn check_equivocation(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        nonce: u64,
        claim_hash: &Hash,
        validator: &ValAddress,
    ) {
        let Some(first) = self
            .store
            .attestations_at_nonce(hyperion_id, nonce)
            .into_iter()
            .find(|att| &att.claim_hash != claim_hash && att.has_voted(validator))
        else {
            return;
        };

        warn!(
            hyperion_id,
            event_nonce = nonce,
            %validator,
            "[hyperion] validator voted for conflicting claims"
        );
        metrics::record_equivocation();
        self.store.push_equivocation(EquivocationRecord {
            hyperion_id,
            event_nonce: nonce,
            validator: validator.clone(),
            first_claim_hash: first.claim_hash,
            conflicting_claim_hash: *claim_hash,
            height: ctx.height,
        });
        self.events.emit(BridgeEvent::Equivocation {
            hyperion_id,
            event_nonce: nonce,
            validator: validator.clone(),
            first_claim_hash: first.claim_hash,
            conflicting_claim_hash: *claim_hash,
        });
    }

    /// Current power behind `votes` and the total bridge power of a chain.
    ///
    /// The total covers every bonded validator, registered for the chain or not.
    pub fn bridge_power(&self, votes: &BTreeSet<ValAddress>) -> (u64, u64) {
        let powers: BTreeMap<ValAddress, u64> = self
            .staking
            .bonded_validators()
            .into_iter()
            .map(|v| (v.operator, v.power))
            .collect();
        let total = powers.values().fold(0u64, |acc, p| acc.saturating_add(*p));
        let voted = votes
            .iter()
            .filter_map(|v| powers.get(v))
            .fold(0u64, |acc, p| acc.saturating_add(*p));
        (voted, total)
    }

    /// Observes the attestation if it is next in line and has the votes.
    ///
    /// Returns true when it was observed by this call.
    pub fn try_attestation(&self, ctx: BlockContext, mut attestation: Attestation) -> BridgeResult<bool> {
        if attestation.observed {
            return Ok(false);
        }
        let hyperion_id = attestation.hyperion_id;
        let nonce = attestation.event_nonce;
        if nonce != self.store.last_observed_event_nonce(hyperion_id) + 1 {
            return Ok(false);
        }
        let (power, total_power) = self.bridge_power(&attestation.votes);
        if !has_supermajority(power, total_power) {
            return Ok(false);
        }

        attestation.observed = true;
        self.store.set_attestation(attestation.clone());
        self.store.set_last_observed_event_nonce(hyperion_id, nonce);
        self.store.set_last_observed_eth_height(
            hyperion_id,
            LastObservedEthHeight {
                cosmos_height: ctx.height,
                eth_height: attestation.claim.block_height,
            },
        );

        let claim_type = attestation.claim.claim_type();
        info!(
            hyperion_id,
            event_nonce = nonce,
            claim_type = %claim_type,
            power,
            total_power,
            "[hyperion] attestation observed"
        );
        metrics::record_attestation_observed(claim_type.as_str());
        self.events.emit(BridgeEvent::AttestationObserved {
            hyperion_id,
            event_nonce: nonce,
            claim_type,
            claim_hash: attestation.claim_hash,
            power,
            total_power,
        });

        if let Err(e) = self.handler.handle(ctx, &attestation.claim) {
            error!(
                hyperion_id,
                event_nonce = nonce,
                claim_type = %claim_type,
                error = %e,
                "[hyperion] observed claim failed to apply"
            );
            metrics::record_post_observation_error(claim_type.as_str());
            self.store.push_post_observation_error(PostObservationError {
                hyperion_id,
                event_nonce: nonce,
                claim_hash: attestation.claim_hash,
                claim_type,
                height: ctx.height,
                error: e.to_string(),
                code: e.code(),
            });
            self.events.emit(BridgeEvent::PostObservationFailure {
                hyperion_id,
                event_nonce: nonce,
                claim_type,
                error: e.to_string(),
            });
        }
        Ok(true)
    }

    /// Retries pending attestations in nonce order until one falls short.
    pub fn tally_pending(&self, ctx: BlockContext, hyperion_id: HyperionId) -> BridgeResult<usize> {
        let mut observed = 0;
        loop {
            let next = self.store.last_observed_event_nonce(hyperion_id) + 1;
            let mut advanced = false;
            for attestation in self.store.attestations_at_nonce(hyperion_id, next) {
                if self.try_attestation(ctx, attestation)? {
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                return Ok(observed);
            }
            observed += 1;
        }
    }

    pub fn last_observed_event_nonce(&self, hyperion_id: HyperionId) -> u64 {
        self.store.last_observed_event_nonce(hyperion_id)
    }
}
