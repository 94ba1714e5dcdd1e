//! Attestation: aggregated votes for one claim at one event nonce
//!
//! Conflicting claims for the same nonce live in separate attestations,
//! keyed by `(hyperion_id, event_nonce, claim_hash)`.

use super::claim::{Claim, ClaimType};
use super::value_objects::{Hash, HyperionId, ValAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Voting record for one claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub hyperion_id: HyperionId,
    pub event_nonce: u64,
    pub claim_hash: Hash,
    /// First submission; every vote carries the same content.
    pub claim: Claim,
    /// Host-chain height the attestation was created at.
    pub height: u64,
    /// Set once, never cleared.
    pub observed: bool,
    pub votes: BTreeSet<ValAddress>,
}

impl Attestation {
    pub fn new(claim: Claim, claim_hash: Hash, height: u64) -> Self {
        Self {
            hyperion_id: claim.hyperion_id,
            event_nonce: claim.event_nonce,
            claim_hash,
            claim,
            height,
            observed: false,
            votes: BTreeSet::new(),
        }
    }

    /// Adds a vote; returns false if the validator had already voted.
    pub fn add_vote(&mut self, validator: ValAddress) -> bool {
        self.votes.insert(validator)
    }

    pub fn has_voted(&self, validator: &ValAddress) -> bool {
        self.votes.contains(validator)
    }
}

/// Handler failure recorded after an attestation was already observed.
///
/// The observation stands and the nonce has advanced; this record is the
/// only trace of the failed side effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostObservationError {
    pub hyperion_id: HyperionId,
    pub event_nonce: u64,
    pub claim_hash: Hash,
    pub claim_type: ClaimType,
    pub height: u64,
    pub error: String,
    pub code: u32,
}

/// A validator voted for two different claims at the same nonce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivocationRecord {
    pub hyperion_id: HyperionId,
    pub event_nonce: u64,
    pub validator: ValAddress,
    pub first_claim_hash: Hash,
    pub conflicting_claim_hash: Hash,
    pub height: u64,
}

/// Host and counterparty heights at the last observed event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastObservedEthHeight {
    pub cosmos_height: u64,
    pub eth_height: u64,
}
