//! Events emitted by the bridge
//!
//! Consumed by relayers and indexers through the [`EventSink`] port.
//!
//! [`EventSink`]: crate::ports::EventSink

use crate::domain::{
    AccAddress, ClaimType, Coin, EthAddress, Hash, HyperionId, SlashFraction, ValAddress,
};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Why a validator was slashed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashReason {
    /// Did not confirm a valset within the signed window.
    MissingValsetConfirm,
    /// Did not confirm a batch within the signed window.
    MissingBatchConfirm,
    /// Signed a checkpoint this chain never produced.
    BadEthSignature,
}

impl SlashReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlashReason::MissingValsetConfirm => "missing_valset_confirm",
            SlashReason::MissingBatchConfirm => "missing_batch_confirm",
            SlashReason::BadEthSignature => "bad_eth_signature",
        }
    }
}

/// Bridge event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    ClaimSubmitted {
        hyperion_id: HyperionId,
        event_nonce: u64,
        claim_type: ClaimType,
        claim_hash: Hash,
        validator: ValAddress,
    },
    AttestationObserved {
        hyperion_id: HyperionId,
        event_nonce: u64,
        claim_type: ClaimType,
        claim_hash: Hash,
        /// Voting power that observed it.
        power: u64,
        total_power: u64,
    },
    PostObservationFailure {
        hyperion_id: HyperionId,
        event_nonce: u64,
        claim_type: ClaimType,
        error: String,
    },
    Equivocation {
        hyperion_id: HyperionId,
        event_nonce: u64,
        validator: ValAddress,
        first_claim_hash: Hash,
        conflicting_claim_hash: Hash,
    },
    DepositProcessed {
        hyperion_id: HyperionId,
        event_nonce: u64,
        receiver: AccAddress,
        coin: Coin,
    },
    DepositToCommunityPool {
        hyperion_id: HyperionId,
        event_nonce: u64,
        coin: Coin,
        reason: String,
    },
    SendToChain {
        hyperion_id: HyperionId,
        tx_id: u64,
        sender: AccAddress,
        dest_address: EthAddress,
        token_contract: EthAddress,
        amount: U256,
        fee: U256,
    },
    SendToChainCanceled {
        hyperion_id: HyperionId,
        tx_id: u64,
        sender: AccAddress,
    },
    BatchCreated {
        hyperion_id: HyperionId,
        batch_nonce: u64,
        token_contract: EthAddress,
        tx_ids: Vec<u64>,
        batch_timeout: u64,
        checkpoint: Hash,
    },
    BatchCanceled {
        hyperion_id: HyperionId,
        batch_nonce: u64,
        token_contract: EthAddress,
    },
    BatchExecuted {
        hyperion_id: HyperionId,
        batch_nonce: u64,
        token_contract: EthAddress,
    },
    BatchConfirmed {
        hyperion_id: HyperionId,
        batch_nonce: u64,
        token_contract: EthAddress,
        orchestrator: AccAddress,
    },
    ValsetRequested {
        hyperion_id: HyperionId,
        valset_nonce: u64,
        checkpoint: Hash,
        members: usize,
    },
    ValsetConfirmed {
        hyperion_id: HyperionId,
        valset_nonce: u64,
        orchestrator: AccAddress,
    },
    ValsetObserved {
        hyperion_id: HyperionId,
        valset_nonce: u64,
    },
    Erc20Registered {
        hyperion_id: HyperionId,
        denom: String,
        token_contract: EthAddress,
        cosmos_originated: bool,
    },
    OrchestratorRegistered {
        hyperion_id: HyperionId,
        validator: ValAddress,
        orchestrator: AccAddress,
        eth_address: EthAddress,
    },
    BadSignatureEvidence {
        hyperion_id: HyperionId,
        checkpoint: Hash,
        signer: EthAddress,
        validator: ValAddress,
    },
    ValidatorSlashed {
        hyperion_id: HyperionId,
        validator: ValAddress,
        reason: SlashReason,
        fraction: SlashFraction,
        slashed: u64,
    },
}

impl BridgeEvent {
    /// Stable event name, as indexed by relayers.
    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::ClaimSubmitted { .. } => "claim_submitted",
            BridgeEvent::AttestationObserved { .. } => "attestation_observed",
            BridgeEvent::PostObservationFailure { .. } => "post_observation_failure",
            BridgeEvent::Equivocation { .. } => "equivocation",
            BridgeEvent::DepositProcessed { .. } => "deposit_processed",
            BridgeEvent::DepositToCommunityPool { .. } => "deposit_to_community_pool",
            BridgeEvent::SendToChain { .. } => "send_to_chain",
            BridgeEvent::SendToChainCanceled { .. } => "send_to_chain_canceled",
            BridgeEvent::BatchCreated { .. } => "batch_created",
            BridgeEvent::BatchCanceled { .. } => "batch_canceled",
            BridgeEvent::BatchExecuted { .. } => "batch_executed",
            BridgeEvent::BatchConfirmed { .. } => "batch_confirmed",
            BridgeEvent::ValsetRequested { .. } => "valset_requested",
            BridgeEvent::ValsetConfirmed { .. } => "valset_confirmed",
            BridgeEvent::ValsetObserved { .. } => "valset_observed",
            BridgeEvent::Erc20Registered { .. } => "erc20_registered",
            BridgeEvent::OrchestratorRegistered { .. } => "orchestrator_registered",
            BridgeEvent::BadSignatureEvidence { .. } => "bad_signature_evidence",
            BridgeEvent::ValidatorSlashed { .. } => "validator_slashed",
        }
    }

    pub fn hyperion_id(&self) -> HyperionId {
        match self {
            BridgeEvent::ClaimSubmitted { hyperion_id, .. }
            | BridgeEvent::AttestationObserved { hyperion_id, .. }
            | BridgeEvent::PostObservationFailure { hyperion_id, .. }
            | BridgeEvent::Equivocation { hyperion_id, .. }
            | BridgeEvent::DepositProcessed { hyperion_id, .. }
            | BridgeEvent::DepositToCommunityPool { hyperion_id, .. }
            | BridgeEvent::SendToChain { hyperion_id, .. }
            | BridgeEvent::SendToChainCanceled { hyperion_id, .. }
            | BridgeEvent::BatchCreated { hyperion_id, .. }
            | BridgeEvent::BatchCanceled { hyperion_id, .. }
            | BridgeEvent::BatchExecuted { hyperion_id, .. }
            | BridgeEvent::BatchConfirmed { hyperion_id, .. }
            | BridgeEvent::ValsetRequested { hyperion_id, .. }
            | BridgeEvent::ValsetConfirmed { hyperion_id, .. }
            | BridgeEvent::ValsetObserved { hyperion_id, .. }
            | BridgeEvent::Erc20Registered { hyperion_id, .. }
            | BridgeEvent::OrchestratorRegistered { hyperion_id, .. }
            | BridgeEvent::BadSignatureEvidence { hyperion_id, .. }
            | BridgeEvent::ValidatorSlashed { hyperion_id, .. } => *hyperion_id,
        }
    }
}
