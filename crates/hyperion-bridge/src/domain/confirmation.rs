//! Orchestrator signatures over valset and batch checkpoints

use super::value_objects::{AccAddress, EthAddress, EthSignature, HyperionId};
use serde::{Deserialize, Serialize};

/// Signature over a valset checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetConfirm {
    pub hyperion_id: HyperionId,
    pub nonce: u64,
    pub orchestrator: AccAddress,
    /// Address the signature recovered to.
    pub eth_address: EthAddress,
    pub signature: EthSignature,
}

/// Signature over a batch checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfirm {
    pub hyperion_id: HyperionId,
    pub nonce: u64,
    pub token_contract: EthAddress,
    pub orchestrator: AccAddress,
    pub eth_address: EthAddress,
    pub signature: EthSignature,
}
