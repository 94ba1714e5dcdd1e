//! Claims submitted by orchestrators about counterparty-chain events

use super::token::TokenMetadata;
use super::valset::BridgeValidator;
use super::value_objects::{AccAddress, EthAddress, Hash, HyperionId};
use crate::error::{BridgeError, BridgeResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Tokens locked in the bridge contract, to be credited on this chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositClaim {
    pub token_contract: EthAddress,
    pub amount: U256,
    /// Raw sender as reported by the orchestrator; validated by the handler.
    pub ethereum_sender: String,
    /// Raw bech32 receiver; a malformed value sends the funds to the community pool.
    pub cosmos_receiver: String,
    /// Only read when the contract is new; invalid metadata falls back to the defaults.
    #[serde(default)]
    pub token_metadata: Option<TokenMetadata>,
}

/// An outgoing batch was executed on the counterparty chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawClaim {
    pub batch_nonce: u64,
    pub token_contract: EthAddress,
}

/// A representation contract for a host-chain denom was deployed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20DeployedClaim {
    pub cosmos_denom: String,
    pub token_contract: EthAddress,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The bridge contract switched to a new validator set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetUpdatedClaim {
    pub valset_nonce: u64,
    pub members: Vec<BridgeValidator>,
    pub reward_amount: U256,
    pub reward_token: EthAddress,
}

/// Variant-specific payload of a claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimPayload {
    Deposit(DepositClaim),
    Withdraw(WithdrawClaim),
    Erc20Deployed(Erc20DeployedClaim),
    ValsetUpdated(ValsetUpdatedClaim),
}

/// Discriminant of [`ClaimPayload`], for events and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    Deposit,
    Withdraw,
    Erc20Deployed,
    ValsetUpdated,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Deposit => "deposit",
            ClaimType::Withdraw => "withdraw",
            ClaimType::Erc20Deployed => "erc20_deployed",
            ClaimType::ValsetUpdated => "valset_updated",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validator's assertion that an event happened on the counterparty chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub hyperion_id: HyperionId,
    /// Externally assigned, gapless per hyperion id.
    pub event_nonce: u64,
    /// Counterparty block height the event was seen at.
    pub block_height: u64,
    pub orchestrator: AccAddress,
    pub payload: ClaimPayload,
}

#[derive(Serialize)]
struct ClaimHashPreimage<'a> {
    hyperion_id: HyperionId,
    event_nonce: u64,
    block_height: u64,
    payload: &'a ClaimPayload,
}

impl Claim {
    pub fn claim_type(&self) -> ClaimType {
        match self.payload {
            ClaimPayload::Deposit(_) => ClaimType::Deposit,
            ClaimPayload::Withdraw(_) => ClaimType::Withdraw,
            ClaimPayload::Erc20Deployed(_) => ClaimType::Erc20Deployed,
            ClaimPayload::ValsetUpdated(_) => ClaimType::ValsetUpdated,
        }
    }

    /// Deterministic hash of the event content. The submitting orchestrator is
    /// not part of it, so every honest validator produces the same hash.
    pub fn claim_hash(&self) -> BridgeResult<Hash> {
        let preimage = ClaimHashPreimage {
            hyperion_id: self.hyperion_id,
            event_nonce: self.event_nonce,
            block_height: self.block_height,
            payload: &self.payload,
        };
        let encoded = bincode::serialize(&preimage).map_err(|e| BridgeError::Internal {
            reason: format!("claim encoding: {e}"),
        })?;
        Ok(Keccak256::digest(&encoded).into())
    }
}
