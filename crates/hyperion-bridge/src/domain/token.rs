//! Token registry entries linking host denoms and counterparty contracts

use super::value_objects::{EthAddress, HyperionId};
use serde::{Deserialize, Serialize};

const VOUCHER_PREFIX: &str = "hyperion";

/// Decimals assumed for a counterparty token first seen in a deposit.
pub const VOUCHER_DECIMALS: u8 = 18;
const MAX_TOKEN_DECIMALS: u8 = 18;
const MAX_TOKEN_NAME_LEN: usize = 100;
const MAX_TOKEN_SYMBOL_LEN: usize = 30;

/// Link between a host-chain denom and a counterparty token contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub hyperion_id: HyperionId,
    pub denom: String,
    pub token_contract: EthAddress,
    /// True when the asset is native to this chain and the contract is its representation.
    pub cosmos_originated: bool,
    pub decimals: u8,
}

/// Token details a deposit may carry for a contract the bridge has not seen yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    /// Used when a deposit carries no usable metadata.
    pub fn voucher_default(denom: &str) -> Self {
        Self {
            name: denom.to_string(),
            symbol: denom.to_string(),
            decimals: VOUCHER_DECIMALS,
        }
    }

    /// Non-empty symbol, bounded lengths and at most 18 decimals.
    pub fn is_valid(&self) -> bool {
        !self.symbol.is_empty()
            && self.symbol.len() <= MAX_TOKEN_SYMBOL_LEN
            && self.name.len() <= MAX_TOKEN_NAME_LEN
            && self.decimals <= MAX_TOKEN_DECIMALS
    }
}

/// Unit of a denom, as in bank metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
}

/// Bank metadata for a denom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomMetadata {
    pub base: String,
    pub display: String,
    pub name: String,
    pub symbol: String,
    pub denom_units: Vec<DenomUnit>,
}

impl DenomMetadata {
    /// Metadata registered for a freshly created voucher denom.
    pub fn voucher(denom: &str, token: &TokenMetadata) -> Self {
        Self {
            base: denom.to_string(),
            display: denom.to_string(),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            denom_units: vec![DenomUnit {
                denom: denom.to_string(),
                exponent: u32::from(token.decimals),
            }],
        }
    }

    /// Exponent of the display unit, if declared.
    pub fn display_exponent(&self) -> Option<u32> {
        self.denom_units
            .iter()
            .find(|u| u.denom == self.display)
            .map(|u| u.exponent)
    }
}

/// Voucher denom for a counterparty-originated token: `hyperion{id}-0x{contract}`.
pub fn voucher_denom(hyperion_id: HyperionId, token_contract: &EthAddress) -> String {
    format!("{VOUCHER_PREFIX}{hyperion_id}-{token_contract}")
}

/// Inverse of [`voucher_denom`] for the given hyperion id.
pub fn parse_voucher_denom(hyperion_id: HyperionId, denom: &str) -> Option<EthAddress> {
    let prefix = format!("{VOUCHER_PREFIX}{hyperion_id}-");
    denom.strip_prefix(&prefix)?.parse().ok()
}
