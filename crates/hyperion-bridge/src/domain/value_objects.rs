//! Value objects shared across the bridge domain

use crate::error::{BridgeError, BridgeResult};
use bech32::{FromBase32, ToBase32, Variant};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use std::str::FromStr;

/// Identifier of one bridge instance (one counterparty chain).
pub type HyperionId = u64;

/// 32-byte hash (keccak256 everywhere in this crate).
pub type Hash = [u8; 32];

/// Address on the counterparty (EVM) chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    pub const ZERO: EthAddress = EthAddress([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for EthAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> BridgeResult<Self> {
        let raw = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if raw.len() != 40 {
            return Err(BridgeError::invalid(format!(
                "eth address must be 40 hex chars, got {}",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(raw, &mut bytes)
            .map_err(|e| BridgeError::invalid(format!("eth address {s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

fn decode_bech32(s: &str) -> BridgeResult<(String, Vec<u8>)> {
    let (hrp, data, variant) =
        bech32::decode(s).map_err(|e| BridgeError::invalid(format!("bech32 {s}: {e}")))?;
    if variant != Variant::Bech32 {
        return Err(BridgeError::invalid(format!("{s}: expected bech32 variant")));
    }
    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| BridgeError::invalid(format!("bech32 payload {s}: {e}")))?;
    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(BridgeError::invalid(format!(
            "{s}: address payload must be 20 or 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok((hrp, bytes))
}

fn encode_bech32(hrp: &str, bytes: &[u8]) -> BridgeResult<String> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| BridgeError::invalid(format!("bech32 encode with prefix {hrp}: {e}")))
}

macro_rules! bech32_address {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Parses and validates a bech32 address.
            pub fn parse(s: &str) -> BridgeResult<Self> {
                decode_bech32(s)?;
                Ok(Self(s.to_string()))
            }

            /// Encodes raw address bytes under the given prefix.
            pub fn from_bytes(hrp: &str, bytes: &[u8]) -> BridgeResult<Self> {
                Ok(Self(encode_bech32(hrp, bytes)?))
            }

            /// Raw address bytes.
            pub fn to_bytes(&self) -> BridgeResult<Vec<u8>> {
                decode_bech32(&self.0).map(|(_, bytes)| bytes)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = BridgeError;

            fn from_str(s: &str) -> BridgeResult<Self> {
                Self::parse(s)
            }
        }
    };
}

bech32_address!(
    /// Host-chain account address (orchestrators, users).
    AccAddress
);

bech32_address!(
    /// Validator operator address.
    ValAddress
);

/// Amount of a host-chain denom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Recoverable secp256k1 signature `r || s || v`.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSignature(#[serde_as(as = "Bytes")] pub [u8; 65]);

impl EthSignature {
    pub fn from_hex(s: &str) -> BridgeResult<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 65];
        hex::decode_to_slice(raw, &mut bytes)
            .map_err(|e| BridgeError::invalid(format!("signature decoding: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthSignature(0x{})", self.to_hex())
    }
}

/// Host-chain block being processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
}

impl BlockContext {
    pub fn new(height: u64) -> Self {
        Self { height }
    }
}

/// Fraction of stake to slash, in parts per million.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlashFraction {
    pub parts_per_million: u32,
}

impl SlashFraction {
    pub const ONE: u32 = 1_000_000;

    pub fn from_ppm(parts_per_million: u32) -> Self {
        Self {
            parts_per_million: parts_per_million.min(Self::ONE),
        }
    }

    /// Stake remaining after applying the fraction, rounded towards the validator.
    pub fn slash(&self, power: u64) -> u64 {
        let cut = (power as u128 * self.parts_per_million as u128) / Self::ONE as u128;
        power.saturating_sub(cut as u64)
    }
}
