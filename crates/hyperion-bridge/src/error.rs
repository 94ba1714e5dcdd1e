//! Error types for the Hyperion bridge
//!
//! Codes follow the module's registered error table so that hosts can
//! surface them unchanged to clients and relayers.

use thiserror::Error;

/// Hyperion bridge errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Invariant violated inside the module itself
    #[error("internal error: {reason}")]
    Internal { reason: String },

    /// Repeated confirmation or signature
    #[error("duplicate: {reason}")]
    Duplicate { reason: String },

    /// Malformed input, mismatched metadata or bad signature
    #[error("invalid: {reason}")]
    Invalid { reason: String },

    /// Operation attempted after its deadline
    #[error("timeout: {reason}")]
    Timeout { reason: String },

    /// Missing validator, orchestrator, denom or record
    #[error("unknown: {reason}")]
    Unknown { reason: String },

    /// Required registered address is missing
    #[error("empty: {reason}")]
    Empty { reason: String },

    /// Batch requested for a token with nothing pending
    #[error("no unbatched txs found for token {token_contract}")]
    NoUnbatchedTxsFound { token_contract: String },

    /// Orchestrator mappings are immutable once registered
    #[error("cannot reset delegate keys for validator {validator}")]
    ResetDelegateKeys { validator: String },

    /// Minting would push total supply past 256 bits, or the locked balance is short
    #[error("supply overflow for {denom}: {reason}")]
    SupplyOverflow { denom: String, reason: String },

    /// Counterparty sender address failed to parse
    #[error("invalid ethereum sender: {sender}")]
    InvalidEthSender { sender: String },

    /// Destination is zero or blacklisted
    #[error("invalid ethereum destination: {destination}")]
    InvalidEthDestination { destination: String },

    /// Signer is not a bonded validator
    #[error("invalid signer: {reason}")]
    InvalidSigner { reason: String },

    /// Bank port failure
    #[error("bank: {0}")]
    Bank(String),

    /// Staking port failure
    #[error("staking: {0}")]
    Staking(String),
}

impl BridgeError {
    /// Registered error code for this error.
    pub fn code(&self) -> u32 {
        match self {
            BridgeError::Internal { .. } | BridgeError::Bank(_) | BridgeError::Staking(_) => 1,
            BridgeError::Duplicate { .. } => 2,
            BridgeError::Invalid { .. } => 3,
            BridgeError::Timeout { .. } => 4,
            BridgeError::Unknown { .. } => 5,
            BridgeError::Empty { .. } => 6,
            BridgeError::NoUnbatchedTxsFound { .. } => 10,
            BridgeError::ResetDelegateKeys { .. } => 11,
            BridgeError::SupplyOverflow { .. } => 12,
            BridgeError::InvalidEthSender { .. } => 13,
            BridgeError::InvalidEthDestination { .. } => 14,
            BridgeError::InvalidSigner { .. } => 18,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BridgeError::Invalid {
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(reason: impl Into<String>) -> Self {
        BridgeError::Unknown {
            reason: reason.into(),
        }
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
