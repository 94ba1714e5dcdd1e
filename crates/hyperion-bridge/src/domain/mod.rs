//! Domain layer: entities and value objects of the bridge
//!
//! Everything here is plain data. State transitions live in `service`.

pub mod attestation;
pub mod claim;
pub mod confirmation;
pub mod outgoing;
pub mod params;
pub mod token;
pub mod valset;
pub mod value_objects;

pub use attestation::{Attestation, EquivocationRecord, LastObservedEthHeight, PostObservationError};
pub use claim::{
    Claim, ClaimPayload, ClaimType, DepositClaim, Erc20DeployedClaim, ValsetUpdatedClaim,
    WithdrawClaim,
};
pub use confirmation::{BatchConfirm, ValsetConfirm};
pub use outgoing::{OutgoingTx, OutgoingTxBatch, TransferRecord, TransferStatus};
pub use params::{BridgeParams, CounterpartyChainParams, OUTGOING_TX_BATCH_SIZE};
pub use token::{
    parse_voucher_denom, voucher_denom, DenomMetadata, DenomUnit, TokenMetadata, TokenPair,
    VOUCHER_DECIMALS,
};
pub use valset::{power_diff_bps, BridgeValidator, Valset};
pub use value_objects::{
    AccAddress, BlockContext, Coin, EthAddress, EthSignature, Hash, HyperionId, SlashFraction,
    ValAddress,
};
