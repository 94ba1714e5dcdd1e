//! # hyperion-bridge
//!
//! Attestation and batch consensus engine of the Hyperion bridge between a
//! host chain and any number of EVM counterparty chains.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Attestation tally**: claims are voted on per event nonce and observed
//!   strictly in order once two thirds of the bridge power agree
//! - **Outgoing pool and batches**: withdrawals are queued, batched by fee
//!   and either executed or cancelled back into the pool
//! - **Checkpoints**: ABI compatible valset and batch digests that
//!   orchestrators sign with their Ethereum keys
//! - **Slashing**: missing confirmations and forged signatures
//!
//! ## Architecture
//!
//! ```text
//! Orchestrators ──claims / confirms──→ HyperionApi ──→ HyperionService
//!                                                          │
//!                         ┌───────────────┬────────────────┼──────────────┐
//!                   AttestationTally  OutgoingTxPool  BatchBuilder  ValsetRegistry
//!                         │                                │
//!                 AttestationHandler ──withdraw────────────┘
//!                         │
//!                         └──→ BridgeStore / BankKeeper / StakingKeeper / EventSink
//! ```
//!
//! ## Error Codes
//!
//! | Error | Code |
//! |-------|------|
//! | Internal, Bank, Staking | 1 |
//! | Duplicate | 2 |
//! | Invalid | 3 |
//! | Timeout | 4 |
//! | Unknown | 5 |
//! | Empty | 6 |
//! | NoUnbatchedTxsFound | 10 |
//! | ResetDelegateKeys | 11 |
//! | SupplyOverflow | 12 |
//! | InvalidEthSender | 13 |
//! | InvalidEthDestination | 14 |
//! | InvalidSigner | 18 |
//!
//! ## Example
//!
//! ```rust,ignore
//! use hyperion_bridge::{BridgeParams, HyperionService, HyperionApi};
//!
//! let service = HyperionService::new(params, store, staking, bank, events)?;
//! service.deposit_claim(ctx, header, claim)?;
//! service.end_block(ctx)?;
//! ```

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    AccAddress, Attestation, BatchConfirm, BlockContext, BridgeParams, BridgeValidator, Claim,
    ClaimPayload, ClaimType, Coin, CounterpartyChainParams, DepositClaim, Erc20DeployedClaim,
    EthAddress, EthSignature, Hash, HyperionId, OutgoingTx, OutgoingTxBatch, SlashFraction,
    TokenPair, ValAddress, Valset, ValsetConfirm, ValsetUpdatedClaim, WithdrawClaim,
};
pub use error::{BridgeError, BridgeResult};
pub use events::{BridgeEvent, SlashReason};
pub use ports::{
    BankKeeper, BridgeStore, ClaimHeader, DistributionKeeper, EventSink, EvidenceSubject,
    HyperionApi, MsgConfirmBatch, MsgValsetConfirm, StakingKeeper,
};
pub use service::HyperionService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
