//! Ports of the bridge
//!
//! `inbound` is what hosts call, `outbound` is what the bridge needs from them.

pub mod inbound;
pub mod outbound;

pub use inbound::{ClaimHeader, EvidenceSubject, HyperionApi, MsgConfirmBatch, MsgValsetConfirm};
pub use outbound::{
    AttestationStore, BankKeeper, BatchStore, BridgeStore, CheckpointStore, ConfirmStore,
    DistributionKeeper, EventSink, PoolStore, StakingKeeper, TokenStore, ValidatorInfo,
    ValsetStore,
};
