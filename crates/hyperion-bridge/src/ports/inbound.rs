//! Driving Ports (API - Inbound)
//!
//! One method per bridge message plus the end-of-block hook. Hosts decode
//! their transactions into these message structs and route them here.

use crate::domain::{
    AccAddress, BlockContext, Coin, DepositClaim, Erc20DeployedClaim, EthAddress, HyperionId,
    OutgoingTxBatch, ValAddress, Valset, ValsetUpdatedClaim, WithdrawClaim,
};
use crate::error::BridgeResult;
use serde::{Deserialize, Serialize};

/// Fields shared by every claim message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimHeader {
    pub hyperion_id: HyperionId,
    pub event_nonce: u64,
    /// Counterparty block the event was seen at.
    pub block_height: u64,
    pub orchestrator: AccAddress,
}

/// Orchestrator signature over a valset checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgValsetConfirm {
    pub hyperion_id: HyperionId,
    pub nonce: u64,
    pub orchestrator: AccAddress,
    /// Hex encoded `r || s || v`, with or without `0x`.
    pub signature: String,
}

/// Orchestrator signature over a batch checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConfirmBatch {
    pub hyperion_id: HyperionId,
    pub nonce: u64,
    pub token_contract: EthAddress,
    pub orchestrator: AccAddress,
    /// Hex encoded `r || s || v`, with or without `0x`.
    pub signature: String,
}

/// What a bad-signature evidence claims was signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceSubject {
    Valset(Valset),
    Batch(OutgoingTxBatch),
}

/// Driving port of the bridge.
pub trait HyperionApi: Send + Sync {
    /// Claims a deposit into the counterparty bridge contract.
    fn deposit_claim(
        &self,
        ctx: BlockContext,
        header: ClaimHeader,
        claim: DepositClaim,
    ) -> BridgeResult<()>;

    /// Claims the execution of an outgoing batch.
    fn withdraw_claim(
        &self,
        ctx: BlockContext,
        header: ClaimHeader,
        claim: WithdrawClaim,
    ) -> BridgeResult<()>;

    /// Claims the deployment of a representation contract for a host denom.
    fn erc20_deployed_claim(
        &self,
        ctx: BlockContext,
        header: ClaimHeader,
        claim: Erc20DeployedClaim,
    ) -> BridgeResult<()>;

    /// Claims a validator set update on the counterparty contract.
    fn valset_updated_claim(
        &self,
        ctx: BlockContext,
        header: ClaimHeader,
        claim: ValsetUpdatedClaim,
    ) -> BridgeResult<()>;

    /// Queues a withdrawal; returns the pool tx id.
    fn send_to_chain(
        &self,
        ctx: BlockContext,
        sender: AccAddress,
        hyperion_id: HyperionId,
        dest: EthAddress,
        amount: Coin,
        fee: Coin,
    ) -> BridgeResult<u64>;

    /// Removes an unbatched withdrawal and refunds it.
    fn cancel_send_to_chain(
        &self,
        ctx: BlockContext,
        sender: AccAddress,
        hyperion_id: HyperionId,
        tx_id: u64,
    ) -> BridgeResult<()>;

    /// Builds a batch for the token behind `denom`.
    fn request_batch(
        &self,
        ctx: BlockContext,
        orchestrator: AccAddress,
        hyperion_id: HyperionId,
        denom: &str,
    ) -> BridgeResult<OutgoingTxBatch>;

    fn confirm_batch(&self, ctx: BlockContext, msg: MsgConfirmBatch) -> BridgeResult<()>;

    fn valset_confirm(&self, ctx: BlockContext, msg: MsgValsetConfirm) -> BridgeResult<()>;

    /// Registers the delegate keys of a validator, once.
    fn set_orchestrator_addresses(
        &self,
        ctx: BlockContext,
        validator: ValAddress,
        orchestrator: AccAddress,
        eth_address: EthAddress,
        hyperion_id: HyperionId,
    ) -> BridgeResult<()>;

    /// Slashes the signer of a checkpoint this chain never produced.
    fn submit_bad_signature_evidence(
        &self,
        ctx: BlockContext,
        hyperion_id: HyperionId,
        subject: EvidenceSubject,
        signature: String,
    ) -> BridgeResult<()>;

    /// End-of-block processing for every configured chain.
    fn end_block(&self, ctx: BlockContext) -> BridgeResult<()>;
}
