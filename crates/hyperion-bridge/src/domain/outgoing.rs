//! Outgoing withdrawals and the batches that carry them

use super::value_objects::{AccAddress, EthAddress, HyperionId};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A user withdrawal waiting to be relayed to the counterparty chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTx {
    pub id: u64,
    pub hyperion_id: HyperionId,
    pub sender: AccAddress,
    pub dest_address: EthAddress,
    pub token_contract: EthAddress,
    pub amount: U256,
    /// Paid in the native fee denom; ordering key for batch selection.
    pub fee: U256,
    /// Projected counterparty height after which the tx is refunded.
    pub tx_timeout: u64,
}

/// Fee-ordered group of withdrawals for a single token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTxBatch {
    pub hyperion_id: HyperionId,
    pub batch_nonce: u64,
    /// Counterparty height after which the batch can no longer execute.
    pub batch_timeout: u64,
    pub token_contract: EthAddress,
    pub transactions: Vec<OutgoingTx>,
    /// Host-chain height the batch was built at.
    pub block: u64,
    pub executed: bool,
}

impl OutgoingTxBatch {
    /// Sum of fees, saturating at `U256::MAX`.
    pub fn total_fees(&self) -> U256 {
        self.transactions
            .iter()
            .fold(U256::zero(), |acc, tx| acc.saturating_add(tx.fee))
    }

    pub fn tx_ids(&self) -> Vec<u64> {
        self.transactions.iter().map(|tx| tx.id).collect()
    }
}

/// Terminal state of an outgoing transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Executed on the counterparty chain.
    Bridged,
    /// Cancelled by the sender or timed out, funds returned.
    Refunded,
}

/// Archive entry for an outgoing transfer that left the pool for good.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub hyperion_id: HyperionId,
    pub tx_id: u64,
    pub sender: AccAddress,
    pub dest_address: EthAddress,
    pub token_contract: EthAddress,
    pub amount: U256,
    pub fee: U256,
    pub status: TransferStatus,
    pub height: u64,
}

impl TransferRecord {
    pub fn from_tx(tx: &OutgoingTx, status: TransferStatus, height: u64) -> Self {
        Self {
            hyperion_id: tx.hyperion_id,
            tx_id: tx.id,
            sender: tx.sender.clone(),
            dest_address: tx.dest_address,
            token_contract: tx.token_contract,
            amount: tx.amount,
            fee: tx.fee,
            status,
            height,
        }
    }
}
