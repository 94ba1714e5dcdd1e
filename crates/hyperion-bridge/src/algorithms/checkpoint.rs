//! Checkpoint hashes signed by orchestrators
//!
//! These must match the bridge contract byte for byte:
//!
//! ```text
//! valset: keccak256(abi.encode(bytes32 hyperionId, bytes32 "checkpoint", uint256 nonce,
//!                              address[] members, uint256[] powers,
//!                              uint256 rewardAmount, address rewardToken))
//! batch:  keccak256(abi.encode(bytes32 hyperionId, bytes32 "transactionBatch", uint256 nonce,
//!                              address token, uint256[] amounts, address[] destinations,
//!                              uint256[] fees, uint256 timeout))
//! ```

use super::abi::{self, AbiToken};
use crate::domain::{Hash, HyperionId, OutgoingTxBatch, Valset};
use sha3::{Digest, Keccak256};

const VALSET_METHOD: &str = "checkpoint";
const BATCH_METHOD: &str = "transactionBatch";

pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Checkpoint of a validator set under the given hyperion id.
pub fn valset_checkpoint(valset: &Valset, hyperion_id: HyperionId) -> Hash {
    let members = valset
        .members
        .iter()
        .map(|m| abi::address_word(&m.eth_address))
        .collect();
    let powers = valset
        .members
        .iter()
        .map(|m| abi::u64_word(m.power))
        .collect();

    let encoded = abi::encode(&[
        AbiToken::Word(abi::u64_word(hyperion_id)),
        AbiToken::Word(abi::bytes32_word(VALSET_METHOD)),
        AbiToken::Word(abi::u64_word(valset.nonce)),
        AbiToken::Array(members),
        AbiToken::Array(powers),
        AbiToken::Word(abi::uint_word(valset.reward_amount)),
        AbiToken::Word(abi::address_word(&valset.reward_token)),
    ]);
    keccak256(&encoded)
}

/// Checkpoint of an outgoing batch under the given hyperion id.
pub fn batch_checkpoint(batch: &OutgoingTxBatch, hyperion_id: HyperionId) -> Hash {
    let txs = &batch.transactions;
    let amounts = txs.iter().map(|tx| abi::uint_word(tx.amount)).collect();
    let destinations = txs
        .iter()
        .map(|tx| abi::address_word(&tx.dest_address))
        .collect();
    let fees = txs.iter().map(|tx| abi::uint_word(tx.fee)).collect();

    let encoded = abi::encode(&[
        AbiToken::Word(abi::u64_word(hyperion_id)),
        AbiToken::Word(abi::bytes32_word(BATCH_METHOD)),
        AbiToken::Word(abi::u64_word(batch.batch_nonce)),
        AbiToken::Word(abi::address_word(&batch.token_contract)),
        AbiToken::Array(amounts),
        AbiToken::Array(destinations),
        AbiToken::Array(fees),
        AbiToken::Word(abi::u64_word(batch.batch_timeout)),
    ]);
    keccak256(&encoded)
}
