//! Counterparty height projection
//!
//! The host chain has no view of the counterparty's clock, so timeouts are
//! set against a projection from the last observed event.

use crate::domain::{CounterpartyChainParams, LastObservedEthHeight};

/// Projected counterparty height at host height `current_height`.
///
/// Zero until both heights have been observed at least once.
pub fn projected_counterparty_height(
    last: &LastObservedEthHeight,
    current_height: u64,
    params: &CounterpartyChainParams,
) -> u64 {
    if last.cosmos_height == 0 || last.eth_height == 0 {
        return 0;
    }
    let elapsed_ms = current_height
        .saturating_sub(last.cosmos_height)
        .saturating_mul(params.average_block_time);
    elapsed_ms / params.average_counterparty_block_time.max(1) + last.eth_height
}
