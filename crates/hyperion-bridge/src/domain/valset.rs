//! Validator set snapshots mirrored on the counterparty chain

use super::value_objects::{EthAddress, HyperionId};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One signer of the bridge contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeValidator {
    pub eth_address: EthAddress,
    /// Normalized power, out of `u32::MAX`.
    pub power: u64,
}

/// Validator set snapshot.
///
/// Members are kept sorted by power descending, ties broken by address
/// ascending, which is the order the contract expects them in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valset {
    pub hyperion_id: HyperionId,
    pub nonce: u64,
    /// Host-chain height the snapshot was taken at.
    pub height: u64,
    pub members: Vec<BridgeValidator>,
    pub reward_amount: U256,
    pub reward_token: EthAddress,
}

impl Valset {
    pub fn new(
        hyperion_id: HyperionId,
        nonce: u64,
        height: u64,
        mut members: Vec<BridgeValidator>,
        reward_amount: U256,
        reward_token: EthAddress,
    ) -> Self {
        sort_members(&mut members);
        Self {
            hyperion_id,
            nonce,
            height,
            members,
            reward_amount,
            reward_token,
        }
    }

    pub fn total_power(&self) -> u64 {
        self.members.iter().map(|m| m.power).sum()
    }

    /// Distance between two power distributions, in basis points.
    ///
    /// Each side is normalized by its own total; the result is half the L1
    /// distance, so `500` means 5% of the voting power moved.
    pub fn power_diff_bps(&self, other: &Valset) -> u64 {
        power_diff_bps(&self.members, &other.members)
    }
}

pub(crate) fn sort_members(members: &mut [BridgeValidator]) {
    members.sort_by(|a, b| {
        b.power
            .cmp(&a.power)
            .then_with(|| a.eth_address.cmp(&b.eth_address))
    });
}

fn by_address(members: &[BridgeValidator]) -> (BTreeMap<EthAddress, u128>, u128) {
    let mut out = BTreeMap::new();
    let mut total = 0u128;
    for m in members {
        *out.entry(m.eth_address).or_insert(0) += m.power as u128;
        total += m.power as u128;
    }
    (out, total)
}

/// Half the L1 distance between normalized distributions, in basis points.
///
/// Integer only: `|pa/ta - pb/tb|` is evaluated as `|pa*tb - pb*ta| / (ta*tb)`.
pub fn power_diff_bps(a: &[BridgeValidator], b: &[BridgeValidator]) -> u64 {
    let (a, ta) = by_address(a);
    let (b, tb) = by_address(b);
    match (ta, tb) {
        (0, 0) => return 0,
        (0, _) | (_, 0) => return 10_000,
        _ => {}
    }
    let mut numerator = 0u128;
    for (addr, pa) in &a {
        let pb = b.get(addr).copied().unwrap_or(0);
        numerator += (pa * tb).abs_diff(pb * ta);
    }
    for (addr, pb) in &b {
        if !a.contains_key(addr) {
            numerator += pb * ta;
        }
    }
    (numerator * 10_000 / (2 * ta * tb)) as u64
}
