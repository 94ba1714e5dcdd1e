//! Fee-ordered selection of pool transactions

use primitive_types::U256;
use std::cmp::{Ordering, Reverse};

/// Priority key of an unbatched tx: highest fee first, then lowest id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeeKey {
    pub fee: U256,
    pub id: u64,
}

impl FeeKey {
    pub fn new(fee: U256, id: u64) -> Self {
        Self { fee, id }
    }
}

impl Ord for FeeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (Reverse(self.fee), self.id).cmp(&(Reverse(other.fee), other.id))
    }
}

impl PartialOrd for FeeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// First `max` keys in priority order. Input must already be sorted, as a
/// `BTreeSet<FeeKey>` iterates.
pub fn select_by_fee<'a, I>(ordered: I, max: usize) -> Vec<FeeKey>
where
    I: IntoIterator<Item = &'a FeeKey>,
{
    ordered.into_iter().take(max).copied().collect()
}

/// Sum of fees, saturating.
pub fn total_fees<'a, I>(keys: I) -> U256
where
    I: IntoIterator<Item = &'a FeeKey>,
{
    keys.into_iter()
        .fold(U256::zero(), |acc, k| acc.saturating_add(k.fee))
}
