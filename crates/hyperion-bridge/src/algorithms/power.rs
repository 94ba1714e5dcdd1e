//! Voting power arithmetic
//!
//! Integer only; every node must land on the same answer.

/// Smallest power that is at least two thirds of `total`.
pub fn supermajority_threshold(total: u64) -> u64 {
    ((total as u128 * 2).div_ceil(3)) as u64
}

/// True when `power` reaches two thirds of a non-empty `total`.
pub fn has_supermajority(power: u64, total: u64) -> bool {
    total > 0 && power >= supermajority_threshold(total)
}

/// Scales `power` into the contract's `u32::MAX` power space.
pub fn normalize_power(power: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((power as u128 * u32::MAX as u128) / total as u128) as u64
}
