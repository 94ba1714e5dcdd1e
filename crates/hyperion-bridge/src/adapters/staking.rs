//! In-memory staking keeper

use crate::domain::{SlashFraction, ValAddress};
use crate::error::{BridgeError, BridgeResult};
use crate::ports::{StakingKeeper, ValidatorInfo};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// Slash applied through the port, kept for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashRecord {
    pub operator: ValAddress,
    pub height: u64,
    pub fraction: SlashFraction,
    pub slashed: u64,
}

/// Validator table with mutable power and status.
#[derive(Default)]
pub struct InMemoryStaking {
    validators: RwLock<BTreeMap<ValAddress, ValidatorInfo>>,
    slashes: RwLock<Vec<SlashRecord>>,
}

impl InMemoryStaking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bonded, unjailed validator.
    pub fn add_validator(&self, operator: ValAddress, power: u64, start_height: u64) {
        let info = ValidatorInfo {
            operator: operator.clone(),
            power,
            bonded: true,
            jailed: false,
            start_height,
        };
        self.validators.write().insert(operator, info);
    }

    pub fn set_power(&self, operator: &ValAddress, power: u64) {
        if let Some(v) = self.validators.write().get_mut(operator) {
            v.power = power;
        }
    }

    pub fn set_jailed(&self, operator: &ValAddress, jailed: bool) {
        if let Some(v) = self.validators.write().get_mut(operator) {
            v.jailed = jailed;
        }
    }

    pub fn set_bonded(&self, operator: &ValAddress, bonded: bool) {
        if let Some(v) = self.validators.write().get_mut(operator) {
            v.bonded = bonded;
        }
    }

    pub fn slashes(&self) -> Vec<SlashRecord> {
        self.slashes.read().clone()
    }
}

impl StakingKeeper for InMemoryStaking {
    fn validator(&self, operator: &ValAddress) -> Option<ValidatorInfo> {
        self.validators.read().get(operator).cloned()
    }

    fn bonded_validators(&self) -> Vec<ValidatorInfo> {
        let mut bonded: Vec<ValidatorInfo> = self
            .validators
            .read()
            .values()
            .filter(|v| v.bonded)
            .cloned()
            .collect();
        bonded.sort_by(|a, b| b.power.cmp(&a.power).then_with(|| a.operator.cmp(&b.operator)));
        bonded
    }

    fn slash(&self, operator: &ValAddress, height: u64, fraction: SlashFraction) -> BridgeResult<u64> {
        let mut validators = self.validators.write();
        let validator = validators
            .get_mut(operator)
            .ok_or_else(|| BridgeError::Staking(format!("no validator {operator}")))?;
        let remaining = fraction.slash(validator.power);
        let slashed = validator.power - remaining;
        validator.power = remaining;
        drop(validators);

        debug!(%operator, height, slashed, "[hyperion] staking slash applied");
        self.slashes.write().push(SlashRecord {
            operator: operator.clone(),
            height,
            fraction,
            slashed,
        });
        Ok(slashed)
    }
}
