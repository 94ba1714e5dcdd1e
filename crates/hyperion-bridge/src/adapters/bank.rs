//! In-memory bank and distribution keepers
//!
//! The bridge module account is modelled as a separate balance table.

use crate::domain::{AccAddress, Coin, DenomMetadata};
use crate::error::{BridgeError, BridgeResult};
use crate::ports::{BankKeeper, DistributionKeeper};
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct BankState {
    accounts: BTreeMap<(AccAddress, String), U256>,
    module: BTreeMap<String, U256>,
    supply: BTreeMap<String, U256>,
    metadata: BTreeMap<String, DenomMetadata>,
    community_pool: BTreeMap<String, U256>,
    /// Receivers the bank refuses to credit.
    blocked: BTreeSet<AccAddress>,
}

/// Balances, supply and denom metadata, plus the community pool.
#[derive(Default)]
pub struct InMemoryBank {
    state: RwLock<BankState>,
}

fn debit(balance: &mut U256, coin: &Coin, who: &str) -> BridgeResult<()> {
    let current = *balance;
    *balance = current.checked_sub(coin.amount).ok_or_else(|| {
        BridgeError::Bank(format!(
            "insufficient funds: {who} has {current}{}, needs {coin}",
            coin.denom
        ))
    })?;
    Ok(())
}

fn credit(balance: &mut U256, coin: &Coin) -> BridgeResult<()> {
    let current = *balance;
    *balance = current
        .checked_add(coin.amount)
        .ok_or_else(|| BridgeError::Bank(format!("balance overflow crediting {coin}")))?;
    Ok(())
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `coin` straight into `account`, as genesis would.
    pub fn fund(&self, account: &AccAddress, coin: &Coin) -> BridgeResult<()> {
        let mut state = self.state.write();
        let supply = state.supply.entry(coin.denom.clone()).or_default();
        credit(supply, coin)?;
        let balance = state
            .accounts
            .entry((account.clone(), coin.denom.clone()))
            .or_default();
        credit(balance, coin)
    }

    pub fn module_balance(&self, denom: &str) -> U256 {
        self.state.read().module.get(denom).copied().unwrap_or_default()
    }

    pub fn community_pool(&self, denom: &str) -> U256 {
        self.state
            .read()
            .community_pool
            .get(denom)
            .copied()
            .unwrap_or_default()
    }

    /// Makes every transfer to `account` fail.
    pub fn block_receiver(&self, account: AccAddress) {
        self.state.write().blocked.insert(account);
    }
}

impl BankKeeper for InMemoryBank {
    fn balance(&self, account: &AccAddress, denom: &str) -> U256 {
        self.state
            .read()
            .accounts
            .get(&(account.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn supply(&self, denom: &str) -> U256 {
        self.state.read().supply.get(denom).copied().unwrap_or_default()
    }

    fn mint(&self, coin: &Coin) -> BridgeResult<()> {
        let mut state = self.state.write();
        let mut supply = state.supply.get(&coin.denom).copied().unwrap_or_default();
        let mut module = state.module.get(&coin.denom).copied().unwrap_or_default();
        credit(&mut supply, coin)?;
        credit(&mut module, coin)?;
        state.supply.insert(coin.denom.clone(), supply);
        state.module.insert(coin.denom.clone(), module);
        Ok(())
    }

    fn burn(&self, coin: &Coin) -> BridgeResult<()> {
        let mut state = self.state.write();
        let mut supply = state.supply.get(&coin.denom).copied().unwrap_or_default();
        let mut module = state.module.get(&coin.denom).copied().unwrap_or_default();
        debit(&mut module, coin, "bridge module")?;
        debit(&mut supply, coin, "supply")?;
        state.supply.insert(coin.denom.clone(), supply);
        state.module.insert(coin.denom.clone(), module);
        Ok(())
    }

    fn send_to_module(&self, from: &AccAddress, coin: &Coin) -> BridgeResult<()> {
        let mut state = self.state.write();
        let key = (from.clone(), coin.denom.clone());
        let mut balance = state.accounts.get(&key).copied().unwrap_or_default();
        let mut module = state.module.get(&coin.denom).copied().unwrap_or_default();
        debit(&mut balance, coin, from.as_str())?;
        credit(&mut module, coin)?;
        state.accounts.insert(key, balance);
        state.module.insert(coin.denom.clone(), module);
        Ok(())
    }

    fn send_from_module(&self, to: &AccAddress, coin: &Coin) -> BridgeResult<()> {
        let mut state = self.state.write();
        if state.blocked.contains(to) {
            return Err(BridgeError::Bank(format!("{to} is not allowed to receive funds")));
        }
        let key = (to.clone(), coin.denom.clone());
        let mut module = state.module.get(&coin.denom).copied().unwrap_or_default();
        let mut balance = state.accounts.get(&key).copied().unwrap_or_default();
        debit(&mut module, coin, "bridge module")?;
        credit(&mut balance, coin)?;
        state.module.insert(coin.denom.clone(), module);
        state.accounts.insert(key, balance);
        Ok(())
    }

    fn denom_metadata(&self, denom: &str) -> Option<DenomMetadata> {
        self.state.read().metadata.get(denom).cloned()
    }

    fn set_denom_metadata(&self, metadata: DenomMetadata) {
        self.state
            .write()
            .metadata
            .insert(metadata.base.clone(), metadata);
    }
}

impl DistributionKeeper for InMemoryBank {
    fn fund_community_pool(&self, coin: &Coin) -> BridgeResult<()> {
        let mut state = self.state.write();
        let mut module = state.module.get(&coin.denom).copied().unwrap_or_default();
        let mut pool = state
            .community_pool
            .get(&coin.denom)
            .copied()
            .unwrap_or_default();
        debit(&mut module, coin, "bridge module")?;
        credit(&mut pool, coin)?;
        state.module.insert(coin.denom.clone(), module);
        state.community_pool.insert(coin.denom.clone(), pool);
        Ok(())
    }
}
