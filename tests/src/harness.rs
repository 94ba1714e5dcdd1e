//! # Test Harness
//!
//! A [`HyperionService`] over the in-memory adapters, plus deterministic
//! keys and addresses for validators, orchestrators and users.

use hyperion_bridge::adapters::{InMemoryBank, InMemoryBridgeStore, InMemoryStaking, RecordingEventSink};
use hyperion_bridge::algorithms::address_from_key;
use hyperion_bridge::domain::voucher_denom;
use hyperion_bridge::ports::TokenStore;
use hyperion_bridge::{
    AccAddress, BlockContext, BridgeParams, ClaimHeader, Coin, CounterpartyChainParams, EthAddress,
    HyperionApi, HyperionId, HyperionService, TokenPair, ValAddress,
};
use k256::ecdsa::SigningKey;
use std::sync::Arc;

pub const HID: HyperionId = 1;
pub const FEE_DENOM: &str = "ahelios";

pub type Service = HyperionService<InMemoryBridgeStore, InMemoryStaking, InMemoryBank, RecordingEventSink>;

pub fn val_addr(n: u8) -> ValAddress {
    ValAddress::from_bytes("heliosvaloper", &[n; 20]).expect("valid bech32")
}

pub fn orch_addr(n: u8) -> AccAddress {
    let mut bytes = [0xee; 20];
    bytes[0] = n;
    AccAddress::from_bytes("helios", &bytes).expect("valid bech32")
}

pub fn user(n: u8) -> AccAddress {
    let mut bytes = [0xaa; 20];
    bytes[0] = n;
    AccAddress::from_bytes("helios", &bytes).expect("valid bech32")
}

/// Ethereum key of validator `n`; `n` must be non-zero.
pub fn eth_key(n: u8) -> SigningKey {
    SigningKey::from_slice(&[n; 32]).expect("non-zero scalar")
}

pub fn eth_of(n: u8) -> EthAddress {
    address_from_key(eth_key(n).verifying_key())
}

pub fn contract(n: u8) -> EthAddress {
    EthAddress([n; 20])
}

pub struct Harness {
    pub store: Arc<InMemoryBridgeStore>,
    pub staking: Arc<InMemoryStaking>,
    pub bank: Arc<InMemoryBank>,
    pub events: Arc<RecordingEventSink>,
    pub service: Service,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_chain(CounterpartyChainParams::with_hyperion_id(HID))
    }

    pub fn with_chain(chain: CounterpartyChainParams) -> Self {
        let store = Arc::new(InMemoryBridgeStore::new());
        let staking = Arc::new(InMemoryStaking::new());
        let bank = Arc::new(InMemoryBank::new());
        let events = Arc::new(RecordingEventSink::new());
        let service = HyperionService::new(
            BridgeParams::default().with_chain(chain),
            store.clone(),
            staking.clone(),
            bank.clone(),
            events.clone(),
        )
        .expect("valid params");
        Self {
            store,
            staking,
            bank,
            events,
            service,
        }
    }

    /// Bonds validator `n` and registers its delegate keys through the API.
    pub fn add_validator(&self, n: u8, power: u64) {
        self.staking.add_validator(val_addr(n), power, 0);
        self.service
            .set_orchestrator_addresses(BlockContext::new(1), val_addr(n), orch_addr(n), eth_of(n), HID)
            .expect("fresh delegate keys");
    }

    pub fn header(&self, orchestrator: u8, event_nonce: u64) -> ClaimHeader {
        ClaimHeader {
            hyperion_id: HID,
            event_nonce,
            block_height: 10_000 + event_nonce,
            orchestrator: orch_addr(orchestrator),
        }
    }

    /// Maps a counterparty token to its voucher denom and returns the denom.
    pub fn register_voucher(&self, token_contract: EthAddress) -> String {
        let denom = voucher_denom(HID, &token_contract);
        self.store.set_token(TokenPair {
            hyperion_id: HID,
            denom: denom.clone(),
            token_contract,
            cosmos_originated: false,
            decimals: 18,
        });
        denom
    }

    pub fn fund(&self, account: &AccAddress, denom: &str, amount: u64) {
        self.bank
            .fund(account, &Coin::new(denom, amount))
            .expect("no overflow");
    }
}
