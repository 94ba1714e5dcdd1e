//! Fixtures shared by the service tests

use crate::adapters::{InMemoryBank, InMemoryBridgeStore, InMemoryStaking, RecordingEventSink};
use crate::algorithms::address_from_key;
use crate::domain::{
    AccAddress, BridgeParams, Claim, ClaimPayload, CounterpartyChainParams, DepositClaim,
    EthAddress, HyperionId, TokenPair, ValAddress,
};
use crate::ports::{TokenStore, ValsetStore};
use k256::ecdsa::SigningKey;
use primitive_types::U256;
use std::sync::Arc;

pub(crate) const HID: HyperionId = 1;
pub(crate) const FEE_DENOM: &str = "ahelios";

pub(crate) fn val_addr(n: u8) -> ValAddress {
    ValAddress::from_bytes("heliosvaloper", &[n; 20]).unwrap()
}

pub(crate) fn orch_addr(n: u8) -> AccAddress {
    let mut bytes = [0xee; 20];
    bytes[0] = n;
    AccAddress::from_bytes("helios", &bytes).unwrap()
}

pub(crate) fn user(n: u8) -> AccAddress {
    let mut bytes = [0xaa; 20];
    bytes[0] = n;
    AccAddress::from_bytes("helios", &bytes).unwrap()
}

/// Deterministic secp256k1 key; `n` must be non-zero.
pub(crate) fn signing_key(n: u8) -> SigningKey {
    SigningKey::from_slice(&[n; 32]).unwrap()
}

pub(crate) fn eth_of(n: u8) -> EthAddress {
    address_from_key(signing_key(n).verifying_key())
}

pub(crate) fn token(n: u8) -> EthAddress {
    EthAddress([n; 20])
}

pub(crate) fn deposit_claim(orchestrator: u8, nonce: u64, amount: u64, receiver: &AccAddress) -> Claim {
    Claim {
        hyperion_id: HID,
        event_nonce: nonce,
        block_height: 1_000 + nonce,
        orchestrator: orch_addr(orchestrator),
        payload: ClaimPayload::Deposit(DepositClaim {
            token_contract: token(0xd0),
            amount: U256::from(amount),
            ethereum_sender: "0x00000000000000000000000000000000000000e1".into(),
            cosmos_receiver: receiver.to_string(),
            token_metadata: None,
        }),
    }
}

pub(crate) struct Fixture {
    pub params: Arc<BridgeParams>,
    pub store: Arc<InMemoryBridgeStore>,
    pub staking: Arc<InMemoryStaking>,
    pub bank: Arc<InMemoryBank>,
    pub events: Arc<RecordingEventSink>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_chain(CounterpartyChainParams::with_hyperion_id(HID))
    }

    pub fn with_chain(chain: CounterpartyChainParams) -> Self {
        Self {
            params: Arc::new(BridgeParams::default().with_chain(chain)),
            store: Arc::new(InMemoryBridgeStore::new()),
            staking: Arc::new(InMemoryStaking::new()),
            bank: Arc::new(InMemoryBank::new()),
            events: Arc::new(RecordingEventSink::new()),
        }
    }

    /// Bonded validator `n` with its orchestrator and eth key registered.
    pub fn add_validator(&self, n: u8, power: u64) {
        self.staking.add_validator(val_addr(n), power, 0);
        self.store
            .set_orchestrator_validator(HID, &orch_addr(n), &val_addr(n));
        self.store.set_eth_address(HID, &val_addr(n), eth_of(n));
    }

    pub fn register_token(&self, denom: &str, contract: EthAddress, cosmos_originated: bool) {
        self.store.set_token(TokenPair {
            hyperion_id: HID,
            denom: denom.to_string(),
            token_contract: contract,
            cosmos_originated,
            decimals: 18,
        });
    }
}
