//! In-memory adapters for every outbound port

pub mod bank;
pub mod event_sink;
pub mod memory_store;
pub mod staking;

pub use bank::InMemoryBank;
pub use event_sink::RecordingEventSink;
pub use memory_store::InMemoryBridgeStore;
pub use staking::{InMemoryStaking, SlashRecord};
