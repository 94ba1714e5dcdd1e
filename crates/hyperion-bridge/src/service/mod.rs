//! Application services
//!
//! Each component owns one slice of the bridge state machine. They share
//! the store and keeper handles, and [`HyperionService`] wires them behind
//! the [`HyperionApi`](crate::ports::HyperionApi) port.

pub mod attestation_handler;
pub mod attestation_tally;
pub mod batch_builder;
pub mod block_handler;
pub mod bridge;
pub mod confirmations;
pub mod evidence;
pub mod pool;
pub mod slashing;
pub mod valset_registry;

#[cfg(test)]
mod test_support;

pub use attestation_handler::AttestationHandler;
pub use attestation_tally::AttestationTally;
pub use batch_builder::BatchBuilder;
pub use block_handler::BlockHandler;
pub use bridge::HyperionService;
pub use confirmations::ConfirmationStore;
pub use evidence::SlashingEvidenceChecker;
pub use pool::OutgoingTxPool;
pub use slashing::ConfirmSlasher;
pub use valset_registry::ValsetRegistry;
