//! Pure algorithms: hashing, signatures, power math and selection.

pub mod abi;
pub mod checkpoint;
pub mod eth_signature;
pub mod power;
pub mod projection;
pub mod selection;

pub use checkpoint::{batch_checkpoint, keccak256, valset_checkpoint};
pub use eth_signature::{
    address_from_key, recover_checkpoint_signer, sign_checkpoint, signed_message_digest,
    validate_checkpoint_signature,
};
pub use power::{has_supermajority, normalize_power, supermajority_threshold};
pub use projection::projected_counterparty_height;
pub use selection::{select_by_fee, total_fees, FeeKey};
