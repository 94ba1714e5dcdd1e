//! Ethereum-style signatures over checkpoints
//!
//! Orchestrators sign the EIP-191 digest of a checkpoint:
//! `keccak256("\x19Ethereum Signed Message:\n32" || checkpoint)`.

use super::checkpoint::keccak256;
use crate::domain::{EthAddress, EthSignature, Hash};
use crate::error::{BridgeError, BridgeResult};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// EIP-191 digest actually signed for a checkpoint.
pub fn signed_message_digest(checkpoint: &Hash) -> Hash {
    let mut preimage = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + 32);
    preimage.extend_from_slice(SIGNED_MESSAGE_PREFIX);
    preimage.extend_from_slice(checkpoint);
    keccak256(&preimage)
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> BridgeResult<RecoveryId> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(BridgeError::invalid(format!("signature recovery id {v}"))),
    };
    RecoveryId::try_from(id).map_err(|_| BridgeError::invalid(format!("signature recovery id {v}")))
}

/// Address derived from a public key: last 20 bytes of keccak256(x || y).
pub fn address_from_key(key: &VerifyingKey) -> EthAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    EthAddress(address)
}

/// Recovers the signer of a checkpoint.
pub fn recover_checkpoint_signer(
    checkpoint: &Hash,
    signature: &EthSignature,
) -> BridgeResult<EthAddress> {
    let recovery_id = parse_recovery_id(signature.0[64])?;
    let sig = Signature::from_slice(&signature.0[..64])
        .map_err(|_| BridgeError::invalid("malformed signature"))?;
    let digest = signed_message_digest(checkpoint);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| BridgeError::invalid("signature recovery failed"))?;
    Ok(address_from_key(&key))
}

/// Checks that `signature` over `checkpoint` was produced by `expected`.
pub fn validate_checkpoint_signature(
    checkpoint: &Hash,
    signature: &EthSignature,
    expected: &EthAddress,
) -> BridgeResult<()> {
    let signer = recover_checkpoint_signer(checkpoint, signature)?;
    if &signer != expected {
        return Err(BridgeError::invalid(format!(
            "signature verification failed: expected signer {expected}, recovered {signer}"
        )));
    }
    Ok(())
}

/// Signs a checkpoint the way an orchestrator does, with `v` in {27, 28}.
pub fn sign_checkpoint(key: &SigningKey, checkpoint: &Hash) -> BridgeResult<EthSignature> {
    let digest = signed_message_digest(checkpoint);
    let (sig, recid) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| BridgeError::Internal {
            reason: format!("signing failed: {e}"),
        })?;
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&sig.to_bytes());
    bytes[64] = recid.to_byte() + 27;
    Ok(EthSignature(bytes))
}
