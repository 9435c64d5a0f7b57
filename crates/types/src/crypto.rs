//! Recoverable secp256k1 signatures and key pairs.
//!
//! The sender of a transaction is never carried on the wire: it is recovered
//! from the signature and the signing digest. The digest folds in the chain
//! identifier, so a signature produced for one network recovers to a key that
//! fails verification on another and the transaction is rejected at the
//! signature step.

use crate::{Address, Hash, ADDRESS_LEN};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Errors from signing and sender recovery.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The signature bytes do not form a valid secp256k1 signature.
    #[error("malformed signature")]
    Malformed,

    /// The recovery byte is out of range.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// No public key could be recovered for this digest/signature pair.
    #[error("signature does not recover a sender")]
    RecoveryFailed,

    /// Signing failed (invalid key material).
    #[error("signing failed")]
    SigningFailed,
}

/// A recoverable signature as carried on the wire: `(r, s, recovery id)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl TransactionSignature {
    /// Recover the signing public key from this signature over `digest`.
    pub fn recover(&self, digest: &Hash) -> Result<VerifyingKey, SignatureError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature =
            EcdsaSignature::from_slice(&rs).map_err(|_| SignatureError::Malformed)?;
        let recovery_id =
            RecoveryId::from_byte(self.v).ok_or(SignatureError::InvalidRecoveryId(self.v))?;
        VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)
    }

    /// Recover the sender address from this signature over `digest`.
    pub fn recover_address(&self, digest: &Hash) -> Result<Address, SignatureError> {
        Ok(address_of(&self.recover(digest)?))
    }
}

/// Derive an address from a public key: last 20 bytes of SHA3-256 over the
/// uncompressed point (without the SEC1 tag byte).
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = Sha3_256::digest(&point.as_bytes()[1..]);
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
    Address(bytes)
}

/// A secp256k1 key pair for signing transactions.
#[derive(Clone)]
pub struct KeyPair {
    key: SigningKey,
}

impl KeyPair {
    /// Generate a new key pair from OS entropy.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create a key pair from raw scalar bytes.
    ///
    /// Returns `None` if the bytes are not a valid secp256k1 scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        SigningKey::from_slice(bytes).ok().map(|key| Self { key })
    }

    /// The address of this key pair.
    pub fn address(&self) -> Address {
        address_of(self.key.verifying_key())
    }

    /// Sign a 32-byte digest, producing a recoverable signature.
    pub fn sign_digest(&self, digest: &Hash) -> Result<TransactionSignature, SignatureError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| SignatureError::SigningFailed)?;
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(TransactionSignature {
            r,
            s,
            v: recovery_id.to_byte(),
        })
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_recover_round_trip() {
        let key = KeyPair::generate();
        let digest = Hash::digest(b"payload");

        let signature = key.sign_digest(&digest).unwrap();
        let recovered = signature.recover_address(&digest).unwrap();

        assert_eq!(recovered, key.address());
    }

    #[test]
    fn test_recovery_over_different_digest_gives_different_sender() {
        let key = KeyPair::generate();
        let signature = key.sign_digest(&Hash::digest(b"network-1")).unwrap();

        // Recovery either fails outright or yields some other address.
        match signature.recover_address(&Hash::digest(b"network-2")) {
            Ok(addr) => assert_ne!(addr, key.address()),
            Err(_) => {}
        }
    }

    #[test]
    fn test_invalid_recovery_byte_is_rejected() {
        let key = KeyPair::generate();
        let digest = Hash::digest(b"payload");
        let mut signature = key.sign_digest(&digest).unwrap();
        signature.v = 27;

        assert!(matches!(
            signature.recover(&digest),
            Err(SignatureError::InvalidRecoveryId(27))
        ));
    }

    #[test]
    fn test_address_is_stable_for_a_key() {
        let key = KeyPair::from_bytes(&[0x11; 32]).unwrap();
        assert_eq!(key.address(), key.address());
    }
}
