//! Signed transactions and their canonical wire encoding.

use crate::{u256_serde, Address, Hash, KeyPair, SignatureError, TransactionSignature, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum encoded transaction size accepted into the mempool, in bytes.
pub const MAX_TX_SIZE: usize = 32_768;

/// Errors from the wire codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload does not decode as a transaction.
    #[error("malformed transaction encoding: {0}")]
    Malformed(String),
}

/// A signed transaction as submitted by clients and ordered by consensus.
///
/// The sender is not a field: it is recovered from `signature` over the
/// signing digest, which folds in the chain identifier for replay protection
/// across networks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Sender's next nonce; strictly `account nonce + 1`.
    pub nonce: u64,

    /// Recipient. `None` means contract creation.
    pub to: Option<Address>,

    /// Amount transferred to the recipient.
    #[serde(with = "u256_serde")]
    pub value: U256,

    /// Maximum gas this transaction may consume.
    pub gas_limit: u64,

    /// Price per unit of gas, charged against the sender's balance.
    pub gas_price: u64,

    /// Opaque payload, interpreted by the execution engine.
    pub data: Vec<u8>,

    /// Recoverable signature over the signing digest.
    pub signature: TransactionSignature,
}

impl SignedTransaction {
    /// Build and sign a transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn sign(
        key: &KeyPair,
        chain_id: u64,
        nonce: u64,
        to: Option<Address>,
        value: U256,
        gas_limit: u64,
        gas_price: u64,
        data: Vec<u8>,
    ) -> Result<Self, SignatureError> {
        let digest = signing_digest(chain_id, nonce, to.as_ref(), &value, gas_limit, gas_price, &data);
        let signature = key.sign_digest(&digest)?;
        Ok(Self {
            nonce,
            to,
            value,
            gas_limit,
            gas_price,
            data,
            signature,
        })
    }

    /// Encode to the canonical wire form.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("transaction should be encodable")
    }

    /// Decode from the wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    /// The digest this transaction's signature commits to on `chain_id`.
    pub fn signing_digest(&self, chain_id: u64) -> Hash {
        signing_digest(
            chain_id,
            self.nonce,
            self.to.as_ref(),
            &self.value,
            self.gas_limit,
            self.gas_price,
            &self.data,
        )
    }

    /// Recover the sender address for `chain_id`.
    ///
    /// Fails if the signature is malformed or was produced over a different
    /// digest (including the same fields signed for another chain).
    pub fn recover_sender(&self, chain_id: u64) -> Result<Address, SignatureError> {
        self.signature.recover_address(&self.signing_digest(chain_id))
    }

    /// Content hash: canonical fields plus `r` and `s`, excluding the
    /// recovery byte.
    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hash_fields(
            &mut hasher,
            self.nonce,
            self.to.as_ref(),
            &self.value,
            self.gas_limit,
            self.gas_price,
            &self.data,
        );
        hasher.update(&self.signature.r);
        hasher.update(&self.signature.s);
        Hash::from_hasher(hasher)
    }

    /// Total funds the sender must hold: `value + gas_limit * gas_price`.
    ///
    /// Returns `None` when the sum overflows 256 bits. Such a cost exceeds
    /// any representable balance, so callers reject it as unfunded rather
    /// than computing with a wrapped value.
    pub fn cost(&self) -> Option<U256> {
        let gas = U256::from(self.gas_limit).checked_mul(U256::from(self.gas_price))?;
        self.value.checked_add(gas)
    }

    /// Whether this transaction creates a contract (no recipient).
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

fn signing_digest(
    chain_id: u64,
    nonce: u64,
    to: Option<&Address>,
    value: &U256,
    gas_limit: u64,
    gas_price: u64,
    data: &[u8],
) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&chain_id.to_le_bytes());
    hash_fields(&mut hasher, nonce, to, value, gas_limit, gas_price, data);
    Hash::from_hasher(hasher)
}

fn hash_fields(
    hasher: &mut blake3::Hasher,
    nonce: u64,
    to: Option<&Address>,
    value: &U256,
    gas_limit: u64,
    gas_price: u64,
    data: &[u8],
) {
    hasher.update(&nonce.to_le_bytes());
    match to {
        Some(addr) => {
            hasher.update(&[1]);
            hasher.update(addr.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
    let mut value_bytes = [0u8; 32];
    value.to_big_endian(&mut value_bytes);
    hasher.update(&value_bytes);
    hasher.update(&gas_limit.to_le_bytes());
    hasher.update(&gas_price.to_le_bytes());
    hasher.update(&(data.len() as u64).to_le_bytes());
    hasher.update(data);
}
