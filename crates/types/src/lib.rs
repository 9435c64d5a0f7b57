//! Core types for the Ledgermint application state machine.
//!
//! This crate provides the foundational types used throughout the
//! implementation:
//!
//! - **Primitives**: Hash, Address, U256 serialization helpers
//! - **Crypto**: recoverable secp256k1 key pairs and signatures
//! - **Wire types**: SignedTransaction and its canonical encoding
//! - **Block artifacts**: Receipt, Log, log bloom
//! - **Status codes**: the result codes reported to the consensus engine
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod address;
mod crypto;
mod hash;
mod receipt;
mod status;
mod transaction;

pub mod u256_serde;

pub use address::{Address, ADDRESS_LEN};
pub use crypto::{KeyPair, SignatureError, TransactionSignature};
pub use hash::Hash;
pub use receipt::{Bloom, Log, Receipt, BLOOM_LEN};
pub use status::StatusCode;
pub use transaction::{CodecError, SignedTransaction, MAX_TX_SIZE};

// Re-export the balance type so downstream crates agree on one U256.
pub use primitive_types::U256;

/// Test utilities.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;

    /// Create a deterministic test key pair from a seed byte.
    pub fn test_keypair(seed: u8) -> KeyPair {
        let mut bytes = [seed; 32];
        // Keep the scalar in range for any seed, including zero.
        bytes[0] = 0x01;
        KeyPair::from_bytes(&bytes).expect("seeded scalar should be valid")
    }

    /// Create a test address from a seed byte.
    pub fn test_address(seed: u8) -> Address {
        Address::from([seed; ADDRESS_LEN])
    }

    /// Build and sign a transfer transaction for tests.
    #[allow(clippy::too_many_arguments)]
    pub fn signed_transfer(
        key: &KeyPair,
        chain_id: u64,
        nonce: u64,
        to: Address,
        value: u64,
        gas_limit: u64,
        gas_price: u64,
    ) -> SignedTransaction {
        SignedTransaction::sign(
            key,
            chain_id,
            nonce,
            Some(to),
            U256::from(value),
            gas_limit,
            gas_price,
            Vec::new(),
        )
        .expect("signing with a valid key should succeed")
    }
}
