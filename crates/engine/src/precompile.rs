//! Address-keyed precompiled capabilities.
//!
//! Special-purpose handlers live in an explicit map built at initialization
//! time and handed to the engine constructor. There is no global registry:
//! two engines with different precompile sets are simply two different
//! engines.

use ledgermint_types::{Address, ADDRESS_LEN};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from precompile execution. A failing precompile reverts the
/// calling transaction; it never excludes it from the block.
#[derive(Debug, Error)]
pub enum PrecompileError {
    /// The input does not satisfy the precompile's contract.
    #[error("precompile rejected input: {0}")]
    Rejected(String),
}

/// A fixed-function capability reachable at a well-known address.
pub trait Precompile: Send + Sync {
    /// Gas charged for running this precompile over `input`.
    fn gas_cost(&self, input: &[u8]) -> u64;

    /// Run the precompile.
    fn compute(&self, input: &[u8]) -> Result<Vec<u8>, PrecompileError>;
}

/// Initialization-time mapping from address to capability.
#[derive(Default)]
pub struct PrecompileSet {
    handlers: BTreeMap<Address, Box<dyn Precompile>>,
}

impl PrecompileSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set: [`WordReverse`] at address `0x00..ff`.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.register(WordReverse::ADDRESS, Box::new(WordReverse));
        set
    }

    /// Register a capability. Later registrations at the same address win.
    pub fn register(&mut self, address: Address, handler: Box<dyn Precompile>) {
        self.handlers.insert(address, handler);
    }

    /// Look up the capability at `address`.
    pub fn get(&self, address: &Address) -> Option<&dyn Precompile> {
        self.handlers.get(address).map(|h| h.as_ref())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.handlers.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for PrecompileSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrecompileSet")
            .field("addresses", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reverses the order of the 32-byte words of its input.
///
/// Input must be a multiple of 32 bytes; anything else is rejected and
/// reverts the caller.
pub struct WordReverse;

impl WordReverse {
    /// Well-known address: zero padded, last byte 0xff.
    pub const ADDRESS: Address = Address({
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 1] = 0xff;
        bytes
    });

    const WORD: usize = 32;
}

impl Precompile for WordReverse {
    fn gas_cost(&self, _input: &[u8]) -> u64 {
        100
    }

    fn compute(&self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        if input.len() % Self::WORD != 0 {
            return Err(PrecompileError::Rejected(
                "input must be a multiple of 32 bytes".into(),
            ));
        }
        let mut output = Vec::with_capacity(input.len());
        for word in input.chunks(Self::WORD).rev() {
            output.extend_from_slice(word);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_resolves_word_reverse() {
        let set = PrecompileSet::builtin();
        assert!(set.contains(&WordReverse::ADDRESS));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_word_reverse_reverses_words() {
        let mut input = vec![0u8; 64];
        input[0] = 0xaa; // first word
        input[32] = 0xbb; // second word

        let output = WordReverse.compute(&input).unwrap();
        assert_eq!(output[0], 0xbb);
        assert_eq!(output[32], 0xaa);
    }

    #[test]
    fn test_word_reverse_rejects_ragged_input() {
        assert!(WordReverse.compute(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_word_reverse_accepts_empty_input() {
        assert_eq!(WordReverse.compute(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_later_registration_wins() {
        struct Free;
        impl Precompile for Free {
            fn gas_cost(&self, _input: &[u8]) -> u64 {
                0
            }
            fn compute(&self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
                Ok(input.to_vec())
            }
        }

        let mut set = PrecompileSet::builtin();
        set.register(WordReverse::ADDRESS, Box::new(Free));
        let handler = set.get(&WordReverse::ADDRESS).unwrap();
        assert_eq!(handler.gas_cost(&[]), 0);
    }
}
