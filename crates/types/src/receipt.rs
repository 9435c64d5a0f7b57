//! Per-block transaction receipts.

use crate::{Address, Hash};

/// Size of the log bloom in bytes (2048 bits).
pub const BLOOM_LEN: usize = 256;

/// A log entry emitted during execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Account that emitted the log.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Unindexed payload.
    pub data: Vec<u8>,
}

/// A 2048-bit bloom filter over log addresses and topics.
///
/// Each element sets three bits chosen from the first six bytes of its
/// blake3 digest, interpreted as big-endian bit positions modulo 2048.
#[derive(Clone, PartialEq, Eq)]
pub struct Bloom([u8; BLOOM_LEN]);

impl Bloom {
    pub fn empty() -> Self {
        Bloom([0u8; BLOOM_LEN])
    }

    /// Build a bloom covering every address and topic in `logs`.
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Self {
        let mut bloom = Bloom::empty();
        for log in logs {
            bloom.accrue(log.address.as_bytes());
            for topic in &log.topics {
                bloom.accrue(topic.as_bytes());
            }
        }
        bloom
    }

    /// Set the three bits for one element.
    pub fn accrue(&mut self, element: &[u8]) {
        for position in bit_positions(element) {
            self.0[position / 8] |= 1 << (position % 8);
        }
    }

    /// Whether all three bits for `element` are set. May false-positive.
    pub fn possibly_contains(&self, element: &[u8]) -> bool {
        bit_positions(element)
            .iter()
            .all(|&position| self.0[position / 8] & (1 << (position % 8)) != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; BLOOM_LEN] {
        &self.0
    }
}

fn bit_positions(element: &[u8]) -> [usize; 3] {
    let digest = blake3::hash(element);
    let bytes = digest.as_bytes();
    let mut positions = [0usize; 3];
    for (i, position) in positions.iter_mut().enumerate() {
        let pair = u16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        *position = (pair % 2048) as usize;
    }
    positions
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Bloom(empty)")
        } else {
            write!(f, "Bloom({}..)", hex::encode(&self.0[..8]))
        }
    }
}

/// The record of one included transaction.
///
/// Built once at inclusion time and never mutated. Receipts are rebuilt for
/// every block and are not part of the committed root: only account state
/// feeds the cross-replica agreement value.
#[derive(Clone, Debug)]
pub struct Receipt {
    /// Hash of the included transaction.
    pub tx_hash: Hash,
    /// Whether execution succeeded (false for reverts).
    pub success: bool,
    /// Block-cumulative gas used after this transaction.
    pub cumulative_gas_used: u64,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
    /// Address of the created contract, for creations.
    pub contract_address: Option<Address>,
    /// Logs emitted during execution (empty for reverts).
    pub logs: Vec<Log>,
    /// Bloom over this receipt's logs.
    pub bloom: Bloom,
}

impl Receipt {
    /// Build a receipt; the bloom is derived from `logs` here, once.
    pub fn new(
        tx_hash: Hash,
        success: bool,
        cumulative_gas_used: u64,
        gas_used: u64,
        contract_address: Option<Address>,
        logs: Vec<Log>,
    ) -> Self {
        let bloom = Bloom::from_logs(&logs);
        Self {
            tx_hash,
            success,
            cumulative_gas_used,
            gas_used,
            contract_address,
            logs,
            bloom,
        }
    }
}
