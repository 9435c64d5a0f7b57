//! Intrinsic gas.

/// Base cost of any transaction.
pub const TRANSFER_GAS: u64 = 21_000;

/// Base cost of a contract creation.
pub const CREATION_GAS: u64 = 53_000;

/// Cost per zero byte of payload.
pub const PER_ZERO_BYTE_GAS: u64 = 4;

/// Cost per non-zero byte of payload.
pub const PER_NONZERO_BYTE_GAS: u64 = 68;

/// Fixed lower-bound cost of carrying a transaction, before any execution.
///
/// A transaction whose gas limit is below this bound can never pay for its
/// own inclusion and is rejected at admission and at construction.
pub fn intrinsic_gas(data: &[u8], is_creation: bool) -> u64 {
    let base = if is_creation { CREATION_GAS } else { TRANSFER_GAS };
    let zero_bytes = data.iter().filter(|&&b| b == 0).count() as u64;
    let nonzero_bytes = data.len() as u64 - zero_bytes;
    base + zero_bytes * PER_ZERO_BYTE_GAS + nonzero_bytes * PER_NONZERO_BYTE_GAS
}
