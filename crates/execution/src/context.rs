//! Per-block execution context.

use ledgermint_types::{Log, Receipt, U256};
use thiserror::Error;

/// The remaining gas budget for one block.
///
/// Decremented per included transaction; by construction it never goes
/// negative, because a transaction whose gas limit exceeds the remaining
/// pool is rejected before the engine runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasPool {
    remaining: u64,
}

/// Attempted to draw more gas than the pool holds.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("gas pool exhausted: remaining {remaining}, requested {requested}")]
pub struct GasPoolError {
    pub remaining: u64,
    pub requested: u64,
}

impl GasPool {
    pub fn new(limit: u64) -> Self {
        Self { remaining: limit }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Whether the pool can cover a draw of `amount`.
    pub fn can_cover(&self, amount: u64) -> bool {
        amount <= self.remaining
    }

    /// Draw `amount` from the pool.
    pub fn deduct(&mut self, amount: u64) -> Result<(), GasPoolError> {
        if amount > self.remaining {
            return Err(GasPoolError {
                remaining: self.remaining,
                requested: amount,
            });
        }
        self.remaining -= amount;
        Ok(())
    }
}

/// Accumulators for one block in progress.
///
/// Created at block begin, fed by each delivered transaction, finalized at
/// block end, and discarded after commit. Receipts and logs are rebuilt
/// every block; they are not part of the committed root.
#[derive(Debug)]
pub struct BlockContext {
    /// Remaining gas budget for the block.
    pub gas_pool: GasPool,
    /// Gas used by all included transactions so far.
    pub total_gas_used: u64,
    /// Receipts for included transactions, in delivery order.
    pub receipts: Vec<Receipt>,
    /// All logs emitted in this block, in emission order.
    pub logs: Vec<Log>,
    /// Gas fees accrued for end-of-block crediting.
    pub accrued_fees: U256,
}

impl BlockContext {
    /// Fresh context with the block's full gas budget.
    pub fn new(block_gas_limit: u64) -> Self {
        Self {
            gas_pool: GasPool::new(block_gas_limit),
            total_gas_used: 0,
            receipts: Vec::new(),
            logs: Vec::new(),
            accrued_fees: U256::zero(),
        }
    }
}

/// What a completed block amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSummary {
    /// Number of included transactions.
    pub tx_count: usize,
    /// Total gas used across the block.
    pub total_gas_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_pool_deducts() {
        let mut pool = GasPool::new(100);
        pool.deduct(60).unwrap();
        assert_eq!(pool.remaining(), 40);
    }

    #[test]
    fn test_gas_pool_never_goes_negative() {
        let mut pool = GasPool::new(100);
        let err = pool.deduct(101).unwrap_err();
        assert_eq!(err.remaining, 100);
        assert_eq!(pool.remaining(), 100);
    }

    #[test]
    fn test_exact_drain_is_allowed() {
        let mut pool = GasPool::new(100);
        pool.deduct(100).unwrap();
        assert_eq!(pool.remaining(), 0);
        assert!(!pool.can_cover(1));
    }
}
