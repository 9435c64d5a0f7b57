//! Deterministic block execution.
//!
//! This crate implements the block-execution layer over the *deliver* view.
//! It handles:
//!
//! - The per-block context: gas pool, running gas total, receipts, logs
//! - Applying consensus-ordered transactions through the execution engine
//! - Revert isolation (fee stands, payload effects are rolled back)
//! - End-of-block bookkeeping (fee crediting)
//!
//! The executor is synchronous and performs no I/O; the commit step that
//! persists its results lives in the node crate.

mod context;
mod executor;

pub use context::{BlockContext, BlockSummary, GasPool, GasPoolError};
pub use executor::{BlockExecutor, ExecuteError, DEFAULT_BLOCK_GAS_LIMIT};
