//! Execution-engine seam for the Ledgermint application.
//!
//! The block executor treats the engine as an opaque collaborator: it hands
//! over a message, a ledger view and a gas bound, and gets back gas usage,
//! a revert flag and any state effects applied to the view. This crate
//! provides:
//!
//! - [`ExecutionEngine`]: the trait the executor calls through
//! - [`TransferEngine`]: the built-in engine (value transfers, contract
//!   creation bookkeeping, precompile dispatch)
//! - [`intrinsic_gas`]: the lower-bound gas cost of any transaction
//! - [`PrecompileSet`]: the initialization-time map of address-keyed
//!   capabilities
//!
//! # Failure modes
//!
//! The engine distinguishes two failures the caller must treat differently:
//! an [`EngineError`] means the message was invalid independent of execution
//! and the transaction is excluded from the block entirely; a completed
//! execution with `reverted` set means the transaction is still included,
//! its gas is still charged, but its payload effects are rolled back.

mod gas;
mod message;
mod precompile;
mod transfer;

pub use gas::{intrinsic_gas, CREATION_GAS, PER_NONZERO_BYTE_GAS, PER_ZERO_BYTE_GAS, TRANSFER_GAS};
pub use message::Message;
pub use precompile::{Precompile, PrecompileError, PrecompileSet, WordReverse};
pub use transfer::{contract_address, EngineError, EngineOutput, ExecutionEngine, TransferEngine};
