//! Block executor over the *deliver* view.

use crate::{BlockContext, BlockSummary};
use ledgermint_engine::{EngineError, ExecutionEngine, Message};
use ledgermint_state::LedgerView;
use ledgermint_types::{Address, Receipt, SignedTransaction, StatusCode, U256};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Default per-block gas budget.
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 10_000_000;

/// Reasons a transaction is excluded from the block.
///
/// Every variant is fatal to inclusion: no state mutates, no gas is
/// consumed, no receipt is recorded. Reverts are not errors; a reverted
/// transaction is included and reported through its receipt.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// No block is open.
    #[error("no block in progress")]
    NoOpenBlock,

    /// A block is already open.
    #[error("block already in progress")]
    BlockAlreadyOpen,

    /// The payload does not decode as a transaction.
    #[error("malformed transaction: {0}")]
    Encoding(String),

    /// The signature does not recover a sender on this chain.
    #[error("signature does not recover a sender")]
    SenderRecovery,

    /// The declared gas limit exceeds the remaining block gas pool.
    #[error("gas limit {gas_limit} exceeds remaining block gas {remaining}")]
    ExceedsGasPool { gas_limit: u64, remaining: u64 },

    /// The engine reported the message invalid independent of execution.
    #[error("construction failure: {0}")]
    Construction(#[from] EngineError),

    /// An internal invariant was violated. Should be unreachable.
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

impl ExecuteError {
    /// The status code reported to the consensus engine.
    pub fn status(&self) -> StatusCode {
        match self {
            ExecuteError::Encoding(_) => StatusCode::EncodingError,
            ExecuteError::NoOpenBlock
            | ExecuteError::BlockAlreadyOpen
            | ExecuteError::SenderRecovery
            | ExecuteError::ExceedsGasPool { .. }
            | ExecuteError::Construction(_)
            | ExecuteError::Invariant(_) => StatusCode::InternalError,
        }
    }
}

/// Applies consensus-ordered transactions to the block-working view.
///
/// Owns *deliver* for the duration of one block. Revert isolation is
/// structural: the engine runs against a fork of *deliver*; on success the
/// fork replaces *deliver*, on revert the fork is discarded and only the
/// fee and nonce are applied to the real view.
pub struct BlockExecutor {
    engine: Arc<dyn ExecutionEngine>,
    chain_id: u64,
    coinbase: Option<Address>,
    deliver: LedgerView,
    context: Option<BlockContext>,
}

impl std::fmt::Debug for BlockExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockExecutor")
            .field("chain_id", &self.chain_id)
            .field("coinbase", &self.coinbase)
            .field("open", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

impl BlockExecutor {
    /// Create an executor over a fork of the committed view.
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        chain_id: u64,
        coinbase: Option<Address>,
        deliver: LedgerView,
    ) -> Self {
        Self {
            engine,
            chain_id,
            coinbase,
            deliver,
            context: None,
        }
    }

    /// Open a block with a fresh gas pool.
    pub fn begin_block(&mut self, block_gas_limit: u64) -> Result<(), ExecuteError> {
        if self.context.is_some() {
            return Err(ExecuteError::BlockAlreadyOpen);
        }
        self.context = Some(BlockContext::new(block_gas_limit));
        Ok(())
    }

    /// Apply one consensus-ordered transaction.
    ///
    /// Returns the receipt for included transactions (successful or
    /// reverted); errors exclude the transaction from the block.
    #[instrument(skip(self, raw), fields(size = raw.len()))]
    pub fn execute_transaction(&mut self, raw: &[u8]) -> Result<Receipt, ExecuteError> {
        let context = self.context.as_mut().ok_or(ExecuteError::NoOpenBlock)?;

        let tx = SignedTransaction::decode(raw)
            .map_err(|e| ExecuteError::Encoding(e.to_string()))?;
        let sender = tx
            .recover_sender(self.chain_id)
            .map_err(|_| ExecuteError::SenderRecovery)?;

        // The engine call is bounded to the remaining pool: a transaction
        // that could outspend it must not run at all.
        if !context.gas_pool.can_cover(tx.gas_limit) {
            return Err(ExecuteError::ExceedsGasPool {
                gas_limit: tx.gas_limit,
                remaining: context.gas_pool.remaining(),
            });
        }

        let message = Message::resolve(&tx, sender);
        let mut scratch = self.deliver.fork();
        let output = self
            .engine
            .execute(&message, &mut scratch, tx.gas_limit)?;

        let fee = U256::from(output.gas_used) * U256::from(tx.gas_price);
        if output.reverted {
            // Keep only the fee and the nonce; every other effect in the
            // scratch view is discarded. The sender held the full cost at
            // construction time, so this debit cannot fail.
            self.deliver
                .debit(sender, fee)
                .map_err(|_| ExecuteError::Invariant("fee exceeds checked balance"))?;
            self.deliver.set_nonce(sender, tx.nonce);
        } else {
            self.deliver = scratch;
        }

        // gas_used <= gas_limit <= remaining, so the pool stays
        // non-negative.
        context
            .gas_pool
            .deduct(output.gas_used)
            .map_err(|_| ExecuteError::Invariant("gas pool underflow"))?;
        context.total_gas_used += output.gas_used;
        context.accrued_fees += fee;

        let receipt = Receipt::new(
            tx.hash(),
            !output.reverted,
            context.total_gas_used,
            output.gas_used,
            output.contract_address,
            output.logs,
        );
        context.logs.extend(receipt.logs.iter().cloned());
        context.receipts.push(receipt.clone());

        tracing::debug!(
            %sender,
            tx_hash = %receipt.tx_hash,
            gas_used = output.gas_used,
            reverted = output.reverted,
            "transaction included"
        );
        Ok(receipt)
    }

    /// End-of-block bookkeeping: credit accrued fees to the coinbase.
    ///
    /// With no coinbase configured the fees stay burned.
    pub fn end_block(&mut self) -> Result<BlockSummary, ExecuteError> {
        let context = self.context.as_mut().ok_or(ExecuteError::NoOpenBlock)?;
        if let Some(coinbase) = self.coinbase {
            if !context.accrued_fees.is_zero() {
                self.deliver.credit(coinbase, context.accrued_fees);
                context.accrued_fees = U256::zero();
            }
        }
        Ok(BlockSummary {
            tx_count: context.receipts.len(),
            total_gas_used: context.total_gas_used,
        })
    }

    /// The block-working view.
    pub fn view(&self) -> &LedgerView {
        &self.deliver
    }

    /// The open block's context, if a block is in progress.
    pub fn context(&self) -> Option<&BlockContext> {
        self.context.as_ref()
    }

    /// Replace *deliver* with a fork of the new committed view and drop the
    /// completed block's accumulators. Called once per commit.
    pub fn reset(&mut self, deliver: LedgerView) {
        self.deliver = deliver;
        self.context = None;
    }
}
