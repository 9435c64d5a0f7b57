//! The application facade driven by the consensus engine.

use crate::query::{self, QueryResponse};
use crate::{AppConfig, CommitOutcome, InfoResponse, TxResult};
use ledgermint_engine::{ExecutionEngine, TransferEngine};
use ledgermint_execution::BlockExecutor;
use ledgermint_mempool::{MempoolConfig, MempoolValidator};
use ledgermint_state::{CommitStore, LedgerView, MemoryStore, StoreError};
use ledgermint_types::{Hash, StatusCode};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Consensus lifecycle phase. One cycle per block; no terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Between blocks.
    Idle,
    /// A block is open and accepting `deliver_tx`.
    Open,
    /// The block is closed and waiting for `commit`.
    Ended,
}

/// Fatal commit failures.
///
/// A storage error here must halt forward progress: the committed view is
/// swapped only after the root is durable, so no partial commit is ever
/// reported as successful.
#[derive(Debug, Error)]
pub enum CommitError {
    /// `commit` arrived while a block was still open.
    #[error("commit invoked while a block is open; end_block must run first")]
    BlockOpen,

    /// The storage collaborator failed to persist the root.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Serialized consensus-stream state: phase, height and last root.
#[derive(Debug)]
struct Lifecycle {
    phase: Phase,
    height: u64,
    last_root: Hash,
}

/// The application state machine.
///
/// Methods take `&self`: the consensus stream, the mempool stream and the
/// query stream each own disjoint state behind their own lock, so the
/// three connections interleave freely.
///
/// - `committed` is replaced in one atomic swap inside [`App::commit`];
///   readers clone the `Arc` and see a full old or new view, never a
///   partial update.
/// - `mempool` owns *check*; `executor` owns *deliver*. The two are never
///   locked together except inside `commit`, which re-forks both.
pub struct App {
    config: AppConfig,
    committed: RwLock<Arc<LedgerView>>,
    mempool: Mutex<MempoolValidator>,
    executor: Mutex<BlockExecutor>,
    store: Mutex<Box<dyn CommitStore>>,
    lifecycle: Mutex<Lifecycle>,
}

impl App {
    /// Build an application from its collaborators.
    ///
    /// Genesis grants from the config are applied to the initial committed
    /// view; the first commit makes them durable.
    pub fn new(
        config: AppConfig,
        engine: Arc<dyn ExecutionEngine>,
        store: Box<dyn CommitStore>,
    ) -> Self {
        let mut genesis = LedgerView::new();
        for (address, balance) in &config.genesis {
            genesis.set_balance(*address, *balance);
        }
        let last_root = genesis.root_hash();
        tracing::info!(chain_id = config.chain_id, root = %last_root, grants = config.genesis.len(), "application initialized");

        let mempool = MempoolValidator::new(
            genesis.fork(),
            MempoolConfig {
                chain_id: config.chain_id,
                max_tx_size: config.max_tx_size,
            },
        );
        let executor = BlockExecutor::new(
            engine,
            config.chain_id,
            config.coinbase,
            genesis.fork(),
        );

        Self {
            config,
            committed: RwLock::new(Arc::new(genesis)),
            mempool: Mutex::new(mempool),
            executor: Mutex::new(executor),
            store: Mutex::new(store),
            lifecycle: Mutex::new(Lifecycle {
                phase: Phase::Idle,
                height: 0,
                last_root,
            }),
        }
    }

    /// Application with the built-in engine and in-memory storage.
    pub fn builtin(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(TransferEngine::builtin()),
            Box::new(MemoryStore::new()),
        )
    }

    /// Basic information for the consensus handshake.
    pub fn info(&self) -> InfoResponse {
        let lifecycle = self.lifecycle.lock();
        InfoResponse {
            name: self.config.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            last_height: lifecycle.height,
            last_root: lifecycle.last_root,
        }
    }

    /// Mempool connection: validate a candidate transaction.
    #[instrument(skip_all)]
    pub fn check_tx(&self, raw: &[u8]) -> TxResult {
        match self.mempool.lock().admit(raw) {
            Ok(_) => TxResult::ok(),
            Err(error) => {
                tracing::debug!(%error, "check_tx rejected");
                TxResult::error(error.status(), error.to_string())
            }
        }
    }

    /// Consensus connection: open a block.
    pub fn begin_block(&self) -> TxResult {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.phase != Phase::Idle {
            return TxResult::error(
                StatusCode::InternalError,
                format!("begin_block in phase {:?}", lifecycle.phase),
            );
        }
        if let Err(error) = self.executor.lock().begin_block(self.config.block_gas_limit) {
            return TxResult::error(error.status(), error.to_string());
        }
        lifecycle.phase = Phase::Open;
        TxResult::ok()
    }

    /// Consensus connection: apply one finalized transaction.
    #[instrument(skip_all)]
    pub fn deliver_tx(&self, raw: &[u8]) -> TxResult {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.phase != Phase::Open {
            return TxResult::error(
                StatusCode::InternalError,
                format!("deliver_tx in phase {:?}", lifecycle.phase),
            );
        }
        match self.executor.lock().execute_transaction(raw) {
            Ok(receipt) if receipt.success => TxResult::ok(),
            Ok(receipt) => {
                TxResult::ok_with_log(format!("reverted; gas used {}", receipt.gas_used))
            }
            Err(error) => {
                tracing::debug!(%error, "deliver_tx excluded transaction");
                TxResult::error(error.status(), error.to_string())
            }
        }
    }

    /// Consensus connection: close the block.
    pub fn end_block(&self, height: u64) -> TxResult {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.phase != Phase::Open {
            return TxResult::error(
                StatusCode::InternalError,
                format!("end_block in phase {:?}", lifecycle.phase),
            );
        }
        match self.executor.lock().end_block() {
            Ok(summary) => {
                tracing::debug!(
                    height,
                    tx_count = summary.tx_count,
                    gas_used = summary.total_gas_used,
                    "block ended"
                );
                lifecycle.phase = Phase::Ended;
                TxResult::ok()
            }
            Err(error) => TxResult::error(error.status(), error.to_string()),
        }
    }

    /// Consensus connection: seal the block.
    ///
    /// Write-then-swap: the root is persisted before the committed pointer
    /// moves, so a crash between the two replays cleanly from storage. A
    /// commit with no intervening block activity reproduces the previous
    /// root (the height still advances).
    #[instrument(skip_all)]
    pub fn commit(&self) -> Result<CommitOutcome, CommitError> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.phase == Phase::Open {
            return Err(CommitError::BlockOpen);
        }

        let mut executor = self.executor.lock();

        // Persist first. On failure nothing is swapped and the error is
        // fatal to the caller.
        let root = self.store.lock().commit_root(executor.view())?;

        let new_committed = executor.view().fork();
        executor.reset(new_committed.fork());
        self.mempool.lock().reset(new_committed.fork());
        *self.committed.write() = Arc::new(new_committed);

        lifecycle.height += 1;
        lifecycle.last_root = root;
        lifecycle.phase = Phase::Idle;
        tracing::info!(height = lifecycle.height, %root, "block committed");

        Ok(CommitOutcome {
            root,
            height: lifecycle.height,
        })
    }

    /// Query connection: read-only lookups against the committed view.
    pub fn query(&self, path: &str, data: &[u8]) -> QueryResponse {
        let view = self.committed.read().clone();
        query::handle(&view, path, data)
    }

    /// A stable snapshot of the committed view.
    pub fn committed_view(&self) -> Arc<LedgerView> {
        self.committed.read().clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle.lock().phase
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lifecycle = self.lifecycle.lock();
        f.debug_struct("App")
            .field("name", &self.config.name)
            .field("chain_id", &self.config.chain_id)
            .field("height", &lifecycle.height)
            .field("phase", &lifecycle.phase)
            .finish_non_exhaustive()
    }
}
