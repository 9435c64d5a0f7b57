//! Application configuration.
//!
//! One explicit value threaded through the constructors. Nothing in the
//! workspace reads process-global configuration.

use ledgermint_execution::DEFAULT_BLOCK_GAS_LIMIT;
use ledgermint_types::{Address, U256, MAX_TX_SIZE};

/// Configuration for one application instance.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Application name reported by `info`.
    pub name: String,

    /// Chain identifier folded into signing digests. Must be unique per
    /// network: it is the replay protection across chains.
    pub chain_id: u64,

    /// Maximum encoded transaction size accepted into the mempool.
    pub max_tx_size: usize,

    /// Per-block gas budget.
    pub block_gas_limit: u64,

    /// Recipient of accrued gas fees at end of block. `None` burns them.
    pub coinbase: Option<Address>,

    /// Genesis balance grants, applied before the first block.
    pub genesis: Vec<(Address, U256)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ledgermint".to_string(),
            chain_id: 1,
            max_tx_size: MAX_TX_SIZE,
            block_gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            coinbase: None,
            genesis: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Add a genesis grant.
    pub fn with_grant(mut self, address: Address, balance: U256) -> Self {
        self.genesis.push((address, balance));
        self
    }

    /// Set the chain identifier.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the fee recipient.
    pub fn with_coinbase(mut self, coinbase: Address) -> Self {
        self.coinbase = Some(coinbase);
        self
    }
}
