//! The Ledgermint application state machine.
//!
//! This crate composes the layer components behind the callback surface an
//! external consensus engine drives:
//!
//! ```text
//! consensus connection:  begin_block → deliver_tx* → end_block → commit
//! mempool connection:    check_tx (concurrent with the above)
//! query connection:      info / query (concurrent with everything)
//! ```
//!
//! Three ledger views back the surface. *committed* serves queries and is
//! replaced atomically at commit; *check* absorbs speculative mempool
//! effects; *deliver* absorbs the in-progress block. The views are disjoint
//! deep copies, so the three connections never contend on shared mutable
//! state; each stream owns its view behind its own lock.

mod app;
mod config;
mod query;
mod response;

pub use app::{App, CommitError, Phase};
pub use config::AppConfig;
pub use query::{QueryResponse, BALANCE_PATH};
pub use response::{CommitOutcome, InfoResponse, TxResult};
