//! Account state for the Ledgermint application.
//!
//! This crate implements the ledger-view layer:
//!
//! - [`Account`]: balance, nonce and optional code reference
//! - [`LedgerView`]: an isolated, value-semantics snapshot of all accounts
//!   with a deterministic root hash
//! - [`CommitStore`]: the durable-storage seam crossed once per commit
//!
//! # Isolation model
//!
//! The application holds three live views at any time: *committed* (served
//! to queries), *check* (speculative mempool state) and *deliver* (the
//! in-progress block). Views are related only by [`LedgerView::fork`], which
//! produces a deep copy sharing no mutable memory with its source, so a
//! mutation of one view is never observable through another.

mod account;
mod store;
mod view;

pub use account::Account;
pub use store::{CommitStore, MemoryStore, StoreError};
pub use view::{LedgerError, LedgerView};

/// Test utilities.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    pub use crate::store::FailingStore;
}
