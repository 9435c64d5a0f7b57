//! Durable storage seam.
//!
//! All operations are synchronous blocking calls. The application crosses
//! this boundary exactly once per block, inside `commit`, and treats any
//! failure there as fatal: the root must be durable before the committed
//! view is swapped.

use crate::LedgerView;
use ledgermint_types::Hash;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database error.
    #[error("storage error: {0}")]
    Backend(String),

    /// A persisted record does not decode.
    #[error("corrupt record under key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

/// Durable key-value storage for committed state.
///
/// `commit_root` must persist the full (non-empty) account set under its
/// root hash and return that hash; it either completes durably or errors.
/// Partial writes that report success are a protocol violation: the commit
/// coordinator swaps the committed view only after this call returns `Ok`.
pub trait CommitStore: Send {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;

    /// Persist the account set of `view` and return its root hash.
    fn commit_root(&mut self, view: &LedgerView) -> Result<Hash, StoreError>;
}

const ROOT_KEY: &[u8] = b"root";
const ACCOUNT_PREFIX: &[u8] = b"acct:";

/// In-memory [`CommitStore`] implementation.
///
/// Backs tests and single-process runs; a production deployment plugs a
/// durable backend into the same trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently committed root, if any block has been committed.
    pub fn last_root(&self) -> Option<Hash> {
        self.records.get(ROOT_KEY).map(|bytes| {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(bytes);
            Hash::from(hash)
        })
    }

    /// Number of persisted account records.
    pub fn account_records(&self) -> usize {
        self.records
            .keys()
            .filter(|k| k.starts_with(ACCOUNT_PREFIX))
            .count()
    }
}

impl CommitStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.records.insert(key, value);
        Ok(())
    }

    fn commit_root(&mut self, view: &LedgerView) -> Result<Hash, StoreError> {
        let root = view.root_hash();
        for (address, account) in view.accounts() {
            let mut key = ACCOUNT_PREFIX.to_vec();
            key.extend_from_slice(address.as_bytes());
            let value = bincode::serialize(account).map_err(|e| StoreError::CorruptRecord {
                key: format!("{address}"),
                reason: e.to_string(),
            })?;
            self.records.insert(key, value);
        }
        self.records.insert(ROOT_KEY.to_vec(), root.as_bytes().to_vec());
        tracing::debug!(%root, accounts = view.len(), "persisted committed state");
        Ok(root)
    }
}

/// A store that fails every commit. Exercises the fatal-commit path.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct FailingStore;

#[cfg(any(test, feature = "test-utils"))]
impl CommitStore for FailingStore {
    fn get(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Backend("injected failure".into()))
    }

    fn put(&mut self, _key: Vec<u8>, _value: Vec<u8>) -> Result<(), StoreError> {
        Err(StoreError::Backend("injected failure".into()))
    }

    fn commit_root(&mut self, _view: &LedgerView) -> Result<Hash, StoreError> {
        Err(StoreError::Backend("injected failure".into()))
    }
}
