//! Callback response types.

use ledgermint_types::{Hash, StatusCode};

/// Response to `info`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub last_height: u64,
    pub last_root: Hash,
}

/// Result of `check_tx` and `deliver_tx`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxResult {
    pub code: StatusCode,
    pub log: String,
}

impl TxResult {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            log: String::new(),
        }
    }

    /// Included, but with something to say (e.g. a revert).
    pub fn ok_with_log(log: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Ok,
            log: log.into(),
        }
    }

    pub fn error(code: StatusCode, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

/// Result of a successful `commit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Root hash of the newly committed state.
    pub root: Hash,
    /// Height after this commit.
    pub height: u64,
}
