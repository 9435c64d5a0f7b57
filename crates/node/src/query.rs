//! Read-only queries against the committed view.

use ledgermint_state::LedgerView;
use ledgermint_types::{Address, StatusCode};

/// Balance lookup path.
pub const BALANCE_PATH: &str = "/balance";

/// Response to `query`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResponse {
    pub code: StatusCode,
    /// Decimal balance for `/balance`, or an error description.
    pub log: String,
}

impl QueryResponse {
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

/// Serve one query against a stable committed snapshot.
///
/// Must never see the *check* or *deliver* views; the caller hands in the
/// committed one only.
pub fn handle(view: &LedgerView, path: &str, data: &[u8]) -> QueryResponse {
    match path {
        BALANCE_PATH => match Address::from_slice(data) {
            Some(address) => QueryResponse {
                code: StatusCode::Ok,
                log: view.get(&address).balance.to_string(),
            },
            None => QueryResponse {
                code: StatusCode::EncodingError,
                log: format!("expected a 20-byte address, got {} bytes", data.len()),
            },
        },
        other => QueryResponse {
            code: StatusCode::UnknownRequest,
            log: format!("unrecognized query path: {other}"),
        },
    }
}
