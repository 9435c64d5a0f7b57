//! Result status codes reported to the consensus engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code carried in every callback result.
///
/// These codes are part of the replicated contract: every replica must
/// report the same code for the same input, so rejection reasons map onto
/// them exactly once each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// Request handled, transaction accepted/included.
    Ok,
    /// Payload does not decode.
    EncodingError,
    /// Signature does not recover a sender on this chain.
    Unauthorized,
    /// Nonce is not exactly the sender's next nonce.
    BadNonce,
    /// Sender balance does not cover the transaction cost.
    InsufficientFunds,
    /// Size bound, gas bound, or another internal rule violated.
    InternalError,
    /// Unrecognized query path or lifecycle misuse.
    UnknownRequest,
}

impl StatusCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ok_is_ok() {
        assert!(StatusCode::Ok.is_ok());
        assert!(!StatusCode::BadNonce.is_ok());
        assert!(!StatusCode::UnknownRequest.is_ok());
    }
}
