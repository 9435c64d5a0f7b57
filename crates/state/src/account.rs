//! Account records.

use ledgermint_types::{u256_serde, Hash, U256};
use serde::{Deserialize, Serialize};

/// One account in the ledger.
///
/// Absent addresses read as the default (zero) account; an account whose
/// fields are all zero is indistinguishable from an absent one and is
/// excluded from the root hash and from persistence.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    /// Balance in the abstract fee unit. Non-negative by construction.
    #[serde(with = "u256_serde")]
    pub balance: U256,

    /// Monotonic counter; advances by one per applied originating
    /// transaction.
    pub nonce: u64,

    /// Reference to deployed code, for contract accounts.
    pub code_ref: Option<Hash>,
}

impl Account {
    /// An account holding `balance` with a fresh nonce.
    pub fn with_balance(balance: U256) -> Self {
        Account {
            balance,
            ..Account::default()
        }
    }

    /// Whether this account is indistinguishable from an absent one.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code_ref.is_none()
    }
}
