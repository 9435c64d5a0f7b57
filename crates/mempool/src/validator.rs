//! Mempool admission against the speculative view.

use ledgermint_engine::intrinsic_gas;
use ledgermint_state::LedgerView;
use ledgermint_types::{
    Address, Hash, SignedTransaction, StatusCode, U256, MAX_TX_SIZE,
};
use thiserror::Error;
use tracing::instrument;

/// Mempool configuration, threaded in from the application config.
#[derive(Clone, Copy, Debug)]
pub struct MempoolConfig {
    /// Chain identifier folded into signing digests.
    pub chain_id: u64,
    /// Maximum encoded transaction size in bytes.
    pub max_tx_size: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            max_tx_size: MAX_TX_SIZE,
        }
    }
}

/// Rejection reasons, in validation order. Each maps to exactly one status
/// code so every replica reports the same code for the same input.
#[derive(Debug, Error)]
pub enum AdmitError {
    /// The payload does not decode as a transaction.
    #[error("malformed transaction: {0}")]
    Encoding(String),

    /// The encoded payload exceeds the size bound.
    #[error("transaction of {size} bytes exceeds limit of {limit}")]
    Oversized { size: usize, limit: usize },

    /// The signature does not recover a sender on this chain.
    #[error("signature does not recover a sender")]
    Unauthorized,

    /// Nonce is not exactly the sender's next nonce.
    #[error("bad nonce for {sender}: expected {expected}, got {got}")]
    BadNonce {
        sender: Address,
        expected: u64,
        got: u64,
    },

    /// Balance does not cover `value + gas_limit * gas_price`.
    #[error("insufficient funds for {sender}: balance {balance}, cost {cost}")]
    InsufficientFunds {
        sender: Address,
        balance: U256,
        cost: U256,
    },

    /// Gas limit below the intrinsic cost.
    #[error("gas limit {gas_limit} below intrinsic gas {intrinsic}")]
    IntrinsicGasTooLow { gas_limit: u64, intrinsic: u64 },
}

impl AdmitError {
    /// The status code reported to the consensus engine.
    pub fn status(&self) -> StatusCode {
        match self {
            AdmitError::Encoding(_) => StatusCode::EncodingError,
            AdmitError::Oversized { .. } => StatusCode::InternalError,
            AdmitError::Unauthorized => StatusCode::Unauthorized,
            AdmitError::BadNonce { .. } => StatusCode::BadNonce,
            AdmitError::InsufficientFunds { .. } => StatusCode::InsufficientFunds,
            AdmitError::IntrinsicGasTooLow { .. } => StatusCode::InternalError,
        }
    }
}

/// An admitted transaction.
#[derive(Clone, Debug)]
pub struct Accepted {
    pub tx_hash: Hash,
    pub sender: Address,
}

/// Admits candidate transactions against the speculative *check* view.
///
/// Validation is fail-fast: the first failing rule rejects the transaction
/// and leaves the view unmodified. On success the transaction's effects are
/// applied speculatively, so a sender can submit a chain of dependent
/// transactions before any of them is finalized. None of this carries a
/// durable guarantee: [`MempoolValidator::reset`] rebuilds the view from
/// the freshly committed state at every commit.
#[derive(Debug)]
pub struct MempoolValidator {
    check: LedgerView,
    config: MempoolConfig,
}

impl MempoolValidator {
    /// Create a validator over a fork of the committed view.
    pub fn new(check: LedgerView, config: MempoolConfig) -> Self {
        Self { check, config }
    }

    /// Validate a raw transaction and speculatively apply it.
    #[instrument(skip(self, raw), fields(size = raw.len()))]
    pub fn admit(&mut self, raw: &[u8]) -> Result<Accepted, AdmitError> {
        let tx = SignedTransaction::decode(raw)
            .map_err(|e| AdmitError::Encoding(e.to_string()))?;

        if raw.len() > self.config.max_tx_size {
            return Err(AdmitError::Oversized {
                size: raw.len(),
                limit: self.config.max_tx_size,
            });
        }

        // Value is an unsigned 256-bit integer on the wire: a negative value
        // is unrepresentable, so the non-negativity rule holds by
        // construction here.

        let sender = tx
            .recover_sender(self.config.chain_id)
            .map_err(|_| AdmitError::Unauthorized)?;

        let account = self.check.get(&sender);
        if account.nonce + 1 != tx.nonce {
            return Err(AdmitError::BadNonce {
                sender,
                expected: account.nonce + 1,
                got: tx.nonce,
            });
        }

        // A cost that overflows 256 bits can never be covered.
        let cost = tx.cost().ok_or(AdmitError::InsufficientFunds {
            sender,
            balance: account.balance,
            cost: U256::MAX,
        })?;
        if account.balance < cost {
            return Err(AdmitError::InsufficientFunds {
                sender,
                balance: account.balance,
                cost,
            });
        }

        let intrinsic = intrinsic_gas(&tx.data, tx.is_creation());
        if tx.gas_limit < intrinsic {
            return Err(AdmitError::IntrinsicGasTooLow {
                gas_limit: tx.gas_limit,
                intrinsic,
            });
        }

        // Speculative application. The debit cannot fail after the cost
        // check above; treat a failure as the same rejection.
        self.check
            .debit(sender, cost)
            .map_err(|_| AdmitError::InsufficientFunds {
                sender,
                balance: account.balance,
                cost,
            })?;
        if let Some(to) = tx.to {
            self.check.credit(to, tx.value);
        }
        self.check.set_nonce(sender, tx.nonce);

        let tx_hash = tx.hash();
        tracing::debug!(%sender, %tx_hash, nonce = tx.nonce, "transaction admitted");
        Ok(Accepted { tx_hash, sender })
    }

    /// Replace the speculative view with a fork of the new committed view.
    ///
    /// Called at every commit; all speculative effects are discarded.
    pub fn reset(&mut self, check: LedgerView) {
        self.check = check;
    }

    /// Read access to the speculative view.
    pub fn view(&self) -> &LedgerView {
        &self.check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgermint_types::test_utils::{signed_transfer, test_address, test_keypair};
    use ledgermint_types::KeyPair;

    const CHAIN: u64 = 1;

    fn validator_with_balance(key: &KeyPair, balance: u64) -> MempoolValidator {
        let mut view = LedgerView::new();
        view.credit(key.address(), U256::from(balance));
        MempoolValidator::new(view, MempoolConfig::default())
    }

    #[test]
    fn test_admit_valid_transaction() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);
        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 100_000, 1);

        let accepted = validator.admit(&tx.encode()).unwrap();
        assert_eq!(accepted.sender, key.address());
        assert_eq!(accepted.tx_hash, tx.hash());
    }

    #[test]
    fn test_garbage_is_an_encoding_error() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);

        let err = validator.admit(&[0xde, 0xad]).unwrap_err();
        assert_eq!(err.status(), StatusCode::EncodingError);
    }

    #[test]
    fn test_oversized_transaction_is_rejected() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, u64::MAX / 2);
        let tx = SignedTransaction::sign(
            &key,
            CHAIN,
            1,
            Some(test_address(2)),
            U256::zero(),
            10_000_000,
            1,
            vec![1u8; MAX_TX_SIZE],
        )
        .unwrap();

        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::InternalError);
        assert!(matches!(err, AdmitError::Oversized { .. }));
    }

    #[test]
    fn test_wrong_chain_signature_is_unauthorized_or_unfunded() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);
        // Signed for another network.
        let tx = signed_transfer(&key, CHAIN + 1, 1, test_address(2), 100, 100_000, 1);

        let err = validator.admit(&tx.encode()).unwrap_err();
        // Recovery either fails (Unauthorized) or yields a stranger that
        // fails the nonce or funds rules. Never accepted.
        assert!(matches!(
            err.status(),
            StatusCode::Unauthorized | StatusCode::BadNonce | StatusCode::InsufficientFunds
        ));
    }

    #[test]
    fn test_nonce_gap_is_rejected() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);
        let tx = signed_transfer(&key, CHAIN, 3, test_address(2), 100, 100_000, 1);

        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadNonce);
    }

    #[test]
    fn test_same_nonce_replay_is_rejected() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);
        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 100_000, 1);

        validator.admit(&tx.encode()).unwrap();
        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadNonce);
    }

    #[test]
    fn test_cost_exactly_balance_is_accepted() {
        let key = test_keypair(1);
        let balance = 100 + 100_000; // value + gas_limit * price
        let mut validator = validator_with_balance(&key, balance);
        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 100_000, 1);

        validator.admit(&tx.encode()).unwrap();
        assert_eq!(validator.view().get(&key.address()).balance, U256::zero());
    }

    #[test]
    fn test_cost_one_above_balance_is_rejected() {
        let key = test_keypair(1);
        let balance = 100 + 100_000 - 1;
        let mut validator = validator_with_balance(&key, balance);
        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 100_000, 1);

        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::InsufficientFunds);
    }

    #[test]
    fn test_overflowing_cost_is_rejected_as_unfunded() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, u64::MAX);
        // value + gas_limit * gas_price wraps past 256 bits; the
        // transaction is representable on the wire and must be rejected,
        // never computed with.
        let tx = SignedTransaction::sign(
            &key,
            CHAIN,
            1,
            Some(test_address(2)),
            U256::MAX,
            100_000,
            1,
            Vec::new(),
        )
        .unwrap();
        let before = validator.view().root_hash();

        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::InsufficientFunds);
        assert_eq!(validator.view().root_hash(), before);
    }

    #[test]
    fn test_zero_balance_sender_is_rejected() {
        let key = test_keypair(1);
        let mut validator = MempoolValidator::new(LedgerView::new(), MempoolConfig::default());
        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 1, 100_000, 1);

        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::InsufficientFunds);
    }

    #[test]
    fn test_gas_limit_below_intrinsic_is_rejected() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);
        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 1_000, 1);

        let err = validator.admit(&tx.encode()).unwrap_err();
        assert_eq!(err.status(), StatusCode::InternalError);
        assert!(matches!(err, AdmitError::IntrinsicGasTooLow { .. }));
    }

    #[test]
    fn test_rejection_leaves_view_unmodified() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 1_000_000);
        let before = validator.view().root_hash();

        let tx = signed_transfer(&key, CHAIN, 7, test_address(2), 100, 100_000, 1);
        validator.admit(&tx.encode()).unwrap_err();

        assert_eq!(validator.view().root_hash(), before);
    }

    #[test]
    fn test_dependent_transactions_chain_through_speculative_state() {
        let key = test_keypair(1);
        let mut validator = validator_with_balance(&key, 10_000_000);

        let first = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 100_000, 1);
        let second = signed_transfer(&key, CHAIN, 2, test_address(2), 100, 100_000, 1);

        validator.admit(&first.encode()).unwrap();
        validator.admit(&second.encode()).unwrap();
        assert_eq!(validator.view().get(&key.address()).nonce, 2);
    }

    #[test]
    fn test_reset_discards_speculative_state() {
        let key = test_keypair(1);
        let mut committed = LedgerView::new();
        committed.credit(key.address(), U256::from(1_000_000u64));
        let mut validator =
            MempoolValidator::new(committed.fork(), MempoolConfig::default());

        let tx = signed_transfer(&key, CHAIN, 1, test_address(2), 100, 100_000, 1);
        validator.admit(&tx.encode()).unwrap();
        assert_ne!(validator.view().root_hash(), committed.root_hash());

        validator.reset(committed.fork());
        assert_eq!(validator.view().root_hash(), committed.root_hash());

        // The same transaction admits again after the reset.
        validator.admit(&tx.encode()).unwrap();
    }
}
