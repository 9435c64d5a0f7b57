//! The built-in execution engine.

use crate::{intrinsic_gas, Message, PrecompileSet};
use ledgermint_state::LedgerView;
use ledgermint_types::{Address, Hash, ADDRESS_LEN, U256};
use thiserror::Error;

/// Construction failures: the message is invalid independent of execution.
///
/// Any of these excludes the transaction from the block entirely: no state
/// mutates, no gas is charged, no receipt is recorded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Nonce is not exactly the sender's next nonce.
    #[error("nonce mismatch for {sender}: expected {expected}, got {got}")]
    NonceMismatch {
        sender: Address,
        expected: u64,
        got: u64,
    },

    /// Sender cannot cover `value + gas_limit * gas_price`.
    #[error("sender {sender} cannot cover cost {cost} with balance {balance}")]
    InsufficientFunds {
        sender: Address,
        balance: U256,
        cost: U256,
    },

    /// Gas limit is below the intrinsic cost of carrying the transaction.
    #[error("gas limit {gas_limit} below intrinsic gas {intrinsic}")]
    IntrinsicGasTooLow { gas_limit: u64, intrinsic: u64 },
}

/// Outcome of a completed execution (successful or reverted).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOutput {
    /// Data returned by the payload, if any.
    pub return_data: Vec<u8>,
    /// Gas consumed, charged to the sender at the message's gas price.
    pub gas_used: u64,
    /// Whether payload execution reverted. A reverted transaction is still
    /// included: its fee stands, its other effects must be discarded.
    pub reverted: bool,
    /// Logs emitted during execution.
    pub logs: Vec<ledgermint_types::Log>,
    /// Address of the created contract, for creations.
    pub contract_address: Option<Address>,
}

/// The execution-engine seam.
///
/// The caller owns the view and the gas pool: it forks the working view,
/// hands the fork to the engine, and decides from the output whether to
/// keep the fork (success), keep only the fee (revert), or discard
/// everything (construction failure).
pub trait ExecutionEngine: Send + Sync {
    /// Execute `message` against `view`, bounded by `gas_limit`.
    fn execute(
        &self,
        message: &Message,
        view: &mut LedgerView,
        gas_limit: u64,
    ) -> Result<EngineOutput, EngineError>;
}

/// Deterministic address for a contract created by `creator` at `nonce`.
pub fn contract_address(creator: &Address, nonce: u64) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"ledgermint:contract");
    hasher.update(creator.as_bytes());
    hasher.update(&nonce.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest.as_bytes()[32 - ADDRESS_LEN..]);
    Address(bytes)
}

/// The built-in engine: native value transfers, contract-creation
/// bookkeeping, and precompile dispatch.
///
/// Semantics per message:
///
/// 1. Construction checks: strict nonce, full cost against balance,
///    intrinsic gas against the gas limit. Failures are [`EngineError`]s.
/// 2. The full cost is debited and the nonce advanced.
/// 3. The payload runs: plain transfer, creation, or precompile call.
///    Precompile failures and gas exhaustion set `reverted`; they never
///    error.
/// 4. Unused gas is refunded at the message's gas price.
pub struct TransferEngine {
    precompiles: PrecompileSet,
}

impl TransferEngine {
    pub fn new(precompiles: PrecompileSet) -> Self {
        Self { precompiles }
    }

    /// Engine with the built-in precompile set.
    pub fn builtin() -> Self {
        Self::new(PrecompileSet::builtin())
    }
}

impl ExecutionEngine for TransferEngine {
    fn execute(
        &self,
        message: &Message,
        view: &mut LedgerView,
        gas_limit: u64,
    ) -> Result<EngineOutput, EngineError> {
        let sender = view.get(&message.from);

        if sender.nonce + 1 != message.nonce {
            return Err(EngineError::NonceMismatch {
                sender: message.from,
                expected: sender.nonce + 1,
                got: message.nonce,
            });
        }

        let intrinsic = intrinsic_gas(&message.data, message.is_creation());
        if gas_limit < intrinsic {
            return Err(EngineError::IntrinsicGasTooLow {
                gas_limit,
                intrinsic,
            });
        }

        // A cost that overflows 256 bits can never be covered.
        let cost = message.cost().ok_or(EngineError::InsufficientFunds {
            sender: message.from,
            balance: sender.balance,
            cost: U256::MAX,
        })?;
        if sender.balance < cost {
            return Err(EngineError::InsufficientFunds {
                sender: message.from,
                balance: sender.balance,
                cost,
            });
        }

        // Buy gas and advance the nonce. The debit cannot fail after the
        // cost check above.
        view.debit(message.from, cost)
            .map_err(|_| EngineError::InsufficientFunds {
                sender: message.from,
                balance: sender.balance,
                cost,
            })?;
        view.set_nonce(message.from, message.nonce);

        let mut gas_used = intrinsic;
        let mut reverted = false;
        let mut return_data = Vec::new();
        let mut created = None;

        match message.to {
            None => {
                let contract = contract_address(&message.from, message.nonce);
                view.credit(contract, message.value);
                view.set_code_ref(contract, Hash::digest(&message.data));
                created = Some(contract);
            }
            Some(to) => {
                if let Some(precompile) = self.precompiles.get(&to) {
                    let compute_gas = precompile.gas_cost(&message.data);
                    if gas_used + compute_gas > gas_limit {
                        // Out of gas: everything in the limit is consumed.
                        gas_used = gas_limit;
                        reverted = true;
                    } else {
                        gas_used += compute_gas;
                        match precompile.compute(&message.data) {
                            Ok(output) => {
                                view.credit(to, message.value);
                                return_data = output;
                            }
                            Err(error) => {
                                tracing::debug!(address = %to, %error, "precompile reverted");
                                reverted = true;
                            }
                        }
                    }
                } else {
                    view.credit(to, message.value);
                }
            }
        }

        // Refund unused gas. On revert the caller discards this view and
        // re-charges the fee, so the refund only matters on success.
        let refund = U256::from(gas_limit - gas_used) * U256::from(message.gas_price);
        view.credit(message.from, refund);

        Ok(EngineOutput {
            return_data,
            gas_used,
            reverted,
            logs: Vec::new(),
            contract_address: created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WordReverse;
    use ledgermint_types::test_utils::test_address;

    fn funded_view(sender: Address, balance: u64) -> LedgerView {
        let mut view = LedgerView::new();
        view.credit(sender, U256::from(balance));
        view
    }

    fn transfer_message(from: Address, to: Address, value: u64) -> Message {
        Message {
            from,
            to: Some(to),
            value: U256::from(value),
            gas_limit: 100_000,
            gas_price: 1,
            data: Vec::new(),
            nonce: 1,
        }
    }

    #[test]
    fn test_plain_transfer_moves_value_and_charges_fee() {
        let from = test_address(1);
        let to = test_address(2);
        let mut view = funded_view(from, 1_000_000);
        let message = transfer_message(from, to, 100);

        let output = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap();

        assert!(!output.reverted);
        assert_eq!(output.gas_used, crate::TRANSFER_GAS);
        assert_eq!(view.get(&to).balance, U256::from(100u64));
        assert_eq!(
            view.get(&from).balance,
            U256::from(1_000_000u64 - 100 - crate::TRANSFER_GAS)
        );
        assert_eq!(view.get(&from).nonce, 1);
    }

    #[test]
    fn test_nonce_mismatch_is_construction_failure() {
        let from = test_address(1);
        let mut view = funded_view(from, 1_000_000);
        let mut message = transfer_message(from, test_address(2), 100);
        message.nonce = 5;

        let err = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap_err();
        assert!(matches!(err, EngineError::NonceMismatch { expected: 1, got: 5, .. }));
        // Nothing mutated.
        assert_eq!(view.get(&from).balance, U256::from(1_000_000u64));
        assert_eq!(view.get(&from).nonce, 0);
    }

    #[test]
    fn test_cost_above_balance_is_construction_failure() {
        let from = test_address(1);
        let mut view = funded_view(from, 1_000);
        let message = transfer_message(from, test_address(2), 100);

        let err = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_overflowing_cost_is_construction_failure() {
        let from = test_address(1);
        let mut view = funded_view(from, u64::MAX);
        let mut message = transfer_message(from, test_address(2), 0);
        message.value = U256::MAX;

        let err = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(view.get(&from).balance, U256::from(u64::MAX));
    }

    #[test]
    fn test_gas_limit_below_intrinsic_is_construction_failure() {
        let from = test_address(1);
        let mut view = funded_view(from, 1_000_000);
        let mut message = transfer_message(from, test_address(2), 100);
        message.gas_limit = 20_000;

        let err = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap_err();
        assert!(matches!(err, EngineError::IntrinsicGasTooLow { .. }));
    }

    #[test]
    fn test_creation_derives_address_and_code_ref() {
        let from = test_address(1);
        let mut view = funded_view(from, 10_000_000);
        let message = Message {
            from,
            to: None,
            value: U256::from(7u64),
            gas_limit: 200_000,
            gas_price: 1,
            data: vec![0xde, 0xad, 0xbe, 0xef],
            nonce: 1,
        };

        let output = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap();

        let contract = output.contract_address.unwrap();
        assert_eq!(contract, contract_address(&from, 1));
        assert_eq!(view.get(&contract).balance, U256::from(7u64));
        assert_eq!(
            view.get(&contract).code_ref,
            Some(Hash::digest(&[0xde, 0xad, 0xbe, 0xef]))
        );
    }

    #[test]
    fn test_precompile_success_returns_output() {
        let from = test_address(1);
        let mut view = funded_view(from, 10_000_000);
        let mut data = vec![0u8; 64];
        data[0] = 0xaa;
        data[32] = 0xbb;
        let message = Message {
            from,
            to: Some(WordReverse::ADDRESS),
            value: U256::zero(),
            gas_limit: 100_000,
            gas_price: 1,
            data,
            nonce: 1,
        };

        let output = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap();

        assert!(!output.reverted);
        assert_eq!(output.return_data[0], 0xbb);
        assert!(output.gas_used > intrinsic_gas(&message.data, false));
    }

    #[test]
    fn test_precompile_rejection_reverts_not_errors() {
        let from = test_address(1);
        let mut view = funded_view(from, 10_000_000);
        let message = Message {
            from,
            to: Some(WordReverse::ADDRESS),
            value: U256::zero(),
            gas_limit: 100_000,
            gas_price: 1,
            data: vec![0u8; 33], // not a multiple of 32
            nonce: 1,
        };

        let output = TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap();
        assert!(output.reverted);
        assert!(output.gas_used > 0);
    }

    #[test]
    fn test_unused_gas_is_refunded() {
        let from = test_address(1);
        let to = test_address(2);
        let mut view = funded_view(from, 1_000_000);
        let mut message = transfer_message(from, to, 0);
        message.gas_price = 2;

        TransferEngine::builtin()
            .execute(&message, &mut view, message.gas_limit)
            .unwrap();

        // Only intrinsic gas at price 2 was kept.
        assert_eq!(
            view.get(&from).balance,
            U256::from(1_000_000u64 - 2 * crate::TRANSFER_GAS)
        );
    }

    #[test]
    fn test_contract_address_is_deterministic() {
        let creator = test_address(9);
        assert_eq!(contract_address(&creator, 1), contract_address(&creator, 1));
        assert_ne!(contract_address(&creator, 1), contract_address(&creator, 2));
    }
}
