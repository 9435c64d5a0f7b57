//! Execution messages.

use ledgermint_types::{Address, SignedTransaction, U256};

/// A transaction resolved to its sender, ready for execution.
///
/// Built after sender recovery; the engine never sees raw signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Recovered sender.
    pub from: Address,
    /// Recipient; `None` for contract creation.
    pub to: Option<Address>,
    /// Value transferred to the recipient.
    pub value: U256,
    /// Gas limit declared by the sender.
    pub gas_limit: u64,
    /// Gas price charged against the sender.
    pub gas_price: u64,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Transaction nonce.
    pub nonce: u64,
}

impl Message {
    /// Resolve a signed transaction against its recovered sender.
    pub fn resolve(tx: &SignedTransaction, from: Address) -> Self {
        Self {
            from,
            to: tx.to,
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
            data: tx.data.clone(),
            nonce: tx.nonce,
        }
    }

    /// Total funds the sender must hold: `value + gas_limit * gas_price`.
    ///
    /// Returns `None` when the sum overflows 256 bits; no balance can cover
    /// such a cost.
    pub fn cost(&self) -> Option<U256> {
        let gas = U256::from(self.gas_limit).checked_mul(U256::from(self.gas_price))?;
        self.value.checked_add(gas)
    }

    /// Whether this message creates a contract.
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}
