//! Isolated ledger views.

use crate::Account;
use ledgermint_types::{Address, Hash, U256};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from ledger mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A debit would drive the balance negative.
    #[error("insufficient funds for {address}: balance {balance}, needed {needed}")]
    InsufficientFunds {
        address: Address,
        balance: U256,
        needed: U256,
    },
}

/// An isolated snapshot of all account state.
///
/// Accounts are kept in a `BTreeMap` so iteration, and therefore the root
/// hash, follows canonical address order regardless of mutation order.
/// `fork` is a deep copy: the clone shares no mutable memory with the
/// source, so independent mutation of either side is safe.
#[derive(Clone, Debug, Default)]
pub struct LedgerView {
    accounts: BTreeMap<Address, Account>,
}

impl LedgerView {
    /// An empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an account. Absent addresses return the zero account.
    pub fn get(&self, address: &Address) -> Account {
        self.accounts.get(address).cloned().unwrap_or_default()
    }

    /// Add `amount` to an account, creating it if absent.
    pub fn credit(&mut self, address: Address, amount: U256) {
        let account = self.accounts.entry(address).or_default();
        account.balance += amount;
    }

    /// Remove `amount` from an account.
    ///
    /// Fails without mutating if the balance does not cover the amount.
    pub fn debit(&mut self, address: Address, amount: U256) -> Result<(), LedgerError> {
        let account = self.accounts.entry(address).or_default();
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                address,
                balance: account.balance,
                needed: amount,
            });
        }
        account.balance -= amount;
        Ok(())
    }

    /// Set an account's nonce, creating the account if absent.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.accounts.entry(address).or_default().nonce = nonce;
    }

    /// Overwrite an account's balance. Used for genesis grants.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    /// Attach a code reference to an account (contract creation).
    pub fn set_code_ref(&mut self, address: Address, code_ref: Hash) {
        self.accounts.entry(address).or_default().code_ref = Some(code_ref);
    }

    /// Produce a fully independent deep copy of this view.
    pub fn fork(&self) -> LedgerView {
        self.clone()
    }

    /// Iterate all non-empty accounts in canonical address order.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter().filter(|(_, a)| !a.is_empty())
    }

    /// Number of non-empty accounts.
    pub fn len(&self) -> usize {
        self.accounts().count()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts().next().is_none()
    }

    /// Deterministic digest over the full account set.
    ///
    /// Computed over non-empty accounts in canonical address order, so two
    /// views holding the same accounts produce the same digest regardless of
    /// the order in which they were mutated. Accounts that have returned to
    /// the zero state hash identically to absent ones.
    pub fn root_hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ledgermint:state:v1");
        for (address, account) in self.accounts() {
            hasher.update(address.as_bytes());
            let mut balance = [0u8; 32];
            account.balance.to_big_endian(&mut balance);
            hasher.update(&balance);
            hasher.update(&account.nonce.to_le_bytes());
            match &account.code_ref {
                Some(code_ref) => {
                    hasher.update(&[1]);
                    hasher.update(code_ref.as_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
        Hash::from_hasher(hasher)
    }
}
