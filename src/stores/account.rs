//! Defines the account store trait.

use crate::{
    Error,
    models::{Account, AccountId, NewAccount, UserId},
};

/// Handles the creation and retrieval of accounts and their balances.
///
/// Balance changes go through [AccountStore::adjust_balance], which
/// implementers must evaluate server-side (`balance = balance + delta`) so
/// that concurrent writers cannot lose each other's updates.
pub trait AccountStore {
    /// Create a new account in the store.
    ///
    /// The current balance starts equal to the initial balance.
    fn create(&mut self, account: NewAccount) -> Result<Account, Error>;

    /// Retrieve the account `id` owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such account exists for this user.
    fn get(&self, id: AccountId, user_id: UserId) -> Result<Account, Error>;

    /// Retrieve all accounts owned by `user_id`.
    fn get_by_user(&self, user_id: UserId) -> Result<Vec<Account>, Error>;

    /// Atomically add `delta` (which may be negative) to the stored balance
    /// of the account `id` owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such account exists for this user.
    fn adjust_balance(&mut self, id: AccountId, user_id: UserId, delta: i64) -> Result<(), Error>;

    /// Overwrite the stored balance of the account `id` owned by `user_id`.
    ///
    /// Only the reconciliation path may use this; normal mutations go through
    /// [AccountStore::adjust_balance].
    fn set_balance(&mut self, id: AccountId, user_id: UserId, balance: i64) -> Result<(), Error>;

    /// Delete the account `id` owned by `user_id`.
    ///
    /// This is the raw row deletion; the ledger checks for referencing
    /// transactions before calling it.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such account exists for this user.
    fn delete(&mut self, id: AccountId, user_id: UserId) -> Result<(), Error>;
}
