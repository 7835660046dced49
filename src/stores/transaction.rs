//! Defines the transaction store trait.

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    models::{
        AccountId, CategoryId, NewTransaction, Transaction, TransactionId, TransactionKind, UserId,
    },
};

/// Handles the creation and retrieval of transactions.
///
/// The store only moves rows; keeping account balances in step with those
/// rows is the ledger's job.
pub trait TransactionStore {
    /// Insert a new transaction row in the store.
    fn create(&mut self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve the transaction `id` owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such transaction exists for this user.
    fn get(&self, id: TransactionId, user_id: UserId) -> Result<Transaction, Error>;

    /// Retrieve transactions from the store in the way defined by `query`.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// Overwrite the mutable fields of the row `transaction.id` owned by
    /// `transaction.user_id`: account, category, amount, date, description.
    ///
    /// The kind, direction, and pair link of a row never change.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such transaction exists for this user.
    fn update_row(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Delete the transaction row `id` owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such transaction exists for this user.
    fn delete_row(&mut self, id: TransactionId, user_id: UserId) -> Result<(), Error>;

    /// Point `id`'s pair link at `related_id`, completing a transfer pair.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such transaction exists for this user.
    fn set_related(
        &mut self,
        id: TransactionId,
        user_id: UserId,
        related_id: TransactionId,
    ) -> Result<(), Error>;

    /// The number of transactions that reference the account `id`.
    fn count_by_account(&self, id: AccountId) -> Result<u32, Error>;

    /// The number of transactions that reference the category `id`.
    fn count_by_category(&self, id: CategoryId) -> Result<u32, Error>;
}

/// Defines how transactions should be fetched from
/// [TransactionStore::get_query].
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    /// Only include transactions owned by this user.
    pub user_id: UserId,
    /// Only include transactions on this account.
    pub account_id: Option<AccountId>,
    /// Only include transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Only include transactions within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
    /// Orders transactions by date in the order `sort_date`. `None` returns
    /// transactions in the order they are stored.
    pub sort_date: Option<SortOrder>,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: Option<u64>,
}

impl TransactionQuery {
    /// A query for all transactions owned by `user_id`, in storage order.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            account_id: None,
            kind: None,
            date_range: None,
            sort_date: None,
            limit: None,
        }
    }
}

/// The order to sort transactions in a [TransactionQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}
