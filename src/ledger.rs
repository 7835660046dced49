//! The ledger service: the single authority for applying any change that
//! affects account balances.
//!
//! Every mutation keeps the invariant that an account's stored balance equals
//! its initial balance plus the sum of the signed contributions of all
//! transactions referencing it. Balance changes are issued to the store as
//! atomic increments; multi-step operations (transfer pairs, edits that move
//! money between accounts) compensate already-applied steps in reverse order
//! when a later step fails. When compensation itself fails, the operation
//! surfaces [Error::PartialBalanceUpdate] so the caller reconciles instead of
//! retrying.

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    Error,
    models::{
        Account, AccountId, AccountKind, Category, CategoryId, CategoryKind, NewAccount,
        NewCategory, NewTransaction, Transaction, TransactionId, TransactionKind,
        TransferDirection, UserId,
    },
    projection::{self, CategoryTotal, DayGroup},
    stores::{AccountStore, CategoryStore, SortOrder, TransactionQuery, TransactionStore},
};

/// The data needed to create an account through the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInput {
    /// The display name of the account.
    pub name: String,
    /// What kind of money store the account is.
    pub kind: AccountKind,
    /// The starting balance, in minor units.
    pub initial_balance: i64,
    /// The display colour.
    pub color: Option<String>,
    /// The name of the icon shown next to the account.
    pub icon: Option<String>,
}

/// The data needed to create a category through the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInput {
    /// The display name of the category.
    pub name: String,
    /// Whether the category labels income or expenses.
    pub kind: CategoryKind,
    /// The display colour.
    pub color: Option<String>,
    /// The name of the icon shown next to the category.
    pub icon: Option<String>,
}

/// The data needed to create a transaction through the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTransaction {
    /// The account the money moves in or out of; for transfers, the source.
    pub account_id: AccountId,
    /// The destination account. Required for transfers, unused otherwise.
    pub destination_account_id: Option<AccountId>,
    /// The category. Required for income and expenses, forbidden for
    /// transfers.
    pub category_id: Option<CategoryId>,
    /// The amount of money, as a positive magnitude in minor units.
    pub amount: i64,
    /// The kind of the transaction.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
}

/// The fields of a transaction that an edit may change.
///
/// `None` leaves a field as it is. The kind of a transaction can never be
/// changed; the field exists so that a caller trying to change it gets a
/// clear error instead of a silent ignore.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// Move the transaction to another account.
    pub account_id: Option<AccountId>,
    /// Re-categorise the transaction.
    pub category_id: Option<CategoryId>,
    /// Change the amount.
    pub amount: Option<i64>,
    /// Attempted kind change; always rejected.
    pub kind: Option<TransactionKind>,
    /// Change the date.
    pub date: Option<Date>,
    /// Change the description.
    pub description: Option<String>,
}

/// The result of comparing an account's stored balance against its
/// transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// The account that was checked.
    pub account_id: AccountId,
    /// The balance currently stored on the account row.
    pub stored_balance: i64,
    /// The balance recomputed from the initial balance plus the transaction
    /// history.
    pub expected_balance: i64,
}

impl BalanceReport {
    /// Whether the stored balance has drifted from the transaction history.
    pub fn has_drift(&self) -> bool {
        self.stored_balance != self.expected_balance
    }
}

/// Validates and applies every mutation that touches account balances.
///
/// Generic over the store traits so the HTTP layer and tests can supply
/// different backends.
#[derive(Debug, Clone)]
pub struct LedgerService<A, C, T> {
    accounts: A,
    categories: C,
    transactions: T,
}

impl<A, C, T> LedgerService<A, C, T>
where
    A: AccountStore,
    C: CategoryStore,
    T: TransactionStore,
{
    /// Create a ledger service over the given stores.
    pub fn new(accounts: A, categories: C, transactions: T) -> Self {
        Self {
            accounts,
            categories,
            transactions,
        }
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Create an account for `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyName] if the name is blank,
    /// - [Error::DuplicateAccount] if the user already has an account with
    ///   this name.
    pub fn create_account(&mut self, user_id: UserId, input: AccountInput) -> Result<Account, Error> {
        if input.name.trim().is_empty() {
            return Err(Error::EmptyName);
        }

        self.accounts.create(NewAccount {
            user_id,
            name: input.name,
            kind: input.kind,
            initial_balance: input.initial_balance,
            color: input.color,
            icon: input.icon,
        })
    }

    /// Retrieve the account `id` owned by `user_id`.
    pub fn get_account(&self, user_id: UserId, id: AccountId) -> Result<Account, Error> {
        self.accounts.get(id, user_id)
    }

    /// Retrieve all accounts owned by `user_id`.
    pub fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, Error> {
        self.accounts.get_by_user(user_id)
    }

    /// Delete the account `id` owned by `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if no such account exists for this user,
    /// - [Error::AccountHasTransactions] if any transaction still references
    ///   the account. There is no cascading delete.
    pub fn delete_account(&mut self, user_id: UserId, id: AccountId) -> Result<(), Error> {
        self.accounts.get(id, user_id)?;

        if self.transactions.count_by_account(id)? > 0 {
            return Err(Error::AccountHasTransactions);
        }

        self.accounts.delete(id, user_id)
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Create a category owned by `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyName] if the name is blank,
    /// - [Error::DuplicateCategory] if the user already has a category with
    ///   this name and kind.
    pub fn create_category(
        &mut self,
        user_id: UserId,
        input: CategoryInput,
    ) -> Result<Category, Error> {
        if input.name.trim().is_empty() {
            return Err(Error::EmptyName);
        }

        self.categories.create(NewCategory {
            user_id: Some(user_id),
            name: input.name,
            kind: input.kind,
            color: input.color,
            icon: input.icon,
        })
    }

    /// Retrieve the categories visible to `user_id`: their own plus the
    /// system defaults.
    pub fn list_categories(&self, user_id: UserId) -> Result<Vec<Category>, Error> {
        self.categories.get_for_user(user_id)
    }

    /// Delete the category `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the category does not exist or belongs to
    ///   another user,
    /// - [Error::SystemCategory] if the category is a shared system default,
    /// - [Error::CategoryInUse] if any transaction still references it.
    pub fn delete_category(&mut self, user_id: UserId, id: CategoryId) -> Result<(), Error> {
        let category = self.categories.get(id, user_id)?;

        if category.is_system() {
            return Err(Error::SystemCategory);
        }

        if self.transactions.count_by_category(id)? > 0 {
            return Err(Error::CategoryInUse);
        }

        self.categories.delete(id)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Create a transaction for `user_id` and apply its balance effect.
    ///
    /// Income and expenses insert one row and adjust the account by
    /// `+amount` or `-amount`. Transfers insert two linked legs (outgoing on
    /// the source, incoming on the destination) and move `amount` from the
    /// source to the destination. The returned vector holds one row, or the
    /// outgoing and incoming legs in that order.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NonPositiveAmount] if the amount is zero or negative,
    /// - [Error::MissingCategory] for an income/expense without a category,
    /// - [Error::CategoryOnTransfer] for a transfer with a category,
    /// - [Error::MissingDestinationAccount] or [Error::SameAccountTransfer]
    ///   for malformed transfers,
    /// - [Error::NotFound] if an account or category does not resolve to a
    ///   row visible to this user,
    /// - [Error::PartialBalanceUpdate] if a step failed and undoing the
    ///   already-applied steps also failed.
    pub fn create_transaction(
        &mut self,
        user_id: UserId,
        input: CreateTransaction,
    ) -> Result<Vec<Transaction>, Error> {
        if input.amount <= 0 {
            return Err(Error::NonPositiveAmount);
        }

        match input.kind {
            TransactionKind::Income | TransactionKind::Expense => {
                self.create_single(user_id, input)
            }
            TransactionKind::Transfer => self.create_transfer(user_id, input),
        }
    }

    fn create_single(
        &mut self,
        user_id: UserId,
        input: CreateTransaction,
    ) -> Result<Vec<Transaction>, Error> {
        let category_id = input.category_id.ok_or(Error::MissingCategory)?;

        self.accounts.get(input.account_id, user_id)?;
        self.categories.get(category_id, user_id)?;

        let transaction = self.transactions.create(NewTransaction {
            user_id,
            account_id: input.account_id,
            category_id: Some(category_id),
            amount: input.amount,
            kind: input.kind,
            direction: None,
            date: input.date,
            description: input.description,
            related_transaction_id: None,
        })?;

        if let Err(error) =
            self.accounts
                .adjust_balance(input.account_id, user_id, transaction.signed_contribution())
        {
            return Err(self.undo_rows(user_id, &[transaction.id], &[input.account_id], error));
        }

        Ok(vec![transaction])
    }

    fn create_transfer(
        &mut self,
        user_id: UserId,
        input: CreateTransaction,
    ) -> Result<Vec<Transaction>, Error> {
        if input.category_id.is_some() {
            return Err(Error::CategoryOnTransfer);
        }

        let destination_id = input
            .destination_account_id
            .ok_or(Error::MissingDestinationAccount)?;

        if destination_id == input.account_id {
            return Err(Error::SameAccountTransfer);
        }

        self.accounts.get(input.account_id, user_id)?;
        self.accounts.get(destination_id, user_id)?;

        let affected = [input.account_id, destination_id];

        let mut outgoing = self.transactions.create(NewTransaction {
            user_id,
            account_id: input.account_id,
            category_id: None,
            amount: input.amount,
            kind: TransactionKind::Transfer,
            direction: Some(TransferDirection::Outgoing),
            date: input.date,
            description: input.description.clone(),
            related_transaction_id: None,
        })?;

        let incoming = match self.transactions.create(NewTransaction {
            user_id,
            account_id: destination_id,
            category_id: None,
            amount: input.amount,
            kind: TransactionKind::Transfer,
            direction: Some(TransferDirection::Incoming),
            date: input.date,
            description: input.description,
            related_transaction_id: Some(outgoing.id),
        }) {
            Ok(incoming) => incoming,
            Err(error) => return Err(self.undo_rows(user_id, &[outgoing.id], &affected, error)),
        };

        if let Err(error) = self
            .transactions
            .set_related(outgoing.id, user_id, incoming.id)
        {
            return Err(self.undo_rows(user_id, &[incoming.id, outgoing.id], &affected, error));
        }
        outgoing.related_transaction_id = Some(incoming.id);

        if let Err(error) = self
            .accounts
            .adjust_balance(input.account_id, user_id, -input.amount)
        {
            return Err(self.undo_rows(user_id, &[incoming.id, outgoing.id], &affected, error));
        }

        if let Err(error) = self
            .accounts
            .adjust_balance(destination_id, user_id, input.amount)
        {
            // Undo the source adjustment before dropping the rows.
            if self
                .accounts
                .adjust_balance(input.account_id, user_id, input.amount)
                .is_err()
            {
                return Err(partial(&affected));
            }
            return Err(self.undo_rows(user_id, &[incoming.id, outgoing.id], &affected, error));
        }

        Ok(vec![outgoing, incoming])
    }

    /// Edit a transaction and move its balance effect accordingly.
    ///
    /// The original contribution is reversed on the original account before
    /// the new contribution is applied on the (possibly different) new
    /// account. The two-step order holds even when the account is unchanged,
    /// so that an edit changing both amount and account can never leave a
    /// residue behind.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::KindChangeNotAllowed] if the patch carries a kind,
    /// - [Error::TransferLegNotEditable] if the transaction is a transfer
    ///   leg,
    /// - [Error::NonPositiveAmount] if the new amount is zero or negative,
    /// - [Error::NotFound] if the transaction, new account, or new category
    ///   does not resolve for this user,
    /// - [Error::PartialBalanceUpdate] if a step failed and undoing the
    ///   already-applied steps also failed.
    pub fn update_transaction(
        &mut self,
        user_id: UserId,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, Error> {
        if patch.kind.is_some() {
            return Err(Error::KindChangeNotAllowed);
        }

        let original = self.transactions.get(id, user_id)?;

        if original.is_transfer_leg() {
            return Err(Error::TransferLegNotEditable);
        }

        let amount = patch.amount.unwrap_or(original.amount);
        if amount <= 0 {
            return Err(Error::NonPositiveAmount);
        }

        let account_id = patch.account_id.unwrap_or(original.account_id);
        if account_id != original.account_id {
            self.accounts.get(account_id, user_id)?;
        }

        if let Some(new_category) = patch.category_id {
            self.categories.get(new_category, user_id)?;
        }
        let category_id = patch.category_id.or(original.category_id);

        let updated = Transaction {
            account_id,
            category_id,
            amount,
            date: patch.date.unwrap_or(original.date),
            description: patch
                .description
                .unwrap_or_else(|| original.description.clone()),
            ..original.clone()
        };

        let mut affected = vec![original.account_id];
        if updated.account_id != original.account_id {
            affected.push(updated.account_id);
        }

        // Step 1: reverse the original effect on the original account.
        self.accounts.adjust_balance(
            original.account_id,
            user_id,
            -original.signed_contribution(),
        )?;

        // Step 2: rewrite the row.
        if let Err(error) = self.transactions.update_row(&updated) {
            if self
                .accounts
                .adjust_balance(original.account_id, user_id, original.signed_contribution())
                .is_err()
            {
                return Err(partial(&affected));
            }
            return Err(error);
        }

        // Step 3: apply the new effect on the new account.
        if let Err(error) =
            self.accounts
                .adjust_balance(updated.account_id, user_id, updated.signed_contribution())
        {
            let row_restored = self.transactions.update_row(&original).is_ok();
            let balance_restored = self
                .accounts
                .adjust_balance(original.account_id, user_id, original.signed_contribution())
                .is_ok();
            if !row_restored || !balance_restored {
                return Err(partial(&affected));
            }
            return Err(error);
        }

        Ok(updated)
    }

    /// Delete a transaction and reverse its balance effect.
    ///
    /// A transfer leg resolves its pair and both legs are removed as one
    /// logical operation; a leg whose pair link is dangling is removed on its
    /// own, which is also how orphan repair works.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if no such transaction exists for this user,
    /// - [Error::PartialBalanceUpdate] if a step failed and undoing the
    ///   already-applied steps also failed.
    pub fn delete_transaction(&mut self, user_id: UserId, id: TransactionId) -> Result<(), Error> {
        let transaction = self.transactions.get(id, user_id)?;

        let mut legs = vec![transaction.clone()];
        if let Some(related_id) = transaction.related_transaction_id {
            match self.transactions.get(related_id, user_id) {
                Ok(pair) => legs.push(pair),
                // A dangling link means the pair is already gone; the
                // remaining leg is deleted on its own.
                Err(Error::NotFound) => {}
                Err(error) => return Err(error),
            }
        }

        self.remove_legs(user_id, &legs)
    }

    /// Retrieve the transaction `id` owned by `user_id`.
    pub fn get_transaction(&self, user_id: UserId, id: TransactionId) -> Result<Transaction, Error> {
        self.transactions.get(id, user_id)
    }

    /// Retrieve transactions for `user_id`, optionally filtered by account
    /// and date range, newest first.
    pub fn list_transactions(
        &self,
        user_id: UserId,
        account_id: Option<AccountId>,
        date_range: Option<std::ops::RangeInclusive<Date>>,
    ) -> Result<Vec<Transaction>, Error> {
        self.transactions.get_query(TransactionQuery {
            user_id,
            account_id,
            kind: None,
            date_range,
            sort_date: Some(SortOrder::Descending),
            limit: None,
        })
    }

    // ------------------------------------------------------------------
    // Projections and reconciliation
    // ------------------------------------------------------------------

    /// Total expenses per category for `user_id` within a calendar month,
    /// sorted by total descending, then category name ascending.
    pub fn monthly_expense_by_category(
        &self,
        user_id: UserId,
        year: i32,
        month: Month,
    ) -> Result<Vec<CategoryTotal>, Error> {
        let start = Date::from_calendar_date(year, month, 1).map_err(|_| Error::InvalidDate)?;
        let end = Date::from_calendar_date(
            year,
            month,
            time::util::days_in_year_month(year, month),
        )
        .map_err(|_| Error::InvalidDate)?;

        let expenses = self.transactions.get_query(TransactionQuery {
            user_id,
            account_id: None,
            kind: Some(TransactionKind::Expense),
            date_range: Some(start..=end),
            sort_date: None,
            limit: None,
        })?;
        let categories = self.categories.get_for_user(user_id)?;

        Ok(projection::monthly_expense_by_category(
            &expenses,
            &categories,
        ))
    }

    /// Transactions for `user_id` grouped by calendar day, newest day first,
    /// with incoming transfer legs suppressed so each transfer shows once.
    pub fn transactions_grouped_by_day(
        &self,
        user_id: UserId,
        account_id: Option<AccountId>,
        date_range: Option<std::ops::RangeInclusive<Date>>,
    ) -> Result<Vec<DayGroup>, Error> {
        let transactions = self.list_transactions(user_id, account_id, date_range)?;

        Ok(projection::group_by_day(transactions))
    }

    /// Compare the stored balance of the account `id` against the balance
    /// recomputed from its transaction history.
    ///
    /// This recomputation is the canonical drift detector: it should be run
    /// whenever an operation reported a partial failure.
    pub fn check_balance(
        &self,
        user_id: UserId,
        id: AccountId,
    ) -> Result<BalanceReport, Error> {
        let account = self.accounts.get(id, user_id)?;
        let transactions = self.transactions.get_query(TransactionQuery {
            account_id: Some(id),
            ..TransactionQuery::for_user(user_id)
        })?;

        Ok(BalanceReport {
            account_id: id,
            stored_balance: account.balance,
            expected_balance: projection::expected_balance(&account, &transactions),
        })
    }

    /// Rewrite the stored balance of the account `id` to the value
    /// recomputed from its transaction history, and report what changed.
    pub fn repair_balance(
        &mut self,
        user_id: UserId,
        id: AccountId,
    ) -> Result<BalanceReport, Error> {
        let report = self.check_balance(user_id, id)?;

        if report.has_drift() {
            self.accounts
                .set_balance(id, user_id, report.expected_balance)?;
        }

        Ok(report)
    }

    /// Transfer legs owned by `user_id` whose pair link is missing or
    /// dangling.
    ///
    /// An orphan is left behind when a caller abandons a transfer between
    /// the two inserts, or when deleting a pair failed half-way.
    pub fn find_orphaned_transfer_legs(&self, user_id: UserId) -> Result<Vec<Transaction>, Error> {
        let legs = self.transactions.get_query(TransactionQuery {
            kind: Some(TransactionKind::Transfer),
            ..TransactionQuery::for_user(user_id)
        })?;

        let ids: std::collections::HashSet<TransactionId> =
            legs.iter().map(|leg| leg.id).collect();

        Ok(legs
            .into_iter()
            .filter(|leg| match leg.related_transaction_id {
                Some(related_id) => !ids.contains(&related_id),
                None => true,
            })
            .collect())
    }

    /// Reverse and remove every orphaned transfer leg owned by `user_id`,
    /// returning the ids of the removed rows.
    pub fn repair_orphaned_transfer_legs(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<TransactionId>, Error> {
        let orphans = self.find_orphaned_transfer_legs(user_id)?;
        let mut removed = Vec::with_capacity(orphans.len());

        for orphan in orphans {
            self.remove_legs(user_id, std::slice::from_ref(&orphan))?;
            removed.push(orphan.id);
        }

        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Compensation helpers
    // ------------------------------------------------------------------

    /// Reverse the balance effect of `legs` and delete their rows.
    ///
    /// Balances are reversed first: if a row deletion then fails, the
    /// reversal of the still-present rows is undone, leaving every account
    /// consistent with the rows that remain.
    fn remove_legs(&mut self, user_id: UserId, legs: &[Transaction]) -> Result<(), Error> {
        let affected: Vec<AccountId> = legs.iter().map(|leg| leg.account_id).collect();

        for (index, leg) in legs.iter().enumerate() {
            if let Err(error) =
                self.accounts
                    .adjust_balance(leg.account_id, user_id, -leg.signed_contribution())
            {
                for applied in &legs[..index] {
                    if self
                        .accounts
                        .adjust_balance(applied.account_id, user_id, applied.signed_contribution())
                        .is_err()
                    {
                        return Err(partial(&affected));
                    }
                }
                return Err(error);
            }
        }

        for (index, leg) in legs.iter().enumerate() {
            if let Err(error) = self.transactions.delete_row(leg.id, user_id) {
                // Rows before `index` are gone with their effect reversed,
                // which keeps their accounts consistent. Restore the balance
                // for the rows that are still present.
                for remaining in &legs[index..] {
                    if self
                        .accounts
                        .adjust_balance(
                            remaining.account_id,
                            user_id,
                            remaining.signed_contribution(),
                        )
                        .is_err()
                    {
                        return Err(partial(&affected));
                    }
                }
                return Err(error);
            }
        }

        Ok(())
    }

    /// Delete rows created by an aborted multi-step operation.
    ///
    /// Returns `original_error` when every deletion succeeded, otherwise the
    /// partial-failure error naming `affected` accounts.
    fn undo_rows(
        &mut self,
        user_id: UserId,
        ids: &[TransactionId],
        affected: &[AccountId],
        original_error: Error,
    ) -> Error {
        for id in ids {
            if self.transactions.delete_row(*id, user_id).is_err() {
                return partial(affected);
            }
        }

        original_error
    }
}

fn partial(affected: &[AccountId]) -> Error {
    Error::PartialBalanceUpdate {
        affected_accounts: affected.to_vec(),
    }
}
