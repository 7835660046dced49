//! Implements a SQLite backed account store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    models::{Account, AccountId, NewAccount, UserId},
    stores::{AccountStore, sqlite::parse_text_column},
};

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                initial_balance INTEGER NOT NULL,
                balance INTEGER NOT NULL,
                color TEXT,
                icon TEXT,
                UNIQUE(user_id, name)
                )",
        (),
    )?;

    Ok(())
}

/// Stores accounts in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteAccountStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn map_row(row: &Row) -> Result<Account, rusqlite::Error> {
        Ok(Account {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            kind: parse_text_column(row, 3)?,
            initial_balance: row.get(4)?,
            balance: row.get(5)?,
            color: row.get(6)?,
            icon: row.get(7)?,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, user_id, name, kind, initial_balance, balance, color, icon";

impl AccountStore for SqliteAccountStore {
    /// Create a new account in the database.
    ///
    /// The current balance starts equal to the initial balance.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateAccount] if the user already has an account with
    ///   this name,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, account: NewAccount) -> Result<Account, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let account = connection
            .prepare(&format!(
                "INSERT INTO account (user_id, name, kind, initial_balance, balance, color, icon)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6)
                 RETURNING {ACCOUNT_COLUMNS}"
            ))?
            .query_row(
                (
                    account.user_id,
                    account.name,
                    account.kind.to_string(),
                    account.initial_balance,
                    account.color,
                    account.icon,
                ),
                Self::map_row,
            )?;

        Ok(account)
    }

    fn get(&self, id: AccountId, user_id: UserId) -> Result<Account, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let account = connection
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = :id AND user_id = :user_id"
            ))?
            .query_row(&[(":id", &id), (":user_id", &user_id)], Self::map_row)?;

        Ok(account)
    }

    fn get_by_user(&self, user_id: UserId) -> Result<Vec<Account>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        connection
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = :user_id ORDER BY name ASC"
            ))?
            .query_map(&[(":user_id", &user_id)], Self::map_row)?
            .map(|maybe_account| maybe_account.map_err(Error::from))
            .collect()
    }

    /// Atomically add `delta` to the stored balance.
    ///
    /// The increment is evaluated inside the database, so concurrent callers
    /// never overwrite each other with stale values.
    fn adjust_balance(&mut self, id: AccountId, user_id: UserId, delta: i64) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected = connection.execute(
            "UPDATE account SET balance = balance + :delta
             WHERE id = :id AND user_id = :user_id",
            &[(":delta", &delta), (":id", &id), (":user_id", &user_id)],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn set_balance(&mut self, id: AccountId, user_id: UserId, balance: i64) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected = connection.execute(
            "UPDATE account SET balance = :balance WHERE id = :id AND user_id = :user_id",
            &[(":balance", &balance), (":id", &id), (":user_id", &user_id)],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn delete(&mut self, id: AccountId, user_id: UserId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected = connection.execute(
            "DELETE FROM account WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id)],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        models::{AccountKind, NewAccount},
        stores::AccountStore,
    };

    use super::SqliteAccountStore;

    fn get_test_store() -> SqliteAccountStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SqliteAccountStore::new(Arc::new(Mutex::new(connection)))
    }

    fn new_account(user_id: i64, name: &str, initial_balance: i64) -> NewAccount {
        NewAccount {
            user_id,
            name: name.to_owned(),
            kind: AccountKind::Cash,
            initial_balance,
            color: Some("#2e7d32".to_owned()),
            icon: Some("wallet".to_owned()),
        }
    }

    #[test]
    fn create_starts_balance_at_initial_balance() {
        let mut store = get_test_store();

        let account = store.create(new_account(1, "Cash", 100_000)).unwrap();

        assert_eq!(account.initial_balance, 100_000);
        assert_eq!(account.balance, 100_000);
    }

    #[test]
    fn create_fails_on_duplicate_name_for_same_user() {
        let mut store = get_test_store();
        store.create(new_account(1, "Cash", 0)).unwrap();

        let duplicate = store.create(new_account(1, "Cash", 0));

        assert_eq!(duplicate, Err(Error::DuplicateAccount));
    }

    #[test]
    fn create_allows_same_name_for_different_users() {
        let mut store = get_test_store();
        store.create(new_account(1, "Cash", 0)).unwrap();

        let result = store.create(new_account(2, "Cash", 0));

        assert!(result.is_ok());
    }

    #[test]
    fn get_is_scoped_to_the_owner() {
        let mut store = get_test_store();
        let account = store.create(new_account(1, "Cash", 0)).unwrap();

        let foreign = store.get(account.id, 2);

        assert_eq!(foreign, Err(Error::NotFound));
    }

    #[test]
    fn adjust_balance_applies_signed_deltas() {
        let mut store = get_test_store();
        let account = store.create(new_account(1, "Cash", 50_000)).unwrap();

        store.adjust_balance(account.id, 1, -20_000).unwrap();
        store.adjust_balance(account.id, 1, 5_000).unwrap();

        let account = store.get(account.id, 1).unwrap();
        assert_eq!(account.balance, 35_000);
    }

    #[test]
    fn adjust_balance_fails_for_missing_account() {
        let mut store = get_test_store();

        let result = store.adjust_balance(42, 1, 1_000);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_is_scoped_to_the_owner() {
        let mut store = get_test_store();
        let account = store.create(new_account(1, "Cash", 0)).unwrap();

        assert_eq!(store.delete(account.id, 2), Err(Error::NotFound));
        assert_eq!(store.delete(account.id, 1), Ok(()));
    }

    #[test]
    fn get_by_user_returns_accounts_sorted_by_name() {
        let mut store = get_test_store();
        store.create(new_account(1, "Wallet", 0)).unwrap();
        store.create(new_account(1, "Bank", 0)).unwrap();
        store.create(new_account(2, "Other", 0)).unwrap();

        let accounts = store.get_by_user(1).unwrap();

        let names: Vec<&str> = accounts.iter().map(|account| account.name.as_str()).collect();
        assert_eq!(names, ["Bank", "Wallet"]);
    }
}
