//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    models::{AccountId, CategoryId, NewTransaction, Transaction, TransactionId, UserId},
    stores::{
        TransactionStore,
        sqlite::{parse_optional_text_column, parse_text_column},
        transaction::{SortOrder, TransactionQuery},
    },
};

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                category_id INTEGER,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                kind TEXT NOT NULL,
                direction TEXT,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                related_transaction_id INTEGER,
                FOREIGN KEY(account_id) REFERENCES account(id),
                FOREIGN KEY(category_id) REFERENCES category(id)
                )",
        (),
    )?;

    // Composite indexes used by the account filter and the date-ranged
    // projections.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
         ON \"transaction\"(account_id, date)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
         ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction references the
/// [Account](crate::models::Account) and [Category](crate::models::Category)
/// models, those tables must be set up in the database.
#[derive(Debug, Clone)]
pub struct SqliteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            account_id: row.get(2)?,
            category_id: row.get(3)?,
            amount: row.get(4)?,
            kind: parse_text_column(row, 5)?,
            direction: parse_optional_text_column(row, 6)?,
            date: row.get(7)?,
            description: row.get(8)?,
            related_transaction_id: row.get(9)?,
        })
    }
}

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, amount, kind, direction, \
                                   date, description, related_transaction_id";

impl TransactionStore for SqliteTransactionStore {
    /// Insert a new transaction row in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the account or category id does not refer to an
    ///   existing row,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let transaction = connection
            .prepare(&format!(
                "INSERT INTO \"transaction\"
                 (user_id, account_id, category_id, amount, kind, direction, date, description,
                  related_transaction_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    transaction.user_id,
                    transaction.account_id,
                    transaction.category_id,
                    transaction.amount,
                    transaction.kind.to_string(),
                    transaction.direction.map(|direction| direction.to_string()),
                    transaction.date,
                    transaction.description,
                    transaction.related_transaction_id,
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    fn get(&self, id: TransactionId, user_id: UserId) -> Result<Transaction, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let transaction = connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE id = :id AND user_id = :user_id"
            ))?
            .query_row(&[(":id", &id), (":user_id", &user_id)], Self::map_row)?;

        Ok(transaction)
    }

    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let mut sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE user_id = ?1"
        );
        let mut params: Vec<Value> = vec![Value::Integer(query.user_id)];

        if let Some(account_id) = query.account_id {
            params.push(Value::Integer(account_id));
            sql.push_str(&format!(" AND account_id = ?{}", params.len()));
        }

        if let Some(kind) = query.kind {
            params.push(Value::Text(kind.to_string()));
            sql.push_str(&format!(" AND kind = ?{}", params.len()));
        }

        if let Some(date_range) = query.date_range {
            params.push(Value::Text(date_range.start().to_string()));
            sql.push_str(&format!(" AND date >= ?{}", params.len()));
            params.push(Value::Text(date_range.end().to_string()));
            sql.push_str(&format!(" AND date <= ?{}", params.len()));
        }

        match query.sort_date {
            Some(SortOrder::Ascending) => sql.push_str(" ORDER BY date ASC, id ASC"),
            Some(SortOrder::Descending) => sql.push_str(" ORDER BY date DESC, id DESC"),
            None => {}
        }

        if let Some(limit) = query.limit {
            params.push(Value::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }

        connection
            .prepare(&sql)?
            .query_map(params_from_iter(params), Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    fn update_row(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected = connection.execute(
            "UPDATE \"transaction\"
             SET account_id = :account_id, category_id = :category_id, amount = :amount,
                 date = :date, description = :description
             WHERE id = :id AND user_id = :user_id",
            rusqlite::named_params! {
                ":account_id": transaction.account_id,
                ":category_id": transaction.category_id,
                ":amount": transaction.amount,
                ":date": transaction.date,
                ":description": transaction.description,
                ":id": transaction.id,
                ":user_id": transaction.user_id,
            },
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn delete_row(&mut self, id: TransactionId, user_id: UserId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected = connection.execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id)],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn set_related(
        &mut self,
        id: TransactionId,
        user_id: UserId,
        related_id: TransactionId,
    ) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected = connection.execute(
            "UPDATE \"transaction\" SET related_transaction_id = :related_id
             WHERE id = :id AND user_id = :user_id",
            &[(":related_id", &related_id), (":id", &id), (":user_id", &user_id)],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn count_by_account(&self, id: AccountId) -> Result<u32, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        connection
            .query_row(
                "SELECT COUNT(id) FROM \"transaction\" WHERE account_id = :id",
                &[(":id", &id)],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    fn count_by_category(&self, id: CategoryId) -> Result<u32, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        connection
            .query_row(
                "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = :id",
                &[(":id", &id)],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }
}
