//! SQLite backed implementations of the store traits.
//!
//! The store instances share one connection behind an `Arc<Mutex<_>>`; each
//! SQL statement is atomic on its own, which is what the ledger's
//! compensation logic relies on.

mod account;
mod category;
mod transaction;

use std::{fmt, str::FromStr};

use rusqlite::{Row, types::Type};

pub use account::{SqliteAccountStore, create_account_table};
pub use category::{SqliteCategoryStore, create_category_table};
pub use transaction::{SqliteTransactionStore, create_transaction_table};

/// Read a TEXT column at `index` and parse it into `T`.
///
/// Used for the kind and direction enums, which are stored as lowercase
/// strings.
pub(crate) fn parse_text_column<T>(row: &Row, index: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let text: String = row.get(index)?;

    text.parse().map_err(|error: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, error.to_string().into())
    })
}

/// Read a nullable TEXT column at `index` and parse it into `Option<T>`.
pub(crate) fn parse_optional_text_column<T>(
    row: &Row,
    index: usize,
) -> Result<Option<T>, rusqlite::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let text: Option<String> = row.get(index)?;

    text.map(|value| {
        value.parse().map_err(|error: T::Err| {
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, error.to_string().into())
        })
    })
    .transpose()
}
