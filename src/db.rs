//! Database schema initialisation.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    stores::sqlite::{create_account_table, create_category_table, create_transaction_table},
};

/// The system default categories seeded on first start, as (name, kind,
/// icon) tuples.
///
/// These rows have no owner (`user_id IS NULL`) and are visible to every
/// user. A user creating a category with the same name and kind shadows the
/// system row in read views without touching it.
pub const SYSTEM_CATEGORIES: [(&str, &str, &str); 10] = [
    ("Salary", "income", "briefcase"),
    ("Gift", "income", "gift"),
    ("Other", "income", "coins"),
    ("Food", "expense", "utensils"),
    ("Transport", "expense", "bus"),
    ("Shopping", "expense", "shopping-bag"),
    ("Bills", "expense", "file-text"),
    ("Entertainment", "expense", "film"),
    ("Health", "expense", "heart-pulse"),
    ("Other", "expense", "coins"),
];

/// Create the application's tables and seed the system categories.
///
/// Safe to call on every start; tables and seed rows are only created when
/// missing.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL
/// error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    seed_system_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn seed_system_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (user_id, name, kind, color, icon)
         VALUES (NULL, ?1, ?2, NULL, ?3)",
    )?;

    for (name, kind, icon) in SYSTEM_CATEGORIES {
        statement.execute((name, kind, icon))?;
    }

    Ok(())
}
