//! Implements a SQLite backed category store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    models::{Category, CategoryId, NewCategory, UserId},
    stores::{CategoryStore, sqlite::parse_text_column},
};

/// Create the category table in the database.
///
/// A pair of partial unique indexes keeps names unique per kind within the
/// system defaults and within each user's own rows, while still letting a
/// user's row shadow a system row with the same name.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                user_id INTEGER,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                color TEXT,
                icon TEXT
                )",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_category_system
         ON category(name, kind) WHERE user_id IS NULL",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_category_owner
         ON category(user_id, name, kind) WHERE user_id IS NOT NULL",
        (),
    )?;

    Ok(())
}

/// Stores categories in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCategoryStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
        Ok(Category {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            kind: parse_text_column(row, 3)?,
            color: row.get(4)?,
            icon: row.get(5)?,
        })
    }
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, color, icon";

impl CategoryStore for SqliteCategoryStore {
    /// Create a new category in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateCategory] if the owner already has a category with
    ///   this name and kind,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, category: NewCategory) -> Result<Category, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let category = connection
            .prepare(&format!(
                "INSERT INTO category (user_id, name, kind, color, icon)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {CATEGORY_COLUMNS}"
            ))?
            .query_row(
                (
                    category.user_id,
                    category.name,
                    category.kind.to_string(),
                    category.color,
                    category.icon,
                ),
                Self::map_row,
            )?;

        Ok(category)
    }

    /// Retrieve the category `id` if it is owned by `user_id` or is a system
    /// default.
    fn get(&self, id: CategoryId, user_id: UserId) -> Result<Category, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let category = connection
            .prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM category
                 WHERE id = :id AND (user_id = :user_id OR user_id IS NULL)"
            ))?
            .query_row(&[(":id", &id), (":user_id", &user_id)], Self::map_row)?;

        Ok(category)
    }

    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Category>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        connection
            .prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM category
                 WHERE user_id = :user_id OR user_id IS NULL
                 ORDER BY id ASC"
            ))?
            .query_map(&[(":user_id", &user_id)], Self::map_row)?
            .map(|maybe_category| maybe_category.map_err(Error::from))
            .collect()
    }

    fn delete(&mut self, id: CategoryId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLockError)?;

        let rows_affected =
            connection.execute("DELETE FROM category WHERE id = :id", &[(":id", &id)])?;

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
        models::{CategoryKind, NewCategory},
        stores::CategoryStore,
    };

    use super::SqliteCategoryStore;

    fn get_test_store() -> SqliteCategoryStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SqliteCategoryStore::new(Arc::new(Mutex::new(connection)))
    }

    fn new_category(user_id: Option<i64>, name: &str, kind: CategoryKind) -> NewCategory {
        NewCategory {
            user_id,
            name: name.to_owned(),
            kind,
            color: None,
            icon: None,
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let mut store = get_test_store();

        let created = store
            .create(new_category(Some(1), "Groceries", CategoryKind::Expense))
            .unwrap();
        let fetched = store.get(created.id, 1).unwrap();

        assert_eq!(created, fetched);
    }

    #[test]
    fn system_category_is_visible_to_every_user() {
        let store = get_test_store();
        // The schema is seeded with system categories on initialisation.
        let categories = store.get_for_user(1).unwrap();
        let system = categories
            .iter()
            .find(|category| category.is_system())
            .expect("expected seeded system categories");

        assert!(store.get(system.id, 1).is_ok());
        assert!(store.get(system.id, 2).is_ok());
    }

    #[test]
    fn owned_category_is_hidden_from_other_users() {
        let mut store = get_test_store();
        let category = store
            .create(new_category(Some(1), "Groceries", CategoryKind::Expense))
            .unwrap();

        assert_eq!(store.get(category.id, 2), Err(Error::NotFound));
    }

    #[test]
    fn get_for_user_includes_own_and_system_rows_only() {
        let mut store = get_test_store();
        store
            .create(new_category(Some(1), "Groceries", CategoryKind::Expense))
            .unwrap();
        store
            .create(new_category(Some(2), "Books", CategoryKind::Expense))
            .unwrap();

        let categories = store.get_for_user(1).unwrap();

        assert!(
            categories
                .iter()
                .all(|category| category.user_id.is_none() || category.user_id == Some(1))
        );
        assert!(categories.iter().any(|category| category.name == "Groceries"));
    }

    #[test]
    fn duplicate_name_and_kind_for_same_user_is_rejected() {
        let mut store = get_test_store();
        store
            .create(new_category(Some(1), "Groceries", CategoryKind::Expense))
            .unwrap();

        let duplicate = store.create(new_category(Some(1), "Groceries", CategoryKind::Expense));

        assert_eq!(duplicate, Err(Error::DuplicateCategory));
    }

    #[test]
    fn user_category_may_shadow_a_system_name() {
        let mut store = get_test_store();
        let categories = store.get_for_user(1).unwrap();
        let system = categories
            .iter()
            .find(|category| category.is_system())
            .expect("expected seeded system categories")
            .clone();

        let shadow = store.create(new_category(Some(1), &system.name, system.kind));

        assert!(shadow.is_ok());
    }

    #[test]
    fn delete_missing_category_fails() {
        let mut store = get_test_store();

        assert_eq!(store.delete(9_999), Err(Error::NotFound));
    }
}
