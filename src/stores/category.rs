//! Defines the category store trait.

use crate::{
    Error,
    models::{Category, CategoryId, NewCategory, UserId},
};

/// Handles the creation and retrieval of transaction categories.
pub trait CategoryStore {
    /// Create a new category in the store.
    fn create(&mut self, category: NewCategory) -> Result<Category, Error>;

    /// Retrieve the category `id` if it is owned by `user_id` or is a system
    /// default.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such category is visible to this user.
    fn get(&self, id: CategoryId, user_id: UserId) -> Result<Category, Error>;

    /// Retrieve the categories visible to `user_id`: their own rows plus the
    /// system defaults.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Category>, Error>;

    /// Delete the category `id`.
    ///
    /// This is the raw row deletion; the ledger checks ownership and
    /// referencing transactions before calling it.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the category does not exist.
    fn delete(&mut self, id: CategoryId) -> Result<(), Error>;
}
