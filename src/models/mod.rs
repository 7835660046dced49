//! The domain models: accounts, categories, and transactions.

mod account;
mod category;
mod transaction;

pub use account::{Account, AccountKind, NewAccount};
pub use category::{Category, CategoryKind, NewCategory};
pub use transaction::{
    NewTransaction, Transaction, TransactionKind, TransferDirection,
};

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of an account row.
pub type AccountId = DatabaseId;
/// The ID of a category row.
pub type CategoryId = DatabaseId;
/// The ID of a transaction row.
pub type TransactionId = DatabaseId;
/// The ID of a user, issued and verified by the external identity provider.
pub type UserId = DatabaseId;
