//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).
//!
//! The traits are the boundary to the external data store: every read is
//! scoped to the owning user, and balance changes are expressed as atomic
//! server-evaluated increments rather than client-computed absolute values.

mod account;
mod category;
mod transaction;

pub mod sqlite;

pub use account::AccountStore;
pub use category::CategoryStore;
pub use transaction::{SortOrder, TransactionQuery, TransactionStore};
