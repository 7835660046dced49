//! Dompet is a web service for tracking personal income, expenses, and
//! transfers across named accounts.
//!
//! The library is the single authority for any change that affects account
//! balances: every create, edit, and delete of a transaction goes through the
//! [LedgerService], which keeps each account's stored balance equal to its
//! seed balance plus the sum of its transaction history. Read views (monthly
//! category totals, day-grouped transaction lists, balance reconciliation)
//! are derived in [projection] without mutating the ledger.
//!
//! The HTTP layer serves JSON; callers are identified by an external session
//! provider (see [auth::SessionVerifier]) and never by ids in request bodies.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod auth;
pub mod db;
pub mod ledger;
pub mod models;
pub mod projection;
pub mod routes;
pub mod state;
pub mod stores;

pub use ledger::LedgerService;
pub use routes::build_router;
pub use state::AppState;

use crate::models::AccountId;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction amount must be greater than zero.
    ///
    /// Amounts are unsigned magnitudes in minor currency units; the sign of a
    /// balance contribution comes from the transaction kind, never from the
    /// amount itself.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// An income or expense transaction was submitted without a category.
    #[error("income and expense transactions require a category")]
    MissingCategory,

    /// A transfer was submitted with a category attached.
    ///
    /// Transfer legs carry no category; the pair of account links fully
    /// describes the movement.
    #[error("transfers cannot have a category")]
    CategoryOnTransfer,

    /// A transfer was submitted without a destination account.
    #[error("transfers require a destination account")]
    MissingDestinationAccount,

    /// A transfer named the same account as both source and destination.
    #[error("cannot transfer money from an account to itself")]
    SameAccountTransfer,

    /// An edit tried to change a transaction's kind.
    ///
    /// The kind is fixed at creation. To change an expense into an income
    /// (or either into a transfer), delete the transaction and create a new
    /// one.
    #[error("the kind of a transaction cannot be changed; delete and re-create it instead")]
    KindChangeNotAllowed,

    /// An edit targeted one leg of a transfer pair.
    ///
    /// Editing a single leg would break the double-entry invariant, so
    /// transfer legs can only be deleted (which removes both legs) and
    /// re-created.
    #[error("transfer legs cannot be edited; delete the transfer and re-create it")]
    TransferLegNotEditable,

    /// An empty string was used for an account or category name.
    #[error("the name cannot be empty")]
    EmptyName,

    /// A date or calendar month in the request did not exist.
    #[error("the date is not a valid calendar date")]
    InvalidDate,

    /// The requested resource was not found.
    ///
    /// Also returned when the resource exists but belongs to another user, so
    /// that responses never reveal what other users have.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete an account that still has transactions.
    #[error("cannot delete an account that has transactions; remove its transactions first")]
    AccountHasTransactions,

    /// Tried to delete a category that transactions still reference.
    #[error(
        "cannot delete a category that is in use; remove or re-categorise its transactions first"
    )]
    CategoryInUse,

    /// Tried to delete a system-provided category.
    ///
    /// Categories without an owner are shared defaults and can never be
    /// deleted, regardless of whether any transaction uses them.
    #[error("only user-created categories may be deleted")]
    SystemCategory,

    /// The account name already exists for this user.
    #[error("an account with this name already exists")]
    DuplicateAccount,

    /// The category name and kind already exist for this user.
    #[error("a category with this name and kind already exists")]
    DuplicateCategory,

    /// The request carried no session token, or the token did not verify.
    #[error("a valid session token is required")]
    Unauthenticated,

    /// A multi-step balance adjustment was applied only partially.
    ///
    /// This happens when a later step of a transfer or edit fails after an
    /// earlier step was applied, and undoing the applied steps also failed.
    /// The stored balances of `affected_accounts` may no longer match their
    /// transaction history; the caller should run a reconciliation rather
    /// than retry, since a retry could apply the first step twice.
    #[error("a balance adjustment was only partially applied; please verify your balances")]
    PartialBalanceUpdate {
        /// Accounts whose stored balance may have drifted.
        affected_accounts: Vec<AccountId>,
    },

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("account") =>
            {
                Error::DuplicateAccount
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("category") =>
            {
                Error::DuplicateCategory
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::NotFound
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code that the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NonPositiveAmount
            | Error::MissingCategory
            | Error::CategoryOnTransfer
            | Error::MissingDestinationAccount
            | Error::SameAccountTransfer
            | Error::KindChangeNotAllowed
            | Error::TransferLegNotEditable
            | Error::EmptyName
            | Error::InvalidDate => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::AccountHasTransactions
            | Error::CategoryInUse
            | Error::DuplicateAccount
            | Error::DuplicateCategory => StatusCode::CONFLICT,
            Error::SystemCategory => StatusCode::FORBIDDEN,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::PartialBalanceUpdate { .. }
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // Partial failures must tell the caller which balances to check.
            Error::PartialBalanceUpdate { affected_accounts } => {
                tracing::error!(
                    "balance adjustment partially applied, affected accounts: {affected_accounts:?}"
                );
                json!({
                    "error": self.to_string(),
                    "affected_accounts": affected_accounts,
                })
            }
            // SQL errors are logged server-side and shown generically.
            Error::SqlError(error) => {
                tracing::error!("an unexpected error occurred: {error}");
                json!({ "error": "an internal error occurred" })
            }
            Error::DatabaseLockError => {
                tracing::error!("could not acquire the database lock");
                json!({ "error": "an internal error occurred" })
            }
            error => json!({ "error": error.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use super::Error;

    #[test]
    fn validation_errors_map_to_bad_request() {
        for error in [
            Error::NonPositiveAmount,
            Error::MissingCategory,
            Error::SameAccountTransfer,
            Error::KindChangeNotAllowed,
            Error::TransferLegNotEditable,
        ] {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn delete_conflicts_map_to_conflict() {
        assert_eq!(
            Error::AccountHasTransactions.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::CategoryInUse.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn system_category_maps_to_forbidden() {
        assert_eq!(Error::SystemCategory.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn partial_failure_maps_to_internal_error() {
        let error = Error::PartialBalanceUpdate {
            affected_accounts: vec![1],
        };

        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error = Error::from(rusqlite::Error::QueryReturnedNoRows);

        assert_eq!(error, Error::NotFound);
    }
}
