//! This module defines the REST API's routes and their handlers.

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::{
    Error,
    auth::{AuthState, auth_guard},
    state::AppState,
    stores::{AccountStore, CategoryStore, TransactionStore},
};

use account::{
    check_balance, create_account, delete_account, get_account, get_accounts, repair_balance,
};
use category::{create_category, delete_category, get_categories};
use report::{get_daily_transactions, get_monthly_expenses};
use transaction::{
    create_transaction, delete_transaction, get_orphaned_transfer_legs, get_transaction,
    get_transactions, repair_orphaned_transfer_legs, update_transaction,
};

mod account;
mod category;
pub mod endpoints;
mod report;
mod transaction;

/// Return a router with all the app's routes.
pub fn build_router<A, C, T>(state: AppState<A, C, T>) -> Router
where
    A: AccountStore + Clone + Send + Sync + 'static,
    C: CategoryStore + Clone + Send + Sync + 'static,
    T: TransactionStore + Clone + Send + Sync + 'static,
{
    let auth_state = AuthState::from_ref(&state);

    let unprotected_routes = Router::new().route(endpoints::COFFEE, get(get_coffee));

    let protected_routes = Router::new()
        .route(
            endpoints::ACCOUNTS,
            post(create_account::<A, C, T>).get(get_accounts::<A, C, T>),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account::<A, C, T>).delete(delete_account::<A, C, T>),
        )
        .route(endpoints::ACCOUNT_BALANCE, get(check_balance::<A, C, T>))
        .route(
            endpoints::ACCOUNT_BALANCE_REPAIR,
            post(repair_balance::<A, C, T>),
        )
        .route(
            endpoints::CATEGORIES,
            post(create_category::<A, C, T>).get(get_categories::<A, C, T>),
        )
        .route(endpoints::CATEGORY, delete(delete_category::<A, C, T>))
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction::<A, C, T>).get(get_transactions::<A, C, T>),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction::<A, C, T>)
                .put(update_transaction::<A, C, T>)
                .delete(delete_transaction::<A, C, T>),
        )
        .route(
            endpoints::TRANSFER_ORPHANS,
            get(get_orphaned_transfer_legs::<A, C, T>),
        )
        .route(
            endpoints::TRANSFER_ORPHANS_REPAIR,
            post(repair_orphaned_transfer_legs::<A, C, T>),
        )
        .route(
            endpoints::MONTHLY_EXPENSES,
            get(get_monthly_expenses::<A, C, T>),
        )
        .route(
            endpoints::DAILY_TRANSACTIONS,
            get(get_daily_transactions::<A, C, T>),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, LedgerService,
        auth::testing::FixedVerifier,
        db::initialize,
        stores::sqlite::{SqliteAccountStore, SqliteCategoryStore, SqliteTransactionStore},
    };

    use super::build_router;

    /// A test server over a fresh in-memory database with two known users:
    /// "test-token" resolves to user 1 and "other-token" to user 2.
    pub(crate) fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&connection).expect("Could not initialize database.");
        let connection = Arc::new(Mutex::new(connection));

        let ledger = LedgerService::new(
            SqliteAccountStore::new(connection.clone()),
            SqliteCategoryStore::new(connection.clone()),
            SqliteTransactionStore::new(connection),
        );
        let verifier = Arc::new(
            FixedVerifier::default()
                .with_token("test-token", 1)
                .with_token("other-token", 2),
        );

        let app = build_router(AppState::new(ledger, verifier));

        TestServer::try_new(app).expect("Could not create test server.")
    }
}
