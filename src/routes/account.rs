//! Route handlers for creating, listing, deleting, and reconciling accounts.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    Error,
    auth::SessionUser,
    ledger::AccountInput,
    models::{AccountId, AccountKind},
    state::AppState,
    stores::{AccountStore, CategoryStore, TransactionStore},
};

/// The request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountData {
    /// The display name of the account.
    pub name: String,
    /// What kind of money store the account is.
    pub kind: AccountKind,
    /// The starting balance, in minor units.
    #[serde(default)]
    pub initial_balance: i64,
    /// The display colour.
    #[serde(default)]
    pub color: Option<String>,
    /// The name of the icon shown next to the account.
    #[serde(default)]
    pub icon: Option<String>,
}

/// A route handler for creating a new account.
pub async fn create_account<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Json(data): Json<AccountData>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    let account = ledger.create_account(
        user_id,
        AccountInput {
            name: data.name,
            kind: data.kind,
            initial_balance: data.initial_balance,
            color: data.color,
            icon: data.icon,
        },
    )?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// A route handler for listing the requester's accounts.
pub async fn get_accounts<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let accounts = state.ledger.list_accounts(user_id)?;

    Ok(Json(accounts))
}

/// A route handler for getting an account by its database ID.
///
/// This function will return the status code 404 if the account does not
/// exist or belongs to another user.
pub async fn get_account<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let account = state.ledger.get_account(user_id, account_id)?;

    Ok(Json(account))
}

/// A route handler for deleting an account.
///
/// This function will return the status code 409 if the account still has
/// transactions.
pub async fn delete_account<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    ledger.delete_account(user_id, account_id)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for comparing an account's stored balance against the
/// balance recomputed from its transaction history.
pub async fn check_balance<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let report = state.ledger.check_balance(user_id, account_id)?;

    Ok(Json(report))
}

/// A route handler for rewriting an account's stored balance from its
/// transaction history.
pub async fn repair_balance<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    let report = ledger.repair_balance(user_id, account_id)?;

    Ok(Json(report))
}

#[cfg(test)]
mod account_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        models::Account,
        routes::{endpoints, endpoints::format_endpoint, testing::get_test_server},
    };

    #[tokio::test]
    async fn create_account_returns_created_account() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .json(&json!({
                "name": "Cash",
                "kind": "cash",
                "initial_balance": 100_000,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let account = response.json::<Account>();
        assert_eq!(account.name, "Cash");
        assert_eq!(account.balance, 100_000);
    }

    #[tokio::test]
    async fn create_account_without_token_is_unauthorized() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({ "name": "Cash", "kind": "cash" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_account_with_blank_name_is_rejected() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .json(&json!({ "name": "   ", "kind": "bank" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_account_name_is_a_conflict() {
        let server = get_test_server();
        let body = json!({ "name": "Cash", "kind": "cash" });

        server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .json(&body)
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn get_accounts_only_shows_own_accounts() {
        let server = get_test_server();
        server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .json(&json!({ "name": "Mine", "kind": "bank" }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("other-token")
            .json(&json!({ "name": "Theirs", "kind": "bank" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .await;

        response.assert_status_ok();
        let accounts = response.json::<Vec<Account>>();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Mine");
    }

    #[tokio::test]
    async fn get_foreign_account_is_not_found() {
        let server = get_test_server();
        let account = server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("other-token")
            .json(&json!({ "name": "Theirs", "kind": "bank" }))
            .await
            .json::<Account>();

        let response = server
            .get(&format_endpoint(endpoints::ACCOUNT, account.id))
            .authorization_bearer("test-token")
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_empty_account_returns_no_content() {
        let server = get_test_server();
        let account = server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer("test-token")
            .json(&json!({ "name": "Cash", "kind": "cash" }))
            .await
            .json::<Account>();

        let response = server
            .delete(&format_endpoint(endpoints::ACCOUNT, account.id))
            .authorization_bearer("test-token")
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
    }
}
