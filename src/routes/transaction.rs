//! Route handlers for creating, reading, editing, and deleting transactions,
//! including transfer pairs and orphaned-leg repair.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::SessionUser,
    ledger::{CreateTransaction, TransactionPatch},
    models::{AccountId, CategoryId, TransactionId, TransactionKind},
    state::AppState,
    stores::{AccountStore, CategoryStore, TransactionStore},
};

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionData {
    /// The account the money moves in or out of; for transfers, the source.
    pub account_id: AccountId,
    /// The destination account. Required for transfers.
    #[serde(default)]
    pub destination_account_id: Option<AccountId>,
    /// The category. Required for income and expenses.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The amount of money, as a positive magnitude in minor units.
    pub amount: i64,
    /// The kind of the transaction.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
}

/// The request body for editing a transaction. Absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct TransactionPatchData {
    /// Move the transaction to another account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Re-categorise the transaction.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Change the amount.
    #[serde(default)]
    pub amount: Option<i64>,
    /// Attempted kind change; always rejected.
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    /// Change the date.
    #[serde(default)]
    pub date: Option<Date>,
    /// Change the description.
    #[serde(default)]
    pub description: Option<String>,
}

/// The query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct TransactionFilter {
    /// Only transactions on this account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Only transactions on or after this date.
    #[serde(default)]
    pub from: Option<Date>,
    /// Only transactions on or before this date.
    #[serde(default)]
    pub to: Option<Date>,
}

impl TransactionFilter {
    /// The inclusive date range the filter describes, if any bound was given.
    ///
    /// An open bound falls back to [Date::MIN] or [Date::MAX].
    fn date_range(&self) -> Option<std::ops::RangeInclusive<Date>> {
        match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some(from.unwrap_or(Date::MIN)..=to.unwrap_or(Date::MAX)),
        }
    }
}

/// A route handler for creating a transaction.
///
/// The response holds the created rows: one for income and expenses, the
/// outgoing and incoming legs (in that order) for transfers.
pub async fn create_transaction<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Json(data): Json<TransactionData>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    let created = ledger.create_transaction(
        user_id,
        CreateTransaction {
            account_id: data.account_id,
            destination_account_id: data.destination_account_id,
            category_id: data.category_id,
            amount: data.amount,
            kind: data.kind,
            date: data.date,
            description: data.description,
        },
    )?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// A route handler for getting a transaction by its database ID.
pub async fn get_transaction<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let transaction = state.ledger.get_transaction(user_id, transaction_id)?;

    Ok(Json(transaction))
}

/// A route handler for listing the requester's transactions, newest first.
pub async fn get_transactions<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let transactions =
        state
            .ledger
            .list_transactions(user_id, filter.account_id, filter.date_range())?;

    Ok(Json(transactions))
}

/// A route handler for editing a transaction.
///
/// This function will return the status code 400 if the patch tries to
/// change the transaction's kind or targets a transfer leg.
pub async fn update_transaction<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(transaction_id): Path<TransactionId>,
    Json(data): Json<TransactionPatchData>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    let updated = ledger.update_transaction(
        user_id,
        transaction_id,
        TransactionPatch {
            account_id: data.account_id,
            category_id: data.category_id,
            amount: data.amount,
            kind: data.kind,
            date: data.date,
            description: data.description,
        },
    )?;

    Ok(Json(updated))
}

/// A route handler for deleting a transaction. Deleting either leg of a
/// transfer removes both legs.
pub async fn delete_transaction<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    ledger.delete_transaction(user_id, transaction_id)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for listing transfer legs whose pair is missing.
pub async fn get_orphaned_transfer_legs<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let orphans = state.ledger.find_orphaned_transfer_legs(user_id)?;

    Ok(Json(orphans))
}

/// A route handler for reversing and removing every orphaned transfer leg.
/// The response holds the ids of the removed rows.
pub async fn repair_orphaned_transfer_legs<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    let removed = ledger.repair_orphaned_transfer_legs(user_id)?;

    Ok(Json(removed))
}
