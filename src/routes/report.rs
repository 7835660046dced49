//! Route handlers for the read-side reports: monthly expense totals and
//! day-grouped transaction lists.

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use time::{Date, Month};

use crate::{
    Error,
    auth::SessionUser,
    models::AccountId,
    state::AppState,
    stores::{AccountStore, CategoryStore, TransactionStore},
};

/// The query parameters for the monthly expense report.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// The calendar year.
    pub year: i32,
    /// The calendar month, 1 through 12.
    pub month: u8,
}

/// The query parameters for the day-grouped transaction list.
#[derive(Debug, Deserialize)]
pub struct DailyQuery {
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

/// A route handler for the monthly expense totals per category, sorted by
/// total descending and name ascending for equal totals.
pub async fn get_monthly_expenses<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let month = Month::try_from(query.month).map_err(|_| Error::InvalidDate)?;
    let totals = state
        .ledger
        .monthly_expense_by_category(user_id, query.year, month)?;

    Ok(Json(totals))
}

/// A route handler for transactions grouped by calendar day, newest day
/// first, with each transfer shown once through its outgoing leg.
pub async fn get_daily_transactions<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Query(query): Query<DailyQuery>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let date_range = match (query.from, query.to) {
        (None, None) => None,
        (from, to) => Some(from.unwrap_or(Date::MIN)..=to.unwrap_or(Date::MAX)),
    };
    let groups =
        state
            .ledger
            .transactions_grouped_by_day(user_id, query.account_id, date_range)?;

    Ok(Json(groups))
}
