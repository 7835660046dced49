//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}',
//! use [format_endpoint].

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route to create or list accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to access a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to compare an account's stored balance with its history.
pub const ACCOUNT_BALANCE: &str = "/api/accounts/{account_id}/balance";
/// The route to rewrite an account's stored balance from its history.
pub const ACCOUNT_BALANCE_REPAIR: &str = "/api/accounts/{account_id}/balance/repair";
/// The route to create or list categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create or list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list transfer legs whose pair is missing.
pub const TRANSFER_ORPHANS: &str = "/api/transfers/orphans";
/// The route to remove transfer legs whose pair is missing.
pub const TRANSFER_ORPHANS_REPAIR: &str = "/api/transfers/orphans/repair";
/// The route for monthly expense totals per category.
pub const MONTHLY_EXPENSES: &str = "/api/reports/monthly_expenses";
/// The route for transactions grouped by calendar day.
pub const DAILY_TRANSACTIONS: &str = "/api/reports/daily";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/accounts/{account_id}',
/// '{account_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => {
            format!(
                "{}{id}{}",
                &endpoint_path[..start],
                &endpoint_path[end + 1..]
            )
        }
        _ => endpoint_path.to_owned(),
    }
}

#[cfg(test)]
mod format_endpoint_tests {
    use super::{ACCOUNT_BALANCE, TRANSACTION, format_endpoint};

    #[test]
    fn replaces_parameter_with_id() {
        assert_eq!(format_endpoint(TRANSACTION, 42), "/api/transactions/42");
    }

    #[test]
    fn keeps_path_after_parameter() {
        assert_eq!(
            format_endpoint(ACCOUNT_BALANCE, 7),
            "/api/accounts/7/balance"
        );
    }

    #[test]
    fn returns_path_without_parameter_unchanged() {
        assert_eq!(format_endpoint("/api/accounts", 1), "/api/accounts");
    }
}
