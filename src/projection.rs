//! Read-side projections over ledger data.
//!
//! Everything in this module is a pure function over rows the stores have
//! already fetched, so the shaping logic can be tested without a database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{
    Account, Category, CategoryId, CategoryKind, Transaction, TransactionKind, TransferDirection,
};

/// The total spent against one category within some period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category the expenses were labelled with.
    pub category_id: CategoryId,
    /// The category's display name.
    pub name: String,
    /// The sum of the expense amounts, in minor units.
    pub total: i64,
}

/// The transactions that happened on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    /// The day the transactions fall on.
    pub date: Date,
    /// The day's transactions, newest first. Each transfer appears once,
    /// through its outgoing leg.
    pub transactions: Vec<Transaction>,
    /// The day's net income minus expenses. Transfers move money between
    /// the user's own accounts, so they do not count towards the net.
    pub net: i64,
}

/// The balance the account should hold given its transaction history.
pub fn expected_balance(account: &Account, transactions: &[Transaction]) -> i64 {
    account.initial_balance
        + transactions
            .iter()
            .filter(|transaction| transaction.account_id == account.id)
            .map(Transaction::signed_contribution)
            .sum::<i64>()
}

/// Sum expenses per category, sorted by total descending and category name
/// ascending for equal totals.
///
/// Rows that are not expenses, or whose category cannot be resolved, are
/// ignored.
pub fn monthly_expense_by_category(
    expenses: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryTotal> {
    let names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_str()))
        .collect();

    let mut totals: HashMap<CategoryId, i64> = HashMap::new();
    for expense in expenses {
        if expense.kind != TransactionKind::Expense {
            continue;
        }
        let Some(category_id) = expense.category_id else {
            continue;
        };
        if names.contains_key(&category_id) {
            *totals.entry(category_id).or_insert(0) += expense.amount;
        }
    }

    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category_id, total)| CategoryTotal {
            category_id,
            name: names[&category_id].to_owned(),
            total,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    rows
}

/// Group transactions by calendar day, newest day first.
///
/// Incoming transfer legs are dropped so each transfer shows exactly once
/// (through its outgoing leg) even though it is stored as two rows.
pub fn group_by_day(mut transactions: Vec<Transaction>) -> Vec<DayGroup> {
    transactions.retain(|transaction| {
        transaction.direction != Some(TransferDirection::Incoming)
    });
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

    let mut groups: Vec<DayGroup> = Vec::new();
    for transaction in transactions {
        let net = match transaction.kind {
            TransactionKind::Transfer => 0,
            _ => transaction.signed_contribution(),
        };
        match groups.last_mut() {
            Some(group) if group.date == transaction.date => {
                group.net += net;
                group.transactions.push(transaction);
            }
            _ => groups.push(DayGroup {
                date: transaction.date,
                net,
                transactions: vec![transaction],
            }),
        }
    }

    groups
}

/// The categories a user effectively sees: their own rows plus the system
/// defaults, with a user row hiding a system row of the same name and kind.
///
/// Name comparison ignores case. The system rows themselves are never
/// modified; shadowing only shapes this view. The result is sorted by name,
/// then kind.
pub fn effective_categories(categories: Vec<Category>) -> Vec<Category> {
    let mut by_key: HashMap<(String, CategoryKind), Category> = HashMap::new();
    for category in categories {
        let key = (category.name.to_lowercase(), category.kind);
        match by_key.get(&key) {
            // A user row wins over a system row; the first row wins
            // otherwise.
            Some(existing) if existing.is_system() && !category.is_system() => {
                by_key.insert(key, category);
            }
            Some(_) => {}
            None => {
                by_key.insert(key, category);
            }
        }
    }

    let mut rows: Vec<Category> = by_key.into_values().collect();
    rows.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.kind.cmp(&b.kind))
    });

    rows
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::models::{
        Account, AccountKind, Category, CategoryKind, Transaction, TransactionKind,
        TransferDirection,
    };

    use super::{
        effective_categories, expected_balance, group_by_day, monthly_expense_by_category,
    };

    fn expense(id: i64, category_id: i64, amount: i64, date: time::Date) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            account_id: 1,
            category_id: Some(category_id),
            amount,
            kind: TransactionKind::Expense,
            direction: None,
            date,
            description: String::new(),
            related_transaction_id: None,
        }
    }

    fn category(id: i64, name: &str, kind: CategoryKind, system: bool) -> Category {
        Category {
            id,
            user_id: (!system).then_some(1),
            name: name.to_owned(),
            kind,
            color: None,
            icon: None,
        }
    }

    #[test]
    fn expected_balance_folds_contributions_over_the_seed() {
        let account = Account {
            id: 1,
            user_id: 1,
            name: "Cash".to_owned(),
            kind: AccountKind::Cash,
            initial_balance: 100_000,
            balance: 0,
            color: None,
            icon: None,
        };
        let day = date!(2025 - 06 - 01);
        let transactions = vec![
            expense(1, 10, 20_000, day),
            Transaction {
                kind: TransactionKind::Income,
                ..expense(2, 11, 5_000, day)
            },
            // A row on another account must not count.
            Transaction {
                account_id: 2,
                ..expense(3, 10, 99_000, day)
            },
        ];

        assert_eq!(expected_balance(&account, &transactions), 85_000);
    }

    #[test]
    fn category_totals_sort_by_total_then_name() {
        let categories = vec![
            category(1, "Food", CategoryKind::Expense, true),
            category(2, "Bills", CategoryKind::Expense, true),
            category(3, "Transport", CategoryKind::Expense, true),
        ];
        let day = date!(2025 - 06 - 15);
        let expenses = vec![
            expense(1, 1, 4_000, day),
            expense(2, 1, 6_000, day),
            expense(3, 2, 10_000, day),
            expense(4, 3, 2_500, day),
        ];

        let totals = monthly_expense_by_category(&expenses, &categories);

        let summary: Vec<(&str, i64)> = totals
            .iter()
            .map(|row| (row.name.as_str(), row.total))
            .collect();
        // Food and Bills tie at 10,000; Bills sorts first by name.
        assert_eq!(
            summary,
            vec![("Bills", 10_000), ("Food", 10_000), ("Transport", 2_500)]
        );
    }

    #[test]
    fn category_totals_ignore_non_expense_rows() {
        let categories = vec![category(1, "Salary", CategoryKind::Income, true)];
        let rows = vec![Transaction {
            kind: TransactionKind::Income,
            ..expense(1, 1, 50_000, date!(2025 - 06 - 01))
        }];

        assert!(monthly_expense_by_category(&rows, &categories).is_empty());
    }

    #[test]
    fn day_groups_are_newest_first_and_hide_incoming_legs() {
        let monday = date!(2025 - 06 - 02);
        let tuesday = date!(2025 - 06 - 03);
        let transactions = vec![
            expense(1, 1, 1_000, monday),
            Transaction {
                kind: TransactionKind::Transfer,
                direction: Some(TransferDirection::Outgoing),
                category_id: None,
                related_transaction_id: Some(3),
                ..expense(2, 1, 5_000, tuesday)
            },
            Transaction {
                kind: TransactionKind::Transfer,
                direction: Some(TransferDirection::Incoming),
                category_id: None,
                account_id: 2,
                related_transaction_id: Some(2),
                ..expense(3, 1, 5_000, tuesday)
            },
            expense(4, 1, 2_000, tuesday),
        ];

        let groups = group_by_day(transactions);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, tuesday);
        let tuesday_ids: Vec<i64> = groups[0]
            .transactions
            .iter()
            .map(|transaction| transaction.id)
            .collect();
        // Newest first within the day, incoming leg 3 suppressed.
        assert_eq!(tuesday_ids, vec![4, 2]);
        assert_eq!(groups[1].date, monday);
        assert_eq!(groups[1].transactions.len(), 1);
    }

    #[test]
    fn day_net_excludes_transfers() {
        let day = date!(2025 - 06 - 02);
        let transactions = vec![
            expense(1, 1, 3_000, day),
            Transaction {
                kind: TransactionKind::Income,
                ..expense(2, 2, 10_000, day)
            },
            Transaction {
                kind: TransactionKind::Transfer,
                direction: Some(TransferDirection::Outgoing),
                category_id: None,
                ..expense(3, 1, 50_000, day)
            },
        ];

        let groups = group_by_day(transactions);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].net, 7_000);
    }

    #[test]
    fn user_category_shadows_system_category_of_same_name_and_kind() {
        let categories = vec![
            category(1, "Food", CategoryKind::Expense, true),
            category(2, "food", CategoryKind::Expense, false),
            category(3, "Transport", CategoryKind::Expense, true),
        ];

        let effective = effective_categories(categories);

        let ids: Vec<i64> = effective.iter().map(|category| category.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn same_name_different_kind_does_not_shadow() {
        let categories = vec![
            category(1, "Other", CategoryKind::Expense, true),
            category(2, "Other", CategoryKind::Income, true),
        ];

        let effective = effective_categories(categories);

        assert_eq!(effective.len(), 2);
    }
}
