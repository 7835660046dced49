//! Defines the transaction model and the sign rules for balance
//! contributions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{AccountId, CategoryId, TransactionId, UserId};

/// The kind of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned into an account.
    Income,
    /// Money spent from an account.
    Expense,
    /// Money moved between two accounts, stored as a pair of legs.
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Transfer => "transfer",
        };

        write!(f, "{name}")
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(format!("unknown transaction kind \"{other}\"")),
        }
    }
}

/// Which side of a transfer pair a leg is.
///
/// Direction is structural: it is never derived from the sign of the amount
/// or from the description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// The leg on the source account; contributes `-amount`.
    Outgoing,
    /// The leg on the destination account; contributes `+amount`.
    Incoming,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferDirection::Outgoing => "outgoing",
            TransferDirection::Incoming => "incoming",
        };

        write!(f, "{name}")
    }
}

impl FromStr for TransferDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "outgoing" => Ok(TransferDirection::Outgoing),
            "incoming" => Ok(TransferDirection::Incoming),
            other => Err(format!("unknown transfer direction \"{other}\"")),
        }
    }
}

/// An event where money was earned, spent, or moved between accounts.
///
/// The amount is always a non-negative magnitude in minor currency units;
/// whether it increases or decreases the account balance is decided by
/// [Transaction::signed_contribution].
///
/// A transfer is stored as two rows: an outgoing leg on the source account
/// and an incoming leg on the destination account, each holding the other's
/// id in `related_transaction_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The category of the transaction. `None` only for transfer legs.
    pub category_id: Option<CategoryId>,
    /// The amount of money, as a non-negative magnitude in minor units.
    pub amount: i64,
    /// The kind of the transaction.
    pub kind: TransactionKind,
    /// Which side of a transfer pair this row is. `None` for income and
    /// expense transactions.
    pub direction: Option<TransferDirection>,
    /// When the transaction happened, as a local calendar date.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The other leg of a transfer pair. `None` for income and expense
    /// transactions.
    pub related_transaction_id: Option<TransactionId>,
}

impl Transaction {
    /// The signed effect this transaction has on its account's balance.
    ///
    /// Income and incoming transfer legs contribute `+amount`; expenses and
    /// outgoing transfer legs contribute `-amount`.
    pub fn signed_contribution(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
            TransactionKind::Transfer => match self.direction {
                Some(TransferDirection::Outgoing) => -self.amount,
                Some(TransferDirection::Incoming) => self.amount,
                // Transfer rows always carry a direction; a row without one
                // is unreadable drift and must not move balances further.
                None => 0,
            },
        }
    }

    /// Whether this row is one leg of a transfer pair.
    pub fn is_transfer_leg(&self) -> bool {
        self.kind == TransactionKind::Transfer
    }
}

/// The data needed to insert a new [Transaction] row.
///
/// This is the store-level input; the ledger decides amounts, directions, and
/// pair links before building one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user that will own the transaction.
    pub user_id: UserId,
    /// The account the money moves in or out of.
    pub account_id: AccountId,
    /// The category of the transaction. `None` only for transfer legs.
    pub category_id: Option<CategoryId>,
    /// The amount of money, as a non-negative magnitude in minor units.
    pub amount: i64,
    /// The kind of the transaction.
    pub kind: TransactionKind,
    /// Which side of a transfer pair this row is.
    pub direction: Option<TransferDirection>,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The other leg of a transfer pair, when already known.
    pub related_transaction_id: Option<TransactionId>,
}

#[cfg(test)]
mod signed_contribution_tests {
    use time::macros::date;

    use super::{Transaction, TransactionKind, TransferDirection};

    fn transaction(kind: TransactionKind, direction: Option<TransferDirection>) -> Transaction {
        Transaction {
            id: 1,
            user_id: 1,
            account_id: 1,
            category_id: None,
            amount: 2_500,
            kind,
            direction,
            date: date!(2025 - 06 - 01),
            description: String::new(),
            related_transaction_id: None,
        }
    }

    #[test]
    fn income_contributes_positive_amount() {
        let contribution = transaction(TransactionKind::Income, None).signed_contribution();

        assert_eq!(contribution, 2_500);
    }

    #[test]
    fn expense_contributes_negative_amount() {
        let contribution = transaction(TransactionKind::Expense, None).signed_contribution();

        assert_eq!(contribution, -2_500);
    }

    #[test]
    fn outgoing_leg_contributes_negative_amount() {
        let contribution =
            transaction(TransactionKind::Transfer, Some(TransferDirection::Outgoing))
                .signed_contribution();

        assert_eq!(contribution, -2_500);
    }

    #[test]
    fn incoming_leg_contributes_positive_amount() {
        let contribution =
            transaction(TransactionKind::Transfer, Some(TransferDirection::Incoming))
                .signed_contribution();

        assert_eq!(contribution, 2_500);
    }
}
