//! Defines the account model.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::{AccountId, UserId};

/// The kind of money store an account represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Physical cash.
    Cash,
    /// A bank account.
    Bank,
    /// An e-wallet such as a phone payment app.
    Ewallet,
    /// A savings account, kept separate from everyday spending.
    Savings,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::Ewallet => "ewallet",
            AccountKind::Savings => "savings",
        };

        write!(f, "{name}")
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cash" => Ok(AccountKind::Cash),
            "bank" => Ok(AccountKind::Bank),
            "ewallet" => Ok(AccountKind::Ewallet),
            "savings" => Ok(AccountKind::Savings),
            other => Err(format!("unknown account kind \"{other}\"")),
        }
    }
}

/// A named place money is kept, with a running balance.
///
/// All amounts are in minor currency units (e.g. cents), stored as signed
/// integers so that balances are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// What kind of money store the account is.
    pub kind: AccountKind,
    /// The balance the account was created with.
    ///
    /// Reconciliation recomputes the current balance from this seed plus the
    /// transaction history.
    pub initial_balance: i64,
    /// The current balance.
    ///
    /// Only ever adjusted through the ledger; equal to `initial_balance` plus
    /// the signed contributions of all transactions referencing the account.
    pub balance: i64,
    /// The display colour, e.g. "#2e7d32".
    pub color: Option<String>,
    /// The name of the icon shown next to the account.
    pub icon: Option<String>,
}

/// The data needed to create a new [Account].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The user that will own the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// What kind of money store the account is.
    pub kind: AccountKind,
    /// The starting balance, in minor units.
    pub initial_balance: i64,
    /// The display colour.
    pub color: Option<String>,
    /// The name of the icon shown next to the account.
    pub icon: Option<String>,
}
