//! Defines the category model.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::{CategoryId, UserId};

/// Whether a category labels money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        };

        write!(f, "{name}")
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(format!("unknown category kind \"{other}\"")),
        }
    }
}

/// A label for grouping transactions, e.g. "Food" or "Salary".
///
/// Categories with no owner (`user_id` is `None`) are system defaults visible
/// to every user. A user's own category with the same name and kind shadows
/// the system one in read views, but both rows persist independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category, or `None` for system defaults.
    pub user_id: Option<UserId>,
    /// The display name of the category.
    pub name: String,
    /// Whether the category labels income or expenses.
    pub kind: CategoryKind,
    /// The display colour.
    pub color: Option<String>,
    /// The name of the icon shown next to the category.
    pub icon: Option<String>,
}

impl Category {
    /// Whether the category is a system default shared across all users.
    pub fn is_system(&self) -> bool {
        self.user_id.is_none()
    }
}

/// The data needed to create a new [Category].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The user that will own the category, or `None` for system defaults.
    pub user_id: Option<UserId>,
    /// The display name of the category.
    pub name: String,
    /// Whether the category labels income or expenses.
    pub kind: CategoryKind,
    /// The display colour.
    pub color: Option<String>,
    /// The name of the icon shown next to the category.
    pub icon: Option<String>,
}

#[cfg(test)]
mod category_tests {
    use super::{Category, CategoryKind};

    #[test]
    fn system_category_has_no_owner() {
        let category = Category {
            id: 1,
            user_id: None,
            name: "Food".to_owned(),
            kind: CategoryKind::Expense,
            color: None,
            icon: None,
        };

        assert!(category.is_system());
    }

    #[test]
    fn owned_category_is_not_system() {
        let category = Category {
            id: 1,
            user_id: Some(7),
            name: "Food".to_owned(),
            kind: CategoryKind::Expense,
            color: None,
            icon: None,
        };

        assert!(!category.is_system());
    }
}
