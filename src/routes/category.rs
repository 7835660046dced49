//! Route handlers for creating, listing, and deleting categories.

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
    ledger::CategoryInput,
    models::{CategoryId, CategoryKind},
    projection,
    state::AppState,
    stores::{AccountStore, CategoryStore, TransactionStore},
};

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryData {
    /// The display name of the category.
    pub name: String,
    /// Whether the category labels income or expenses.
    pub kind: CategoryKind,
    /// The display colour.
    #[serde(default)]
    pub color: Option<String>,
    /// The name of the icon shown next to the category.
    #[serde(default)]
    pub icon: Option<String>,
}

/// A route handler for creating a new category.
pub async fn create_category<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Json(data): Json<CategoryData>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    let category = ledger.create_category(
        user_id,
        CategoryInput {
            name: data.name,
            kind: data.kind,
            color: data.color,
            icon: data.icon,
        },
    )?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// A route handler for listing the categories the requester effectively
/// sees: their own plus the system defaults, with user rows shadowing
/// system rows of the same name and kind.
pub async fn get_categories<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let categories = state.ledger.list_categories(user_id)?;

    Ok(Json(projection::effective_categories(categories)))
}

/// A route handler for deleting a category.
///
/// This function will return the status code 403 for system categories and
/// 409 for categories that transactions still reference.
pub async fn delete_category<A, C, T>(
    State(state): State<AppState<A, C, T>>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(category_id): Path<CategoryId>,
) -> Result<impl IntoResponse, Error>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    let mut ledger = state.ledger.clone();
    ledger.delete_category(user_id, category_id)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod category_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        db::SYSTEM_CATEGORIES,
        models::Category,
        routes::{endpoints, endpoints::format_endpoint, testing::get_test_server},
    };

    #[tokio::test]
    async fn create_category_returns_created_category() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer("test-token")
            .json(&json!({ "name": "Coffee", "kind": "expense" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let category = response.json::<Category>();
        assert_eq!(category.name, "Coffee");
        assert!(!category.is_system());
    }

    #[tokio::test]
    async fn get_categories_includes_system_defaults() {
        let server = get_test_server();

        let response = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer("test-token")
            .await;

        response.assert_status_ok();
        let categories = response.json::<Vec<Category>>();
        assert_eq!(categories.len(), SYSTEM_CATEGORIES.len());
        assert!(categories.iter().all(Category::is_system));
    }

    #[tokio::test]
    async fn user_category_shadows_system_default_in_listing() {
        let server = get_test_server();
        let shadow = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer("test-token")
            .json(&json!({ "name": "Food", "kind": "expense" }))
            .await
            .json::<Category>();

        let categories = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer("test-token")
            .await
            .json::<Vec<Category>>();

        // Still one "Food" expense entry, now the user's row.
        assert_eq!(categories.len(), SYSTEM_CATEGORIES.len());
        let food = categories
            .iter()
            .find(|category| category.name == "Food")
            .unwrap();
        assert_eq!(food.id, shadow.id);
        assert!(!food.is_system());
    }

    #[tokio::test]
    async fn delete_system_category_is_forbidden() {
        let server = get_test_server();
        let categories = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer("test-token")
            .await
            .json::<Vec<Category>>();

        let response = server
            .delete(&format_endpoint(endpoints::CATEGORY, categories[0].id))
            .authorization_bearer("test-token")
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delete_foreign_category_is_not_found() {
        let server = get_test_server();
        let category = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer("other-token")
            .json(&json!({ "name": "Theirs", "kind": "expense" }))
            .await
            .json::<Category>();

        let response = server
            .delete(&format_endpoint(endpoints::CATEGORY, category.id))
            .authorization_bearer("test-token")
            .await;

        response.assert_status_not_found();
    }
}
