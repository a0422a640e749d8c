use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use super::auth::AuthUser;
use super::error::ApiResult;
use crate::db::RecipeListRepo;
use crate::server::AppState;
use crate::util::shopping_cart;

const FILE_NAME: &str = "shopping_cart.txt";

/// `GET /api/recipes/download_shopping_cart/`
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Response> {
    let entries = state.db.get_cart_entries(user.id).await?;
    let lines = shopping_cart::aggregate(entries);
    let body = shopping_cart::render(&lines);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", FILE_NAME),
            ),
        ],
        body,
    )
        .into_response())
}
