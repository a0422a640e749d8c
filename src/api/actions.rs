use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use super::recipes::recipe_short_dto;
use super::types::RecipeShortDto;
use crate::db::{DbError, RecipeList, RecipeListRepo, RecipeRepo};
use crate::server::AppState;

fn list_label(list: RecipeList) -> &'static str {
    match list {
        RecipeList::Favorite => "favorites",
        RecipeList::ShoppingCart => "shopping cart",
    }
}

/// Puts a recipe on one of the user's lists. The unique constraint on the
/// list table turns a second add into a 400.
async fn add(
    state: &AppState,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<(StatusCode, Json<RecipeShortDto>)> {
    let recipe = state.db.get_recipe(recipe_id).await?;

    state
        .db
        .add_to_list(list, user_id, recipe.id)
        .await
        .map_err(|e| match e {
            DbError::AlreadyExists(_) => ApiError::BadRequest(format!(
                "Recipe is already in {}.",
                list_label(list)
            )),
            e => e.into(),
        })?;

    Ok((StatusCode::CREATED, Json(recipe_short_dto(state, &recipe))))
}

async fn remove(
    state: &AppState,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<StatusCode> {
    let recipe = state.db.get_recipe(recipe_id).await?;

    state
        .db
        .remove_from_list(list, user_id, recipe.id)
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => {
                ApiError::BadRequest(format!("Recipe is not in {}.", list_label(list)))
            }
            e => e.into(),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShortDto>)> {
    add(&state, RecipeList::Favorite, user.id, recipe_id).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<StatusCode> {
    remove(&state, RecipeList::Favorite, user.id, recipe_id).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShortDto>)> {
    add(&state, RecipeList::ShoppingCart, user.id, recipe_id).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<StatusCode> {
    remove(&state, RecipeList::ShoppingCart, user.id, recipe_id).await
}
