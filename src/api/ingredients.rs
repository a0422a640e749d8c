use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::error::ApiResult;
use crate::db::{Ingredient, IngredientRepo};
use crate::server::AppState;
use crate::util::QueryParams;

/// `GET /api/ingredients/?name=` filters on a case-insensitive substring.
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    let name = params.get("name").map(str::trim).filter(|n| !n.is_empty());
    Ok(Json(state.db.list_ingredients(name).await?))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i64>,
) -> ApiResult<Json<Ingredient>> {
    Ok(Json(state.db.get_ingredient(ingredient_id).await?))
}
