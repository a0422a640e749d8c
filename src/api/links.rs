use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::error::ApiResult;
use super::types::ShortLinkResponse;
use crate::db::{DbError, LinkRepo, RecipeRepo};
use crate::server::AppState;
use crate::util::generate_short_link;

/// `GET /api/recipes/:id/get-link/` hands out a short link for the recipe
/// page, reusing the one stored earlier for the same url.
pub async fn get_link(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Json<ShortLinkResponse>> {
    let recipe = state.db.get_recipe(recipe_id).await?;
    let url = format!("{}/recipes/{}", state.config.baseurl, recipe.id);

    let link = match state.db.get_link_by_url(&url).await {
        Ok(link) => link,
        Err(DbError::NotFound(_)) => {
            let short = generate_short_link(&url);
            debug!("New short link {} for {}", short, url);
            state.db.create_link(&url, &short).await?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(ShortLinkResponse {
        short_link: link.short_link,
    }))
}

/// `GET /s/:code/`
pub async fn redirect_short_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Response> {
    let short = format!("{}/s/{}", state.config.baseurl, code);
    let link = state.db.get_link_by_short(&short).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, link.url)]).into_response())
}
