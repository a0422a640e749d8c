use axum::{
    extract::{Path, State},
    Json,
};

use super::error::ApiResult;
use crate::db::{Tag, TagRepo};
use crate::server::AppState;

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.db.list_tags().await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> ApiResult<Json<Tag>> {
    Ok(Json(state.db.get_tag(tag_id).await?))
}
