use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::auth::{AuthUser, MaybeUser};
use super::error::{parse_json, ApiError, ApiResult, FieldErrors};
use super::filter::recipe_query;
use super::pagination::{Page, Paginated};
use super::types::*;
use super::users::user_dto;
use super::validate::*;
use crate::db::{
    IngredientRepo, Recipe, RecipeData, RecipeList, RecipeListRepo, RecipeRepo, User, UserRepo,
};
use crate::server::AppState;
use crate::util::media::{decode_data_uri, DecodedImage};
use crate::util::{media_url, QueryParams};

const IMAGE_FOLDER: &str = "recipes/images";

pub fn recipe_short_dto(state: &AppState, recipe: &Recipe) -> RecipeShortDto {
    RecipeShortDto {
        id: recipe.id,
        name: recipe.name.clone(),
        image: media_url(&state.config.baseurl, &recipe.image),
        cooking_time: recipe.cooking_time,
    }
}

pub async fn recipe_dto(
    state: &AppState,
    viewer: Option<&User>,
    recipe: &Recipe,
) -> ApiResult<RecipeDto> {
    let author = state.db.get_user_by_id(recipe.author_id).await?;
    let tags = state.db.get_recipe_tags(recipe.id).await?;
    let ingredients = state.db.get_recipe_ingredients(recipe.id).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            state
                .db
                .in_list(RecipeList::Favorite, viewer.id, recipe.id)
                .await?,
            state
                .db
                .in_list(RecipeList::ShoppingCart, viewer.id, recipe.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDto {
        id: recipe.id,
        tags,
        author: user_dto(state, viewer, &author).await?,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: media_url(&state.config.baseurl, &recipe.image),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    })
}

/// Returns the values that occur more than once, in order of first repeat.
fn duplicates(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for id in ids {
        if !seen.insert(id) && !dups.contains(&id) {
            dups.push(id);
        }
    }
    dups
}

fn missing_ids(wanted: &[i64], existing: &[i64]) -> Vec<i64> {
    wanted
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect()
}

fn does_not_exist(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Validated recipe body plus the decoded image, not yet written to disk.
struct ValidRecipe {
    data: RecipeData,
    image: Option<DecodedImage>,
}

async fn validate_recipe(
    state: &AppState,
    req: RecipeWrite,
    require_image: bool,
) -> ApiResult<ValidRecipe> {
    let mut errors = FieldErrors::new();

    let name = required_text(&mut errors, "name", req.name.as_deref(), Some(RECIPE_NAME_LENGTH))
        .map(str::to_string);
    let text = required_text(&mut errors, "text", req.text.as_deref(), None).map(str::to_string);

    let cooking_time = match req.cooking_time {
        Some(t) => check_positive(&mut errors, "cooking_time", t).then_some(t),
        None => {
            errors.add("cooking_time", REQUIRED);
            None
        }
    };

    let tags = req.tags.unwrap_or_default();
    if tags.is_empty() {
        errors.add("tags", "This list may not be empty.");
    } else if !duplicates(tags.iter().copied()).is_empty() {
        errors.add("tags", "Duplicate values are not allowed.");
    } else {
        let existing = state.db.existing_tag_ids(&tags).await?;
        for id in missing_ids(&tags, &existing) {
            errors.add("tags", does_not_exist(id));
        }
    }

    let ingredients = req.ingredients.unwrap_or_default();
    if ingredients.is_empty() {
        errors.add("ingredients", "This list may not be empty.");
    } else {
        let ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
        if !duplicates(ids.iter().copied()).is_empty() {
            errors.add("ingredients", "Duplicate ingredients are not allowed.");
        } else {
            let existing = state.db.existing_ingredient_ids(&ids).await?;
            for id in missing_ids(&ids, &existing) {
                errors.add("ingredients", does_not_exist(id));
            }
        }
        for ingredient in &ingredients {
            check_positive(&mut errors, "ingredients", ingredient.amount);
        }
    }

    let image = match req.image.filter(|i| !i.is_empty()) {
        Some(data) => match decode_data_uri(&data) {
            Ok(image) => Some(image),
            Err(e) => {
                errors.add("image", e.to_string());
                None
            }
        },
        None => {
            if require_image {
                errors.add("image", REQUIRED);
            }
            None
        }
    };

    errors.into_result()?;

    let (Some(name), Some(text), Some(cooking_time)) = (name, text, cooking_time) else {
        return Err(ApiError::Internal("validated fields missing".to_string()));
    };

    Ok(ValidRecipe {
        data: RecipeData {
            name,
            text,
            cooking_time,
            image: None,
            tags,
            ingredients: ingredients.iter().map(|i| (i.id, i.amount)).collect(),
        },
        image,
    })
}

/// Writes the decoded image (if any) and returns the data ready for the
/// database.
fn store_image(state: &AppState, valid: ValidRecipe) -> ApiResult<RecipeData> {
    let mut data = valid.data;
    if let Some(image) = valid.image {
        data.image = Some(state.media.save(IMAGE_FOLDER, &image)?);
    }
    Ok(data)
}

pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Paginated<RecipeDto>>> {
    let page = Page::from_params(&params, state.config.pagination.page_size)?;
    let query = recipe_query(&params, viewer.as_ref(), page)?;
    let (recipes, count) = state.db.list_recipes(&query).await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        results.push(recipe_dto(&state, viewer.as_ref(), recipe).await?);
    }

    let url = format!("{}/api/recipes/", state.config.baseurl);
    Ok(Json(Paginated::new(results, count, page, &url, &params)?))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<RecipeDto>)> {
    let req: RecipeWrite = parse_json(&body)?;
    let valid = validate_recipe(&state, req, true).await?;
    let data = store_image(&state, valid)?;

    let recipe = state.db.create_recipe(user.id, &data).await?;
    info!("User {} created recipe {} ({})", user.id, recipe.name, recipe.id);

    Ok((
        StatusCode::CREATED,
        Json(recipe_dto(&state, Some(&user), &recipe).await?),
    ))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Json<RecipeDto>> {
    let recipe = state.db.get_recipe(recipe_id).await?;
    Ok(Json(recipe_dto(&state, viewer.as_ref(), &recipe).await?))
}

/// Loads a recipe and checks that `user` wrote it.
async fn own_recipe(state: &AppState, user: &User, recipe_id: i64) -> ApiResult<Recipe> {
    let recipe = state.db.get_recipe(recipe_id).await?;
    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden);
    }
    Ok(recipe)
}

pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<RecipeDto>> {
    own_recipe(&state, &user, recipe_id).await?;

    let req: RecipeWrite = parse_json(&body)?;
    let valid = validate_recipe(&state, req, false).await?;
    let data = store_image(&state, valid)?;

    let recipe = state.db.update_recipe(recipe_id, &data).await?;
    Ok(Json(recipe_dto(&state, Some(&user), &recipe).await?))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<StatusCode> {
    own_recipe(&state, &user, recipe_id).await?;
    state.db.delete_recipe(recipe_id).await?;
    info!("User {} deleted recipe {}", user.id, recipe_id);
    Ok(StatusCode::NO_CONTENT)
}
