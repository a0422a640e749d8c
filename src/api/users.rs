use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::auth::{hash_password, verify_password, AuthUser, MaybeUser};
use super::error::{parse_json, ApiError, ApiResult, FieldErrors};
use super::pagination::{Page, Paginated};
use super::recipes::recipe_short_dto;
use super::types::*;
use super::validate::*;
use crate::db::{DbError, NewUser, RecipeRepo, SubscriptionRepo, User, UserRepo};
use crate::server::AppState;
use crate::util::{media_url, QueryParams};

const AVATAR_FOLDER: &str = "users/avatars";

pub async fn user_dto(state: &AppState, viewer: Option<&User>, user: &User) -> ApiResult<UserDto> {
    let is_subscribed = match viewer {
        Some(viewer) if viewer.id != user.id => state.db.is_subscribed(viewer.id, user.id).await?,
        _ => false,
    };

    Ok(UserDto {
        email: user.email.clone(),
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
        avatar: user
            .avatar
            .as_deref()
            .map(|path| media_url(&state.config.baseurl, path)),
    })
}

fn recipes_limit(params: &QueryParams) -> ApiResult<Option<usize>> {
    match params.get("recipes_limit").filter(|l| !l.is_empty()) {
        None => Ok(None),
        Some(l) => l
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError::field("recipes_limit", "A valid integer is required.")),
    }
}

async fn subscription_dto(
    state: &AppState,
    viewer: &User,
    author: &User,
    limit: Option<usize>,
) -> ApiResult<SubscriptionDto> {
    let recipes = state.db.list_recipes_by_author(author.id, limit).await?;
    let recipes_count = state.db.count_recipes_by_author(author.id).await?;

    Ok(SubscriptionDto {
        user: user_dto(state, Some(viewer), author).await?,
        recipes: recipes
            .iter()
            .map(|r| recipe_short_dto(state, r))
            .collect(),
        recipes_count,
    })
}

pub async fn list_users(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Paginated<UserDto>>> {
    let page = Page::from_params(&params, state.config.pagination.page_size)?;
    let (users, count) = state.db.list_users(page.offset(), page.limit).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        results.push(user_dto(&state, viewer.as_ref(), user).await?);
    }

    let url = format!("{}/api/users/", state.config.baseurl);
    Ok(Json(Paginated::new(results, count, page, &url, &params)?))
}

pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreatedUserDto>)> {
    let req: RegisterRequest = parse_json(&body)?;
    let mut errors = FieldErrors::new();

    let email = required_text(&mut errors, "email", req.email.as_deref(), Some(EMAIL_LENGTH));
    if let Some(email) = email {
        if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    let username = required_text(
        &mut errors,
        "username",
        req.username.as_deref(),
        Some(USER_NAME_LENGTH),
    );
    if let Some(username) = username {
        if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if is_reserved_username(username) {
            errors.add("username", "This username is reserved.");
        }
    }

    let first_name = required_text(
        &mut errors,
        "first_name",
        req.first_name.as_deref(),
        Some(USER_NAME_LENGTH),
    );
    let last_name = required_text(
        &mut errors,
        "last_name",
        req.last_name.as_deref(),
        Some(USER_NAME_LENGTH),
    );

    match req.password.as_deref() {
        Some(password) if !password.is_empty() => check_password(&mut errors, "password", password),
        _ => errors.add("password", REQUIRED),
    }

    if let Some(email) = email {
        if errors.is_empty() && state.db.get_user_by_email(email).await.is_ok() {
            errors.add("email", "A user with that email already exists.");
        }
    }
    errors.into_result()?;

    let (Some(email), Some(username), Some(first_name), Some(last_name), Some(password)) =
        (email, username, first_name, last_name, req.password.clone())
    else {
        return Err(ApiError::Internal("validated fields missing".to_string()));
    };

    let new_user = NewUser {
        email: email.to_string(),
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        password: hash_password(password, state.config.auth.bcrypt_cost).await?,
    };

    let user = match state.db.create_user(&new_user).await {
        Ok(user) => user,
        Err(DbError::AlreadyExists(_)) => {
            return Err(ApiError::field(
                "username",
                "A user with that username already exists.",
            ))
        }
        Err(e) => return Err(e.into()),
    };

    info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserDto {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserDto>> {
    let user = state.db.get_user_by_id(user_id).await?;
    Ok(Json(user_dto(&state, viewer.as_ref(), &user).await?))
}

pub async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<UserDto>> {
    Ok(Json(user_dto(&state, Some(&user), &user).await?))
}

pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let req: SetPasswordRequest = parse_json(&body)?;
    let mut errors = FieldErrors::new();

    let current = req.current_password.filter(|p| !p.is_empty());
    if current.is_none() {
        errors.add("current_password", REQUIRED);
    }
    let new_password = req.new_password.filter(|p| !p.is_empty());
    match new_password.as_deref() {
        Some(p) => check_password(&mut errors, "new_password", p),
        None => errors.add("new_password", REQUIRED),
    }
    errors.into_result()?;

    let (Some(current), Some(new_password)) = (current, new_password) else {
        return Err(ApiError::Internal("validated fields missing".to_string()));
    };

    if !verify_password(current, user.password.clone()).await? {
        return Err(ApiError::field("current_password", "Invalid password."));
    }

    let hash = hash_password(new_password, state.config.auth.bcrypt_cost).await?;
    state.db.set_password(user.id, &hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> ApiResult<Json<AvatarResponse>> {
    let req: AvatarRequest = parse_json(&body)?;
    let data = req
        .avatar
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::field("avatar", REQUIRED))?;

    let path = state
        .media
        .save_data_uri(AVATAR_FOLDER, &data)
        .map_err(|e| match e.is_client_error() {
            true => ApiError::field("avatar", e.to_string()),
            false => e.into(),
        })?;
    state.db.set_avatar(user.id, Some(&path)).await?;

    Ok(Json(AvatarResponse {
        avatar: Some(media_url(&state.config.baseurl, &path)),
    }))
}

pub async fn delete_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<StatusCode> {
    state.db.set_avatar(user.id, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Paginated<SubscriptionDto>>> {
    let page = Page::from_params(&params, state.config.pagination.page_size)?;
    let limit = recipes_limit(&params)?;
    let (authors, count) = state
        .db
        .list_subscriptions(user.id, page.offset(), page.limit)
        .await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(subscription_dto(&state, &user, author, limit).await?);
    }

    let url = format!("{}/api/users/subscriptions/", state.config.baseurl);
    Ok(Json(Paginated::new(results, count, page, &url, &params)?))
}

pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(author_id): Path<i64>,
    Query(params): Query<QueryParams>,
) -> ApiResult<(StatusCode, Json<SubscriptionDto>)> {
    let author = state.db.get_user_by_id(author_id).await?;
    let limit = recipes_limit(&params)?;

    if author.id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot subscribe to yourself.".to_string(),
        ));
    }

    state.db.subscribe(user.id, author.id).await.map_err(|e| match e {
        DbError::AlreadyExists(_) => {
            ApiError::BadRequest("You are already subscribed to this user.".to_string())
        }
        e => e.into(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(subscription_dto(&state, &user, &author, limit).await?),
    ))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(author_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let author = state.db.get_user_by_id(author_id).await?;

    state.db.unsubscribe(user.id, author.id).await.map_err(|e| match e {
        DbError::NotFound(_) => {
            ApiError::BadRequest("You are not subscribed to this user.".to_string())
        }
        e => e.into(),
    })?;

    Ok(StatusCode::NO_CONTENT)
}
