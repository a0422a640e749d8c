use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use tracing::debug;

use super::error::{parse_json, ApiError, ApiResult};
use super::types::{LoginRequest, TokenResponse};
use crate::db::{AccessToken, AccessTokenRepo, User, UserRepo};
use crate::server::AppState;

/// Set on the request by [`auth_middleware`] when a valid token was presented.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Handler argument that requires an authenticated user (401 otherwise).
pub struct AuthUser(pub User);

/// Handler argument for endpoints that also serve anonymous visitors.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| AuthUser(current.user.clone()))
            .ok_or(ApiError::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<CurrentUser>()
                .map(|current| current.user.clone()),
        ))
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        match state.db.get_token(&token).await {
            Ok(access_token) => {
                if let Ok(user) = state.db.get_user_by_id(access_token.userid).await {
                    req.extensions_mut().insert(CurrentUser { user, token });
                }
            }
            Err(e) => debug!("Rejected token: {}", e),
        }
    }

    next.run(req).await
}

fn extract_token<B>(req: &axum::http::Request<B>) -> Option<String> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    parse_auth_header(header)
}

/// Accepts `Token <key>` and `Bearer <key>`.
fn parse_auth_header(header: &str) -> Option<String> {
    let (scheme, key) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some(key.to_string())
}

pub async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<TokenResponse>> {
    let req: LoginRequest = parse_json(&body)?;

    let invalid = || {
        ApiError::field(
            "non_field_errors",
            "Unable to log in with provided credentials.",
        )
    };

    let user = match state.db.get_user_by_email(req.email.trim()).await {
        Ok(user) => user,
        Err(crate::db::DbError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(req.password, user.password.clone()).await? {
        return Err(invalid());
    }

    let token = AccessToken {
        token: uuid::Uuid::new_v4().simple().to_string(),
        userid: user.id,
        created: Some(chrono::Utc::now().to_rfc3339()),
    };
    state.db.create_token(&token).await?;

    Ok(Json(TokenResponse {
        auth_token: token.token,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    current: Option<Extension<CurrentUser>>,
) -> ApiResult<StatusCode> {
    let Extension(current) = current.ok_or(ApiError::Unauthorized)?;
    state.db.delete_token(&current.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
