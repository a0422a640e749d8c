use axum::{
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::{self, ApiError};
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::util::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub media: Arc<MediaStore>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, media: Arc<MediaStore>) -> Self {
        Self {
            config: Arc::new(config),
            db,
            media,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/token/login/", post(api::auth::login))
        .route("/api/auth/token/logout/", post(api::auth::logout));

    let user_routes = Router::new()
        .route(
            "/api/users/",
            get(api::users::list_users).post(api::users::register),
        )
        .route("/api/users/me/", get(api::users::me))
        .route(
            "/api/users/me/avatar/",
            put(api::users::put_avatar).delete(api::users::delete_avatar),
        )
        .route("/api/users/set_password/", post(api::users::set_password))
        .route("/api/users/subscriptions/", get(api::users::subscriptions))
        .route("/api/users/:id/", get(api::users::get_user))
        .route(
            "/api/users/:id/subscribe/",
            post(api::users::subscribe).delete(api::users::unsubscribe),
        );

    let catalog_routes = Router::new()
        .route("/api/tags/", get(api::tags::list_tags))
        .route("/api/tags/:id/", get(api::tags::get_tag))
        .route("/api/ingredients/", get(api::ingredients::list_ingredients))
        .route("/api/ingredients/:id/", get(api::ingredients::get_ingredient));

    let recipe_routes = Router::new()
        .route(
            "/api/recipes/",
            get(api::recipes::list_recipes).post(api::recipes::create_recipe),
        )
        .route(
            "/api/recipes/download_shopping_cart/",
            get(api::cart::download_shopping_cart),
        )
        .route(
            "/api/recipes/:id/",
            get(api::recipes::get_recipe)
                .patch(api::recipes::update_recipe)
                .delete(api::recipes::delete_recipe),
        )
        .route(
            "/api/recipes/:id/favorite/",
            post(api::actions::add_favorite).delete(api::actions::remove_favorite),
        )
        .route(
            "/api/recipes/:id/shopping_cart/",
            post(api::actions::add_to_cart).delete(api::actions::remove_from_cart),
        )
        .route("/api/recipes/:id/get-link/", get(api::links::get_link))
        .route("/s/:code/", get(api::links::redirect_short_link));

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(catalog_routes)
        .merge(recipe_routes)
        .nest_service("/media", ServeDir::new(state.media.media_dir()))
        .fallback(fallback_handler)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ))
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback_handler() -> impl IntoResponse {
    ApiError::NotFound
}
