pub mod actions;
pub mod auth;
pub mod cart;
pub mod error;
mod filter;
pub mod ingredients;
pub mod links;
pub mod pagination;
pub mod recipes;
pub mod tags;
pub mod types;
pub mod users;
pub mod validate;

pub use auth::{auth_middleware, AuthUser, CurrentUser, MaybeUser};
pub use error::{ApiError, ApiResult};
