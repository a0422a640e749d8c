use super::error::{ApiError, ApiResult};
use super::pagination::Page;
use crate::db::{RecipeQuery, User};
use crate::util::QueryParams;

/// Translates recipe list query parameters into a database query.
/// Membership filters only apply to a logged-in viewer.
pub fn recipe_query(params: &QueryParams, viewer: Option<&User>, page: Page) -> ApiResult<RecipeQuery> {
    let author = match params.get("author").filter(|a| !a.is_empty()) {
        None => None,
        Some(a) => Some(
            a.parse::<i64>()
                .map_err(|_| ApiError::field("author", "Enter a number."))?,
        ),
    };

    let tags = params
        .get_all("tags")
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let membership = |key: &str| {
        let user = viewer?;
        params.get_bool(key).map(|wanted| (user.id, wanted))
    };

    Ok(RecipeQuery {
        author,
        tags,
        favorited: membership("is_favorited"),
        in_cart: membership("is_in_shopping_cart"),
        offset: page.offset(),
        limit: page.limit,
    })
}
