use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user_by_id(&self, id: i64) -> DbResult<User>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn list_users(&self, offset: usize, limit: usize) -> DbResult<(Vec<User>, usize)>;
    async fn create_user(&self, user: &NewUser) -> DbResult<User>;
    async fn set_password(&self, id: i64, password: &str) -> DbResult<()>;
    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> DbResult<()>;
}

#[async_trait]
pub trait AccessTokenRepo: Send + Sync {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken>;
    async fn create_token(&self, token: &AccessToken) -> DbResult<()>;
    async fn delete_token(&self, token: &str) -> DbResult<()>;
}

#[async_trait]
pub trait TagRepo: Send + Sync {
    async fn list_tags(&self) -> DbResult<Vec<Tag>>;
    async fn get_tag(&self, id: i64) -> DbResult<Tag>;
    async fn upsert_tag(&self, name: &str, slug: &str) -> DbResult<()>;
}

#[async_trait]
pub trait IngredientRepo: Send + Sync {
    async fn list_ingredients(&self, name: Option<&str>) -> DbResult<Vec<Ingredient>>;
    async fn get_ingredient(&self, id: i64) -> DbResult<Ingredient>;
    async fn upsert_ingredient(&self, name: &str, measurement_unit: &str) -> DbResult<()>;
    /// Returns the subset of `ids` that exist.
    async fn existing_ingredient_ids(&self, ids: &[i64]) -> DbResult<Vec<i64>>;
}

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn get_recipe(&self, id: i64) -> DbResult<Recipe>;
    async fn list_recipes(&self, query: &RecipeQuery) -> DbResult<(Vec<Recipe>, usize)>;
    async fn list_recipes_by_author(&self, author_id: i64, limit: Option<usize>) -> DbResult<Vec<Recipe>>;
    async fn count_recipes_by_author(&self, author_id: i64) -> DbResult<usize>;
    async fn create_recipe(&self, author_id: i64, data: &RecipeData) -> DbResult<Recipe>;
    async fn update_recipe(&self, id: i64, data: &RecipeData) -> DbResult<Recipe>;
    async fn delete_recipe(&self, id: i64) -> DbResult<()>;
    async fn get_recipe_tags(&self, recipe_id: i64) -> DbResult<Vec<Tag>>;
    async fn get_recipe_ingredients(&self, recipe_id: i64) -> DbResult<Vec<RecipeIngredient>>;
    /// Returns the subset of `ids` that exist.
    async fn existing_tag_ids(&self, ids: &[i64]) -> DbResult<Vec<i64>>;
}

#[async_trait]
pub trait RecipeListRepo: Send + Sync {
    async fn add_to_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> DbResult<()>;
    async fn remove_from_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> DbResult<()>;
    async fn in_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> DbResult<bool>;
    /// Ingredient lines of every recipe in the user's cart, in cart order.
    async fn get_cart_entries(&self, user_id: i64) -> DbResult<Vec<CartEntry>>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn subscribe(&self, user_id: i64, author_id: i64) -> DbResult<()>;
    async fn unsubscribe(&self, user_id: i64, author_id: i64) -> DbResult<()>;
    async fn is_subscribed(&self, user_id: i64, author_id: i64) -> DbResult<bool>;
    async fn list_subscriptions(&self, user_id: i64, offset: usize, limit: usize) -> DbResult<(Vec<User>, usize)>;
}

#[async_trait]
pub trait LinkRepo: Send + Sync {
    async fn get_link_by_url(&self, url: &str) -> DbResult<Link>;
    async fn get_link_by_short(&self, short_link: &str) -> DbResult<Link>;
    async fn create_link(&self, url: &str, short_link: &str) -> DbResult<Link>;
}
