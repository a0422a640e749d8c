use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

use super::model::*;
use super::repo::*;

const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.text, r.cooking_time, r.image, r.created";
const USER_COLUMNS: &str = "u.id, u.email, u.username, u.first_name, u.last_name, u.password, u.avatar, u.created";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }
}

fn not_found(what: String) -> impl FnOnce(sqlx::Error) -> DbError {
    move |e| match e {
        sqlx::Error::RowNotFound => DbError::NotFound(what),
        _ => DbError::Sqlx(e),
    }
}

fn already_exists(what: String) -> impl FnOnce(sqlx::Error) -> DbError {
    move |e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            DbError::AlreadyExists(what)
        }
        _ => DbError::Sqlx(e),
    }
}

/// Pattern for a case-insensitive substring match with `LIKE ? ESCAPE '\'`.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_recipe_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &RecipeQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(author) = query.author {
        builder.push(" AND r.author_id = ").push_bind(author);
    }

    if !query.tags.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND (",
        );
        for (i, tag) in query.tags.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push("t.slug LIKE ")
                .push_bind(like_pattern(tag))
                .push(" ESCAPE '\\'");
        }
        builder.push("))");
    }

    for (list, filter) in [
        (RecipeList::Favorite, query.favorited),
        (RecipeList::ShoppingCart, query.in_cart),
    ] {
        if let Some((user_id, wanted)) = filter {
            builder.push(if wanted { " AND EXISTS" } else { " AND NOT EXISTS" });
            builder
                .push(format!(
                    " (SELECT 1 FROM {} l WHERE l.recipe_id = r.id AND l.holder_id = ",
                    list.table()
                ))
                .push_bind(user_id)
                .push(")");
        }
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user_by_id(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found(format!("User not found: {}", id)))
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users u WHERE u.email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found(format!("User not found: {}", email)))
    }

    async fn list_users(&self, offset: usize, limit: usize) -> DbResult<(Vec<User>, usize)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users u ORDER BY u.id LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, count as usize))
    }

    async fn create_user(&self, user: &NewUser) -> DbResult<User> {
        let created = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO users (email, username, first_name, last_name, password, created)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .bind(&created)
        .execute(&self.pool)
        .await
        .map_err(already_exists(format!("User {} / {}", user.username, user.email)))?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password: user.password.clone(),
            avatar: None,
            created: Some(created),
        })
    }

    async fn set_password(&self, id: i64, password: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> DbResult<()> {
        sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
            .bind(avatar)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccessTokenRepo for SqliteRepository {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken> {
        sqlx::query_as::<_, AccessToken>(
            "SELECT token, userid, created FROM accesstokens WHERE token = ?",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Token not found".to_string()))
    }

    async fn create_token(&self, token: &AccessToken) -> DbResult<()> {
        sqlx::query("INSERT INTO accesstokens (token, userid, created) VALUES (?, ?, ?)")
            .bind(&token.token)
            .bind(token.userid)
            .bind(&token.created)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_token(&self, token: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM accesstokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TagRepo for SqliteRepository {
    async fn list_tags(&self) -> DbResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn get_tag(&self, id: i64) -> DbResult<Tag> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found(format!("Tag not found: {}", id)))
    }

    async fn upsert_tag(&self, name: &str, slug: &str) -> DbResult<()> {
        sqlx::query("INSERT OR IGNORE INTO tags (name, slug) VALUES (?, ?)")
            .bind(name)
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IngredientRepo for SqliteRepository {
    async fn list_ingredients(&self, name: Option<&str>) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        // SQLite's LIKE only folds ASCII, so match in Rust.
        let Some(needle) = name.map(str::to_lowercase).filter(|n| !n.is_empty()) else {
            return Ok(ingredients);
        };
        Ok(ingredients
            .into_iter()
            .filter(|i| i.name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn get_ingredient(&self, id: i64) -> DbResult<Ingredient> {
        sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Ingredient not found: {}", id)))
    }

    async fn upsert_ingredient(&self, name: &str, measurement_unit: &str) -> DbResult<()> {
        sqlx::query("INSERT OR IGNORE INTO ingredients (name, measurement_unit) VALUES (?, ?)")
            .bind(name)
            .bind(measurement_unit)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn existing_ingredient_ids(&self, ids: &[i64]) -> DbResult<Vec<i64>> {
        existing_ids(&self.pool, "ingredients", ids).await
    }
}

async fn existing_ids(pool: &SqlitePool, table: &str, ids: &[i64]) -> DbResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT id FROM {} WHERE id IN (", table));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found = builder.build_query_scalar::<i64>().fetch_all(pool).await?;
    Ok(found)
}

impl SqliteRepository {
    async fn write_recipe_relations(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        recipe_id: i64,
        data: &RecipeData,
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut **tx)
            .await?;

        for tag_id in &data.tags {
            sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
                .bind(recipe_id)
                .bind(tag_id)
                .execute(&mut **tx)
                .await
                .map_err(already_exists(format!("Duplicate tag {}", tag_id)))?;
        }

        for (ingredient_id, amount) in &data.ingredients {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?, ?, ?)",
            )
            .bind(recipe_id)
            .bind(ingredient_id)
            .bind(amount)
            .execute(&mut **tx)
            .await
            .map_err(already_exists(format!("Duplicate ingredient {}", ingredient_id)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl RecipeRepo for SqliteRepository {
    async fn get_recipe(&self, id: i64) -> DbResult<Recipe> {
        sqlx::query_as::<_, Recipe>(&format!("SELECT {} FROM recipes r WHERE r.id = ?", RECIPE_COLUMNS))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found(format!("Recipe not found: {}", id)))
    }

    async fn list_recipes(&self, query: &RecipeQuery) -> DbResult<(Vec<Recipe>, usize)> {
        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM recipes r");
        push_recipe_filters(&mut count_builder, query);
        let count = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM recipes r", RECIPE_COLUMNS));
        push_recipe_filters(&mut builder, query);
        builder
            .push(" ORDER BY r.id DESC LIMIT ")
            .push_bind(query.limit as i64)
            .push(" OFFSET ")
            .push_bind(query.offset as i64);

        let recipes = builder
            .build_query_as::<Recipe>()
            .fetch_all(&self.pool)
            .await?;

        Ok((recipes, count as usize))
    }

    async fn list_recipes_by_author(&self, author_id: i64, limit: Option<usize>) -> DbResult<Vec<Recipe>> {
        // LIMIT -1 means no limit in SQLite.
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {} FROM recipes r WHERE r.author_id = ? ORDER BY r.id DESC LIMIT ?",
            RECIPE_COLUMNS
        ))
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(recipes)
    }

    async fn count_recipes_by_author(&self, author_id: i64) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn create_recipe(&self, author_id: i64, data: &RecipeData) -> DbResult<Recipe> {
        let created = chrono::Utc::now().to_rfc3339();
        let image = data.image.clone().unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO recipes (author_id, name, text, cooking_time, image, created)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(author_id)
        .bind(&data.name)
        .bind(&data.text)
        .bind(data.cooking_time)
        .bind(&image)
        .bind(&created)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        Self::write_recipe_relations(&mut tx, id, data).await?;
        tx.commit().await?;

        Ok(Recipe {
            id,
            author_id,
            name: data.name.clone(),
            text: data.text.clone(),
            cooking_time: data.cooking_time,
            image,
            created: Some(created),
        })
    }

    async fn update_recipe(&self, id: i64, data: &RecipeData) -> DbResult<Recipe> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE recipes SET name = ?, text = ?, cooking_time = ?, image = COALESCE(?, image)
             WHERE id = ?",
        )
        .bind(&data.name)
        .bind(&data.text)
        .bind(data.cooking_time)
        .bind(&data.image)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Recipe not found: {}", id)));
        }

        Self::write_recipe_relations(&mut tx, id, data).await?;
        tx.commit().await?;

        self.get_recipe(id).await
    }

    async fn delete_recipe(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Recipe not found: {}", id)));
        }
        Ok(())
    }

    async fn get_recipe_tags(&self, recipe_id: i64) -> DbResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.slug FROM recipe_tags rt
             JOIN tags t ON t.id = rt.tag_id
             WHERE rt.recipe_id = ? ORDER BY t.id",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn get_recipe_ingredients(&self, recipe_id: i64) -> DbResult<Vec<RecipeIngredient>> {
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            "SELECT i.id, i.name, i.measurement_unit, ri.amount FROM recipe_ingredients ri
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = ? ORDER BY ri.id",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ingredients)
    }

    async fn existing_tag_ids(&self, ids: &[i64]) -> DbResult<Vec<i64>> {
        existing_ids(&self.pool, "tags", ids).await
    }
}

#[async_trait]
impl RecipeListRepo for SqliteRepository {
    async fn add_to_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> DbResult<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (holder_id, recipe_id) VALUES (?, ?)",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await
        .map_err(already_exists(format!("Recipe {} already in {}", recipe_id, list.table())))?;
        Ok(())
    }

    async fn remove_from_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> DbResult<()> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE holder_id = ? AND recipe_id = ?",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "Recipe {} not in {}",
                recipe_id,
                list.table()
            )));
        }
        Ok(())
    }

    async fn in_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(&format!(
            "SELECT 1 FROM {} WHERE holder_id = ? AND recipe_id = ?",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn get_cart_entries(&self, user_id: i64) -> DbResult<Vec<CartEntry>> {
        let entries = sqlx::query_as::<_, CartEntry>(
            "SELECT i.name, i.measurement_unit, ri.amount FROM shoppingcart sc
             JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE sc.holder_id = ?
             ORDER BY sc.id, ri.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

#[async_trait]
impl SubscriptionRepo for SqliteRepository {
    async fn subscribe(&self, user_id: i64, author_id: i64) -> DbResult<()> {
        sqlx::query("INSERT INTO subscriptions (user_id, subscribed_on_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(already_exists(format!("Already subscribed to {}", author_id)))?;
        Ok(())
    }

    async fn unsubscribe(&self, user_id: i64, author_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND subscribed_on_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Not subscribed to {}", author_id)));
        }
        Ok(())
    }

    async fn is_subscribed(&self, user_id: i64, author_id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM subscriptions WHERE user_id = ? AND subscribed_on_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn list_subscriptions(&self, user_id: i64, offset: usize, limit: usize) -> DbResult<(Vec<User>, usize)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM subscriptions s JOIN users u ON u.id = s.subscribed_on_id
             WHERE s.user_id = ? ORDER BY s.id LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, count as usize))
    }
}

#[async_trait]
impl LinkRepo for SqliteRepository {
    async fn get_link_by_url(&self, url: &str) -> DbResult<Link> {
        sqlx::query_as::<_, Link>(
            "SELECT id, url, short_link FROM links WHERE url = ? ORDER BY id LIMIT 1",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Link not found: {}", url)))
    }

    async fn get_link_by_short(&self, short_link: &str) -> DbResult<Link> {
        sqlx::query_as::<_, Link>(
            "SELECT id, url, short_link FROM links WHERE short_link = ? ORDER BY id LIMIT 1",
        )
        .bind(short_link)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Link not found: {}", short_link)))
    }

    async fn create_link(&self, url: &str, short_link: &str) -> DbResult<Link> {
        let result = sqlx::query("INSERT INTO links (url, short_link) VALUES (?, ?)")
            .bind(url)
            .bind(short_link)
            .execute(&self.pool)
            .await?;

        Ok(Link {
            id: result.last_insert_rowid(),
            url: url.to_string(),
            short_link: short_link.to_string(),
        })
    }
}
