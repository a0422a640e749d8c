use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use foodgram_rs::config::{AuthConfig, Config};
use foodgram_rs::db::{IngredientRepo, SqliteRepository, TagRepo};
use foodgram_rs::server::{build_router, AppState};
use foodgram_rs::util::MediaStore;

struct TestApp {
    app: Router,
    db: Arc<SqliteRepository>,
    _dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Body is not UTF-8")
    }
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("test.db");
        let db = Arc::new(
            SqliteRepository::new(db_path.to_str().unwrap())
                .await
                .expect("Failed to open test database"),
        );
        let media = Arc::new(MediaStore::new(dir.path().join("media")).unwrap());

        let config = Config {
            auth: AuthConfig { bcrypt_cost: 4 },
            ..Config::default()
        };
        let state = AppState::new(config, db.clone(), media);

        TestApp {
            app: build_router(state),
            db,
            _dir: dir,
        }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers a user and returns (user id, auth token).
    async fn signup(&self, name: &str) -> (i64, String) {
        let email = format!("{}@example.com", name);
        let res = self
            .request(
                "POST",
                "/api/users/",
                None,
                Some(json!({
                    "email": email,
                    "username": name,
                    "first_name": "Test",
                    "last_name": "Cook",
                    "password": "pass-word-123",
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
        let id = res.json()["id"].as_i64().unwrap();

        let res = self
            .request(
                "POST",
                "/api/auth/token/login/",
                None,
                Some(json!({ "email": email, "password": "pass-word-123" })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        let token = res.json()["auth_token"].as_str().unwrap().to_string();

        (id, token)
    }

    /// Seeds two tags and three ingredients, returning their ids in order.
    async fn seed(&self) -> (Vec<i64>, Vec<i64>) {
        self.db.upsert_tag("Breakfast", "breakfast").await.unwrap();
        self.db.upsert_tag("Dinner", "dinner").await.unwrap();
        self.db.upsert_ingredient("eggs", "pcs").await.unwrap();
        self.db.upsert_ingredient("flour", "g").await.unwrap();
        self.db.upsert_ingredient("milk", "ml").await.unwrap();

        let tags = self.db.list_tags().await.unwrap();
        let ingredients = self.db.list_ingredients(None).await.unwrap();
        (
            tags.iter().map(|t| t.id).collect(),
            ingredients.iter().map(|i| i.id).collect(),
        )
    }

    async fn create_recipe(&self, token: &str, body: Value) -> TestResponse {
        self.request("POST", "/api/recipes/", Some(token), Some(body))
            .await
    }
}

fn png_data_uri() -> String {
    let img = image::RgbImage::from_pixel(3, 3, image::Rgb([10, 200, 10]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
}

fn recipe_body(name: &str, tags: &[i64], ingredients: &[(i64, i64)], cooking_time: i64) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and cook.",
        "cooking_time": cooking_time,
        "image": png_data_uri(),
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new().await;

    let res = app
        .request("POST", "/api/users/", None, Some(json!({ "email": "bad" })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let errors = res.json();
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert!(errors.get(field).is_some(), "missing error for {}", field);
    }

    app.signup("alice").await;
    let res = app
        .request(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "alice@example.com",
                "username": "alice2",
                "first_name": "A",
                "last_name": "B",
                "password": "pass-word-123",
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("email").is_some());
}

#[tokio::test]
async fn test_login_logout() {
    let app = TestApp::new().await;
    let (id, token) = app.signup("bob").await;

    let res = app
        .request(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(json!({ "email": "bob@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("non_field_errors").is_some());

    let res = app.request("GET", "/api/users/me/", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.request("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let me = res.json();
    assert_eq!(me["id"], id);
    assert_eq!(me["username"], "bob");
    assert_eq!(me["is_subscribed"], false);
    assert!(me.get("password").is_none());

    let res = app
        .request("POST", "/api/auth/token/logout/", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.request("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_set_password_and_avatar() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("carol").await;

    let res = app
        .request(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(json!({ "current_password": "nope-nope-nope", "new_password": "another-pass-1" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .request(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(json!({ "current_password": "pass-word-123", "new_password": "another-pass-1" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .request(
            "PUT",
            "/api/users/me/avatar/",
            Some(&token),
            Some(json!({ "avatar": "not an image" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("avatar").is_some());

    let res = app
        .request(
            "PUT",
            "/api/users/me/avatar/",
            Some(&token),
            Some(json!({ "avatar": png_data_uri() })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let avatar = res.json()["avatar"].as_str().unwrap().to_string();
    assert!(avatar.starts_with("http://localhost:8000/media/users/avatars/"));

    let res = app
        .request("DELETE", "/api/users/me/avatar/", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.request("GET", "/api/users/me/", Some(&token), None).await;
    assert!(res.json()["avatar"].is_null());
}

#[tokio::test]
async fn test_recipe_validation() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("dave").await;
    let (tags, ingredients) = app.seed().await;

    let res = app
        .create_recipe(&token, recipe_body("Toast", &tags[..1], &[(ingredients[0], 1)], 0))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("cooking_time").is_some());

    let res = app
        .create_recipe(
            &token,
            recipe_body("Toast", &[tags[0], tags[0]], &[(ingredients[0], 1)], 5),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("tags").is_some());

    let res = app
        .create_recipe(
            &token,
            recipe_body(
                "Toast",
                &tags[..1],
                &[(ingredients[0], 1), (ingredients[0], 2)],
                5,
            ),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("ingredients").is_some());

    let res = app
        .create_recipe(&token, recipe_body("Toast", &[], &[], 5))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let errors = res.json();
    assert!(errors.get("tags").is_some());
    assert!(errors.get("ingredients").is_some());

    let res = app
        .create_recipe(&token, recipe_body("Toast", &[9999], &[(ingredients[0], 0)], 5))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let errors = res.json();
    assert!(errors.get("tags").is_some());
    assert!(errors.get("ingredients").is_some());

    let mut no_image = recipe_body("Toast", &tags[..1], &[(ingredients[0], 1)], 5);
    no_image.as_object_mut().unwrap().remove("image");
    let res = app.create_recipe(&token, no_image).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("image").is_some());

    let res = app
        .request(
            "POST",
            "/api/recipes/",
            None,
            Some(recipe_body("Toast", &tags[..1], &[(ingredients[0], 1)], 5)),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_get_recipe() {
    let app = TestApp::new().await;
    let (author_id, token) = app.signup("erin").await;
    let (tags, ingredients) = app.seed().await;

    let res = app
        .create_recipe(
            &token,
            recipe_body("Pancakes", &tags, &[(ingredients[1], 200), (ingredients[2], 300)], 20),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
    let recipe = res.json();
    assert_eq!(recipe["name"], "Pancakes");
    assert_eq!(recipe["author"]["id"], author_id);
    assert_eq!(recipe["tags"].as_array().unwrap().len(), 2);
    assert_eq!(recipe["ingredients"][0]["name"], "flour");
    assert_eq!(recipe["ingredients"][0]["amount"], 200);
    assert_eq!(recipe["is_favorited"], false);
    assert!(recipe["image"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:8000/media/recipes/images/"));

    let id = recipe["id"].as_i64().unwrap();
    let res = app
        .request("GET", &format!("/api/recipes/{}/", id), None, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["cooking_time"], 20);

    let res = app.request("GET", "/api/recipes/4242/", None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["detail"], "Not found.");
}

#[tokio::test]
async fn test_only_author_can_modify() {
    let app = TestApp::new().await;
    let (_, author) = app.signup("frank").await;
    let (_, other) = app.signup("grace").await;
    let (tags, ingredients) = app.seed().await;

    let res = app
        .create_recipe(&author, recipe_body("Stew", &tags[..1], &[(ingredients[0], 2)], 60))
        .await;
    let id = res.json()["id"].as_i64().unwrap();
    let uri = format!("/api/recipes/{}/", id);

    let mut patch = recipe_body("Better stew", &tags[1..], &[(ingredients[2], 5)], 90);
    patch.as_object_mut().unwrap().remove("image");

    let res = app.request("PATCH", &uri, None, Some(patch.clone())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.request("PATCH", &uri, Some(&other), Some(patch.clone())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.request("PATCH", &uri, Some(&author), Some(patch)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    let recipe = res.json();
    assert_eq!(recipe["name"], "Better stew");
    assert_eq!(recipe["cooking_time"], 90);
    assert_eq!(recipe["tags"][0]["id"], tags[1]);
    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(recipe["ingredients"][0]["name"], "milk");

    let res = app.request("DELETE", &uri, Some(&other), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.request("DELETE", &uri, Some(&author), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_toggle() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("heidi").await;
    let (tags, ingredients) = app.seed().await;

    let res = app
        .create_recipe(&token, recipe_body("Omelette", &tags[..1], &[(ingredients[0], 3)], 10))
        .await;
    let id = res.json()["id"].as_i64().unwrap();
    let uri = format!("/api/recipes/{}/favorite/", id);

    let res = app.request("POST", &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let short = res.json();
    assert_eq!(short["id"], id);
    assert_eq!(short["name"], "Omelette");
    assert!(short.get("text").is_none());

    let res = app.request("POST", &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json().get("errors").is_some());

    let res = app
        .request("GET", "/api/recipes/?is_favorited=1", Some(&token), None)
        .await;
    assert_eq!(res.json()["count"], 1);
    assert_eq!(res.json()["results"][0]["is_favorited"], true);

    let res = app.request("DELETE", &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.request("DELETE", &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .request("POST", "/api/recipes/999/favorite/", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shopping_cart_download() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("ivan").await;
    let (tags, ingredients) = app.seed().await;
    let (eggs, flour, milk) = (ingredients[0], ingredients[1], ingredients[2]);

    let first = app
        .create_recipe(&token, recipe_body("Crepes", &tags[..1], &[(flour, 100), (milk, 250)], 15))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();
    let second = app
        .create_recipe(&token, recipe_body("Bread", &tags[..1], &[(flour, 200), (eggs, 2)], 90))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    for id in [first, second] {
        let res = app
            .request(
                "POST",
                &format!("/api/recipes/{}/shopping_cart/", id),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = app
        .request("GET", "/api/recipes/download_shopping_cart/", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert!(res.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("shopping_cart.txt"));

    let text = res.text();
    assert!(text.starts_with("Shopping list:\n\n"));
    assert!(text.contains("\t\u{2022} flour (g) - 300\n"));
    assert!(text.contains("\t\u{2022} milk (ml) - 250\n"));
    assert!(text.contains("\t\u{2022} eggs (pcs) - 2\n"));
    assert_eq!(text.matches("flour").count(), 1);

    let res = app
        .request("GET", "/api/recipes/download_shopping_cart/", None, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_subscriptions() {
    let app = TestApp::new().await;
    let (reader_id, reader) = app.signup("judy").await;
    let (author_id, author) = app.signup("karl").await;
    let (tags, ingredients) = app.seed().await;

    for name in ["Soup", "Salad", "Pie"] {
        app.create_recipe(&author, recipe_body(name, &tags[..1], &[(ingredients[0], 1)], 5))
            .await;
    }

    let res = app
        .request(
            "POST",
            &format!("/api/users/{}/subscribe/", reader_id),
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/users/{}/subscribe/?recipes_limit=2", author_id);
    let res = app.request("POST", &uri, Some(&reader), None).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let sub = res.json();
    assert_eq!(sub["id"], author_id);
    assert_eq!(sub["is_subscribed"], true);
    assert_eq!(sub["recipes_count"], 3);
    assert_eq!(sub["recipes"].as_array().unwrap().len(), 2);

    let res = app.request("POST", &uri, Some(&reader), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .request("GET", "/api/users/subscriptions/", Some(&reader), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let page = res.json();
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["username"], "karl");
    assert_eq!(page["results"][0]["recipes"].as_array().unwrap().len(), 3);

    let res = app
        .request("GET", &format!("/api/users/{}/", author_id), Some(&reader), None)
        .await;
    assert_eq!(res.json()["is_subscribed"], true);

    let uri = format!("/api/users/{}/subscribe/", author_id);
    let res = app.request("DELETE", &uri, Some(&reader), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.request("DELETE", &uri, Some(&reader), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .request("POST", "/api/users/999/subscribe/", Some(&reader), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_pagination_and_filters() {
    let app = TestApp::new().await;
    let (author_id, token) = app.signup("liam").await;
    let (_, other) = app.signup("mia").await;
    let (tags, ingredients) = app.seed().await;

    app.create_recipe(&token, recipe_body("One", &tags[..1], &[(ingredients[0], 1)], 5))
        .await;
    app.create_recipe(&token, recipe_body("Two", &tags[1..], &[(ingredients[0], 1)], 5))
        .await;
    app.create_recipe(&other, recipe_body("Three", &tags[1..], &[(ingredients[0], 1)], 5))
        .await;

    let res = app.request("GET", "/api/recipes/?limit=2", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    let page = res.json();
    assert_eq!(page["count"], 3);
    assert_eq!(page["results"][0]["name"], "Three");
    assert!(page["previous"].is_null());
    let next = page["next"].as_str().unwrap();
    assert!(next.starts_with("http://localhost:8000/api/recipes/?"));
    assert!(next.contains("page=2"));

    let res = app
        .request("GET", "/api/recipes/?limit=2&page=2", None, None)
        .await;
    let page = res.json();
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert!(page["next"].is_null());
    assert!(page["previous"].as_str().is_some());

    let res = app
        .request("GET", "/api/recipes/?limit=2&page=3", None, None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["detail"], "Invalid page.");

    for uri in [
        "/api/recipes/?page=18446744073709551615",
        "/api/recipes/?page=3074457345618258603&limit=6",
        "/api/users/?page=18446744073709551615",
    ] {
        let res = app.request("GET", uri, None, None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(res.json()["detail"], "Invalid page.");
    }
    let res = app
        .request(
            "GET",
            "/api/users/subscriptions/?page=18446744073709551615",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .request("GET", &format!("/api/recipes/?author={}", author_id), None, None)
        .await;
    assert_eq!(res.json()["count"], 2);

    let res = app
        .request("GET", "/api/recipes/?tags=DINNER", None, None)
        .await;
    assert_eq!(res.json()["count"], 2);

    let res = app
        .request("GET", "/api/recipes/?tags=breakfast&tags=dinner", None, None)
        .await;
    assert_eq!(res.json()["count"], 3);

    // Anonymous viewers have no lists, so the filter is ignored.
    let res = app
        .request("GET", "/api/recipes/?is_in_shopping_cart=1", None, None)
        .await;
    assert_eq!(res.json()["count"], 3);

    let res = app
        .request("GET", "/api/recipes/?is_in_shopping_cart=1", Some(&token), None)
        .await;
    assert_eq!(res.json()["count"], 0);

    let res = app.request("GET", "/api/users/?limit=1", None, None).await;
    assert_eq!(res.json()["count"], 2);
    assert_eq!(res.json()["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tags_and_ingredients() {
    let app = TestApp::new().await;
    let (tags, ingredients) = app.seed().await;

    let res = app.request("GET", "/api/tags/", None, None).await;
    assert_eq!(res.json().as_array().unwrap().len(), 2);

    let res = app
        .request("GET", &format!("/api/tags/{}/", tags[0]), None, None)
        .await;
    assert_eq!(res.json()["slug"], "breakfast");

    let res = app
        .request("GET", "/api/ingredients/?name=FLO", None, None)
        .await;
    let found = res.json();
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["measurement_unit"], "g");

    let res = app
        .request("GET", &format!("/api/ingredients/{}/", ingredients[2]), None, None)
        .await;
    assert_eq!(res.json()["name"], "milk");

    let res = app.request("GET", "/api/ingredients/999/", None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_short_link_redirect() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("nina").await;
    let (tags, ingredients) = app.seed().await;

    let id = app
        .create_recipe(&token, recipe_body("Waffles", &tags[..1], &[(ingredients[1], 50)], 15))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/recipes/{}/get-link/", id);
    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    let link = res.json()["short-link"].as_str().unwrap().to_string();
    assert!(link.starts_with("http://localhost:8000/s/"));

    let again = app.request("GET", &uri, None, None).await.json();
    assert_eq!(again["short-link"], link.as_str());

    let code = link.rsplit('/').next().unwrap();
    let res = app
        .request("GET", &format!("/s/{}/", code), None, None)
        .await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(
        res.headers[header::LOCATION].to_str().unwrap(),
        format!("http://localhost:8000/recipes/{}", id)
    );

    let res = app.request("GET", "/s/nope0/", None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
