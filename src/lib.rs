pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod server;
pub mod util;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use api::types::{IngredientImport, TagImport};
use api::validate;
use db::{IngredientRepo, TagRepo};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
    #[error("Media error: {0}")]
    Media(#[from] util::media::ImageError),
    #[error("Import error: {0}")]
    Import(String),
    #[error("Server error: {0}")]
    Server(String),
}

async fn open_database(config: &config::Config) -> Result<db::SqliteRepository, ServerError> {
    let db_path = config
        .get_database_path()
        .ok_or_else(|| ServerError::Server("No database path configured".to_string()))?;

    info!("Opening database at {}", db_path);
    Ok(db::SqliteRepository::new(&db_path).await?)
}

pub async fn run(config_path: &str, debug_logs: bool) -> Result<(), ServerError> {
    let config = config::Config::from_file(config_path)?;

    info!("Using config file: {}", config_path);
    info!("Base url: {}", config.baseurl);
    if debug_logs {
        info!("Debug logging enabled");
    }

    let db = Arc::new(open_database(&config).await?);

    info!("Storing uploads in {}", config.mediadir);
    let media = Arc::new(util::MediaStore::new(PathBuf::from(&config.mediadir))?);

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        (None, None) => None,
        _ => {
            warn!("Both tlscert and tlskey are needed for TLS, serving plain HTTP");
            None
        }
    };

    let state = server::AppState::new(config, db, media);
    let app = server::build_router(state);

    if let Some((cert_path, key_path)) = tls {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<Vec<T>, ServerError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ServerError::Import(format!("Failed to read {}: {}", path, e)))?;
    serde_json::from_str(&content)
        .map_err(|e| ServerError::Import(format!("Failed to parse {}: {}", path, e)))
}

fn check_length(path: &str, what: &str, value: &str, max: usize) -> Result<(), ServerError> {
    if value.trim().is_empty() || value.chars().count() > max {
        return Err(ServerError::Import(format!(
            "{}: {} must be 1 to {} characters, got {:?}",
            path, what, max, value
        )));
    }
    Ok(())
}

async fn import_ingredients(
    repo: &db::SqliteRepository,
    path: &str,
) -> Result<usize, ServerError> {
    let rows: Vec<IngredientImport> = read_json(path)?;
    for row in &rows {
        check_length(path, "name", &row.name, validate::INGREDIENT_NAME_LENGTH)?;
        check_length(
            path,
            "measurement_unit",
            &row.measurement_unit,
            validate::MEASUREMENT_UNIT_LENGTH,
        )?;
    }
    for row in &rows {
        repo.upsert_ingredient(row.name.trim(), row.measurement_unit.trim())
            .await?;
    }
    Ok(rows.len())
}

async fn import_tags(repo: &db::SqliteRepository, path: &str) -> Result<usize, ServerError> {
    let rows: Vec<TagImport> = read_json(path)?;
    for row in &rows {
        check_length(path, "name", &row.name, validate::TAG_LENGTH)?;
        check_length(path, "slug", &row.slug, validate::TAG_LENGTH)?;
        if !validate::is_valid_slug(&row.slug) {
            return Err(ServerError::Import(format!(
                "{}: invalid slug {:?}",
                path, row.slug
            )));
        }
    }
    for row in &rows {
        repo.upsert_tag(row.name.trim(), &row.slug).await?;
    }
    Ok(rows.len())
}

/// Loads ingredient and tag fixtures into the database.
pub async fn import(
    config_path: &str,
    ingredients: Option<&str>,
    tags: Option<&str>,
) -> Result<(), ServerError> {
    let config = config::Config::from_file(config_path)?;
    let repo = open_database(&config).await?;

    if let Some(path) = ingredients {
        let n = import_ingredients(&repo, path).await?;
        info!("Imported {} ingredients from {}", n, path);
    }
    if let Some(path) = tags {
        let n = import_tags(&repo, path).await?;
        info!("Imported {} tags from {}", n, path);
    }

    Ok(())
}
