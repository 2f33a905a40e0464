use crate::{GIT_COMMIT_HASH, account::AccountService};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Database is healthy", body = Health),
        (status = 503, description = "Database is unhealthy", body = Health)
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(accounts: Extension<Arc<AccountService>>) -> impl IntoResponse {
    let database = match accounts.ping().await {
        Ok(()) => {
            debug!("Database connection is healthy");
            Ok(())
        }
        Err(err) => {
            error!("Failed to ping database: {}", err);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let short_hash = if health.commit.len() > 7 {
        health.commit.get(0..7).unwrap_or("")
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    match format!("{}:{}:{}", health.name, health.version, short_hash).parse::<HeaderValue>() {
        Ok(value) => {
            headers.insert("X-App", value);
        }
        Err(err) => error!("Failed to parse X-App header: {}", err),
    }

    let status = database.err().unwrap_or(StatusCode::OK);

    (status, headers, Json(health))
}
