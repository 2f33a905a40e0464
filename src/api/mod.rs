use crate::account::{AccountService, CredentialHasher, PgUserStore};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use handlers::{auth::TokenVerifier, users};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

const REQUEST_ID: &str = "x-request-id";

/// Server settings resolved from the command line.
#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub dsn: SecretString,
    pub max_connections: u32,
    pub hasher: CredentialHasher,
    pub verifier: TokenVerifier,
}

/// Assemble the HTTP application around an account service and token verifier.
///
/// Documented routes come from the `OpenAPI` router; `/users` without the trailing
/// slash is served as an alias of `/users/`.
pub fn app(accounts: Arc<AccountService>, verifier: Arc<TokenVerifier>) -> Router {
    let (router, openapi) = openapi::api_router().split_for_parts();

    router
        .route("/users", get(users::get_user))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(accounts))
                .layer(Extension(verifier)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or to start the server
pub async fn new(config: ServerConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(config.dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let accounts = Arc::new(AccountService::new(
        Arc::new(PgUserStore::new(pool)),
        config.hasher,
    ));
    let app = self::app(accounts, Arc::new(config.verifier));

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
