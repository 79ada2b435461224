pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod integrations;
pub mod maintenance;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod render;
pub mod request_meta;
pub mod routes;
pub mod state;
pub mod tier;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::ai::GenerationService;
use crate::config::Config;
use crate::integrations::github::GithubClient;
use crate::integrations::unsplash::UnsplashClient;
use crate::integrations::vercel::VercelClient;
use crate::rate_limit::{GenerationRateLimiter, LoginRateLimiter};
use crate::state::{AppState, SharedState};

pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let ai = GenerationService::new(config.ai_api_keys.clone(), &config.ai_model);
    if config.ai_api_keys.is_empty() {
        tracing::warn!("No AI API keys configured; generation requests will fail");
    } else {
        tracing::info!("Loaded {} AI API keys", config.ai_api_keys.len());
    }

    let github = config.github.as_ref().map(GithubClient::new);
    let vercel = config.vercel.as_ref().map(VercelClient::new);
    let unsplash = config
        .unsplash_access_key
        .as_deref()
        .map(UnsplashClient::new);

    Arc::new(AppState {
        pool,
        config,
        ai,
        github,
        vercel,
        unsplash,
        generation_limiter: GenerationRateLimiter::new(),
        login_limiter: LoginRateLimiter::new(),
    })
}

pub fn build_app(state: SharedState) -> Router {
    let upload_dir = state.config.upload_dir.clone();

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::public_routes())
        .merge(routes::site_routes())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .route("/health", axum::routing::get(health))
        .layer(axum::extract::DefaultBodyLimit::max(state.config.max_body_size))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::host::rewrite_tenant_hosts,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
