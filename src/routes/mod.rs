pub mod admin;
pub mod auth;
pub mod deploy;
pub mod generate;
pub mod images;
pub mod leads;
pub mod payments;
pub mod projects;
pub mod sites;
pub mod themes;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::SharedState;

/// Upload bodies get their own generous cap; the per-file limit from
/// config is enforced in the handler.
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        // Themes
        .route("/api/v1/themes", get(themes::list).post(themes::create))
        .route(
            "/api/v1/themes/{id}",
            get(themes::get).put(themes::update).delete(themes::delete),
        )
        // Projects
        .route(
            "/api/v1/projects",
            get(projects::list).post(projects::create),
        )
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/api/v1/projects/{id}/versions",
            get(projects::list_versions),
        )
        .route(
            "/api/v1/projects/{id}/versions/{number}",
            get(projects::get_version),
        )
        .route(
            "/api/v1/projects/{id}/domain",
            put(projects::claim_domain).delete(projects::release_domain),
        )
        .route("/api/v1/check-domain", get(projects::check_domain))
        // Leads (authenticated management)
        .route(
            "/api/v1/projects/{id}/leads",
            get(leads::list_by_project),
        )
        .route(
            "/api/v1/projects/{id}/leads/{lead_id}",
            put(leads::update_status),
        )
        // Payments
        .route(
            "/api/v1/payments",
            get(payments::list).post(payments::create),
        )
        .route("/api/v1/payments/{id}", get(payments::get))
        .route("/api/v1/payments/webhook", post(payments::webhook))
        .route("/api/v1/tier", get(payments::my_tier))
        // Generation
        .route("/api/v1/generate-theme", post(generate::generate))
        .route(
            "/api/v1/generate-theme/stream",
            post(generate::generate_stream),
        )
        .route("/api/v1/generate-theme/stats", get(generate::stats))
        // Images
        .route("/api/v1/images/random", get(images::random))
        .route("/api/v1/images/search", get(images::search))
        // Uploads
        .route(
            "/api/v1/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/uploads/{file_name}", delete(uploads::delete))
        // Export / deploy
        .route(
            "/api/v1/projects/{id}/export",
            post(deploy::export_project),
        )
        .route(
            "/api/v1/projects/{id}/deploy/github",
            post(deploy::deploy_github),
        )
        .route(
            "/api/v1/projects/{id}/deploy/vercel",
            post(deploy::deploy_vercel),
        )
        .route(
            "/api/v1/deployments/{deployment_id}",
            get(deploy::deployment_status),
        )
        // Admin
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/projects", get(admin::list_projects))
        .route(
            "/api/v1/admin/users/{user_id}/reset-password",
            post(admin::reset_user_password),
        )
        .route("/api/v1/admin/audit", get(admin::list_audit_events))
}

/// Public endpoints hit by tenant sites and exported bundles.
pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/v1/leads",
            post(leads::submit).options(leads::submit_options),
        )
}

/// Tenant site rendering; requests land here via the host-rewrite layer.
pub fn site_routes() -> Router<SharedState> {
    Router::new()
        .route("/sites/{domain}", get(sites::render_site))
        .route("/sites/{domain}/{*rest}", get(sites::render_site_path))
}
