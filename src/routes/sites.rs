use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::db;
use crate::models::Project;
use crate::render;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "site/not_found.html")]
struct NotFoundTemplate {
    domain: String,
}

/// Render a tenant site: the project is found by custom domain, falling
/// back to the first label as a subdomain; the page is its latest
/// version snapshot.
pub async fn render_site(
    State(state): State<SharedState>,
    Path(domain): Path<String>,
) -> Response {
    render_for_domain(&state, &domain).await
}

/// Tenant sites are single-page; deep links render the same document and
/// the fragment navigation takes over client-side.
pub async fn render_site_path(
    State(state): State<SharedState>,
    Path((domain, _rest)): Path<(String, String)>,
) -> Response {
    render_for_domain(&state, &domain).await
}

async fn render_for_domain(state: &SharedState, domain: &str) -> Response {
    let domain = domain.to_ascii_lowercase();

    let project = match lookup_project(state, &domain).await {
        Ok(Some(project)) if project.status != "archived" => project,
        Ok(_) => return not_found(&domain),
        Err(e) => {
            tracing::error!("Tenant lookup failed for {domain}: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let version = match db::versions::latest(&state.pool, project.id).await {
        Ok(Some(version)) => version,
        Ok(None) => return not_found(&domain),
        Err(e) => {
            tracing::error!("Version lookup failed for {domain}: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let view = render::build_view(
        &project.name,
        &project.id.to_string(),
        &version.snapshot,
        true,
        "/v1/leads",
    );

    match render::render_page(&view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render site for {domain}: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn lookup_project(
    state: &SharedState,
    domain: &str,
) -> Result<Option<Project>, sqlx::Error> {
    if let Some(project) = db::projects::find_by_custom_domain(&state.pool, domain).await? {
        return Ok(Some(project));
    }

    let label = domain.split('.').next().unwrap_or(domain);
    db::projects::find_by_subdomain(&state.pool, label).await
}

fn not_found(domain: &str) -> Response {
    let template = NotFoundTemplate {
        domain: domain.to_string(),
    };
    (
        StatusCode::NOT_FOUND,
        Html(template.render().unwrap_or_default()),
    )
        .into_response()
}
