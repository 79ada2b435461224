use std::sync::LazyLock;

use axum::extract::{Path, Query, State};
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Project, ProjectVersion, Theme};
use crate::state::SharedState;
use crate::tier;

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)+$")
        .expect("domain regex")
});
static SUBDOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("subdomain regex"));

#[derive(Deserialize)]
pub struct CreateProject {
    pub theme_id: Uuid,
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    /// When present, a new immutable version is appended.
    pub theme_params: Option<serde_json::Value>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub theme: Option<ThemeSummary>,
    pub latest_version: Option<ProjectVersion>,
}

#[derive(Serialize)]
pub struct ThemeSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub default_params: serde_json::Value,
}

impl From<Theme> for ThemeSummary {
    fn from(theme: Theme) -> Self {
        Self {
            id: theme.id,
            name: theme.name,
            description: theme.description,
            default_params: theme.default_params,
        }
    }
}

async fn detail(state: &SharedState, project: Project) -> Result<ProjectDetail, AppError> {
    let theme = db::themes::find_by_id(&state.pool, project.theme_id).await?;
    let latest_version = db::versions::latest(&state.pool, project.id).await?;
    Ok(ProjectDetail {
        project,
        theme: theme.map(ThemeSummary::from),
        latest_version,
    })
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProjectDetail>>, AppError> {
    let projects = db::projects::list(&state.pool, auth.user_id).await?;
    let mut detailed = Vec::with_capacity(projects.len());
    for project in projects {
        detailed.push(detail(&state, project).await?);
    }
    Ok(Json(detailed))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<ProjectDetail>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Project name is required".to_string()));
    }

    let theme = db::themes::find_by_id(&state.pool, req.theme_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Theme not found".to_string()))?;

    // Tier gate: active project count.
    let user_tier = tier::user_tier(&state.pool, auth.user_id).await?;
    let features = user_tier.features();
    let current = db::users::count_projects(&state.pool, auth.user_id).await?;
    if tier::limit_reached(current, features.max_projects) {
        return Err(AppError::PaymentRequired(format!(
            "The {} plan allows at most {} projects. Upgrade to create more.",
            features.name, features.max_projects
        )));
    }

    let project =
        db::projects::create(&state.pool, auth.user_id, theme.id, req.name.trim()).await?;

    // Seed version 1 from the theme defaults so the project always has a
    // renderable snapshot.
    db::versions::append(&state.pool, project.id, &theme.default_params).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.created",
        "project",
        Some(project.id),
        None,
    )
    .await;

    let detail = detail(&state, project).await?;
    Ok(Json(detail))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let detail = detail(&state, project).await?;
    Ok(Json(detail))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<ProjectDetail>, AppError> {
    let mut project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if let Some(name) = req.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Project name cannot be empty".to_string(),
            ));
        }
        project = db::projects::rename(&state.pool, id, auth.user_id, name.trim()).await?;
    }

    if let Some(status) = req.status.as_deref() {
        if !matches!(status, "editing" | "archived") {
            return Err(AppError::BadRequest(
                "Status must be 'editing' or 'archived'".to_string(),
            ));
        }
        project = db::projects::set_status(&state.pool, id, auth.user_id, status).await?;
    }

    if let Some(theme_params) = &req.theme_params {
        if !theme_params.is_object() {
            return Err(AppError::BadRequest(
                "theme_params must be a JSON object".to_string(),
            ));
        }

        // Versions are immutable and never deleted, so the tier history
        // cap refuses new snapshots instead of pruning old ones.
        let user_tier = tier::user_tier(&state.pool, auth.user_id).await?;
        let features = user_tier.features();
        let versions = db::versions::count(&state.pool, project.id).await?;
        if tier::limit_reached(versions, features.max_version_history) {
            return Err(AppError::PaymentRequired(format!(
                "The {} plan keeps at most {} versions per project. Upgrade for more history.",
                features.name, features.max_version_history
            )));
        }

        let version = db::versions::append(&state.pool, project.id, theme_params).await?;

        audit::log_event(
            &state.pool,
            Some(auth.user_id),
            "project.version_created",
            "project",
            Some(project.id),
            Some(json!({ "version_number": version.version_number })),
        )
        .await;
    }

    let detail = detail(&state, project).await?;
    Ok(Json(detail))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::projects::delete(&state.pool, id, auth.user_id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.deleted",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(json!({ "message": "Deleted" })))
}

// ── Versions ────────────────────────────────────────────────────

pub async fn list_versions(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectVersion>>, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let versions = db::versions::list(&state.pool, id).await?;
    Ok(Json(versions))
}

pub async fn get_version(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, number)): Path<(Uuid, i32)>,
) -> Result<Json<ProjectVersion>, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let version = db::versions::find_by_number(&state.pool, id, number)
        .await?
        .ok_or_else(|| AppError::NotFound("Version not found".to_string()))?;
    Ok(Json(version))
}

// ── Domains ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ClaimDomain {
    pub custom_domain: Option<String>,
    pub subdomain: Option<String>,
}

pub async fn claim_domain(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ClaimDomain>,
) -> Result<Json<Project>, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let custom_domain = req
        .custom_domain
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());
    let subdomain = req
        .subdomain
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());

    if custom_domain.is_none() && subdomain.is_none() {
        return Err(AppError::BadRequest(
            "Provide a custom_domain or a subdomain".to_string(),
        ));
    }

    if let Some(domain) = custom_domain.as_deref() {
        if !DOMAIN_RE.is_match(domain) {
            return Err(AppError::BadRequest(format!("Invalid domain: {domain}")));
        }
        if domain.ends_with(&format!(".{}", state.config.app_domain)) {
            return Err(AppError::BadRequest(
                "Use the subdomain field for app-domain hosts".to_string(),
            ));
        }
    }
    if let Some(sub) = subdomain.as_deref() {
        if !SUBDOMAIN_RE.is_match(sub) {
            return Err(AppError::BadRequest(format!("Invalid subdomain: {sub}")));
        }
    }

    for candidate in [custom_domain.as_deref(), subdomain.as_deref()]
        .into_iter()
        .flatten()
    {
        if db::projects::domain_taken(&state.pool, candidate, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "Domain '{candidate}' is already in use"
            )));
        }
    }

    let project = db::projects::set_domains(
        &state.pool,
        id,
        auth.user_id,
        custom_domain.as_deref(),
        subdomain.as_deref(),
    )
    .await
    .map_err(|e| match e {
        // Unique index race: another project claimed it between the check
        // and the write.
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Domain is already in use".to_string())
        }
        _ => AppError::Database(e),
    })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.domain_claimed",
        "project",
        Some(id),
        Some(json!({ "custom_domain": project.custom_domain, "subdomain": project.subdomain })),
    )
    .await;

    Ok(Json(project))
}

pub async fn release_domain(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let project = db::projects::set_domains(&state.pool, id, auth.user_id, None, None).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.domain_released",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(project))
}

#[derive(Deserialize)]
pub struct DomainQuery {
    pub domain: String,
}

pub async fn check_domain(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<DomainQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let domain = query.domain.to_lowercase();
    if !DOMAIN_RE.is_match(&domain) && !SUBDOMAIN_RE.is_match(&domain) {
        return Ok(Json(
            json!({ "domain": domain, "available": false, "reason": "invalid" }),
        ));
    }

    let taken = db::projects::domain_taken(&state.pool, &domain, None).await?;
    Ok(Json(json!({ "domain": domain, "available": !taken })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_regex_accepts_real_domains() {
        assert!(DOMAIN_RE.is_match("shopgiay.com"));
        assert!(DOMAIN_RE.is_match("coffee-export.example.co"));
        assert!(!DOMAIN_RE.is_match("nodots"));
        assert!(!DOMAIN_RE.is_match("-bad.com"));
        assert!(!DOMAIN_RE.is_match("UPPER.com"));
    }

    #[test]
    fn subdomain_regex_is_single_label() {
        assert!(SUBDOMAIN_RE.is_match("beans"));
        assert!(SUBDOMAIN_RE.is_match("highland-beans"));
        assert!(!SUBDOMAIN_RE.is_match("two.labels"));
        assert!(!SUBDOMAIN_RE.is_match("trailing-"));
    }
}
