use std::path::Path as FsPath;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::integrations::vercel;
use crate::middleware::audit;
use crate::models::Project;
use crate::render::export;
use crate::state::SharedState;
use crate::tier;

async fn owned_project_with_snapshot(
    state: &SharedState,
    auth: &AuthUser,
    project_id: Uuid,
) -> Result<(Project, serde_json::Value), AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let version = db::versions::latest(&state.pool, project.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Project has no versions to deploy".to_string()))?;

    Ok((project, version.snapshot))
}

fn site_url(state: &SharedState, project: &Project) -> String {
    match (&project.custom_domain, &project.subdomain) {
        (Some(domain), _) => format!("https://{domain}"),
        (None, Some(sub)) => format!("https://{sub}.{}", state.config.app_domain),
        (None, None) => state.config.base_url.clone(),
    }
}

fn repo_name(project: &Project) -> String {
    let slug: String = project
        .name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let short_id = project.id.simple().to_string()[..8].to_string();
    format!("site-{slug}-{short_id}")
}

/// Export the latest snapshot as a static bundle on disk and return the
/// file manifest.
pub async fn export_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (project, snapshot) = owned_project_with_snapshot(&state, &auth, project_id).await?;

    let leads_endpoint = format!("{}/v1/leads", state.config.base_url);
    let bundle = export::build_bundle(
        &project.name,
        &project.id.to_string(),
        &snapshot,
        &site_url(&state, &project),
        &leads_endpoint,
    )
    .map_err(AppError::Internal)?;

    let dir = FsPath::new(&state.config.export_dir)
        .join(auth.user_id.to_string())
        .join(project.id.to_string());
    bundle.write_to_dir(&dir).await.map_err(AppError::Internal)?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.exported",
        "project",
        Some(project.id),
        Some(json!({ "files": bundle.manifest().len() })),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "export_dir": dir.to_string_lossy(),
        "files": bundle.manifest(),
    })))
}

#[derive(Deserialize)]
pub struct GithubDeployRequest {
    #[serde(default)]
    pub private: bool,
}

/// Create (or reuse) a GitHub repository and push the exported bundle.
pub async fn deploy_github(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<GithubDeployRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_tier = tier::user_tier(&state.pool, auth.user_id).await?;
    if !user_tier.features().can_deploy_github {
        return Err(AppError::PaymentRequired(format!(
            "The {} plan does not include GitHub deploys",
            user_tier.features().name
        )));
    }

    let github = state
        .github
        .as_ref()
        .ok_or_else(|| AppError::UpstreamApi("GitHub integration is not configured".to_string()))?;
    let owner = state
        .config
        .github
        .as_ref()
        .map(|g| g.owner.clone())
        .unwrap_or_default();

    let (project, snapshot) = owned_project_with_snapshot(&state, &auth, project_id).await?;

    let leads_endpoint = format!("{}/v1/leads", state.config.base_url);
    let bundle = export::build_bundle(
        &project.name,
        &project.id.to_string(),
        &snapshot,
        &site_url(&state, &project),
        &leads_endpoint,
    )
    .map_err(AppError::Internal)?;

    let name = repo_name(&project);
    let repo = if github.repo_exists(&name).await.map_err(AppError::UpstreamApi)? {
        tracing::debug!("Reusing existing repository {name}");
        crate::integrations::github::RepoInfo {
            repo_url: format!("https://github.com/{owner}/{name}"),
            repo_full_name: format!("{owner}/{name}"),
            default_branch: "main".to_string(),
        }
    } else {
        github
            .create_repo(&name, &format!("Website for {}", project.name), req.private)
            .await
            .map_err(AppError::UpstreamApi)?
    };

    github
        .push_files(
            &repo.repo_full_name,
            &bundle.files,
            &format!("Publish {}", project.name),
        )
        .await
        .map_err(AppError::UpstreamApi)?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.deployed_github",
        "project",
        Some(project.id),
        Some(json!({ "repo": repo.repo_full_name })),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "repo_url": repo.repo_url,
        "repo_full_name": repo.repo_full_name,
        "default_branch": repo.default_branch,
    })))
}

#[derive(Deserialize)]
pub struct VercelDeployRequest {
    pub repo_full_name: String,
}

/// Link the GitHub repository to a Vercel project and trigger a
/// production deployment.
pub async fn deploy_vercel(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<VercelDeployRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_tier = tier::user_tier(&state.pool, auth.user_id).await?;
    if !user_tier.features().can_deploy_vercel {
        return Err(AppError::PaymentRequired(format!(
            "The {} plan does not include Vercel deploys",
            user_tier.features().name
        )));
    }

    let vercel_client = state
        .vercel
        .as_ref()
        .ok_or_else(|| AppError::UpstreamApi("Vercel integration is not configured".to_string()))?;
    let github_config = state
        .config
        .github
        .as_ref()
        .ok_or_else(|| AppError::UpstreamApi("GitHub integration is not configured".to_string()))?;

    let (project, _snapshot) = owned_project_with_snapshot(&state, &auth, project_id).await?;

    if req.repo_full_name.is_empty() || !req.repo_full_name.contains('/') {
        return Err(AppError::BadRequest(
            "repo_full_name must be 'owner/repo'".to_string(),
        ));
    }

    let vercel_project = vercel_client
        .ensure_project(&repo_name(&project), &req.repo_full_name)
        .await
        .map_err(AppError::UpstreamApi)?;

    let repo_id = vercel::github_repo_id(&req.repo_full_name, &github_config.token)
        .await
        .map_err(AppError::UpstreamApi)?;

    let deployment = vercel_client
        .deploy(&vercel_project, repo_id, "main")
        .await
        .map_err(AppError::UpstreamApi)?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.deployed_vercel",
        "project",
        Some(project.id),
        Some(json!({ "deployment_id": deployment.deployment_id })),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "deployment": deployment,
    })))
}

/// Poll a Vercel deployment's ready state.
pub async fn deployment_status(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(deployment_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let vercel_client = state
        .vercel
        .as_ref()
        .ok_or_else(|| AppError::UpstreamApi("Vercel integration is not configured".to_string()))?;

    let ready_state = vercel_client
        .deployment_status(&deployment_id)
        .await
        .map_err(AppError::UpstreamApi)?;

    Ok(Json(json!({ "deployment_id": deployment_id, "ready_state": ready_state })))
}
