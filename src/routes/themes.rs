use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Theme;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateTheme {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub preview_url: Option<String>,
    pub default_params: serde_json::Value,
}

#[derive(Deserialize)]
pub struct UpdateTheme {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub preview_url: Option<String>,
    pub default_params: serde_json::Value,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Theme>>, AppError> {
    let themes = db::themes::list(&state.pool).await?;
    Ok(Json(themes))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Theme>, AppError> {
    let theme = db::themes::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Theme not found".to_string()))?;
    Ok(Json(theme))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateTheme>,
) -> Result<Json<Theme>, AppError> {
    auth.require_admin()?;

    if req.name.is_empty() {
        return Err(AppError::BadRequest("Theme name is required".to_string()));
    }
    if !req.default_params.is_object() {
        return Err(AppError::BadRequest(
            "default_params must be a JSON object".to_string(),
        ));
    }

    let theme = db::themes::create(
        &state.pool,
        &req.name,
        &req.description,
        req.preview_url.as_deref(),
        &req.default_params,
        auth.user_id,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "theme.created",
        "theme",
        Some(theme.id),
        None,
    )
    .await;

    Ok(Json(theme))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTheme>,
) -> Result<Json<Theme>, AppError> {
    auth.require_admin()?;

    if !req.default_params.is_object() {
        return Err(AppError::BadRequest(
            "default_params must be a JSON object".to_string(),
        ));
    }

    let theme = db::themes::update(
        &state.pool,
        id,
        &req.name,
        &req.description,
        req.preview_url.as_deref(),
        &req.default_params,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Theme not found".to_string()),
        _ => AppError::Database(e),
    })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "theme.updated",
        "theme",
        Some(theme.id),
        None,
    )
    .await;

    Ok(Json(theme))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    db::themes::delete(&state.pool, id).await.map_err(|e| {
        match e {
            // Projects reference themes; refuse to orphan them.
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::Conflict("Theme is in use by existing projects".to_string())
            }
            _ => AppError::Database(e),
        }
    })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "theme.deleted",
        "theme",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
