use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{AuditEvent, Project};
use crate::state::SharedState;
use crate::tier;

#[derive(Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub tier: tier::Tier,
    pub project_count: i64,
    pub paid_total_30d: i64,
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminUser>>, AppError> {
    auth.require_admin()?;

    let users = db::users::list_all(&state.pool).await?;
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        let paid_total = db::payments::paid_total_since(&state.pool, user.id, 30).await?;
        let project_count = db::users::count_projects(&state.pool, user.id).await?;
        out.push(AdminUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            tier: tier::Tier::from_paid_total(paid_total),
            project_count,
            paid_total_30d: paid_total,
        });
    }
    Ok(Json(out))
}

pub async fn list_projects(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Project>>, AppError> {
    auth.require_admin()?;
    let projects = db::projects::list_all(&state.pool).await?;
    Ok(Json(projects))
}

/// Mint a one-hour reset token for a user. The admin hands the token to
/// the user out of band; `/api/v1/auth/reset-password` consumes it.
pub async fn reset_user_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    db::users::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let token = super::auth::mint_reset_token(&state, user_id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "admin.password_reset_issued",
        "user",
        Some(user_id),
        None,
    )
    .await;

    Ok(Json(json!({ "success": true, "reset_token": token, "expires_in_secs": 3600 })))
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_audit_events(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    auth.require_admin()?;
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);
    let events = db::audit::list(&state.pool, limit, offset).await?;
    Ok(Json(events))
}
