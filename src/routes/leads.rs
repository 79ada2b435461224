use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Lead;
use crate::request_meta;
use crate::state::SharedState;

const LEAD_LIST_LIMIT: i64 = 100;

/// Public lead capture, posted by tenant sites and exported bundles.
/// Accepts JSON or form-urlencoded bodies; CORS is wide open because the
/// form lives on arbitrary customer domains.
pub async fn submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Response> {
    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());

    let data = parse_body(content_type, &body).map_err(|e| {
        with_cors((StatusCode::BAD_REQUEST, Json(json!({ "error": e }))).into_response())
    })?;

    let name = data["name"].as_str().unwrap_or("").trim().to_string();
    let email = data["email"].as_str().unwrap_or("").trim().to_string();
    if name.is_empty() || email.is_empty() || !email.contains('@') {
        return Err(with_cors(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Name and email are required" })),
            )
                .into_response(),
        ));
    }

    let project_id = data["projectId"]
        .as_str()
        .or_else(|| data["project_id"].as_str())
        .and_then(|s| s.parse::<Uuid>().ok())
        .ok_or_else(|| {
            with_cors(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "projectId is required" })),
                )
                    .into_response(),
            )
        })?;

    let project = db::projects::find_by_id_unscoped(&state.pool, project_id)
        .await
        .map_err(|_| {
            with_cors(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal error" })),
                )
                    .into_response(),
            )
        })?
        .ok_or_else(|| {
            with_cors(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Project not found" })),
                )
                    .into_response(),
            )
        })?;

    let metadata = request_meta::extract(&headers, Some(addr.ip()), &state.config.trusted_proxies);

    let lead = db::leads::create(
        &state.pool,
        project.id,
        &name,
        &email,
        data["company"].as_str().filter(|s| !s.is_empty()),
        data["message"].as_str().filter(|s| !s.is_empty()),
        &metadata,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to store lead: {e}");
        with_cors(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create lead" })),
            )
                .into_response(),
        )
    })?;

    tracing::debug!("Lead {} captured for project {}", lead.id, project.id);

    Ok(with_cors(
        (
            StatusCode::CREATED,
            Json(json!({ "success": true, "lead_id": lead.id })),
        )
            .into_response(),
    ))
}

pub async fn submit_options() -> Response {
    with_cors(StatusCode::NO_CONTENT.into_response())
}

fn with_cors(mut response: Response) -> Response {
    use axum::http::HeaderValue;

    let headers = response.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else {
        serde_json::from_slice(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Value, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let pairs: HashMap<String, String> = form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k, Value::String(v));
    }
    Ok(Value::Object(map))
}

// ── Authenticated lead management ───────────────────────────────

pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Lead>>, AppError> {
    db::projects::find_by_id(&state.pool, project_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let leads = db::leads::list_by_project(&state.pool, project_id, LEAD_LIST_LIMIT).await?;
    Ok(Json(leads))
}

#[derive(Deserialize)]
pub struct UpdateLead {
    pub status: String,
}

pub async fn update_status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((project_id, lead_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateLead>,
) -> Result<Json<Lead>, AppError> {
    if !matches!(req.status.as_str(), "new" | "contacted" | "closed") {
        return Err(AppError::BadRequest(
            "Status must be 'new', 'contacted' or 'closed'".to_string(),
        ));
    }

    db::projects::find_by_id(&state.pool, project_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let lead = db::leads::set_status(&state.pool, lead_id, project_id, &req.status)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Lead not found".to_string()),
            _ => AppError::Database(e),
        })?;

    Ok(Json(lead))
}
