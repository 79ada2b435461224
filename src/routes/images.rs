use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ImageQuery {
    pub query: Option<String>,
    pub per_page: Option<u32>,
}

pub async fn random(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ImageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client = state
        .unsplash
        .as_ref()
        .ok_or_else(|| AppError::UpstreamApi("Image search is not configured".to_string()))?;

    let query = params.query.as_deref().unwrap_or("business");
    let photo = client
        .random_photo(query)
        .await
        .map_err(AppError::UpstreamApi)?;

    Ok(Json(json!({ "success": true, "photo": photo })))
}

pub async fn search(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ImageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client = state
        .unsplash
        .as_ref()
        .ok_or_else(|| AppError::UpstreamApi("Image search is not configured".to_string()))?;

    let query = params
        .query
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("query is required".to_string()))?;

    let per_page = params.per_page.unwrap_or(10).min(30);
    let photos = client
        .search_photos(query, per_page)
        .await
        .map_err(AppError::UpstreamApi)?;

    Ok(Json(json!({ "success": true, "photos": photos })))
}
