use std::convert::Infallible;
use std::time::Instant;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::ai::{BusinessInfo, ProgressEvent};
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;
use crate::tier;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub business_info: BusinessInfo,
    #[serde(default)]
    pub current_theme: serde_json::Value,
}

async fn check_rate_limit(state: &SharedState, auth: &AuthUser) -> Result<(), AppError> {
    let user_tier = tier::user_tier(&state.pool, auth.user_id).await?;
    state
        .generation_limiter
        .check(auth.user_id, user_tier)
        .map(|_| ())
        .map_err(|retry_after| {
            AppError::RateLimited(format!(
                "Generation rate limit reached. Retry after {retry_after}s"
            ))
        })
}

fn map_generation_error(message: String) -> AppError {
    if message.contains("Queue is full") || message.contains("already in progress") {
        AppError::RateLimited(message)
    } else {
        AppError::UpstreamApi(message)
    }
}

fn validate(req: &GenerateRequest) -> Result<(), AppError> {
    if req.business_info.company_name.trim().is_empty()
        || req.business_info.industry.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "companyName and industry are required".to_string(),
        ));
    }
    Ok(())
}

/// Blocking generation: waits for the queue and returns the merged theme
/// params in one JSON response.
pub async fn generate(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate(&req)?;
    check_rate_limit(&state, &auth).await?;

    let outcome = state
        .ai
        .generate(&req.business_info, &req.current_theme, None)
        .await
        .map_err(map_generation_error)?;

    Ok(Json(json!({
        "success": true,
        "theme_params": outcome.theme_params,
        "generated_data": outcome.generated_data,
        "response_time_ms": outcome.response_time_ms,
        "cached": outcome.cached,
        "queue_stats": state.ai.queue_stats(),
    })))
}

/// Streaming generation: emits `data: {...}` SSE frames for each progress
/// step, ending with a `completed` frame carrying the result (or an
/// `error` frame).
pub async fn generate_stream(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    validate(&req)?;
    check_rate_limit(&state, &auth).await?;

    let (tx, rx) = mpsc::channel::<ProgressEvent>(32);

    let service_state = state.clone();
    tokio::spawn(async move {
        let started = Instant::now();
        let result = service_state
            .ai
            .generate(&req.business_info, &req.current_theme, Some(&tx))
            .await;

        // The service emits its own Error frame on failure; only the
        // terminal result frame is added here.
        if let Ok(outcome) = result {
            let _ = tx
                .send(ProgressEvent::Completed {
                    data: outcome,
                    total_time_ms: started.elapsed().as_millis() as u64,
                })
                .await;
        }
    });

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| {
            let frame = Event::default()
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().data("{\"status\":\"error\"}"));
            (Ok::<_, Infallible>(frame), rx)
        })
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Queue and cache health, used by the dashboard and ops checks.
pub async fn stats(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    Ok(Json(json!({
        "queue": state.ai.queue_stats(),
        "cache": state.ai.cache_stats(),
    })))
}
