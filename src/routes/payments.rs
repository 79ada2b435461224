use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Payment;
use crate::state::SharedState;
use crate::tier;

#[derive(Deserialize)]
pub struct CreatePayment {
    pub amount: i64,
    pub currency: String,
    pub plan_id: String,
}

/// Start a checkout: record a pending payment with a fresh bank reference.
/// The bank transfers against that reference and the webhook confirms it.
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreatePayment>,
) -> Result<Json<Payment>, AppError> {
    if req.amount <= 0 {
        return Err(AppError::BadRequest(
            "Amount must be positive".to_string(),
        ));
    }
    if req.currency.is_empty() || req.plan_id.is_empty() {
        return Err(AppError::BadRequest(
            "currency and plan_id are required".to_string(),
        ));
    }

    let bank_txn_id = generate_bank_txn_id();
    let payment = db::payments::create(
        &state.pool,
        auth.user_id,
        req.amount,
        &req.currency,
        &bank_txn_id,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "payment.created",
        "payment",
        Some(payment.id),
        Some(json!({ "plan_id": req.plan_id, "amount": req.amount })),
    )
    .await;

    Ok(Json(payment))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = db::payments::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(payments))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = db::payments::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
    Ok(Json(payment))
}

/// The caller's current tier and its feature limits.
pub async fn my_tier(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_tier = tier::user_tier(&state.pool, auth.user_id).await?;
    Ok(Json(json!({
        "tier": user_tier,
        "features": user_tier.features(),
    })))
}

// ── Bank webhook ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub gateway: String,
    pub transfer_type: String,
    pub transfer_amount: i64,
    pub reference_code: String,
}

/// Bank-gateway confirmation callback. Auth is a static key in the
/// `Authorization: Apikey <key>` header; the payment is correlated by
/// reference code and flipped to paid when the amount matches. Replays of
/// an already-paid payment are acknowledged without another write.
pub async fn webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let api_key = auth_header
        .strip_prefix("Apikey ")
        .ok_or_else(|| AppError::Unauthorized("Missing Apikey authorization".to_string()))?;

    if api_key != state.config.payment_webhook_key {
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }

    if payload.reference_code.is_empty() || payload.gateway.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }
    if payload.transfer_amount <= 0 {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }

    // Outgoing transfers are not payment confirmations.
    if payload.transfer_type != "in" {
        tracing::debug!("Ignoring outgoing transfer {}", payload.reference_code);
        return Ok(Json(json!({
            "success": true,
            "message": "Outgoing transfer ignored",
        })));
    }

    let payment = db::payments::find_by_bank_txn_id(&state.pool, &payload.reference_code)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Webhook for unknown payment {}", payload.reference_code);
            AppError::NotFound("Payment not found".to_string())
        })?;

    if payment.amount != payload.transfer_amount {
        tracing::warn!(
            "Webhook amount mismatch for {}: expected {}, got {}",
            payload.reference_code,
            payment.amount,
            payload.transfer_amount
        );
        return Err(AppError::BadRequest("Amount mismatch".to_string()));
    }

    if payment.status == "paid" {
        return Ok(Json(json!({
            "success": true,
            "message": "Webhook processed successfully",
            "payment_id": payment.id,
            "status": "paid",
            "already_processed": true,
        })));
    }

    let updated = db::payments::mark_paid(&state.pool, payment.id, Utc::now()).await?;

    audit::log_event(
        &state.pool,
        None,
        "payment.paid",
        "payment",
        Some(payment.id),
        Some(json!({ "gateway": payload.gateway, "amount": payload.transfer_amount })),
    )
    .await;

    tracing::info!(
        "Payment {} marked as paid via {}",
        payload.reference_code,
        payload.gateway
    );

    Ok(Json(json!({
        "success": true,
        "message": "Webhook processed successfully",
        "payment_id": updated.id,
        "status": updated.status,
        "gateway": payload.gateway,
        "amount": payload.transfer_amount,
    })))
}

fn generate_bank_txn_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: [u8; 4] = rand::random();
    format!("TXN_{millis}_{}", hex::encode(suffix))
}

#[cfg(test)]
mod tests {
    use super::generate_bank_txn_id;

    #[test]
    fn bank_txn_ids_are_unique_enough() {
        let a = generate_bank_txn_id();
        let b = generate_bank_txn_id();
        assert!(a.starts_with("TXN_"));
        assert_ne!(a, b);
    }
}
