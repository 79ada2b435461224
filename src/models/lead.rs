use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contact-form submission captured on a tenant site.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
