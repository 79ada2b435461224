use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An admin-curated parameter bundle (colors, typography, layout,
/// component and section styles) that new projects start from.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Theme {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub preview_url: Option<String>,
    pub default_params: serde_json::Value,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
