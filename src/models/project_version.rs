use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of a project's theme parameters. Edits append new
/// versions; numbers increase monotonically per project.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProjectVersion {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version_number: i32,
    pub snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
