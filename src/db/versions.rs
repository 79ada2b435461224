use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ProjectVersion;

/// Append a new snapshot. The version number is assigned inside the
/// transaction as max + 1 so concurrent edits cannot produce gaps or
/// duplicates (the UNIQUE constraint backs this up).
pub async fn append(
    pool: &PgPool,
    project_id: Uuid,
    snapshot: &serde_json::Value,
) -> Result<ProjectVersion, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Serialize appends per project by locking the parent row.
    sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

    let row: (i32,) = sqlx::query_as(
        "SELECT COALESCE(MAX(version_number), 0) FROM project_versions WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(&mut *tx)
    .await?;

    let version = sqlx::query_as::<_, ProjectVersion>(
        "INSERT INTO project_versions (project_id, version_number, snapshot)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(project_id)
    .bind(row.0 + 1)
    .bind(snapshot)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(version)
}

pub async fn latest(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<ProjectVersion>, sqlx::Error> {
    sqlx::query_as::<_, ProjectVersion>(
        "SELECT * FROM project_versions WHERE project_id = $1
         ORDER BY version_number DESC LIMIT 1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, project_id: Uuid) -> Result<Vec<ProjectVersion>, sqlx::Error> {
    sqlx::query_as::<_, ProjectVersion>(
        "SELECT * FROM project_versions WHERE project_id = $1 ORDER BY version_number DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_number(
    pool: &PgPool,
    project_id: Uuid,
    version_number: i32,
) -> Result<Option<ProjectVersion>, sqlx::Error> {
    sqlx::query_as::<_, ProjectVersion>(
        "SELECT * FROM project_versions WHERE project_id = $1 AND version_number = $2",
    )
    .bind(project_id)
    .bind(version_number)
    .fetch_optional(pool)
    .await
}

pub async fn count(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM project_versions WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}
