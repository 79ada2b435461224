use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Lead;

pub async fn create(
    pool: &PgPool,
    project_id: Uuid,
    name: &str,
    email: &str,
    company: Option<&str>,
    message: Option<&str>,
    metadata: &serde_json::Value,
) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        "INSERT INTO leads (project_id, name, email, company, message, metadata)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(project_id)
    .bind(name)
    .bind(email)
    .bind(company)
    .bind(message)
    .bind(metadata)
    .fetch_one(pool)
    .await
}

pub async fn list_by_project(
    pool: &PgPool,
    project_id: Uuid,
    limit: i64,
) -> Result<Vec<Lead>, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        "SELECT * FROM leads WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(project_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    project_id: Uuid,
    status: &str,
) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        "UPDATE leads SET status = $3 WHERE id = $1 AND project_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(project_id)
    .bind(status)
    .fetch_one(pool)
    .await
}
