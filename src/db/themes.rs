use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Theme;

pub async fn list(pool: &PgPool) -> Result<Vec<Theme>, sqlx::Error> {
    sqlx::query_as::<_, Theme>("SELECT * FROM themes ORDER BY created_at ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Theme>, sqlx::Error> {
    sqlx::query_as::<_, Theme>("SELECT * FROM themes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    description: &str,
    preview_url: Option<&str>,
    default_params: &serde_json::Value,
    created_by: Uuid,
) -> Result<Theme, sqlx::Error> {
    sqlx::query_as::<_, Theme>(
        "INSERT INTO themes (name, description, preview_url, default_params, created_by)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(preview_url)
    .bind(default_params)
    .bind(created_by)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: &str,
    preview_url: Option<&str>,
    default_params: &serde_json::Value,
) -> Result<Theme, sqlx::Error> {
    sqlx::query_as::<_, Theme>(
        "UPDATE themes SET name = $2, description = $3, preview_url = $4,
                default_params = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(preview_url)
    .bind(default_params)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM themes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
