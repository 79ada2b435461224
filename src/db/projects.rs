use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Project;

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    theme_id: Uuid,
    name: &str,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (user_id, theme_id, name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(theme_id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Unscoped lookup, used by tenant rendering and the lead pipeline.
pub async fn find_by_id_unscoped(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_custom_domain(
    pool: &PgPool,
    domain: &str,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE custom_domain = $1")
        .bind(domain)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_subdomain(
    pool: &PgPool,
    subdomain: &str,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE subdomain = $1")
        .bind(subdomain)
        .fetch_optional(pool)
        .await
}

pub async fn rename(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    name: &str,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET name = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    status: &str,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET status = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await
}

pub async fn set_domains(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    custom_domain: Option<&str>,
    subdomain: Option<&str>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET custom_domain = $3, subdomain = $4, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(custom_domain)
    .bind(subdomain)
    .fetch_one(pool)
    .await
}

pub async fn domain_taken(
    pool: &PgPool,
    domain: &str,
    exclude_project: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM projects
         WHERE (custom_domain = $1 OR subdomain = $1) AND ($2::uuid IS NULL OR id != $2)",
    )
    .bind(domain)
    .bind(exclude_project)
    .fetch_one(pool)
    .await?;
    Ok(row.0 > 0)
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
